// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::ValidationError;
use crate::utils::parse_currency;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_TITLE: &str = "New Transaction";
pub const MAX_CATEGORY_NAME: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Income,
    Expense,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Income => "Income",
            Kind::Expense => "Expense",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Kind::Income),
            "expense" => Ok(Kind::Expense),
            _ => Err(ValidationError::Kind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub owner: String,
    pub title: String,
    /// Magnitude only; the sign comes from `kind`.
    pub amount: Decimal,
    pub currency: String,
    pub category: Option<String>,
    pub kind: Kind,
    pub timestamp: NaiveDateTime,
}

impl Transaction {
    /// Records with a negative amount or no currency code are left out of
    /// every aggregate.
    pub fn is_well_formed(&self) -> bool {
        self.amount >= Decimal::ZERO && !self.currency.trim().is_empty()
    }
}

/// Input for recording a transaction. Defaults are resolved once, at creation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub title: Option<String>,
    pub amount: Decimal,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub kind: Kind,
    pub timestamp: Option<NaiveDateTime>,
}

impl NewTransaction {
    pub fn new(kind: Kind, amount: Decimal) -> Self {
        Self {
            title: None,
            amount,
            currency: None,
            category: None,
            kind,
            timestamp: None,
        }
    }

    /// Validate and fill in defaults. The returned record has id 0 until a
    /// store assigns one.
    pub fn resolve(self, owner: &str, now: NaiveDateTime) -> Result<Transaction, ValidationError> {
        if self.amount < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount(self.amount));
        }
        let currency = match self.currency.as_deref() {
            Some(c) if !c.trim().is_empty() => parse_currency(c)?,
            _ => DEFAULT_CURRENCY.to_string(),
        };
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        Ok(Transaction {
            id: 0,
            owner: owner.to_string(),
            title,
            amount: self.amount,
            currency,
            category: self.category.filter(|c| !c.trim().is_empty()),
            kind: self.kind,
            timestamp: self.timestamp.unwrap_or(now),
        })
    }
}

/// Partial update; `None` leaves a field untouched. An empty category clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub title: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub kind: Option<Kind>,
    pub timestamp: Option<NaiveDateTime>,
}

impl TransactionPatch {
    pub fn apply(&self, t: &mut Transaction) -> Result<(), ValidationError> {
        if let Some(amount) = self.amount {
            if amount < Decimal::ZERO {
                return Err(ValidationError::NegativeAmount(amount));
            }
            t.amount = amount;
        }
        if let Some(c) = &self.currency {
            t.currency = parse_currency(c)?;
        }
        if let Some(title) = &self.title {
            let title = title.trim();
            t.title = if title.is_empty() {
                DEFAULT_TITLE.to_string()
            } else {
                title.to_string()
            };
        }
        if let Some(cat) = &self.category {
            t.category = if cat.trim().is_empty() {
                None
            } else {
                Some(cat.clone())
            };
        }
        if let Some(kind) = self.kind {
            t.kind = kind;
        }
        if let Some(ts) = self.timestamp {
            t.timestamp = ts;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub owner: String,
    pub name: String,
}

impl Category {
    /// Trim and check a category name against the 1..=25 character rule.
    pub fn validate_name(name: &str) -> Result<String, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyCategory);
        }
        if name.chars().count() > MAX_CATEGORY_NAME {
            return Err(ValidationError::CategoryTooLong {
                name: name.to_string(),
                max: MAX_CATEGORY_NAME,
            });
        }
        Ok(name.to_string())
    }
}
