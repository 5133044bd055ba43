// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Currency-normalised aggregates over a set of transactions.
//!
//! Every function here takes the rate table explicitly and converts each
//! transaction on its own before summing, so the same table always gives the
//! same answer no matter where the transactions came from.

use crate::convert::{convert_checked, cross_rate};
use crate::models::{Kind, Transaction};
use crate::rates::RateTable;
use chrono::{Datelike, NaiveDate};
use log::warn;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

pub const UNCATEGORIZED: &str = "(uncategorized)";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Records left out because they were malformed.
    pub skipped: usize,
    /// Codes missing from the rate table; their amounts were not converted.
    pub unknown_currencies: BTreeSet<String>,
    /// Records left out because converting or summing them overflowed.
    pub overflowed: usize,
}

impl Diagnostics {
    pub fn is_clean(&self) -> bool {
        self.skipped == 0 && self.overflowed == 0 && self.unknown_currencies.is_empty()
    }

    pub fn merge(&mut self, other: &Diagnostics) {
        self.skipped += other.skipped;
        self.overflowed += other.overflowed;
        self.unknown_currencies
            .extend(other.unknown_currencies.iter().cloned());
    }

    fn note_unknown(&mut self, codes: Vec<String>) {
        for code in codes {
            if self.unknown_currencies.insert(code.clone()) {
                warn!("No exchange rate for {}; amounts pass through unconverted", code);
            }
        }
    }

    fn note_overflow(&mut self, t: &Transaction, target: &str) {
        warn!("Transaction {} does not fit a {} total; left out", t.id, target);
        self.overflowed += 1;
    }
}

/// `t` in `target`, or `None` when the conversion overflowed.
fn converted(
    t: &Transaction,
    target: &str,
    table: &RateTable,
    diagnostics: &mut Diagnostics,
) -> Option<Decimal> {
    let c = convert_checked(t.amount, &t.currency, target, table);
    diagnostics.note_unknown(c.unknown);
    if c.overflow {
        diagnostics.note_overflow(t, target);
        return None;
    }
    Some(c.amount)
}

fn add_to(total: &mut Decimal, value: Decimal, t: &Transaction, target: &str, diagnostics: &mut Diagnostics) {
    match total.checked_add(value) {
        Some(sum) => *total = sum,
        None => diagnostics.note_overflow(t, target),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Total {
    pub amount: Decimal,
    pub diagnostics: Diagnostics,
}

pub fn total_by_kind(
    transactions: &[Transaction],
    kind: Kind,
    target: &str,
    table: &RateTable,
) -> Total {
    let mut amount = Decimal::ZERO;
    let mut diagnostics = Diagnostics::default();
    for t in transactions.iter().filter(|t| t.kind == kind) {
        if !t.is_well_formed() {
            diagnostics.skipped += 1;
            continue;
        }
        if let Some(value) = converted(t, target, table, &mut diagnostics) {
            add_to(&mut amount, value, t, target, &mut diagnostics);
        }
    }
    Total {
        amount,
        diagnostics,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotals {
    pub rows: Vec<CategoryTotal>,
    pub diagnostics: Diagnostics,
    /// Set by [`crate::summary::SummaryService`] when rates were degraded.
    pub warning: Option<String>,
}

impl CategoryTotals {
    pub fn get(&self, category: &str) -> Option<Decimal> {
        self.rows
            .iter()
            .find(|r| r.category == category)
            .map(|r| r.amount)
    }
}

/// Expenses grouped by the stored category string, largest first. Names are
/// compared exactly as stored.
pub fn totals_by_category(
    transactions: &[Transaction],
    target: &str,
    table: &RateTable,
) -> CategoryTotals {
    let mut agg: HashMap<String, Decimal> = HashMap::new();
    let mut diagnostics = Diagnostics::default();
    for t in transactions.iter().filter(|t| t.kind == Kind::Expense) {
        if !t.is_well_formed() {
            diagnostics.skipped += 1;
            continue;
        }
        let Some(value) = converted(t, target, table, &mut diagnostics) else {
            continue;
        };
        let key = t
            .category
            .clone()
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        add_to(agg.entry(key).or_insert(Decimal::ZERO), value, t, target, &mut diagnostics);
    }
    let mut rows: Vec<CategoryTotal> = agg
        .into_iter()
        .map(|(category, amount)| CategoryTotal { category, amount })
        .collect();
    rows.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.category.cmp(&b.category)));
    CategoryTotals {
        rows,
        diagnostics,
        warning: None,
    }
}

/// Transactions whose naive date falls in `month` of `year`.
pub fn filter_by_period(transactions: &[Transaction], month: u32, year: i32) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| t.timestamp.year() == year && t.timestamp.month() == month)
        .cloned()
        .collect()
}

pub fn filter_by_year(transactions: &[Transaction], year: i32) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| t.timestamp.year() == year)
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentEntry {
    pub transaction: Transaction,
    /// Factor from the transaction's currency to the target.
    pub rate: Decimal,
    /// Saturated when the conversion overflowed; counted in the diagnostics.
    pub converted: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentActivity {
    pub entries: Vec<RecentEntry>,
    pub diagnostics: Diagnostics,
    /// Set by [`crate::summary::SummaryService`] when rates were degraded.
    pub warning: Option<String>,
}

/// The `limit` newest transactions of either kind. Equal timestamps keep
/// their input order.
pub fn recent_activity(
    transactions: &[Transaction],
    limit: usize,
    target: &str,
    table: &RateTable,
) -> RecentActivity {
    let mut diagnostics = Diagnostics::default();
    let mut sorted: Vec<&Transaction> = Vec::with_capacity(transactions.len());
    for t in transactions {
        if t.is_well_formed() {
            sorted.push(t);
        } else {
            diagnostics.skipped += 1;
        }
    }
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    let entries = sorted
        .into_iter()
        .take(limit)
        .map(|t| {
            let c = convert_checked(t.amount, &t.currency, target, table);
            diagnostics.note_unknown(c.unknown);
            if c.overflow {
                diagnostics.note_overflow(t, target);
            }
            RecentEntry {
                rate: cross_rate(&t.currency, target, table),
                converted: c.amount,
                transaction: t.clone(),
            }
        })
        .collect();
    RecentActivity {
        entries,
        diagnostics,
        warning: None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Every income, whatever its category.
    Income,
    Named(String),
}

impl CategoryFilter {
    pub fn parse(s: &str) -> Self {
        match s {
            "All" | "all" | "" => CategoryFilter::All,
            "Income" | "income" => CategoryFilter::Income,
            other => CategoryFilter::Named(other.to_string()),
        }
    }

    fn matches(&self, t: &Transaction) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Income => t.kind == Kind::Income,
            CategoryFilter::Named(name) => t.category.as_deref() == Some(name.as_str()),
        }
    }
}

/// Filters for browsing history. Date and amount bounds are inclusive and
/// amounts are compared in the transaction's own currency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub category: CategoryFilter,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
}

impl HistoryFilter {
    pub fn matches(&self, t: &Transaction) -> bool {
        let date = t.timestamp.date();
        self.category.matches(t)
            && self.from.is_none_or(|d| date >= d)
            && self.to.is_none_or(|d| date <= d)
            && self.min_amount.is_none_or(|m| t.amount >= m)
            && self.max_amount.is_none_or(|m| t.amount <= m)
    }

    pub fn apply(&self, transactions: &[Transaction]) -> Vec<Transaction> {
        transactions
            .iter()
            .filter(|t| self.matches(t))
            .cloned()
            .collect()
    }
}
