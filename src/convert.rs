// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::rates::{Quotation, RateTable};
use log::warn;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;

/// Round to cents, halves away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert `amount` from one currency to another through the table's base,
/// rounded to cents. Converting to the same currency, or involving a code the
/// table does not know, returns `amount` untouched. A result too large for
/// `Decimal` saturates; use [`convert_checked`] to detect that.
pub fn convert(amount: Decimal, from: &str, to: &str, table: &RateTable) -> Decimal {
    try_convert(amount, from, to, table).unwrap_or_else(|| {
        warn!("{} {} does not fit when converted to {}; saturating", amount, from, to);
        if amount.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        }
    })
}

/// Like [`convert`], but `None` when the result does not fit in a `Decimal`.
pub fn try_convert(amount: Decimal, from: &str, to: &str, table: &RateTable) -> Option<Decimal> {
    if from == to || !table.contains(from) || !table.contains(to) {
        return Some(amount);
    }
    let (mul, div) = match table.quotation() {
        Quotation::BasePerUnit => (table.rate_of(from), table.rate_of(to)),
        Quotation::UnitsPerBase => (table.rate_of(to), table.rate_of(from)),
    };
    // Dividing first loses a little precision but survives amounts near the top
    let raw = amount
        .checked_mul(mul)
        .and_then(|x| x.checked_div(div))
        .or_else(|| amount.checked_div(div)?.checked_mul(mul))?;
    Some(round_money(raw))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    pub amount: Decimal,
    /// Codes the table did not know; the amount passed through unconverted.
    pub unknown: Vec<String>,
    /// The converted value did not fit and `amount` is saturated.
    pub overflow: bool,
}

impl Converted {
    pub fn is_degraded(&self) -> bool {
        !self.unknown.is_empty() || self.overflow
    }
}

pub fn convert_checked(amount: Decimal, from: &str, to: &str, table: &RateTable) -> Converted {
    if from == to {
        return Converted {
            amount,
            unknown: Vec::new(),
            overflow: false,
        };
    }
    let unknown = [from, to]
        .into_iter()
        .filter(|c| !table.contains(c))
        .map(str::to_string)
        .collect();
    match try_convert(amount, from, to, table) {
        Some(amount) => Converted {
            amount,
            unknown,
            overflow: false,
        },
        None => Converted {
            amount: convert(amount, from, to, table),
            unknown,
            overflow: true,
        },
    }
}

/// Unrounded factor that turns one unit of `from` into `to`; 1 whenever
/// [`convert`] would pass the amount through.
pub fn cross_rate(from: &str, to: &str, table: &RateTable) -> Decimal {
    if from == to || !table.contains(from) || !table.contains(to) {
        return Decimal::ONE;
    }
    let (num, den) = match table.quotation() {
        Quotation::BasePerUnit => (table.rate_of(from), table.rate_of(to)),
        Quotation::UnitsPerBase => (table.rate_of(to), table.rate_of(from)),
    };
    num.checked_div(den).unwrap_or(Decimal::MAX)
}

/// Target currency plus the one rate snapshot a computation runs against.
#[derive(Debug, Clone)]
pub struct ConversionContext {
    pub target: String,
    pub snapshot: Arc<RateTable>,
}

impl ConversionContext {
    pub fn new(target: &str, snapshot: Arc<RateTable>) -> Self {
        Self {
            target: target.to_string(),
            snapshot,
        }
    }

    pub fn convert(&self, amount: Decimal, from: &str) -> Converted {
        convert_checked(amount, from, &self.target, &self.snapshot)
    }
}
