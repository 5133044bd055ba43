// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

/// Failure to obtain a fresh rate table from the external source.
#[derive(Error, Debug)]
pub enum RateError {
    #[error("Rate request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Rate source answered with HTTP {0}")]
    Status(u16),

    #[error("Malformed rate payload: {0}")]
    Malformed(String),

    #[error("Rate refresh gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<RateError> },
}

impl RateError {
    /// Transport problems and server-side statuses are worth another attempt;
    /// a payload we cannot read will not get better by asking again.
    pub fn is_retryable(&self) -> bool {
        match self {
            RateError::Transport(_) => true,
            RateError::Status(code) => *code == 429 || *code >= 500,
            RateError::Malformed(_) | RateError::Exhausted { .. } => false,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Category name must not be empty")]
    EmptyCategory,

    #[error("Category name '{name}' is longer than {max} characters")]
    CategoryTooLong { name: String, max: usize },

    #[error("Invalid currency '{0}', expected a three-letter code such as USD")]
    Currency(String),

    #[error("Amount must not be negative, got {0}")]
    NegativeAmount(Decimal),

    #[error("Unknown transaction type '{0}', expected Income or Expense")]
    Kind(String),
}

/// Ownership and lookup failures raised by the transaction stores.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record {0} not found")]
    NotFound(i64),

    #[error("Record {0} belongs to another user")]
    NotOwner(i64),

    #[error("Category '{0}' already exists")]
    DuplicateCategory(String),
}
