// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Exchange-rate tables and the provider that caches them.
//!
//! A [`RateTable`] is never edited in place: a refresh builds a complete new
//! table and swaps the shared pointer, so a reader holding a snapshot keeps
//! seeing one consistent set of rates for the whole computation.

use crate::error::RateError;
use chrono::{Duration, NaiveDateTime, Utc};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

pub const BASE_CURRENCY: &str = "PLN";
pub const TRACKED_CURRENCIES: [&str; 4] = ["USD", "EUR", "GBP", "JPY"];

/// Orientation of the numbers held in a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quotation {
    /// Units of base for one unit of the code (NBP "mid").
    BasePerUnit,
    /// Units of the code for one unit of base (ECB style).
    UnitsPerBase,
}

impl Quotation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quotation::BasePerUnit => "base_per_unit",
            Quotation::UnitsPerBase => "units_per_base",
        }
    }
}

impl fmt::Display for Quotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quotation {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base_per_unit" => Ok(Quotation::BasePerUnit),
            "units_per_base" => Ok(Quotation::UnitsPerBase),
            other => Err(RateError::Malformed(format!("unknown quotation '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateQuote {
    pub code: String,
    pub rate: Decimal,
}

/// What a [`RateSource`] hands back; the provider stamps it into a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedRates {
    pub base: String,
    pub quotation: Quotation,
    pub quotes: Vec<RateQuote>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateTable {
    base: String,
    as_of: NaiveDateTime,
    quotation: Quotation,
    rates: BTreeMap<String, Decimal>,
}

impl RateTable {
    pub fn new<I>(base: &str, as_of: NaiveDateTime, quotation: Quotation, quotes: I) -> Self
    where
        I: IntoIterator<Item = RateQuote>,
    {
        let base = base.trim().to_uppercase();
        let mut rates = BTreeMap::new();
        for q in quotes {
            let code = q.code.trim().to_uppercase();
            if code.is_empty() || code == base {
                continue;
            }
            if q.rate <= Decimal::ZERO {
                warn!("Dropping non-positive rate {} for {}", q.rate, code);
                continue;
            }
            rates.insert(code, q.rate);
        }
        rates.insert(base.clone(), Decimal::ONE);
        Self {
            base,
            as_of,
            quotation,
            rates,
        }
    }

    /// A table that knows only its base; every other code converts at 1.
    pub fn identity(base: &str, as_of: NaiveDateTime) -> Self {
        Self::new(base, as_of, Quotation::BasePerUnit, Vec::new())
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn as_of(&self) -> NaiveDateTime {
        self.as_of
    }

    pub fn quotation(&self) -> Quotation {
        self.quotation
    }

    pub fn rates(&self) -> &BTreeMap<String, Decimal> {
        &self.rates
    }

    pub fn lookup(&self, code: &str) -> Option<Decimal> {
        self.rates.get(code).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rates.contains_key(code)
    }

    /// Rate of `code` against the base, or 1 when the table does not know it.
    pub fn rate_of(&self, code: &str) -> Decimal {
        match self.lookup(code) {
            Some(r) => r,
            None => {
                debug!("No {} rate in table based on {}; using 1", code, self.base);
                Decimal::ONE
            }
        }
    }

    pub fn age(&self, now: NaiveDateTime) -> Duration {
        now - self.as_of
    }

    /// Same rates, ignoring when they were fetched.
    pub fn same_rates(&self, other: &RateTable) -> bool {
        self.base == other.base && self.quotation == other.quotation && self.rates == other.rates
    }
}

pub trait RateSource: Send + Sync {
    fn fetch(&self) -> Result<FetchedRates, RateError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Wait after the n-th failed attempt is `backoff * n`.
    pub backoff: std::time::Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: std::time::Duration::from_millis(500),
        }
    }
}

/// Snapshot handed to a computation, plus any soft warning about how it was
/// obtained.
#[derive(Debug, Clone)]
pub struct Freshness {
    pub snapshot: Arc<RateTable>,
    pub warning: Option<String>,
}

pub struct RateProvider {
    source: Box<dyn RateSource>,
    retry: RetryPolicy,
    base: String,
    current: RwLock<Option<Arc<RateTable>>>,
}

impl RateProvider {
    pub fn new(source: Box<dyn RateSource>) -> Self {
        Self {
            source,
            retry: RetryPolicy::default(),
            base: BASE_CURRENCY.to_string(),
            current: RwLock::new(None),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Seed the cache, e.g. with the table persisted by an earlier run.
    pub fn with_table(self, table: RateTable) -> Self {
        self.publish(table);
        self
    }

    pub fn snapshot(&self) -> Option<Arc<RateTable>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn rate_of(&self, code: &str) -> Decimal {
        match self.snapshot() {
            Some(t) => {
                if !t.contains(code) {
                    warn!("Unknown currency {}; converting at rate 1", code);
                }
                t.rate_of(code)
            }
            None => {
                warn!("No rate table cached; converting {} at rate 1", code);
                Decimal::ONE
            }
        }
    }

    /// Fetch a new table and publish it. On failure the cached table stays
    /// in place and the error goes back to the caller.
    pub fn refresh(&self) -> Result<Arc<RateTable>, RateError> {
        let fetched = self.fetch_with_retry()?;
        let table = RateTable::new(
            &fetched.base,
            Utc::now().naive_utc(),
            fetched.quotation,
            fetched.quotes,
        );
        info!(
            "Rate table refreshed: {} codes against {}",
            table.rates().len(),
            table.base()
        );
        Ok(self.publish(table))
    }

    /// Return a snapshot, refreshing first when nothing is cached or the cache
    /// is older than `max_age`. Never fails: a failed refresh serves the stale
    /// table, or identity rates when there was never one.
    pub fn ensure_fresh(&self, max_age: Option<Duration>) -> Freshness {
        let now = Utc::now().naive_utc();
        let cached = self.snapshot();
        let needs_refresh = match (&cached, max_age) {
            (None, _) => true,
            (Some(t), Some(max)) => t.age(now) > max,
            (Some(_), None) => false,
        };
        if !needs_refresh {
            if let Some(snapshot) = cached {
                return Freshness {
                    snapshot,
                    warning: None,
                };
            }
        }
        match self.refresh() {
            Ok(snapshot) => Freshness {
                snapshot,
                warning: None,
            },
            Err(e) => {
                warn!("Rate refresh failed: {}", e);
                match cached {
                    Some(snapshot) => Freshness {
                        warning: Some(format!(
                            "Using rates from {} (refresh failed: {})",
                            snapshot.as_of().format("%Y-%m-%d %H:%M"),
                            e
                        )),
                        snapshot,
                    },
                    None => Freshness {
                        snapshot: Arc::new(RateTable::identity(&self.base, now)),
                        warning: Some(format!(
                            "No exchange rates available, amounts are not converted ({})",
                            e
                        )),
                    },
                }
            }
        }
    }

    fn publish(&self, table: RateTable) -> Arc<RateTable> {
        let table = Arc::new(table);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(table.clone());
        table
    }

    fn fetch_with_retry(&self) -> Result<FetchedRates, RateError> {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.source.fetch() {
                Ok(rates) => return Ok(rates),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    debug!("Rate fetch attempt {} failed: {}", attempt, e);
                    std::thread::sleep(self.retry.backoff * attempt);
                }
                Err(e) if attempt > 1 => {
                    return Err(RateError::Exhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }
}
