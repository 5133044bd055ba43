// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Session;
use crate::db::load_rate_table;
use crate::utils::{get_max_age, get_target_currency, pretty_table};
use anyhow::Result;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};

/// Data-quality checks. Returns (issue, detail) rows; empty means healthy.
pub fn check(s: &Session) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let snapshot = s.store.transactions(&s.owner)?;
    let txs = &snapshot.transactions;

    if snapshot.skipped > 0 {
        rows.push(vec![
            "unreadable_transaction".into(),
            format!("{} records", snapshot.skipped),
        ]);
    }

    // 1) Rate cache
    let table = load_rate_table(s.conn)?;
    match &table {
        None => rows.push(vec!["no_rates".into(), "run `fintrack fx fetch`".into()]),
        Some(t) => {
            if let Some(max) = get_max_age(s.conn)? {
                if t.age(Utc::now().naive_utc()) > max {
                    rows.push(vec![
                        "stale_rates".into(),
                        format!("fetched {}", t.as_of().format("%Y-%m-%d %H:%M")),
                    ]);
                }
            }
        }
    }

    // 2) Currencies the rate table cannot convert
    if let Some(rates) = &table {
        let mut codes: BTreeSet<String> = txs.iter().map(|t| t.currency.clone()).collect();
        codes.insert(get_target_currency(s.conn)?);
        for c in codes {
            if !rates.contains(&c) {
                rows.push(vec!["unknown_currency".into(), c]);
            }
        }
    }

    // 3) Category names that differ only by case or surrounding whitespace
    let mut names: BTreeSet<String> = s
        .store
        .categories(&s.owner)?
        .into_iter()
        .map(|c| c.name)
        .collect();
    names.extend(txs.iter().filter_map(|t| t.category.clone()));
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for n in names {
        groups.entry(n.trim().to_lowercase()).or_default().push(n);
    }
    for variants in groups.into_values().filter(|v| v.len() > 1) {
        rows.push(vec!["category_variants".into(), variants.join(" | ")]);
    }

    Ok(rows)
}

pub fn handle(s: &Session) -> Result<()> {
    let rows = check(s)?;
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
