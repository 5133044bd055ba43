// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Session;
use crate::aggregate::{filter_by_period, CategoryFilter, HistoryFilter};
use crate::models::{Kind, NewTransaction, TransactionPatch};
use crate::utils::{
    maybe_print_json, parse_date, parse_datetime, parse_decimal, parse_month, pretty_table,
};
use anyhow::Result;
use serde::Serialize;

pub fn handle(s: &Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(s, sub)?,
        Some(("edit", sub)) => edit(s, sub)?,
        Some(("rm", sub)) => remove(s, sub)?,
        Some(("list", sub)) => list(s, sub)?,
        Some(("reset", sub)) => reset(s, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(s: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let kind: Kind = sub.get_one::<String>("type").unwrap().parse()?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let mut new = NewTransaction::new(kind, amount);
    new.title = sub.get_one::<String>("title").cloned();
    new.currency = sub.get_one::<String>("currency").cloned();
    new.category = sub.get_one::<String>("category").cloned();
    new.timestamp = sub
        .get_one::<String>("date")
        .map(|d| parse_datetime(d))
        .transpose()?;

    let t = s.store.add_transaction(&s.owner, new)?;
    println!(
        "Recorded #{} {} {} {} '{}' on {}",
        t.id,
        t.kind,
        t.amount,
        t.currency,
        t.title,
        t.timestamp.date()
    );
    Ok(())
}

fn edit(s: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let patch = TransactionPatch {
        title: sub.get_one::<String>("title").cloned(),
        amount: sub
            .get_one::<String>("amount")
            .map(|a| parse_decimal(a))
            .transpose()?,
        currency: sub.get_one::<String>("currency").cloned(),
        category: sub.get_one::<String>("category").cloned(),
        kind: sub
            .get_one::<String>("type")
            .map(|k| k.parse::<Kind>())
            .transpose()?,
        timestamp: sub
            .get_one::<String>("date")
            .map(|d| parse_datetime(d))
            .transpose()?,
    };
    let t = s.store.update_transaction(&s.owner, id, &patch)?;
    println!("Updated #{} ({} {} {})", t.id, t.kind, t.amount, t.currency);
    Ok(())
}

fn remove(s: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    s.store.delete_transaction(&s.owner, id)?;
    println!("Removed transaction #{}", id);
    Ok(())
}

fn reset(s: &Session, sub: &clap::ArgMatches) -> Result<()> {
    if !sub.get_flag("yes") {
        println!("Refusing to delete all transactions without --yes");
        return Ok(());
    }
    let n = s.store.reset(&s.owner)?;
    println!("Deleted {} transactions for {}", n, s.owner);
    Ok(())
}

fn list(s: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(s, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.title.clone(),
                    r.kind.clone(),
                    r.amount.clone(),
                    r.currency.clone(),
                    r.category.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Title", "Type", "Amount", "CCY", "Category"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub title: String,
    pub kind: String,
    pub amount: String,
    pub currency: String,
    pub category: String,
}

/// History view: newest first, narrowed by the list filters.
pub fn query_rows(s: &Session, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let snapshot = s.store.transactions(&s.owner)?;
    let mut txs = snapshot.transactions;

    if let Some(month) = sub.get_one::<String>("month") {
        let (year, m) = parse_month(month)?;
        txs = filter_by_period(&txs, m, year);
    }
    let filter = HistoryFilter {
        category: sub
            .get_one::<String>("category")
            .map(|c| CategoryFilter::parse(c))
            .unwrap_or_default(),
        from: sub
            .get_one::<String>("from")
            .map(|d| parse_date(d))
            .transpose()?,
        to: sub.get_one::<String>("to").map(|d| parse_date(d)).transpose()?,
        min_amount: sub
            .get_one::<String>("min")
            .map(|a| parse_decimal(a))
            .transpose()?,
        max_amount: sub
            .get_one::<String>("max")
            .map(|a| parse_decimal(a))
            .transpose()?,
    };
    let mut txs = filter.apply(&txs);
    if let Some(limit) = sub.get_one::<usize>("limit") {
        txs.truncate(*limit);
    }

    Ok(txs
        .into_iter()
        .map(|t| TransactionRow {
            id: t.id,
            date: t.timestamp.date().to_string(),
            title: t.title,
            kind: t.kind.to_string(),
            amount: format!("{:.2}", t.amount),
            currency: t.currency,
            category: t.category.unwrap_or_default(),
        })
        .collect())
}
