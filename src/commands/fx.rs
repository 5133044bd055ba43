// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Session;
use crate::convert::convert_checked;
use crate::db::{load_rate_table, save_rate_table};
use crate::nbp::NbpSource;
use crate::rates::{RateProvider, RateTable};
use crate::summary::SummaryService;
use crate::utils::{
    get_max_age, get_target_currency, http_client, maybe_print_json, parse_currency,
    parse_decimal, pretty_table,
};
use anyhow::Result;
use log::warn;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(s: &Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("fetch", _)) => fetch(s.conn)?,
        Some(("show", sub)) => show(s.conn, sub)?,
        Some(("convert", sub)) => convert_amount(s.conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Provider over NBP, seeded with the table saved by the last run.
pub fn rate_provider(conn: &Connection) -> Result<RateProvider> {
    let provider = RateProvider::new(Box::new(NbpSource::new(http_client()?)));
    Ok(match load_rate_table(conn)? {
        Some(table) => provider.with_table(table),
        None => provider,
    })
}

pub fn summary_service(conn: &Connection) -> Result<SummaryService> {
    Ok(SummaryService::new(rate_provider(conn)?).with_max_age(get_max_age(conn)?))
}

/// Save the provider's table if it is newer than what the database holds.
pub fn persist_snapshot(conn: &Connection, provider: &RateProvider) -> Result<()> {
    let Some(current) = provider.snapshot() else {
        return Ok(());
    };
    let stored = load_rate_table(conn)?;
    if stored.is_none_or(|t| t.as_of() < current.as_of()) {
        save_rate_table(conn, &current)?;
    }
    Ok(())
}

fn fetch(conn: &Connection) -> Result<()> {
    let provider = rate_provider(conn)?;
    match provider.refresh() {
        Ok(table) => {
            save_rate_table(conn, &table)?;
            println!("Fetched {} rates against {}", table.rates().len() - 1, table.base());
            println!("{}", rates_table(&table));
        }
        Err(e) => {
            warn!("Rate refresh failed: {}", e);
            match provider.snapshot() {
                Some(t) => println!(
                    "Refresh failed ({}); keeping rates from {}",
                    e,
                    t.as_of().format("%Y-%m-%d %H:%M")
                ),
                None => println!("Refresh failed ({}); no cached rates, amounts stay unconverted", e),
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct RateRow {
    code: String,
    rate: String,
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let Some(table) = load_rate_table(conn)? else {
        println!("No rates cached yet; run `fintrack fx fetch`.");
        return Ok(());
    };
    let rows: Vec<RateRow> = table
        .rates()
        .iter()
        .map(|(code, rate)| RateRow {
            code: code.clone(),
            rate: rate.to_string(),
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        println!(
            "Base {} as of {} ({})",
            table.base(),
            table.as_of().format("%Y-%m-%d %H:%M"),
            table.quotation()
        );
        println!("{}", rates_table(&table));
    }
    Ok(())
}

fn rates_table(table: &RateTable) -> comfy_table::Table {
    let data = table
        .rates()
        .iter()
        .map(|(code, rate)| vec![code.clone(), rate.to_string()])
        .collect();
    pretty_table(&["Code", &format!("Rate ({})", table.base())], data)
}

fn convert_amount(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let from = parse_currency(sub.get_one::<String>("from").unwrap())?;
    let to = match sub.get_one::<String>("to") {
        Some(t) => parse_currency(t)?,
        None => get_target_currency(conn)?,
    };
    let provider = rate_provider(conn)?;
    let fresh = provider.ensure_fresh(get_max_age(conn)?);
    persist_snapshot(conn, &provider)?;
    if let Some(w) = &fresh.warning {
        eprintln!("warning: {}", w);
    }
    let res = convert_checked(amount, &from, &to, &fresh.snapshot);
    println!("{} {} -> {:.2} {}", amount, from, res.amount, to);
    if !res.unknown.is_empty() {
        eprintln!("warning: no rate for {}; amounts left unconverted", res.unknown.join(", "));
    }
    if res.overflow {
        eprintln!("warning: result does not fit and was capped");
    }
    Ok(())
}
