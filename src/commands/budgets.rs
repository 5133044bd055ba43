// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::fx::{persist_snapshot, summary_service};
use super::reports::print_warnings;
use super::Session;
use crate::utils::{
    fmt_money, get_annual_budget, get_target_currency, maybe_print_json, parse_decimal, pretty_table,
    set_setting,
};
use anyhow::{bail, Result};
use chrono::{Datelike, Utc};
use rust_decimal::Decimal;

pub fn handle(s: &Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(s, sub)?,
        Some(("status", sub)) => status(s, sub)?,
        _ => {}
    }
    Ok(())
}

fn set(s: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    if amount < Decimal::ZERO {
        bail!("Annual budget must not be negative");
    }
    set_setting(s.conn, "annual_budget", &amount.to_string())?;
    println!(
        "Annual budget set to {}",
        fmt_money(&amount, &get_target_currency(s.conn)?)
    );
    Ok(())
}

fn status(s: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let Some(budget) = get_annual_budget(s.conn)? else {
        println!("No annual budget set; use `fintrack budget set <amount>`.");
        return Ok(());
    };
    let year = sub
        .get_one::<i32>("year")
        .copied()
        .unwrap_or_else(|| Utc::now().year());
    let target = get_target_currency(s.conn)?;
    let service = summary_service(s.conn)?;
    let snapshot = s.store.transactions(&s.owner)?;
    let mut st = service.annual_budget(&snapshot.transactions, &target, year, budget);
    st.diagnostics.skipped += snapshot.skipped;
    persist_snapshot(s.conn, service.rates())?;

    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &st)? {
        let data = vec![vec![
            st.year.to_string(),
            format!("{:.2}", st.budget),
            format!("{:.2}", st.spent),
            format!("{:.2}", st.remaining),
        ]];
        println!(
            "{}",
            pretty_table(
                &[
                    "Year",
                    &format!("Budget ({})", st.currency),
                    "Spent",
                    "Remaining"
                ],
                data
            )
        );
    }
    print_warnings(st.warning.as_deref(), &st.diagnostics);
    Ok(())
}
