// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::fx::{persist_snapshot, summary_service};
use super::Session;
use crate::aggregate::{CategoryTotals, Diagnostics, RecentActivity, RecentEntry};
use crate::models::Kind;
use crate::store::TransactionSnapshot;
use crate::summary::{Dashboard, Summary, SummaryService};
use crate::utils::{get_target_currency, maybe_print_json, parse_currency, parse_month, pretty_table};
use anyhow::Result;
use chrono::{Datelike, Utc};
use serde::Serialize;

/// One computed report, ready to print.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Summary { label: String, summary: Summary },
    Categories(CategoryTotals),
    Recent(RecentActivity),
    Dashboard(Dashboard),
}

impl Report {
    /// Warning and data-quality notes covering the whole report.
    pub fn notes(&self) -> (Option<&str>, &Diagnostics) {
        match self {
            Report::Summary { summary, .. } => (summary.warning.as_deref(), &summary.diagnostics),
            Report::Categories(t) => (t.warning.as_deref(), &t.diagnostics),
            Report::Recent(r) => (r.warning.as_deref(), &r.diagnostics),
            // All-time figures cover every record
            Report::Dashboard(d) => (d.all_time.warning.as_deref(), &d.all_time.diagnostics),
        }
    }

    fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        match self {
            Report::Summary { summary, .. } => &mut summary.diagnostics,
            Report::Categories(t) => &mut t.diagnostics,
            Report::Recent(r) => &mut r.diagnostics,
            Report::Dashboard(d) => &mut d.all_time.diagnostics,
        }
    }
}

pub fn handle(s: &Session, m: &clap::ArgMatches) -> Result<()> {
    let Some((name, sub)) = m.subcommand() else {
        return Ok(());
    };
    let service = summary_service(s.conn)?;
    let snapshot = s.store.transactions(&s.owner)?;
    let target = target_currency(s, sub)?;
    let Some(report) = compute(&service, &snapshot, &target, name, sub)? else {
        return Ok(());
    };

    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        match &report {
            Report::Summary { label, summary } => print_summary(label, summary),
            Report::Categories(t) => print_categories(t, &target),
            Report::Recent(r) => print_recent(&r.entries, &target),
            Report::Dashboard(d) => {
                print_summary("All time", &d.all_time);
                print_summary(&d.period, &d.month);
                print_categories(&d.by_category, &target);
                print_recent(&d.recent.entries, &target);
            }
        }
    }
    let (warning, diagnostics) = report.notes();
    print_warnings(warning, diagnostics);
    persist_snapshot(s.conn, service.rates())?;
    Ok(())
}

/// Run the `report` subcommand `name` over one store snapshot. Records the
/// store could not read are counted in the report's diagnostics.
pub fn compute(
    service: &SummaryService,
    snapshot: &TransactionSnapshot,
    target: &str,
    name: &str,
    sub: &clap::ArgMatches,
) -> Result<Option<Report>> {
    let txs = &snapshot.transactions;
    let limit = || sub.get_one::<usize>("limit").copied().unwrap_or(5);
    let mut report = match name {
        "summary" => Report::Summary {
            label: "All time".into(),
            summary: service.get_summary(txs, target),
        },
        "month" => {
            let (year, month) = month_arg(sub)?;
            Report::Summary {
                label: format!("{:04}-{:02}", year, month),
                summary: service.month_summary(txs, target, month, year),
            }
        }
        "by-category" => Report::Categories(service.category_breakdown(txs, target)),
        "recent" => Report::Recent(service.recent(txs, target, limit())),
        "dashboard" => {
            let (year, month) = month_arg(sub)?;
            Report::Dashboard(service.dashboard(txs, target, month, year, limit()))
        }
        _ => return Ok(None),
    };
    report.diagnostics_mut().skipped += snapshot.skipped;
    Ok(Some(report))
}

/// Soft warnings and data-quality notes go to stderr, after the report.
pub(crate) fn print_warnings(warning: Option<&str>, d: &Diagnostics) {
    if let Some(w) = warning {
        eprintln!("warning: {}", w);
    }
    if !d.unknown_currencies.is_empty() {
        let codes: Vec<&str> = d.unknown_currencies.iter().map(String::as_str).collect();
        eprintln!("warning: no rate for {}; amounts left unconverted", codes.join(", "));
    }
    if d.skipped > 0 {
        eprintln!("warning: {} malformed transactions skipped", d.skipped);
    }
    if d.overflowed > 0 {
        eprintln!("warning: {} transactions too large to total, left out", d.overflowed);
    }
}

fn target_currency(s: &Session, sub: &clap::ArgMatches) -> Result<String> {
    match sub.get_one::<String>("currency") {
        Some(c) => Ok(parse_currency(c)?),
        None => get_target_currency(s.conn),
    }
}

fn month_arg(sub: &clap::ArgMatches) -> Result<(i32, u32)> {
    match sub.get_one::<String>("month") {
        Some(m) => parse_month(m),
        None => {
            let today = Utc::now().date_naive();
            Ok((today.year(), today.month()))
        }
    }
}

fn print_summary(label: &str, s: &Summary) {
    let data = vec![vec![
        label.to_string(),
        format!("{:.2}", s.total_income),
        format!("{:.2}", s.total_expense),
        format!("{:.2}", s.balance),
    ]];
    let hdr = |h: &str| format!("{} ({})", h, s.currency);
    println!(
        "{}",
        pretty_table(
            &["Period", &hdr("Income"), &hdr("Expense"), &hdr("Balance")],
            data
        )
    );
}

fn print_categories(totals: &CategoryTotals, target: &str) {
    let data = totals
        .rows
        .iter()
        .map(|r| vec![r.category.clone(), format!("{:.2}", r.amount)])
        .collect();
    println!(
        "{}",
        pretty_table(&["Category", &format!("Spent ({})", target)], data)
    );
}

fn print_recent(recent: &[RecentEntry], target: &str) {
    let data = recent
        .iter()
        .map(|e| {
            let t = &e.transaction;
            let sign = if t.kind == Kind::Income { "+" } else { "-" };
            vec![
                t.timestamp.date().to_string(),
                t.title.clone(),
                t.category.clone().unwrap_or_default(),
                format!("{}{:.2} {}", sign, t.amount, t.currency),
                format!("{}", e.rate.round_dp(6)),
                format!("{}{:.2}", sign, e.converted),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &[
                "Date",
                "Title",
                "Category",
                "Amount",
                "Rate",
                &format!("In {}", target)
            ],
            data
        )
    );
}
