// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use fintrack::aggregate::total_by_kind;
use fintrack::error::RateError;
use fintrack::models::{Kind, Transaction};
use fintrack::rates::{FetchedRates, Quotation, RateProvider, RateQuote, RateSource, RateTable};
use fintrack::summary::SummaryService;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

struct Offline;

impl RateSource for Offline {
    fn fetch(&self) -> Result<FetchedRates, RateError> {
        Err(RateError::Malformed("offline".into()))
    }
}

/// Always answers with the same quotes, counting calls.
struct Fixed {
    quotes: Vec<RateQuote>,
    quotation: Quotation,
    calls: Arc<AtomicU32>,
}

impl RateSource for Fixed {
    fn fetch(&self) -> Result<FetchedRates, RateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(FetchedRates {
            base: "PLN".into(),
            quotation: self.quotation,
            quotes: self.quotes.clone(),
        })
    }
}

fn fixed(quotation: Quotation, pairs: &[(&str, &str)]) -> (Box<Fixed>, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let source = Fixed {
        quotes: quotes(pairs),
        quotation,
        calls: calls.clone(),
    };
    (Box::new(source), calls)
}

fn at(y: i32, m: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, day)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

fn tx(id: i64, kind: Kind, amount: &str, ccy: &str, category: Option<&str>, ts: NaiveDateTime) -> Transaction {
    Transaction {
        id,
        owner: "alice".into(),
        title: format!("t{id}"),
        amount: d(amount),
        currency: ccy.into(),
        category: category.map(str::to_string),
        kind,
        timestamp: ts,
    }
}

fn quotes(pairs: &[(&str, &str)]) -> Vec<RateQuote> {
    pairs
        .iter()
        .map(|(c, r)| RateQuote {
            code: c.to_string(),
            rate: d(r),
        })
        .collect()
}

fn service(table: RateTable) -> SummaryService {
    SummaryService::new(RateProvider::new(Box::new(Offline)).with_table(table))
}

fn scenario_table() -> RateTable {
    RateTable::new(
        "PLN",
        Utc::now().naive_utc(),
        Quotation::UnitsPerBase,
        quotes(&[("USD", "1.0"), ("EUR", "0.9")]),
    )
}

#[test]
fn summary_in_base_currency() {
    let svc = service(scenario_table());
    let txs = vec![
        tx(1, Kind::Income, "100", "USD", None, at(2024, 3, 1)),
        tx(2, Kind::Expense, "50", "EUR", Some("Food"), at(2024, 3, 2)),
    ];
    let s = svc.get_summary(&txs, "PLN");
    assert_eq!(s.total_income, d("100"));
    assert_eq!(s.total_expense, d("55.56"));
    assert_eq!(s.balance, d("44.44"));
    assert_eq!(s.currency, "PLN");
    assert!(s.diagnostics.is_clean());
    assert!(s.warning.is_none());
}

#[test]
fn unknown_currency_contributes_its_raw_amount() {
    let svc = service(scenario_table());
    let txs = vec![
        tx(1, Kind::Expense, "30", "XYZ", None, at(2024, 3, 1)),
        tx(2, Kind::Expense, "10", "USD", None, at(2024, 3, 2)),
    ];
    let s = svc.get_summary(&txs, "USD");
    assert_eq!(s.total_expense, d("40"));
    assert_eq!(s.balance, d("-40"));
    assert!(s.diagnostics.unknown_currencies.contains("XYZ"));
    assert_eq!(s.diagnostics.unknown_currencies.len(), 1);
}

#[test]
fn empty_history_sums_to_zero() {
    let svc = service(scenario_table());
    let s = svc.get_summary(&[], "EUR");
    assert_eq!(s.total_income, Decimal::ZERO);
    assert_eq!(s.total_expense, Decimal::ZERO);
    assert_eq!(s.balance, Decimal::ZERO);
}

#[test]
fn summary_matches_per_kind_totals() {
    let table = RateTable::new(
        "PLN",
        Utc::now().naive_utc(),
        Quotation::BasePerUnit,
        quotes(&[("USD", "3.98"), ("EUR", "4.31"), ("GBP", "5.01")]),
    );
    let txs = vec![
        tx(1, Kind::Income, "1200", "PLN", None, at(2024, 1, 5)),
        tx(2, Kind::Income, "310.10", "GBP", None, at(2024, 2, 5)),
        tx(3, Kind::Expense, "19.99", "USD", Some("Fun"), at(2024, 2, 6)),
        tx(4, Kind::Expense, "7.5", "EUR", Some("Food"), at(2024, 2, 7)),
    ];
    let income = total_by_kind(&txs, Kind::Income, "EUR", &table);
    let expense = total_by_kind(&txs, Kind::Expense, "EUR", &table);
    let s = service(table).get_summary(&txs, "EUR");
    assert_eq!(s.total_income, income.amount);
    assert_eq!(s.total_expense, expense.amount);
    assert_eq!(s.balance, income.amount - expense.amount);
}

#[test]
fn malformed_records_are_skipped_and_counted() {
    let svc = service(scenario_table());
    let mut bad = tx(2, Kind::Expense, "5", "USD", None, at(2024, 3, 2));
    bad.amount = d("-5");
    let mut blank = tx(3, Kind::Income, "5", "", None, at(2024, 3, 3));
    blank.currency = "  ".into();
    let txs = vec![tx(1, Kind::Income, "20", "USD", None, at(2024, 3, 1)), bad, blank];
    let s = svc.get_summary(&txs, "USD");
    assert_eq!(s.total_income, d("20"));
    assert_eq!(s.total_expense, Decimal::ZERO);
    assert_eq!(s.diagnostics.skipped, 2);
}

#[test]
fn dashboard_month_is_summed_from_that_month_only() {
    let svc = service(scenario_table());
    let txs = vec![
        tx(1, Kind::Income, "1000", "USD", None, at(2024, 2, 28)),
        tx(2, Kind::Income, "200", "USD", None, at(2024, 3, 1)),
        tx(3, Kind::Expense, "45", "EUR", Some("Food"), at(2024, 3, 15)),
        tx(4, Kind::Expense, "10", "USD", Some("Travel"), at(2024, 4, 1)),
    ];
    let dash = svc.dashboard(&txs, "USD", 3, 2024, 2);

    assert_eq!(dash.period, "2024-03");
    assert_eq!(dash.month.total_income, d("200"));
    assert_eq!(dash.month.total_expense, d("50"));
    assert_eq!(dash.month.balance, d("150"));
    assert_eq!(dash.all_time.total_income, d("1200"));
    assert_eq!(dash.all_time.total_expense, d("60"));
    assert_eq!(dash.by_category.get("Food"), Some(d("50")));
    assert_eq!(dash.recent.entries.len(), 2);
    assert_eq!(dash.recent.entries[0].transaction.id, 4);
    assert_eq!(dash.month.rates_as_of, dash.all_time.rates_as_of);

    let month = svc.month_summary(&txs, "USD", 3, 2024);
    assert_eq!(month.balance, dash.month.balance);
}

#[test]
fn annual_budget_counts_only_that_years_expenses() {
    let svc = service(scenario_table());
    let txs = vec![
        tx(1, Kind::Expense, "100", "USD", None, at(2023, 12, 31)),
        tx(2, Kind::Expense, "90", "EUR", None, at(2024, 1, 1)),
        tx(3, Kind::Income, "5000", "USD", None, at(2024, 6, 1)),
        tx(4, Kind::Expense, "250", "USD", None, at(2024, 12, 31)),
    ];
    let st = svc.annual_budget(&txs, "USD", 2024, d("1000"));
    assert_eq!(st.spent, d("350"));
    assert_eq!(st.remaining, d("650"));
    assert_eq!(st.currency, "USD");
    assert_eq!(st.year, 2024);
}

#[test]
fn offline_without_cache_reports_unconverted_totals() {
    let svc = SummaryService::new(RateProvider::new(Box::new(Offline)));
    let txs = vec![
        tx(1, Kind::Income, "100", "USD", None, at(2024, 3, 1)),
        tx(2, Kind::Expense, "40", "EUR", None, at(2024, 3, 2)),
    ];
    let s = svc.get_summary(&txs, "USD");
    assert!(s.warning.is_some());
    assert_eq!(s.total_income, d("100"));
    assert_eq!(s.total_expense, d("40"));
    assert!(s.diagnostics.unknown_currencies.contains("EUR"));
}

#[test]
fn summary_fetches_rates_when_nothing_is_cached() {
    let (source, calls) = fixed(Quotation::UnitsPerBase, &[("USD", "1.0"), ("EUR", "0.9")]);
    let svc = SummaryService::new(RateProvider::new(source));
    let before = Utc::now().naive_utc();
    let txs = vec![
        tx(1, Kind::Income, "100", "USD", None, at(2024, 3, 1)),
        tx(2, Kind::Expense, "50", "EUR", Some("Food"), at(2024, 3, 2)),
    ];
    let s = svc.get_summary(&txs, "PLN");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(s.warning.is_none());
    assert!(s.rates_as_of >= before);
    assert_eq!(s.total_income, d("100"));
    assert_eq!(s.total_expense, d("55.56"));
    assert_eq!(s.balance, d("44.44"));
    assert!(s.diagnostics.is_clean());
}

#[test]
fn stale_cache_is_refreshed_before_summing() {
    let (source, calls) = fixed(Quotation::BasePerUnit, &[("USD", "4"), ("EUR", "4.5")]);
    let old = at(2024, 1, 2);
    let provider = RateProvider::new(source).with_table(RateTable::new(
        "PLN",
        old,
        Quotation::BasePerUnit,
        quotes(&[("USD", "3"), ("EUR", "3")]),
    ));
    let svc = SummaryService::new(provider).with_max_age(Some(chrono::Duration::hours(24)));
    let txs = vec![
        tx(1, Kind::Income, "100", "USD", None, at(2024, 3, 1)),
        tx(2, Kind::Expense, "10", "EUR", None, at(2024, 3, 2)),
    ];
    let s = svc.get_summary(&txs, "PLN");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(s.warning.is_none());
    assert!(s.rates_as_of > old);
    // 100 USD at 4 and 10 EUR at 4.5, not the cached 3s
    assert_eq!(s.total_income, d("400"));
    assert_eq!(s.total_expense, d("45"));
    assert_eq!(s.balance, d("355"));

    // Later views reuse the refreshed table
    let again = svc.get_summary(&txs, "PLN");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(again.rates_as_of, s.rates_as_of);
}

#[test]
fn every_view_carries_the_rate_warning() {
    let svc = SummaryService::new(RateProvider::new(Box::new(Offline)));
    let txs = vec![
        tx(1, Kind::Income, "100", "USD", None, at(2024, 3, 1)),
        tx(2, Kind::Expense, "40", "EUR", Some("Food"), at(2024, 3, 2)),
    ];

    let by_category = svc.category_breakdown(&txs, "USD");
    assert!(by_category.warning.is_some());
    assert!(by_category.diagnostics.unknown_currencies.contains("EUR"));
    assert_eq!(by_category.get("Food"), Some(d("40")));

    let recent = svc.recent(&txs, "USD", 5);
    assert!(recent.warning.is_some());
    assert_eq!(recent.entries.len(), 2);
    assert!(recent.diagnostics.unknown_currencies.contains("EUR"));

    let dash = svc.dashboard(&txs, "USD", 3, 2024, 5);
    assert!(dash.all_time.warning.is_some());
    assert!(dash.month.warning.is_some());
    assert!(dash.by_category.warning.is_some());
    assert!(dash.recent.warning.is_some());

    let st = svc.annual_budget(&txs, "USD", 2024, d("100"));
    assert!(st.warning.is_some());
}

#[test]
fn oversized_amounts_do_not_abort_a_summary() {
    let svc = service(scenario_table());
    let txs = vec![
        tx(1, Kind::Expense, &Decimal::MAX.to_string(), "EUR", None, at(2024, 3, 1)),
        tx(2, Kind::Expense, "9", "EUR", None, at(2024, 3, 2)),
    ];
    // EUR at 0.9 per PLN makes MAX EUR larger than MAX PLN
    let s = svc.get_summary(&txs, "PLN");
    assert_eq!(s.total_expense, d("10"));
    assert_eq!(s.diagnostics.overflowed, 1);

    let st = svc.annual_budget(&txs, "PLN", 2024, d("100"));
    assert_eq!(st.spent, d("10"));
    assert_eq!(st.remaining, d("90"));
    assert_eq!(st.diagnostics.overflowed, 1);
}
