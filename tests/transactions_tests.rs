// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use fintrack::commands::{transactions, Session};
use fintrack::store::{LocalCache, SqliteStore, TransactionStore};
use fintrack::{cli, db};
use rusqlite::Connection;

fn base_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn run_tx(s: &Session, args: &[&str]) {
    let mut argv = vec!["fintrack", "tx"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("tx", tx_m)) = matches.subcommand() {
        transactions::handle(s, tx_m).unwrap();
    } else {
        panic!("no tx subcommand");
    }
}

fn list_rows(s: &Session, args: &[&str]) -> Vec<transactions::TransactionRow> {
    let mut argv = vec!["fintrack", "tx", "list"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let tx_m = matches.subcommand_matches("tx").unwrap();
    let list_m = tx_m.subcommand_matches("list").unwrap();
    transactions::query_rows(s, list_m).unwrap()
}

fn seed(s: &Session) {
    run_tx(s, &["add", "income", "2500", "--title", "Salary", "--currency", "PLN", "--date", "2025-07-31"]);
    run_tx(s, &["add", "expense", "42.10", "--category", "Food", "--currency", "eur", "--date", "2025-08-02"]);
    run_tx(s, &["add", "expense", "9.99", "--category", "Fun", "--date", "2025-08-05 18:30"]);
    run_tx(s, &["add", "expense", "120", "--category", "Food", "--date", "2025-08-20"]);
}

#[test]
fn list_is_newest_first_and_respects_limit() {
    let conn = base_conn();
    let store = SqliteStore::new(&conn);
    let s = Session::new(&conn, &store, "local");
    seed(&s);

    let rows = list_rows(&s, &["--limit", "2"]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, "2025-08-20");
    assert_eq!(rows[1].date, "2025-08-05");
    assert_eq!(rows[1].currency, "USD");
    assert_eq!(rows[1].title, "New Transaction");
}

#[test]
fn list_filters_by_month_category_and_amount() {
    let conn = base_conn();
    let store = SqliteStore::new(&conn);
    let s = Session::new(&conn, &store, "local");
    seed(&s);

    let rows = list_rows(&s, &["--month", "2025-08"]);
    assert_eq!(rows.len(), 3);

    let rows = list_rows(&s, &["--category", "Food"]);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.category == "Food"));

    let rows = list_rows(&s, &["--category", "Income"]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Salary");

    let rows = list_rows(&s, &["--min", "10", "--max", "120", "--from", "2025-08-01"]);
    let amounts: Vec<&str> = rows.iter().map(|r| r.amount.as_str()).collect();
    assert_eq!(amounts, vec!["120.00", "42.10"]);
}

#[test]
fn edit_rm_and_reset_go_through_the_store() {
    let conn = base_conn();
    let store = SqliteStore::new(&conn);
    let s = Session::new(&conn, &store, "local");
    seed(&s);

    let id = list_rows(&s, &["--category", "Fun"])[0].id;
    run_tx(&s, &["edit", &id.to_string(), "--amount", "11", "--category", "Games"]);
    let rows = list_rows(&s, &["--category", "Games"]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount, "11.00");

    run_tx(&s, &["rm", &id.to_string()]);
    assert_eq!(list_rows(&s, &[]).len(), 3);

    // Without --yes nothing is removed
    run_tx(&s, &["reset"]);
    assert_eq!(list_rows(&s, &[]).len(), 3);
    run_tx(&s, &["reset", "--yes"]);
    assert!(list_rows(&s, &[]).is_empty());
}

#[test]
fn guest_sessions_keep_transactions_in_the_json_file() {
    let conn = base_conn();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("guest.json");
    let cache = LocalCache::open(&path).unwrap();
    let s = Session::new(&conn, &cache, "guest");
    seed(&s);

    assert_eq!(list_rows(&s, &["--limit", "2"]).len(), 2);
    assert!(path.exists());
    // The database never saw them
    let sqlite = SqliteStore::new(&conn);
    assert!(sqlite.transactions("guest").unwrap().transactions.is_empty());
}
