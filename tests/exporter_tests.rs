// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use fintrack::commands::{exporter, Session};
use fintrack::models::{Kind, NewTransaction};
use fintrack::store::{SqliteStore, TransactionStore};
use fintrack::{cli, db};
use rusqlite::Connection;
use serde_json::json;
use tempfile::tempdir;

fn base_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn seed(store: &dyn TransactionStore) {
    let mut n = NewTransaction::new(Kind::Expense, "12.34".parse().unwrap());
    n.title = Some("Corner; Shop".into());
    n.category = Some("Groceries".into());
    n.currency = Some("EUR".into());
    n.timestamp = NaiveDate::from_ymd_opt(2025, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0);
    store.add_transaction("local", n).unwrap();
}

fn run_export(s: &Session, format: &str, out: &str) -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches_from([
        "fintrack",
        "export",
        "transactions",
        "--format",
        format,
        "--out",
        out,
    ]);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(s, export_m)
    } else {
        panic!("no export subcommand");
    }
}

#[test]
fn export_transactions_writes_semicolon_csv_with_bom() {
    let conn = base_conn();
    let store = SqliteStore::new(&conn);
    seed(&store);
    let session = Session::new(&conn, &store, "local");

    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.csv");
    run_export(&session, "csv", &out_path.to_string_lossy()).unwrap();

    let bytes = std::fs::read(&out_path).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
    let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Date;Title;Amount;Currency;Category;Type");
    assert_eq!(lines[1], "2025-01-02;Corner  Shop;12.34;EUR;Groceries;Expense");
    assert_eq!(lines.len(), 2);
}

#[test]
fn export_transactions_writes_pretty_json() {
    let conn = base_conn();
    let store = SqliteStore::new(&conn);
    seed(&store);
    let session = Session::new(&conn, &store, "local");

    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.json");
    run_export(&session, "json", &out_path.to_string_lossy()).unwrap();

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(
        parsed,
        json!([
            {
                "id": 1,
                "date": "2025-01-02",
                "title": "Corner; Shop",
                "amount": "12.34",
                "currency": "EUR",
                "category": "Groceries",
                "type": "Expense"
            }
        ])
    );
}

#[test]
fn export_only_includes_the_session_owner() {
    let conn = base_conn();
    let store = SqliteStore::new(&conn);
    seed(&store);
    let session = Session::new(&conn, &store, "someone-else");

    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.json");
    run_export(&session, "json", &out_path.to_string_lossy()).unwrap();
    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out_path).unwrap()).unwrap();
    assert_eq!(parsed, json!([]));
}

#[test]
fn export_transactions_rejects_unknown_format() {
    let conn = base_conn();
    let store = SqliteStore::new(&conn);
    let session = Session::new(&conn, &store, "local");
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.unknown");

    assert!(run_export(&session, "xml", &out_path.to_string_lossy()).is_err());
    assert!(!out_path.exists());
}
