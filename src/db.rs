// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::rates::{Quotation, RateQuote, RateTable};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.alphavelocity", "Fintrack", "fintrack"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("fintrack.sqlite"))
}

pub fn open_at(path: &Path) -> Result<Connection> {
    let conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner TEXT NOT NULL,
        name TEXT NOT NULL,
        UNIQUE(owner, name)
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner TEXT NOT NULL,
        title TEXT NOT NULL,
        amount TEXT NOT NULL,
        currency TEXT NOT NULL DEFAULT 'USD',
        category TEXT,
        kind TEXT NOT NULL CHECK(kind IN ('Income','Expense')),
        date TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_owner_date ON transactions(owner, date);

    -- One row per code per fetch; the newest fetched_at is the live table
    CREATE TABLE IF NOT EXISTS fx_rates(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        fetched_at TEXT NOT NULL,
        base TEXT NOT NULL,
        quotation TEXT NOT NULL,
        quote TEXT NOT NULL,
        rate TEXT NOT NULL,
        UNIQUE(fetched_at, quote)
    );
    "#,
    )?;
    Ok(())
}

/// Persist a whole table in one transaction.
pub fn save_rate_table(conn: &Connection, table: &RateTable) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    for (code, rate) in table.rates() {
        tx.execute(
            "INSERT OR REPLACE INTO fx_rates(fetched_at, base, quotation, quote, rate)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                table.as_of(),
                table.base(),
                table.quotation().as_str(),
                code,
                rate.to_string()
            ],
        )?;
    }
    tx.commit()?;
    Ok(())
}

/// The most recently fetched table, if any was ever saved.
pub fn load_rate_table(conn: &Connection) -> Result<Option<RateTable>> {
    let latest: Option<NaiveDateTime> = conn
        .query_row("SELECT MAX(fetched_at) FROM fx_rates", [], |r| r.get(0))
        .optional()?
        .flatten();
    let Some(as_of) = latest else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT base, quotation, quote, rate FROM fx_rates WHERE fetched_at=?1 ORDER BY quote",
    )?;
    let mut rows = stmt.query(params![as_of])?;
    let mut base = None;
    let mut quotation = Quotation::BasePerUnit;
    let mut quotes = Vec::new();
    while let Some(r) = rows.next()? {
        let b: String = r.get(0)?;
        let q: String = r.get(1)?;
        let code: String = r.get(2)?;
        let rate_s: String = r.get(3)?;
        let rate = rate_s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid rate '{}' for {}", rate_s, code))?;
        quotation = q.parse()?;
        base = Some(b);
        quotes.push(RateQuote { code, rate });
    }
    Ok(base.map(|b| RateTable::new(&b, as_of, quotation, quotes)))
}
