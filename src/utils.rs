// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::ValidationError;
use crate::models::DEFAULT_CURRENCY;
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

const UA: &str = concat!("fintrack/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_MAX_AGE_HOURS: i64 = 24;

// Accepts bare codes ("eur") as well as display labels ("EUR (€)").
static CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z]{3})(?:\s*\(.*\))?\s*$").expect("valid regex"));

pub fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// `YYYY-MM-DD` (midnight) or `YYYY-MM-DD HH:MM[:SS]`.
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    Ok(parse_date(s)?.and_time(NaiveTime::MIN))
}

/// `YYYY-MM` into (year, month).
pub fn parse_month(s: &str) -> Result<(i32, u32)> {
    let d = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok((d.year(), d.month()))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn parse_currency(s: &str) -> Result<String, ValidationError> {
    CURRENCY_RE
        .captures(s)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_uppercase())
        .ok_or_else(|| ValidationError::Currency(s.to_string()))
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {:.2}", ccy, d)
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // Arrays stream one element per line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn get_target_currency(conn: &Connection) -> Result<String> {
    Ok(get_setting(conn, "target_currency")?.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()))
}

pub fn set_target_currency(conn: &Connection, ccy: &str) -> Result<String> {
    let code = parse_currency(ccy)?;
    set_setting(conn, "target_currency", &code)?;
    Ok(code)
}

pub fn get_annual_budget(conn: &Connection) -> Result<Option<Decimal>> {
    match get_setting(conn, "annual_budget")? {
        Some(s) => Ok(Some(
            s.parse::<Decimal>()
                .with_context(|| format!("Invalid annual budget '{}' in settings", s))?,
        )),
        None => Ok(None),
    }
}

/// Hours a cached rate table stays usable; 0 means it never expires.
pub fn get_max_age(conn: &Connection) -> Result<Option<chrono::Duration>> {
    let hours = match get_setting(conn, "rates_max_age_hours")? {
        Some(s) => s
            .trim()
            .parse::<i64>()
            .with_context(|| format!("Invalid rates_max_age_hours '{}'", s))?,
        None => DEFAULT_MAX_AGE_HOURS,
    };
    Ok((hours > 0).then(|| chrono::Duration::hours(hours)))
}
