// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Session;
use anyhow::{bail, Result};
use serde_json::json;
use std::io::Write;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn handle(s: &Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(s, sub),
        _ => Ok(()),
    }
}

fn export_transactions(s: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();
    if fmt != "csv" && fmt != "json" {
        bail!("Unknown format: {} (use csv|json)", fmt);
    }

    let txs = s.store.transactions(&s.owner)?.transactions;

    match fmt.as_str() {
        "csv" => {
            // BOM first, then semicolon-separated rows
            let mut file = std::fs::File::create(out)?;
            file.write_all(UTF8_BOM)?;
            let mut wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(file);
            wtr.write_record(["Date", "Title", "Amount", "Currency", "Category", "Type"])?;
            for t in &txs {
                wtr.write_record([
                    t.timestamp.format("%Y-%m-%d").to_string(),
                    t.title.replace(';', " "),
                    t.amount.to_string(),
                    t.currency.clone(),
                    t.category.clone().unwrap_or_default(),
                    t.kind.to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        _ => {
            let items: Vec<_> = txs
                .iter()
                .map(|t| {
                    json!({
                        "id": t.id,
                        "date": t.timestamp.format("%Y-%m-%d").to_string(),
                        "title": t.title,
                        "amount": t.amount.to_string(),
                        "currency": t.currency,
                        "category": t.category,
                        "type": t.kind.as_str(),
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
    }
    println!("Exported {} transactions to {}", txs.len(), out);
    Ok(())
}
