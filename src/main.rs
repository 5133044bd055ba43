// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::path::PathBuf;

use fintrack::commands::{self, Session};
use fintrack::store::{LocalCache, SqliteStore, TransactionStore};
use fintrack::{cli, db};

fn main() -> Result<()> {
    env_logger::init();
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let db_file = match matches.get_one::<String>("db") {
        Some(p) => PathBuf::from(p),
        None => db::db_path()?,
    };
    let conn = db::open_at(&db_file)?;
    let owner = matches
        .get_one::<String>("user")
        .map(String::as_str)
        .unwrap_or("local");

    let sqlite;
    let guest;
    let store: &dyn TransactionStore = match matches.get_one::<String>("guest") {
        Some(path) => {
            guest = LocalCache::open(path)?;
            &guest
        }
        None => {
            sqlite = SqliteStore::new(&conn);
            &sqlite
        }
    };
    let session = Session::new(&conn, store, owner);

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db_file.display());
        }
        Some(("tx", sub)) => commands::transactions::handle(&session, sub)?,
        Some(("category", sub)) => commands::categories::handle(&session, sub)?,
        Some(("fx", sub)) => commands::fx::handle(&session, sub)?,
        Some(("report", sub)) => commands::reports::handle(&session, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&session, sub)?,
        Some(("settings", sub)) => commands::settings::handle(&session, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&session, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&session)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
