// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Session;
use crate::utils::pretty_table;
use anyhow::Result;

pub fn handle(s: &Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let cat = s.store.add_category(&s.owner, name)?;
            println!("Added category '{}' (#{})", cat.name, cat.id);
        }
        Some(("list", _)) => {
            let data = s
                .store
                .categories(&s.owner)?
                .into_iter()
                .map(|c| vec![c.id.to_string(), c.name])
                .collect();
            println!("{}", pretty_table(&["ID", "Category"], data));
        }
        Some(("rename", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let name = sub.get_one::<String>("name").unwrap();
            let cat = s.store.rename_category(&s.owner, id, name)?;
            println!("Renamed category #{} to '{}'", cat.id, cat.name);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            s.store.delete_category(&s.owner, id)?;
            println!("Removed category #{}", id);
        }
        _ => {}
    }
    Ok(())
}
