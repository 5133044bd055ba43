// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Session;
use crate::utils::{
    get_annual_budget, get_max_age, get_target_currency, pretty_table, set_setting,
    set_target_currency,
};
use anyhow::Result;

pub fn handle(s: &Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", _)) => {
            let budget = get_annual_budget(s.conn)?
                .map(|b| format!("{:.2}", b))
                .unwrap_or_else(|| "-".into());
            let max_age = get_max_age(s.conn)?
                .map(|d| format!("{}h", d.num_hours()))
                .unwrap_or_else(|| "never".into());
            let data = vec![
                vec!["target_currency".into(), get_target_currency(s.conn)?],
                vec!["annual_budget".into(), budget],
                vec!["rates_max_age".into(), max_age],
                vec!["user".into(), s.owner.clone()],
            ];
            println!("{}", pretty_table(&["Setting", "Value"], data));
        }
        Some(("currency", sub)) => {
            let code = set_target_currency(s.conn, sub.get_one::<String>("currency").unwrap())?;
            println!("Currency changed to {}", code);
        }
        Some(("max-age", sub)) => {
            let hours = *sub.get_one::<u32>("hours").unwrap();
            set_setting(s.conn, "rates_max_age_hours", &hours.to_string())?;
            println!("Cached rates now expire after {} hours (0 = never)", hours);
        }
        _ => {}
    }
    Ok(())
}
