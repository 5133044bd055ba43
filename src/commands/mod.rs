// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::TransactionStore;
use rusqlite::Connection;

pub mod budgets;
pub mod categories;
pub mod doctor;
pub mod exporter;
pub mod fx;
pub mod reports;
pub mod settings;
pub mod transactions;

/// Everything a command needs: the database (settings and the rate cache),
/// the store holding transactions, and whose records we act on.
pub struct Session<'a> {
    pub conn: &'a Connection,
    pub store: &'a dyn TransactionStore,
    pub owner: String,
}

impl<'a> Session<'a> {
    pub fn new(conn: &'a Connection, store: &'a dyn TransactionStore, owner: &str) -> Self {
        Self {
            conn,
            store,
            owner: owner.to_string(),
        }
    }
}
