// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Where transactions live: the SQLite database for signed-in use, or a JSON
//! file standing in for the browser-local cache of guest sessions. Summaries
//! only ever see a [`TransactionSnapshot`], so both behave the same.

use crate::error::StoreError;
use crate::models::{Category, Kind, NewTransaction, Transaction, TransactionPatch};
use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Read-only copy of one owner's transactions, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionSnapshot {
    pub transactions: Vec<Transaction>,
    /// Stored records that could not be read back.
    pub skipped: usize,
}

pub trait TransactionStore {
    fn transactions(&self, owner: &str) -> Result<TransactionSnapshot>;
    fn add_transaction(&self, owner: &str, new: NewTransaction) -> Result<Transaction>;
    fn update_transaction(&self, owner: &str, id: i64, patch: &TransactionPatch) -> Result<Transaction>;
    fn delete_transaction(&self, owner: &str, id: i64) -> Result<()>;
    /// Remove every transaction of `owner`, returning how many went.
    fn reset(&self, owner: &str) -> Result<usize>;

    fn categories(&self, owner: &str) -> Result<Vec<Category>>;
    fn add_category(&self, owner: &str, name: &str) -> Result<Category>;
    fn rename_category(&self, owner: &str, id: i64, name: &str) -> Result<Category>;
    fn delete_category(&self, owner: &str, id: i64) -> Result<()>;
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn check_owner(id: i64, record_owner: &str, owner: &str) -> Result<()> {
    if record_owner != owner {
        return Err(StoreError::NotOwner(id).into());
    }
    Ok(())
}

pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn read_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<Option<Transaction>> {
        let amount_s: String = r.get(3)?;
        let kind_s: String = r.get(6)?;
        let (Ok(amount), Ok(kind)) = (amount_s.parse::<Decimal>(), kind_s.parse::<Kind>()) else {
            return Ok(None);
        };
        let Ok(timestamp) = r.get::<_, NaiveDateTime>(7) else {
            return Ok(None);
        };
        Ok(Some(Transaction {
            id: r.get(0)?,
            owner: r.get(1)?,
            title: r.get(2)?,
            amount,
            currency: r.get(4)?,
            category: r.get(5)?,
            kind,
            timestamp,
        }))
    }

    fn find(&self, id: i64) -> Result<Transaction> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner, title, amount, currency, category, kind, date FROM transactions WHERE id=?1",
        )?;
        let row = stmt
            .query_row(params![id], Self::read_row)
            .optional()?
            .ok_or(StoreError::NotFound(id))?;
        row.with_context(|| format!("Transaction {} is unreadable", id))
    }

    fn find_category(&self, id: i64) -> Result<Category> {
        let cat = self
            .conn
            .query_row(
                "SELECT id, owner, name FROM categories WHERE id=?1",
                params![id],
                |r| {
                    Ok(Category {
                        id: r.get(0)?,
                        owner: r.get(1)?,
                        name: r.get(2)?,
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::NotFound(id))?;
        Ok(cat)
    }

    fn category_exists(&self, owner: &str, name: &str) -> Result<bool> {
        let hit: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM categories WHERE owner=?1 AND name=?2",
                params![owner, name],
                |r| r.get(0),
            )
            .optional()?;
        Ok(hit.is_some())
    }
}

impl TransactionStore for SqliteStore<'_> {
    fn transactions(&self, owner: &str) -> Result<TransactionSnapshot> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner, title, amount, currency, category, kind, date
             FROM transactions WHERE owner=?1 ORDER BY date DESC, id DESC",
        )?;
        let mut rows = stmt.query(params![owner])?;
        let mut snapshot = TransactionSnapshot::default();
        while let Some(r) = rows.next()? {
            match Self::read_row(r)? {
                Some(t) => snapshot.transactions.push(t),
                None => snapshot.skipped += 1,
            }
        }
        if snapshot.skipped > 0 {
            debug!("Skipped {} unreadable transactions for {}", snapshot.skipped, owner);
        }
        Ok(snapshot)
    }

    fn add_transaction(&self, owner: &str, new: NewTransaction) -> Result<Transaction> {
        let mut t = new.resolve(owner, now())?;
        self.conn.execute(
            "INSERT INTO transactions(owner, title, amount, currency, category, kind, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                t.owner,
                t.title,
                t.amount.to_string(),
                t.currency,
                t.category,
                t.kind.as_str(),
                t.timestamp
            ],
        )?;
        t.id = self.conn.last_insert_rowid();
        Ok(t)
    }

    fn update_transaction(&self, owner: &str, id: i64, patch: &TransactionPatch) -> Result<Transaction> {
        let mut t = self.find(id)?;
        check_owner(id, &t.owner, owner)?;
        patch.apply(&mut t)?;
        self.conn.execute(
            "UPDATE transactions SET title=?1, amount=?2, currency=?3, category=?4, kind=?5, date=?6
             WHERE id=?7",
            params![
                t.title,
                t.amount.to_string(),
                t.currency,
                t.category,
                t.kind.as_str(),
                t.timestamp,
                id
            ],
        )?;
        Ok(t)
    }

    fn delete_transaction(&self, owner: &str, id: i64) -> Result<()> {
        let record_owner: String = self
            .conn
            .query_row(
                "SELECT owner FROM transactions WHERE id=?1",
                params![id],
                |r| r.get(0),
            )
            .optional()?
            .ok_or(StoreError::NotFound(id))?;
        check_owner(id, &record_owner, owner)?;
        self.conn
            .execute("DELETE FROM transactions WHERE id=?1", params![id])?;
        Ok(())
    }

    fn reset(&self, owner: &str) -> Result<usize> {
        let n = self
            .conn
            .execute("DELETE FROM transactions WHERE owner=?1", params![owner])?;
        Ok(n)
    }

    fn categories(&self, owner: &str) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, owner, name FROM categories WHERE owner=?1 ORDER BY name")?;
        let rows = stmt.query_map(params![owner], |r| {
            Ok(Category {
                id: r.get(0)?,
                owner: r.get(1)?,
                name: r.get(2)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn add_category(&self, owner: &str, name: &str) -> Result<Category> {
        let name = Category::validate_name(name)?;
        if self.category_exists(owner, &name)? {
            return Err(StoreError::DuplicateCategory(name).into());
        }
        self.conn.execute(
            "INSERT INTO categories(owner, name) VALUES (?1, ?2)",
            params![owner, name],
        )?;
        Ok(Category {
            id: self.conn.last_insert_rowid(),
            owner: owner.to_string(),
            name,
        })
    }

    fn rename_category(&self, owner: &str, id: i64, name: &str) -> Result<Category> {
        let name = Category::validate_name(name)?;
        let mut cat = self.find_category(id)?;
        check_owner(id, &cat.owner, owner)?;
        if cat.name != name && self.category_exists(owner, &name)? {
            return Err(StoreError::DuplicateCategory(name).into());
        }
        self.conn.execute(
            "UPDATE categories SET name=?1 WHERE id=?2",
            params![name, id],
        )?;
        cat.name = name;
        Ok(cat)
    }

    fn delete_category(&self, owner: &str, id: i64) -> Result<()> {
        let cat = self.find_category(id)?;
        check_owner(id, &cat.owner, owner)?;
        self.conn
            .execute("DELETE FROM categories WHERE id=?1", params![id])?;
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GuestFile {
    #[serde(default)]
    next_id: i64,
    // Kept raw so one bad record never hides the rest
    #[serde(default)]
    transactions: Vec<serde_json::Value>,
    #[serde(default)]
    categories: Vec<Category>,
}

impl GuestFile {
    fn take_id(&mut self) -> i64 {
        self.next_id = self.next_id.max(1);
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.transactions
            .iter()
            .position(|v| v.get("id").and_then(|x| x.as_i64()) == Some(id))
    }
}

/// Guest store: everything in one JSON file.
pub struct LocalCache {
    path: PathBuf,
}

impl LocalCache {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let cache = Self {
            path: path.as_ref().to_path_buf(),
        };
        // Fail early on a file we cannot parse at all
        cache.load()?;
        Ok(cache)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<GuestFile> {
        if !self.path.exists() {
            return Ok(GuestFile::default());
        }
        let s = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Read guest data at {}", self.path.display()))?;
        if s.trim().is_empty() {
            return Ok(GuestFile::default());
        }
        serde_json::from_str(&s)
            .with_context(|| format!("Parse guest data at {}", self.path.display()))
    }

    /// Write next to the target and rename over it, so a crash leaves either
    /// the old file or the new one.
    fn save(&self, file: &GuestFile) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Create temp file in {}", dir.display()))?;
        serde_json::to_writer_pretty(&mut tmp, file)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .with_context(|| format!("Write guest data at {}", self.path.display()))?;
        Ok(())
    }

    fn parse_at(file: &GuestFile, idx: usize, id: i64) -> Result<Transaction> {
        serde_json::from_value(file.transactions[idx].clone())
            .with_context(|| format!("Transaction {} is unreadable", id))
    }
}

impl TransactionStore for LocalCache {
    fn transactions(&self, owner: &str) -> Result<TransactionSnapshot> {
        let file = self.load()?;
        let mut snapshot = TransactionSnapshot::default();
        for v in file.transactions {
            match serde_json::from_value::<Transaction>(v) {
                Ok(t) if t.owner == owner => snapshot.transactions.push(t),
                Ok(_) => {}
                Err(e) => {
                    debug!("Skipping guest record: {}", e);
                    snapshot.skipped += 1;
                }
            }
        }
        snapshot
            .transactions
            .sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(snapshot)
    }

    fn add_transaction(&self, owner: &str, new: NewTransaction) -> Result<Transaction> {
        let mut file = self.load()?;
        let mut t = new.resolve(owner, now())?;
        t.id = file.take_id();
        file.transactions.push(serde_json::to_value(&t)?);
        self.save(&file)?;
        Ok(t)
    }

    fn update_transaction(&self, owner: &str, id: i64, patch: &TransactionPatch) -> Result<Transaction> {
        let mut file = self.load()?;
        let idx = file.position(id).ok_or(StoreError::NotFound(id))?;
        let mut t = Self::parse_at(&file, idx, id)?;
        check_owner(id, &t.owner, owner)?;
        patch.apply(&mut t)?;
        file.transactions[idx] = serde_json::to_value(&t)?;
        self.save(&file)?;
        Ok(t)
    }

    fn delete_transaction(&self, owner: &str, id: i64) -> Result<()> {
        let mut file = self.load()?;
        let idx = file.position(id).ok_or(StoreError::NotFound(id))?;
        let t = Self::parse_at(&file, idx, id)?;
        check_owner(id, &t.owner, owner)?;
        file.transactions.remove(idx);
        self.save(&file)
    }

    fn reset(&self, owner: &str) -> Result<usize> {
        let mut file = self.load()?;
        let before = file.transactions.len();
        file.transactions
            .retain(|v| v.get("owner").and_then(|o| o.as_str()) != Some(owner));
        let removed = before - file.transactions.len();
        self.save(&file)?;
        Ok(removed)
    }

    fn categories(&self, owner: &str) -> Result<Vec<Category>> {
        let mut out: Vec<Category> = self
            .load()?
            .categories
            .into_iter()
            .filter(|c| c.owner == owner)
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    fn add_category(&self, owner: &str, name: &str) -> Result<Category> {
        let name = Category::validate_name(name)?;
        let mut file = self.load()?;
        if file
            .categories
            .iter()
            .any(|c| c.owner == owner && c.name == name)
        {
            return Err(StoreError::DuplicateCategory(name).into());
        }
        let cat = Category {
            id: file.take_id(),
            owner: owner.to_string(),
            name,
        };
        file.categories.push(cat.clone());
        self.save(&file)?;
        Ok(cat)
    }

    fn rename_category(&self, owner: &str, id: i64, name: &str) -> Result<Category> {
        let name = Category::validate_name(name)?;
        let mut file = self.load()?;
        let clash = file
            .categories
            .iter()
            .any(|c| c.owner == owner && c.id != id && c.name == name);
        let cat = file
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound(id))?;
        check_owner(id, &cat.owner, owner)?;
        if clash {
            return Err(StoreError::DuplicateCategory(name).into());
        }
        cat.name = name;
        let out = cat.clone();
        self.save(&file)?;
        Ok(out)
    }

    fn delete_category(&self, owner: &str, id: i64) -> Result<()> {
        let mut file = self.load()?;
        let idx = file
            .categories
            .iter()
            .position(|c| c.id == id)
            .ok_or(StoreError::NotFound(id))?;
        check_owner(id, &file.categories[idx].owner, owner)?;
        file.categories.remove(idx);
        self.save(&file)
    }
}
