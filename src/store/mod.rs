//! Per-user campaign history.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::info;
use uuid::Uuid;

use crate::wire::CampaignRecord;

pub trait CampaignStore: Send + Sync {
    /// Assigns an id and timestamp and stores the record. A record that
    /// already has an id is returned unchanged and nothing is written.
    fn save(&self, user_id: &str, record: &CampaignRecord) -> Result<CampaignRecord>;
    /// Most recent first.
    fn list(&self, user_id: &str) -> Result<Vec<CampaignRecord>>;
    fn delete(&self, user_id: &str, record_id: &str) -> Result<()>;
}

fn stamp(record: &CampaignRecord) -> CampaignRecord {
    let mut stored = record.clone();
    stored.id = Some(Uuid::new_v4().to_string());
    stored.saved_at = Some(Utc::now());
    stored
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            fs_err::create_dir_all(dir)?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("opening campaign store {}", path.display()))?;
        Self::init(conn)
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS campaigns (
                id       TEXT PRIMARY KEY,
                user_id  TEXT NOT NULL,
                app_name TEXT NOT NULL,
                saved_at TEXT NOT NULL,
                body     TEXT NOT NULL
             );
             CREATE INDEX IF NOT EXISTS campaigns_by_user ON campaigns (user_id, saved_at);",
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

impl CampaignStore for SqliteStore {
    fn save(&self, user_id: &str, record: &CampaignRecord) -> Result<CampaignRecord> {
        if record.is_persisted() {
            return Ok(record.clone());
        }
        let stored = stamp(record);
        let body = serde_json::to_string(&stored)?;
        let id = stored.id.clone().unwrap_or_default();
        let saved_at = stored
            .saved_at
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Nanos, true))
            .unwrap_or_default();
        self.conn.lock().execute(
            "INSERT OR IGNORE INTO campaigns (id, user_id, app_name, saved_at, body)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, user_id, stored.app_name, saved_at, body],
        )?;
        info!(%id, app = %stored.app_name, "campaign saved");
        Ok(stored)
    }

    fn list(&self, user_id: &str) -> Result<Vec<CampaignRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT body FROM campaigns WHERE user_id = ?1 ORDER BY saved_at DESC, rowid DESC",
        )?;
        let bodies = stmt
            .query_map([user_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        bodies
            .iter()
            .map(|b| serde_json::from_str(b).context("corrupt campaign row"))
            .collect()
    }

    fn delete(&self, user_id: &str, record_id: &str) -> Result<()> {
        let n = self.conn.lock().execute(
            "DELETE FROM campaigns WHERE user_id = ?1 AND id = ?2",
            params![user_id, record_id],
        )?;
        info!(id = %record_id, removed = n, "campaign deleted");
        Ok(())
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<(String, CampaignRecord)>>,
}

#[cfg(test)]
impl CampaignStore for MemoryStore {
    fn save(&self, user_id: &str, record: &CampaignRecord) -> Result<CampaignRecord> {
        if record.is_persisted() {
            return Ok(record.clone());
        }
        let stored = stamp(record);
        self.rows.lock().push((user_id.to_string(), stored.clone()));
        Ok(stored)
    }

    fn list(&self, user_id: &str) -> Result<Vec<CampaignRecord>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .rev()
            .filter(|(u, _)| u == user_id)
            .map(|(_, r)| r.clone())
            .collect())
    }

    fn delete(&self, user_id: &str, record_id: &str) -> Result<()> {
        self.rows
            .lock()
            .retain(|(u, r)| !(u == user_id && r.id.as_deref() == Some(record_id)));
        Ok(())
    }
}
