//! Persistence of derived rows.
//!
//! Table (default `crypto_prices`), one row per (coin, tick, ingestion):
//! `timestamp, coin, price, market_cap, total_volume, return_1h, log_return_1h,
//! ma_24h, volatility_24h, momentum_24h, ingested_at`
//!
//! Timestamps are RFC 3339 UTC strings. SQLite stores NaN as NULL, so a NaN anomaly
//! reads back as a missing value.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, Row, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::models::{DerivedRow, StoredRow};
use crate::utils::time_utils::epoch_ms_to_datetime;

/// Append-only store of derived rows plus a full read-back.
/// Appends do not deduplicate; `remove_duplicates` is the separate maintenance step.
pub trait DerivedStore: Send + Sync {
    fn append(&self, rows: &[DerivedRow], ingested_at: DateTime<Utc>) -> Result<usize>;

    fn read_all(&self) -> Result<Vec<StoredRow>>;

    /// Keep only the newest ingestion of every (coin, timestamp). Returns rows removed.
    fn remove_duplicates(&self) -> Result<usize>;
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
    table: String,
}

fn to_rfc3339(epoch_ms: i64) -> Result<String> {
    epoch_ms_to_datetime(epoch_ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| anyhow!("Timestamp {}ms is out of range", epoch_ms))
}

fn parse_rfc3339(text: &str) -> rusqlite::Result<i64> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc).timestamp_millis())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))
}

fn stored_row_from_sql(row: &Row) -> rusqlite::Result<StoredRow> {
    let timestamp: String = row.get(0)?;
    let ingested_at: String = row.get(10)?;
    Ok(StoredRow {
        row: DerivedRow {
            timestamp_ms: parse_rfc3339(&timestamp)?,
            coin: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            price: row.get(2)?,
            market_cap: row.get(3)?,
            total_volume: row.get(4)?,
            return_1h: row.get(5)?,
            log_return_1h: row.get(6)?,
            ma_24h: row.get(7)?,
            volatility_24h: row.get(8)?,
            momentum_24h: row.get(9)?,
        },
        ingested_at_ms: parse_rfc3339(&ingested_at)?,
    })
}

/// SQLite writes NaN as NULL; make that explicit so both paths agree.
fn sql_value(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

impl SqliteStore {
    pub fn open(path: &Path, table: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create directory: {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .context(format!("Failed to open SQLite database: {}", path.display()))?;
        Self::with_connection(conn, table)
    }

    pub fn open_in_memory(table: &str) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, table)
    }

    fn with_connection(conn: Connection, table: &str) -> Result<Self> {
        if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(anyhow!("Invalid table name: {:?}", table));
        }
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                timestamp TEXT NOT NULL,
                coin TEXT,
                price REAL,
                market_cap REAL,
                total_volume REAL,
                return_1h REAL,
                log_return_1h REAL,
                ma_24h REAL,
                volatility_24h REAL,
                momentum_24h REAL,
                ingested_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_{table}_coin_ts ON {table} (coin, timestamp);"
        ))
        .context("Failed to create schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
            table: table.to_string(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("SQLite connection mutex poisoned"))
    }
}

impl DerivedStore for SqliteStore {
    fn append(&self, rows: &[DerivedRow], ingested_at: DateTime<Utc>) -> Result<usize> {
        let ingested_at = ingested_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (timestamp, coin, price, market_cap, total_volume, return_1h,
                    log_return_1h, ma_24h, volatility_24h, momentum_24h, ingested_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                self.table
            ))?;
            for row in rows {
                stmt.execute(params![
                    to_rfc3339(row.timestamp_ms)?,
                    row.coin,
                    sql_value(row.price),
                    sql_value(row.market_cap),
                    sql_value(row.total_volume),
                    sql_value(row.return_1h),
                    sql_value(row.log_return_1h),
                    sql_value(row.ma_24h),
                    sql_value(row.volatility_24h),
                    sql_value(row.momentum_24h),
                    ingested_at,
                ])?;
            }
        }
        tx.commit().context("Failed to commit appended rows")?;
        log::info!("Appended {} rows to {}", rows.len(), self.table);
        Ok(rows.len())
    }

    fn read_all(&self) -> Result<Vec<StoredRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT timestamp, coin, price, market_cap, total_volume, return_1h, log_return_1h,
                ma_24h, volatility_24h, momentum_24h, ingested_at
             FROM {} ORDER BY coin, timestamp, rowid",
            self.table
        ))?;
        let rows = stmt
            .query_map([], stored_row_from_sql)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context(format!("Failed to read {}", self.table))?;
        Ok(rows)
    }

    fn remove_duplicates(&self) -> Result<usize> {
        let conn = self.lock()?;
        let removed = conn.execute(
            &format!(
                "DELETE FROM {t} WHERE rowid NOT IN (
                    SELECT rowid FROM (
                        SELECT rowid, ROW_NUMBER() OVER (
                            PARTITION BY coin, timestamp ORDER BY ingested_at DESC, rowid DESC
                        ) AS rn FROM {t}
                    ) WHERE rn = 1
                )",
                t = self.table
            ),
            [],
        )?;
        if removed > 0 {
            log::info!("Removed {} duplicate (coin, timestamp) rows from {}", removed, self.table);
        }
        Ok(removed)
    }
}
