//! Explicit memoization of the stored dataset.
//!
//! Invalidation policy: an entry is refreshed once it is older than its TTL,
//! and dropped immediately whenever the underlying store is written to.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::analysis::CombinedDataset;
#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;
use crate::data::store::DerivedStore;
use crate::models::{DerivedRow, StoredRow};

/// A value with a staleness bound.
pub struct Memoized<T> {
    ttl: Duration,
    cached: Option<(Instant, Arc<T>)>,
}

impl<T> Memoized<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, cached: None }
    }

    pub fn is_fresh_at(&self, now: Instant) -> bool {
        self.cached
            .as_ref()
            .is_some_and(|(loaded_at, _)| now.saturating_duration_since(*loaded_at) < self.ttl)
    }

    pub fn get_or_refresh<F>(&mut self, loader: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        self.get_or_refresh_at(Instant::now(), loader)
    }

    /// Return the cached value if it is younger than the TTL at `now`, else reload.
    /// A failed reload leaves the previous entry untouched.
    pub fn get_or_refresh_at<F>(&mut self, now: Instant, loader: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        if self.is_fresh_at(now) {
            if let Some((_, value)) = &self.cached {
                #[cfg(debug_assertions)]
                if DEBUG_FLAGS.print_memo_events {
                    log::debug!("Memo hit");
                }
                return Ok(Arc::clone(value));
            }
        }
        let value = Arc::new(loader()?);
        #[cfg(debug_assertions)]
        if DEBUG_FLAGS.print_memo_events {
            log::debug!("Memo refreshed");
        }
        self.cached = Some((now, Arc::clone(&value)));
        Ok(value)
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

/// A `DerivedStore` whose full read is memoized and invalidated on every append.
pub struct MemoizedStore<S: DerivedStore> {
    store: S,
    memo: Mutex<Memoized<CombinedDataset>>,
}

impl<S: DerivedStore> MemoizedStore<S> {
    pub fn new(store: S, ttl: Duration) -> Self {
        Self {
            store,
            memo: Mutex::new(Memoized::new(ttl)),
        }
    }

    fn invalidate(&self) -> Result<()> {
        self.memo
            .lock()
            .map_err(|_| anyhow!("Dataset memo mutex poisoned"))?
            .invalidate();
        Ok(())
    }

    /// Get-or-refresh the combined dataset.
    pub fn dataset(&self) -> Result<Arc<CombinedDataset>> {
        let mut memo = self
            .memo
            .lock()
            .map_err(|_| anyhow!("Dataset memo mutex poisoned"))?;
        memo.get_or_refresh(|| {
            let stored = self.store.read_all()?;
            Ok(CombinedDataset::from_stored(&stored))
        })
    }
}

impl<S: DerivedStore> DerivedStore for MemoizedStore<S> {
    fn append(&self, rows: &[DerivedRow], ingested_at: DateTime<Utc>) -> Result<usize> {
        let written = self.store.append(rows, ingested_at)?;
        self.invalidate()?;
        Ok(written)
    }

    fn read_all(&self) -> Result<Vec<StoredRow>> {
        self.store.read_all()
    }

    fn remove_duplicates(&self) -> Result<usize> {
        let removed = self.store.remove_duplicates()?;
        self.invalidate()?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::store::SqliteStore;
    use std::cell::Cell;

    #[test]
    fn serves_cached_value_until_ttl_expires() {
        let mut memo = Memoized::new(Duration::from_secs(300));
        let loads = Cell::new(0);
        let load = || {
            loads.set(loads.get() + 1);
            Ok(loads.get())
        };
        let t0 = Instant::now();

        assert_eq!(*memo.get_or_refresh_at(t0, load).unwrap(), 1);
        assert_eq!(*memo.get_or_refresh_at(t0 + Duration::from_secs(299), load).unwrap(), 1);
        assert_eq!(*memo.get_or_refresh_at(t0 + Duration::from_secs(300), load).unwrap(), 2);

        memo.invalidate();
        assert!(!memo.is_fresh_at(t0 + Duration::from_secs(301)));
        assert_eq!(*memo.get_or_refresh_at(t0 + Duration::from_secs(301), load).unwrap(), 3);
    }

    #[test]
    fn failed_refresh_keeps_previous_entry() {
        let mut memo: Memoized<u32> = Memoized::new(Duration::from_secs(1));
        let t0 = Instant::now();
        memo.get_or_refresh_at(t0, || Ok(7)).unwrap();
        let later = t0 + Duration::from_secs(5);
        assert!(memo.get_or_refresh_at(later, || Err(anyhow!("db down"))).is_err());
        assert!(memo.cached.as_ref().is_some_and(|(_, v)| **v == 7));
    }

    #[test]
    fn append_invalidates_the_dataset() {
        let store = MemoizedStore::new(
            SqliteStore::open_in_memory("crypto_prices").unwrap(),
            Duration::from_secs(3_600),
        );
        assert!(store.dataset().unwrap().is_empty());

        let row = DerivedRow {
            coin: "bitcoin".to_string(),
            timestamp_ms: 0,
            price: Some(1.0),
            market_cap: None,
            total_volume: None,
            return_1h: None,
            log_return_1h: None,
            ma_24h: Some(1.0),
            volatility_24h: None,
            momentum_24h: Some(0.0),
        };
        store.append(&[row], Utc::now()).unwrap();
        assert_eq!(store.dataset().unwrap().len(), 1);
    }
}
