use bincode::{deserialize, serialize};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use fs2::FileExt;
use media_trends_models::StoredTrend;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::Relation;

/// On-disk trend table.
///
/// Uses binary format (bincode) with gzip compression. Writes go to a
/// temp file first and are renamed into place, so readers never observe a
/// half-written table. Read-modify-write cycles hold an advisory lock on a
/// sibling `.lock` file, so handles in different processes (the daemon and
/// a manual `analyze`) never drop each other's rows.
#[derive(Debug, Clone)]
pub struct TrendStorage {
    table_path: PathBuf,
}

/// Exclusive lock on the trend table, released on drop
struct TableLock {
    file: File,
}

impl TableLock {
    fn acquire(path: &Path) -> StoreResult<Self> {
        let io_err = |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(io_err)?;
        FileExt::lock_exclusive(&file).map_err(io_err)?;
        Ok(Self { file })
    }
}

impl Drop for TableLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(error = %e, "Failed to release trend table lock");
        }
    }
}

impl TrendStorage {
    pub fn new(trends_dir: &Path) -> Self {
        Self {
            table_path: trends_dir.join(Relation::MovieTrends.file_name()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.table_path
    }

    fn lock(&self) -> StoreResult<TableLock> {
        TableLock::acquire(&self.table_path.with_extension("lock"))
    }

    /// Load all rows; a table that was never written is empty
    pub fn load(&self) -> StoreResult<Vec<StoredTrend>> {
        if !self.table_path.exists() {
            debug!("Trend table does not exist yet, treating as empty");
            return Ok(Vec::new());
        }

        let start = std::time::Instant::now();
        let data = std::fs::read(&self.table_path).map_err(|source| StoreError::Io {
            path: self.table_path.clone(),
            source,
        })?;

        let mut decoder = GzDecoder::new(&data[..]);
        let mut decoded = Vec::new();
        if let Err(e) = decoder.read_to_end(&mut decoded) {
            return Ok(self.discard_incompatible(&e.to_string()));
        }

        let rows: Vec<StoredTrend> = match deserialize(&decoded) {
            Ok(rows) => rows,
            Err(e) => return Ok(self.discard_incompatible(&e.to_string())),
        };

        debug!(
            rows = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded trend table"
        );
        Ok(rows)
    }

    /// Back up a table written by an incompatible build and start empty
    fn discard_incompatible(&self, error: &str) -> Vec<StoredTrend> {
        let backup_path = self.table_path.with_extension("bin.bak");
        if let Err(backup_err) = std::fs::copy(&self.table_path, &backup_path) {
            warn!(
                "Failed to backup incompatible trend table: {}. Starting with empty table.",
                backup_err
            );
        } else {
            info!(
                "Trend table format incompatible (error: {}). Backed up old table to {:?} and starting with empty table.",
                error, backup_path
            );
        }
        Vec::new()
    }

    /// Replace the whole table; callers hold the table lock
    fn save(&self, rows: &[StoredTrend]) -> StoreResult<()> {
        let start = std::time::Instant::now();
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StoreError::Io { path, source }
        };

        let serialized = serialize(rows).map_err(|e| StoreError::Encoding(e.to_string()))?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&serialized).map_err(io_err(&self.table_path))?;
        let encoded = encoder.finish().map_err(io_err(&self.table_path))?;

        if let Some(parent) = self.table_path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err(parent))?;
        }

        let temp_path = self.table_path.with_extension("tmp");
        std::fs::write(&temp_path, encoded).map_err(io_err(&temp_path))?;
        std::fs::rename(&temp_path, &self.table_path).map_err(io_err(&self.table_path))?;

        info!(
            rows = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Saved trend table"
        );
        Ok(())
    }

    /// Insert or replace the row for one movie
    pub fn upsert(&self, row: StoredTrend) -> StoreResult<()> {
        let _lock = self.lock()?;
        let mut rows = self.load()?;
        match rows.iter_mut().find(|r| r.trend.movie_id == row.trend.movie_id) {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }
        rows.sort_by_key(|r| r.trend.movie_id);
        self.save(&rows)
    }

    pub fn clear(&self) -> StoreResult<bool> {
        let _lock = self.lock()?;
        if !self.table_path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.table_path).map_err(|source| StoreError::Io {
            path: self.table_path.clone(),
            source,
        })?;
        Ok(true)
    }

    pub fn size(&self) -> StoreResult<u64> {
        if self.table_path.exists() {
            std::fs::metadata(&self.table_path)
                .map(|m| m.len())
                .map_err(|source| StoreError::Io {
                    path: self.table_path.clone(),
                    source,
                })
        } else {
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use media_trends_models::{MovieTrend, SnapshotKey, TrendStatus};

    fn stored(movie_id: i64, status: TrendStatus) -> StoredTrend {
        let mut trend = MovieTrend::empty(movie_id);
        trend.trend_status = status;
        trend.trend_confidence = 0.75;
        trend.spike_date = Some(SnapshotKey::On(NaiveDate::from_ymd_opt(2026, 1, 4).unwrap()));
        trend.spike_magnitude = Some(2.3);
        StoredTrend {
            trend,
            last_calculated_at: Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_missing_table_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = TrendStorage::new(dir.path());
        assert!(storage.load().unwrap().is_empty());
        assert_eq!(storage.size().unwrap(), 0);
        assert!(!storage.clear().unwrap());
    }

    #[test]
    fn test_upsert_replaces_row_per_movie() {
        let dir = tempfile::tempdir().unwrap();
        let storage = TrendStorage::new(&dir.path().join("trends"));

        storage.upsert(stored(2, TrendStatus::Stable)).unwrap();
        storage.upsert(stored(1, TrendStatus::TrendingUp)).unwrap();
        storage.upsert(stored(2, TrendStatus::SleeperHit)).unwrap();

        let rows = storage.load().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].trend.movie_id, 1);
        assert_eq!(rows[1].trend.trend_status, TrendStatus::SleeperHit);
        assert_eq!(rows[1], stored(2, TrendStatus::SleeperHit));
        assert!(storage.size().unwrap() > 0);
    }

    #[test]
    fn test_corrupt_table_is_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let storage = TrendStorage::new(dir.path());
        std::fs::write(storage.path(), b"not a trend table").unwrap();

        assert!(storage.load().unwrap().is_empty());
        assert!(storage.path().with_extension("bin.bak").exists());
    }

    #[test]
    fn test_separate_handles_keep_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let workers: Vec<_> = (0..2i64)
            .map(|worker| {
                let storage = TrendStorage::new(dir.path());
                std::thread::spawn(move || {
                    for i in 0..25 {
                        storage.upsert(stored(worker * 100 + i, TrendStatus::Stable)).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let rows = TrendStorage::new(dir.path()).load().unwrap();
        assert_eq!(rows.len(), 50);
        assert!(rows.windows(2).all(|w| w[0].trend.movie_id < w[1].trend.movie_id));
    }
}
