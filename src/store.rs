use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use redb::ReadableTable;
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;

use crate::constants::CHANGE_CHANNEL_CAPACITY;
use crate::db::{self, tables, Db};
use crate::error::{AppError, Result};
use crate::models::{CounterRecord, MovieRecord};

/// Document-store layer over the movies and metadata collections
///
/// Every committed mutation publishes a fresh snapshot batch, ordered by
/// creation time descending, to all feed subscribers.
#[derive(Clone)]
pub struct MovieStore {
    db: Db,
    changes: broadcast::Sender<Vec<MovieRecord>>,
}

impl MovieStore {
    pub fn new(db: Db) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { db, changes }
    }

    /// Subscribe to snapshot batches emitted after each mutation
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<MovieRecord>> {
        self.changes.subscribe()
    }

    /// Read the full collection, newest first
    pub async fn list(&self) -> Result<Vec<MovieRecord>> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || read_snapshot(&db)).await?
    }

    /// Fetch a single record by identifier
    pub async fn get(&self, id: String) -> Result<MovieRecord> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || -> Result<MovieRecord> {
            let read_txn = db.begin_read()?;
            let movies = read_txn.open_table(tables::MOVIES)?;
            movies
                .get(id.as_str())?
                .map(|bytes| db::decode(bytes.value()))
                .transpose()?
                .ok_or(AppError::MovieNotFound)
        })
        .await?
    }

    /// Equality query on (name_lower, year), used as the pre-write
    /// uniqueness check
    ///
    /// Runs outside the insert transaction, so two concurrent adds of the
    /// same pair can both pass. Accepted best-effort behavior.
    pub async fn exists(&self, name_lower: String, year: i32) -> Result<bool> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || -> Result<bool> {
            let read_txn = db.begin_read()?;
            let movies = read_txn.open_table(tables::MOVIES)?;
            for entry in movies.iter()? {
                let (_, bytes) = entry?;
                let record: MovieRecord = db::decode(bytes.value())?;
                if record.name_lower == name_lower && record.year == year {
                    return Ok(true);
                }
            }
            Ok(false)
        })
        .await?
    }

    /// Insert a movie and bump the counter in one transaction
    ///
    /// Ensures the counter singleton exists (created at 0 if absent),
    /// inserts the record with a store-assigned id and timestamp, and
    /// increments the counter. All-or-nothing.
    pub async fn add(&self, name: String, year: i32) -> Result<MovieRecord> {
        let db = self.db.clone();

        let (record, snapshot) = tokio::task::spawn_blocking(
            move || -> Result<(MovieRecord, Vec<MovieRecord>)> {
                let created_at = Utc::now().timestamp();
                let name_lower = name.to_lowercase();
                let id = assign_id(&name_lower, year);

                let record = MovieRecord {
                    id,
                    name,
                    name_lower,
                    year,
                    created_at,
                };

                let write_txn = db.begin_write()?;
                {
                    let mut metadata = write_txn.open_table(tables::METADATA)?;
                    let counter: CounterRecord = metadata
                        .get(tables::MOVIE_COUNT_KEY)?
                        .map(|bytes| db::decode(bytes.value()))
                        .transpose()?
                        .unwrap_or_default();

                    let mut movies = write_txn.open_table(tables::MOVIES)?;
                    let bytes = db::encode(&record)?;
                    movies.insert(record.id.as_str(), bytes.as_slice())?;
                    drop(movies);

                    let updated = CounterRecord {
                        count: counter.count + 1,
                    };
                    let counter_bytes = db::encode(&updated)?;
                    metadata.insert(tables::MOVIE_COUNT_KEY, counter_bytes.as_slice())?;
                }
                write_txn.commit()?;

                let snapshot = read_snapshot(&db)?;
                Ok((record, snapshot))
            },
        )
        .await??;

        tracing::info!("Movie added: {} ({})", record.name, record.year);
        let _ = self.changes.send(snapshot);

        Ok(record)
    }

    /// Remove a movie, then decrement the counter
    ///
    /// The removal and the decrement are separate transactions with a
    /// read-then-write on the counter in between. A crash after the
    /// removal commits leaves the counter one too high.
    pub async fn delete(&self, id: String) -> Result<()> {
        let db = self.db.clone();

        let snapshot = tokio::task::spawn_blocking(move || -> Result<Vec<MovieRecord>> {
            let write_txn = db.begin_write()?;
            {
                let mut movies = write_txn.open_table(tables::MOVIES)?;
                if movies.remove(id.as_str())?.is_none() {
                    return Err(AppError::MovieNotFound);
                }
            }
            write_txn.commit()?;

            // Separate read of the current counter value
            let read_txn = db.begin_read()?;
            let metadata = read_txn.open_table(tables::METADATA)?;
            let counter: Option<CounterRecord> = metadata
                .get(tables::MOVIE_COUNT_KEY)?
                .map(|bytes| db::decode(bytes.value()))
                .transpose()?;
            drop(metadata);
            drop(read_txn);

            // Separate write of the decremented value
            if let Some(counter) = counter {
                let updated = CounterRecord {
                    count: counter.count - 1,
                };
                let write_txn = db.begin_write()?;
                {
                    let mut metadata = write_txn.open_table(tables::METADATA)?;
                    let bytes = db::encode(&updated)?;
                    metadata.insert(tables::MOVIE_COUNT_KEY, bytes.as_slice())?;
                }
                write_txn.commit()?;
            }

            read_snapshot(&db)
        })
        .await??;

        tracing::info!("Movie deleted");
        let _ = self.changes.send(snapshot);

        Ok(())
    }

    /// Read the counter singleton, 0 when it has never been created
    pub async fn count(&self) -> Result<i64> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || -> Result<i64> {
            let read_txn = db.begin_read()?;
            let metadata = read_txn.open_table(tables::METADATA)?;
            let counter: Option<CounterRecord> = metadata
                .get(tables::MOVIE_COUNT_KEY)?
                .map(|bytes| db::decode(bytes.value()))
                .transpose()?;
            Ok(counter.map(|c| c.count).unwrap_or(0))
        })
        .await?
    }
}

/// Full-collection read, ordered by creation time descending with the
/// identifier as tie-breaker
fn read_snapshot(db: &Db) -> Result<Vec<MovieRecord>> {
    let read_txn = db.begin_read()?;
    let movies = read_txn.open_table(tables::MOVIES)?;

    let mut records = Vec::new();
    for entry in movies.iter()? {
        let (_, bytes) = entry?;
        records.push(db::decode::<MovieRecord>(bytes.value())?);
    }

    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    Ok(records)
}

/// Assign a store identifier: SHA-256 over the record key and the wall
/// clock, hex encoded
fn assign_id(name_lower: &str, year: i32) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    let mut hasher = Sha256::new();
    hasher.update(name_lower.as_bytes());
    hasher.update(year.to_le_bytes());
    hasher.update(nanos.to_le_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_database;
    use tempfile::TempDir;

    async fn test_store(tmp: &TempDir) -> MovieStore {
        let db = open_database(tmp.path().join("test.db")).unwrap();
        MovieStore::new(db)
    }

    #[tokio::test]
    async fn test_add_assigns_id_and_counts() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp).await;

        let record = store.add("Dune".to_string(), 2021).await.unwrap();

        assert_eq!(record.id.len(), 64);
        assert_eq!(record.name, "Dune");
        assert_eq!(record.name_lower, "dune");
        assert_eq!(store.count().await.unwrap(), 1);

        let listed = store.list().await.unwrap();
        assert_eq!(listed, vec![record]);
    }

    #[tokio::test]
    async fn test_exists_matches_lowercase_name_and_year() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp).await;

        store.add("Dune".to_string(), 2021).await.unwrap();

        assert!(store.exists("dune".to_string(), 2021).await.unwrap());
        assert!(!store.exists("dune".to_string(), 1984).await.unwrap());
        assert!(!store.exists("up".to_string(), 2021).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_decrements() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp).await;

        let record = store.add("Dune".to_string(), 2021).await.unwrap();
        store.add("Up".to_string(), 2009).await.unwrap();

        store.delete(record.id.clone()).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.get(record.id).await.is_err());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_record_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp).await;

        let result = store.delete("f".repeat(64)).await;
        assert!(matches!(result, Err(AppError::MovieNotFound)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mutations_publish_snapshots() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp).await;
        let mut updates = store.subscribe();

        let record = store.add("Dune".to_string(), 2021).await.unwrap();
        let batch = updates.recv().await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id, record.id);

        store.delete(record.id).await.unwrap();
        let batch = updates.recv().await.unwrap();
        assert!(batch.is_empty());
    }
}
