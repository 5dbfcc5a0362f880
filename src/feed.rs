use std::collections::HashSet;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::cache::SnapshotCache;
use crate::error::AppError;
use crate::models::MovieRecord;
use crate::store::MovieStore;

/// Event delivered to a feed consumer
#[derive(Debug)]
pub enum FeedEvent {
    /// A record not yet seen by this subscription
    Item(MovieRecord),
    /// A batch finished processing; the consumer has a consistent view
    Synced,
    /// The subscription failed; the feed stops and is not retried here
    Failed(AppError),
}

/// Handle detaching a live subscription
///
/// A feed served from the cache has nothing to detach; cancel is a no-op.
pub struct FeedHandle {
    task: Option<JoinHandle<()>>,
}

impl FeedHandle {
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Whether this feed holds a live subscription
    pub fn is_live(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Start a feed of movie records
///
/// With `force_refresh` unset and a fresh snapshot in the cache, the cached
/// records are replayed immediately and no subscription is opened.
/// Otherwise the feed subscribes to the store: the current collection is the
/// first batch, every committed mutation delivers another. Per batch,
/// records not yet emitted by this subscription are sent as `Item`s, the
/// accumulated set is written back to the cache when the batch contained
/// anything new, and `Synced` marks the batch boundary. A failed store read
/// emits `Failed` once and ends the feed; restarting is the caller's call.
pub fn start_feed(
    store: MovieStore,
    cache: SnapshotCache,
    force_refresh: bool,
) -> (mpsc::UnboundedReceiver<FeedEvent>, FeedHandle) {
    let (tx, rx) = mpsc::unbounded_channel();

    if !force_refresh {
        if let Some(cached) = cache.read() {
            tracing::debug!("Replaying {} cached movies", cached.len());
            for movie in cached {
                let _ = tx.send(FeedEvent::Item(movie));
            }
            let _ = tx.send(FeedEvent::Synced);
            return (rx, FeedHandle { task: None });
        }
    }

    tracing::debug!("Streaming fresh movie data from the store");
    let mut updates = store.subscribe();

    let task = tokio::spawn(async move {
        let mut seen: HashSet<String> = HashSet::new();
        let mut emitted: Vec<MovieRecord> = Vec::new();

        // The current collection is the first batch
        let first = match store.list().await {
            Ok(batch) => batch,
            Err(e) => {
                let _ = tx.send(FeedEvent::Failed(e));
                return;
            }
        };
        if !deliver_batch(first, &tx, &mut seen, &mut emitted, &cache) {
            return;
        }

        loop {
            let batch = match updates.recv().await {
                Ok(batch) => batch,
                // Every batch is a full snapshot, so skipped batches are
                // recovered by the next one
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Feed lagged, skipped {} batches", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            if !deliver_batch(batch, &tx, &mut seen, &mut emitted, &cache) {
                break;
            }
        }
    });

    (rx, FeedHandle { task: Some(task) })
}

/// Emit the unseen records of one batch, refresh the cache when the batch
/// brought news, and mark the batch boundary
///
/// Returns false when the consumer is gone.
fn deliver_batch(
    batch: Vec<MovieRecord>,
    tx: &mpsc::UnboundedSender<FeedEvent>,
    seen: &mut HashSet<String>,
    emitted: &mut Vec<MovieRecord>,
    cache: &SnapshotCache,
) -> bool {
    let mut fresh = false;

    for movie in batch {
        if seen.insert(movie.id.clone()) {
            if tx.send(FeedEvent::Item(movie.clone())).is_err() {
                return false;
            }
            emitted.push(movie);
            fresh = true;
        }
    }

    if fresh {
        cache.write(emitted);
    }

    tx.send(FeedEvent::Synced).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_database;
    use tempfile::TempDir;

    fn test_parts(tmp: &TempDir) -> (MovieStore, SnapshotCache) {
        let db = open_database(tmp.path().join("test.db")).unwrap();
        let cache = SnapshotCache::new(tmp.path().join("cache"), 30);
        (MovieStore::new(db), cache)
    }

    /// Drain events until the next batch boundary
    async fn collect_batch(rx: &mut mpsc::UnboundedReceiver<FeedEvent>) -> Vec<MovieRecord> {
        let mut items = Vec::new();
        while let Some(event) = rx.recv().await {
            match event {
                FeedEvent::Item(movie) => items.push(movie),
                FeedEvent::Synced => return items,
                FeedEvent::Failed(e) => panic!("feed failed: {e}"),
            }
        }
        panic!("feed ended without a batch boundary");
    }

    #[tokio::test]
    async fn test_fresh_cache_replays_without_subscription() {
        let tmp = TempDir::new().unwrap();
        let (store, cache) = test_parts(&tmp);

        let movie = store.add("Dune".to_string(), 2021).await.unwrap();
        cache.write(&[movie.clone()]);

        let (mut rx, handle) = start_feed(store, cache, false);

        assert!(!handle.is_live());
        assert_eq!(collect_batch(&mut rx).await, vec![movie]);
    }

    #[tokio::test]
    async fn test_cold_cache_streams_from_store() {
        let tmp = TempDir::new().unwrap();
        let (store, cache) = test_parts(&tmp);

        let movie = store.add("Dune".to_string(), 2021).await.unwrap();

        let (mut rx, mut handle) = start_feed(store, cache.clone(), false);

        assert!(handle.is_live());
        assert_eq!(collect_batch(&mut rx).await, vec![movie.clone()]);

        // The first live batch is written through to the cache
        assert_eq!(cache.read(), Some(vec![movie]));
        handle.cancel();
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_cache() {
        let tmp = TempDir::new().unwrap();
        let (store, cache) = test_parts(&tmp);

        let stale = MovieRecord {
            id: "0".repeat(64),
            name: "Gone".to_string(),
            name_lower: "gone".to_string(),
            year: 1990,
            created_at: 1,
        };
        cache.write(&[stale]);
        let movie = store.add("Dune".to_string(), 2021).await.unwrap();

        let (mut rx, mut handle) = start_feed(store, cache, true);

        assert!(handle.is_live());
        assert_eq!(collect_batch(&mut rx).await, vec![movie]);
        handle.cancel();
    }

    #[tokio::test]
    async fn test_duplicate_ids_emitted_once_per_subscription() {
        let tmp = TempDir::new().unwrap();
        let (store, cache) = test_parts(&tmp);

        let first = store.add("Dune".to_string(), 2021).await.unwrap();

        let (mut rx, mut handle) = start_feed(store.clone(), cache, true);
        assert_eq!(collect_batch(&mut rx).await, vec![first.clone()]);

        // The next snapshot repeats the first record; only the new one
        // may come through
        let second = store.add("Up".to_string(), 2009).await.unwrap();
        assert_eq!(collect_batch(&mut rx).await, vec![second]);

        // A snapshot with nothing new yields an empty batch
        store.delete(first.id).await.unwrap();
        assert_eq!(collect_batch(&mut rx).await, vec![]);
        handle.cancel();
    }

    #[tokio::test]
    async fn test_cancel_detaches_subscription() {
        let tmp = TempDir::new().unwrap();
        let (store, cache) = test_parts(&tmp);

        let (mut rx, mut handle) = start_feed(store.clone(), cache, true);
        assert_eq!(collect_batch(&mut rx).await, vec![]);

        handle.cancel();
        assert!(!handle.is_live());

        // Mutations after cancel no longer reach the receiver
        store.add("Dune".to_string(), 2021).await.unwrap();
        assert!(rx.recv().await.is_none());
    }
}
