//! In-memory entry collection with background persistence.
//!
//! [`EntryManager`] owns the canonical collection for the life of the
//! process. Mutations apply immediately in memory and queue a persist request
//! for a single writer task. The writer snapshots the collection when it runs,
//! not when the request was queued, so the last completed write always holds
//! every mutation made before it.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::entry::{sort_by_recent, PainEntry};
use crate::error::{Error, Result};
use crate::storage::EntryStore;

type SharedEntries = Arc<RwLock<Vec<PainEntry>>>;

/// A message for the persistence writer.
#[derive(Debug)]
enum PersistRequest {
    /// Write the current collection; nobody waits for the outcome.
    Sync,
    /// Write the current collection and report the outcome.
    Flush(oneshot::Sender<Result<()>>),
}

/// Owner of the in-memory pain entry collection.
///
/// Construct one with [`EntryManager::hydrate`] and pass it by reference to
/// whatever needs the entries. Call [`EntryManager::shutdown`] before exit so
/// queued writes land.
#[derive(Debug)]
pub struct EntryManager {
    entries: SharedEntries,
    store: EntryStore,
    persist_tx: mpsc::UnboundedSender<PersistRequest>,
    writer: JoinHandle<()>,
}

impl EntryManager {
    /// Load the stored collection and start the persistence writer.
    ///
    /// The writer starts after hydration, so nothing is written back until
    /// the first mutation.
    ///
    /// # Errors
    ///
    /// Returns an error if the blocking load task cannot be joined.
    pub async fn hydrate(store: EntryStore) -> Result<Self> {
        let loaded = load_blocking(store.clone()).await?;
        info!("Hydrated {} pain entries", loaded.len());

        let entries: SharedEntries = Arc::new(RwLock::new(dedupe_by_id(loaded)));
        let (persist_tx, persist_rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(run_writer(store.clone(), Arc::clone(&entries), persist_rx));

        Ok(Self {
            entries,
            store,
            persist_tx,
            writer,
        })
    }

    /// Append an entry and queue a persist.
    ///
    /// Returns as soon as the entry is in memory. A failed background write
    /// is logged, not returned; use [`flush`](Self::flush) to observe it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateEntry`] if an entry with the same id exists.
    pub fn add(&self, entry: PainEntry) -> Result<()> {
        {
            let mut entries = self.write_entries();
            if entries.iter().any(|e| e.id == entry.id) {
                return Err(Error::DuplicateEntry { id: entry.id });
            }
            debug!(id = %entry.id, body_part = %entry.body_part, "Adding entry");
            entries.push(entry);
        }
        self.request_persist();
        Ok(())
    }

    /// Append an entry and wait until it is written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateEntry`] if the id exists, or
    /// [`Error::EntryNotSaved`] if the write fails. In that case the entry
    /// stays in memory and is retried with the next write.
    pub async fn commit(&self, entry: PainEntry) -> Result<()> {
        self.add(entry)?;
        self.flush().await.map_err(|e| {
            if e.is_storage_write() {
                Error::EntryNotSaved {
                    source: Box::new(e),
                }
            } else {
                e
            }
        })
    }

    /// Remove the entry with `id`.
    ///
    /// Returns `false` and leaves the collection untouched if no entry matches.
    pub fn remove(&self, id: &str) -> bool {
        let removed = {
            let mut entries = self.write_entries();
            let before = entries.len();
            entries.retain(|e| e.id != id);
            before != entries.len()
        };

        if removed {
            debug!(id, "Removed entry");
            self.request_persist();
        } else {
            debug!(id, "No entry to remove");
        }
        removed
    }

    /// Replace the whole collection.
    ///
    /// Later duplicates of an id are dropped.
    pub fn replace_all(&self, entries: Vec<PainEntry>) {
        let entries = dedupe_by_id(entries);
        debug!("Replacing collection with {} entries", entries.len());
        *self.write_entries() = entries;
        self.request_persist();
    }

    /// Append a batch of entries, skipping ids already present.
    ///
    /// Returns the number of entries appended.
    pub fn extend(&self, incoming: Vec<PainEntry>) -> usize {
        let appended = {
            let mut entries = self.write_entries();
            let mut seen: HashSet<String> = entries.iter().map(|e| e.id.clone()).collect();
            let before = entries.len();
            for entry in incoming {
                if seen.insert(entry.id.clone()) {
                    entries.push(entry);
                } else {
                    warn!(id = %entry.id, "Skipping entry with duplicate id");
                }
            }
            entries.len() - before
        };

        if appended > 0 {
            debug!("Appended {} entries", appended);
            self.request_persist();
        }
        appended
    }

    /// Re-read the stored collection and replace the in-memory one with it.
    ///
    /// Mutations made before the call are written first, so the reloaded
    /// collection includes them.
    ///
    /// # Errors
    ///
    /// Returns the [`flush`](Self::flush) error if pending mutations cannot be
    /// written (the in-memory collection is left untouched), or an error if
    /// the blocking load task cannot be joined.
    pub async fn reload(&self) -> Result<()> {
        self.flush().await?;
        let loaded = load_blocking(self.store.clone()).await?;
        let loaded = dedupe_by_id(loaded);
        debug!("Reloaded {} entries", loaded.len());
        *self.write_entries() = loaded;
        Ok(())
    }

    /// Snapshot of the collection in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<PainEntry> {
        self.read_entries().clone()
    }

    /// Snapshot of the collection, newest first.
    #[must_use]
    pub fn sorted_by_recent(&self) -> Vec<PainEntry> {
        let mut entries = self.entries();
        sort_by_recent(&mut entries);
        entries
    }

    /// Look up an entry by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<PainEntry> {
        self.read_entries().iter().find(|e| e.id == id).cloned()
    }

    /// Number of entries in the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    /// Check if the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_entries().is_empty()
    }

    /// Wait until every mutation made so far has been written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageWrite`] if that write failed, or
    /// [`Error::PersistWorkerStopped`] if the writer is gone.
    pub async fn flush(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.persist_tx
            .send(PersistRequest::Flush(tx))
            .map_err(|_| Error::PersistWorkerStopped)?;
        rx.await.map_err(|_| Error::PersistWorkerStopped)?
    }

    /// Stop accepting requests, drain the queue and wait for the writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer task panicked.
    pub async fn shutdown(self) -> Result<()> {
        let Self {
            persist_tx, writer, ..
        } = self;
        drop(persist_tx);
        writer
            .await
            .map_err(|e| Error::internal(format!("persistence writer failed: {e}")))
    }

    fn request_persist(&self) {
        if self.persist_tx.send(PersistRequest::Sync).is_err() {
            warn!("Persistence writer stopped; change kept in memory only");
        }
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, Vec<PainEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, Vec<PainEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Run [`EntryStore::load`] off the async executor.
async fn load_blocking(store: EntryStore) -> Result<Vec<PainEntry>> {
    tokio::task::spawn_blocking(move || store.load())
        .await
        .map_err(|e| Error::internal(format!("load task failed: {e}")))
}

/// Keep the first occurrence of each id.
fn dedupe_by_id(entries: Vec<PainEntry>) -> Vec<PainEntry> {
    let mut seen = HashSet::with_capacity(entries.len());
    entries
        .into_iter()
        .filter(|entry| {
            let fresh = seen.insert(entry.id.clone());
            if !fresh {
                warn!(id = %entry.id, "Dropping entry with duplicate id");
            }
            fresh
        })
        .collect()
}

/// The single writer: drains queued requests, then saves one snapshot.
///
/// A batch holding only flushes saves nothing unless an earlier save failed.
async fn run_writer(
    store: EntryStore,
    entries: SharedEntries,
    mut rx: mpsc::UnboundedReceiver<PersistRequest>,
) {
    let mut dirty = false;
    while let Some(first) = rx.recv().await {
        let mut waiters = Vec::new();
        let mut requests = 0usize;
        for request in std::iter::once(first).chain(std::iter::from_fn(|| rx.try_recv().ok())) {
            requests += 1;
            match request {
                PersistRequest::Sync => dirty = true,
                PersistRequest::Flush(tx) => waiters.push(tx),
            }
        }

        if !dirty {
            for waiter in waiters {
                let _ = waiter.send(Ok(()));
            }
            continue;
        }

        let snapshot = entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let count = snapshot.len();
        let task_store = store.clone();
        let outcome = match tokio::task::spawn_blocking(move || task_store.save(&snapshot)).await
        {
            Ok(result) => result,
            Err(e) => Err(Error::internal(format!("persist task failed: {e}"))),
        };

        dirty = outcome.is_err();
        match &outcome {
            Ok(()) => debug!(entries = count, requests, "Persisted pain entries"),
            Err(e) => error!(error = %e, "Error saving pain entries"),
        }

        for waiter in waiters {
            // A waiter that gave up is not an error.
            let _ = waiter.send(outcome.as_ref().map(|_| ()).map_err(replicate_error));
        }
    }
    debug!("Persistence writer stopped");
}

/// Rebuild a write failure for each flush waiter; errors are not `Clone`.
fn replicate_error(err: &Error) -> Error {
    match err {
        Error::StorageWrite { key, source } => {
            Error::storage_write(*key, Error::internal(source.to_string()))
        }
        other => Error::internal(other.to_string()),
    }
}
