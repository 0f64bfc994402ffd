// crates/digitalis-core/src/runtime/store.rs
// ============================================================================
// Module: Digitalis In-Memory Document Store
// Description: In-memory document store with an asynchronous secondary index.
// Purpose: Provide a deterministic, eventually consistent store for tests.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryDocumentStore`] keeps documents in a mutex-guarded map and hands
//! every write to a dedicated indexer thread. Loads by id see a document as
//! soon as it is written; queries see it only after the indexer has processed
//! it. The indexer can be slowed with [`InMemoryDocumentStore::with_index_delay`]
//! or halted with [`InMemoryDocumentStore::pause_indexing`], which makes
//! consistency races reproducible in tests.
//!
//! [`SharedDocumentStore`] wraps any store in an `Arc` so that every request of
//! a server session observes the same instance.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use serde_json::Value;

use crate::core::DocumentId;
use crate::core::index_terms;
use crate::interfaces::DocumentStore;
use crate::interfaces::IndexQuery;
use crate::interfaces::IndexStats;
use crate::interfaces::StoreError;
use crate::interfaces::StoredDocument;

// ============================================================================
// SECTION: State
// ============================================================================

/// Written document keyed by its global write sequence.
#[derive(Debug)]
struct Record {
    /// Allocated identifier.
    id: DocumentId,
    /// Owning collection.
    collection: String,
    /// JSON body.
    body: Value,
}

/// Term index key: collection, field, term.
type TermKey = (String, String, String);

/// Mutable store state guarded by one mutex.
#[derive(Debug, Default)]
struct State {
    /// Next global write sequence.
    next_write: u64,
    /// Documents by write sequence.
    records: BTreeMap<u64, Record>,
    /// Write sequence by identifier.
    ids: HashMap<DocumentId, u64>,
    /// Per-collection identifier counters.
    counters: HashMap<String, u64>,
    /// Writes awaiting the indexer.
    queue: VecDeque<u64>,
    /// Writes taken by the indexer but not yet published.
    in_flight: u64,
    /// Writes visible to queries.
    indexed: BTreeSet<u64>,
    /// Term postings in write order.
    terms: HashMap<TermKey, BTreeSet<u64>>,
    /// Indexer pause flag.
    paused: bool,
    /// Indexer shutdown flag.
    shutdown: bool,
}

/// State shared with the indexer thread.
#[derive(Debug, Default)]
struct Shared {
    /// Store state.
    state: Mutex<State>,
    /// Wakes the indexer on new work, resume, or shutdown.
    wake: Condvar,
    /// Artificial delay applied to each indexed document.
    index_delay: Duration,
}

impl Shared {
    /// Locks the state, mapping poisoning to a store error.
    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Store("in-memory document store mutex poisoned".to_string()))
    }
}

// ============================================================================
// SECTION: Indexer
// ============================================================================

/// Owns the indexer thread; stops and joins it on drop.
#[derive(Debug)]
struct IndexerHandle {
    /// Shared store state.
    shared: Arc<Shared>,
    /// Indexer thread handle.
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for IndexerHandle {
    fn drop(&mut self) {
        let mut state = match self.shared.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.shutdown = true;
        drop(state);
        self.shared.wake.notify_all();
        let handle = match self.thread.get_mut() {
            Ok(slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

/// Indexer loop: drains the queue one write at a time until shutdown.
fn run_indexer(shared: &Shared) {
    let Ok(mut state) = shared.state.lock() else {
        return;
    };
    loop {
        if state.shutdown {
            return;
        }
        if state.paused || state.queue.is_empty() {
            state = match shared.wake.wait(state) {
                Ok(guard) => guard,
                Err(_) => return,
            };
            continue;
        }
        let Some(write) = state.queue.pop_front() else {
            continue;
        };
        state.in_flight += 1;
        drop(state);
        if !shared.index_delay.is_zero() {
            thread::sleep(shared.index_delay);
        }
        state = match shared.state.lock() {
            Ok(guard) => guard,
            Err(_) => return,
        };
        publish(&mut state, write);
        state.in_flight -= 1;
    }
}

/// Makes one write visible to queries.
fn publish(state: &mut State, write: u64) {
    let Some(record) = state.records.get(&write) else {
        return;
    };
    let keys: Vec<TermKey> = index_terms(&record.body)
        .into_iter()
        .map(|(field, term)| (record.collection.clone(), field, term))
        .collect();
    for key in keys {
        state.terms.entry(key).or_default().insert(write);
    }
    state.indexed.insert(write);
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory eventually consistent document store.
///
/// # Invariants
/// - Clones share the same documents and the same indexer thread.
/// - The indexer thread stops when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct InMemoryDocumentStore {
    /// Shared store state.
    shared: Arc<Shared>,
    /// Indexer thread owner.
    _indexer: Arc<IndexerHandle>,
}

impl InMemoryDocumentStore {
    /// Creates a store whose indexer publishes writes as fast as it can.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the indexer thread cannot be spawned.
    pub fn new() -> Result<Self, StoreError> {
        Self::with_index_delay(Duration::ZERO)
    }

    /// Creates a store whose indexer waits `delay` before publishing each write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the indexer thread cannot be spawned.
    pub fn with_index_delay(delay: Duration) -> Result<Self, StoreError> {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            wake: Condvar::new(),
            index_delay: delay,
        });
        let worker = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name("digitalis-memory-indexer".to_string())
            .spawn(move || run_indexer(&worker))
            .map_err(|err| StoreError::Io(format!("indexer thread spawn failed: {err}")))?;
        let indexer = IndexerHandle {
            shared: Arc::clone(&shared),
            thread: Mutex::new(Some(thread)),
        };
        Ok(Self {
            shared,
            _indexer: Arc::new(indexer),
        })
    }

    /// Stops the indexer from taking new work. Writes stay pending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store state is unavailable.
    pub fn pause_indexing(&self) -> Result<(), StoreError> {
        self.shared.lock()?.paused = true;
        Ok(())
    }

    /// Resumes a paused indexer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store state is unavailable.
    pub fn resume_indexing(&self) -> Result<(), StoreError> {
        self.shared.lock()?.paused = false;
        self.shared.wake.notify_all();
        Ok(())
    }

    /// Returns the number of documents written, indexed or not.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store state is unavailable.
    pub fn document_count(&self) -> Result<usize, StoreError> {
        Ok(self.shared.lock()?.records.len())
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn store(&self, collection: &str, body: Value) -> Result<DocumentId, StoreError> {
        if collection.is_empty() || collection.contains('/') {
            return Err(StoreError::Invalid(format!("invalid collection name: '{collection}'")));
        }
        let mut state = self.shared.lock()?;
        let counter = state.counters.entry(collection.to_string()).or_insert(0);
        *counter += 1;
        let id = DocumentId::from_sequence(collection, *counter);
        state.next_write += 1;
        let write = state.next_write;
        state.records.insert(
            write,
            Record {
                id: id.clone(),
                collection: collection.to_string(),
                body,
            },
        );
        state.ids.insert(id.clone(), write);
        state.queue.push_back(write);
        drop(state);
        self.shared.wake.notify_all();
        Ok(id)
    }

    fn load(&self, id: &DocumentId) -> Result<Option<StoredDocument>, StoreError> {
        let state = self.shared.lock()?;
        Ok(state
            .ids
            .get(id)
            .and_then(|write| state.records.get(write))
            .map(|record| StoredDocument {
                id: record.id.clone(),
                body: record.body.clone(),
            }))
    }

    fn query(&self, query: &IndexQuery) -> Result<Vec<StoredDocument>, StoreError> {
        let state = self.shared.lock()?;
        let writes: Vec<u64> = match query {
            IndexQuery::ById {
                id, ..
            } => state
                .ids
                .get(id)
                .filter(|write| state.indexed.contains(*write))
                .copied()
                .into_iter()
                .collect(),
            IndexQuery::Term {
                collection,
                field,
                term,
            } => state
                .terms
                .get(&(collection.clone(), field.clone(), term.clone()))
                .map(|postings| postings.iter().copied().collect())
                .unwrap_or_default(),
        };
        Ok(writes
            .iter()
            .filter_map(|write| state.records.get(write))
            .filter(|record| record.collection == query.collection())
            .map(|record| StoredDocument {
                id: record.id.clone(),
                body: record.body.clone(),
            })
            .collect())
    }

    fn index_stats(&self) -> Result<IndexStats, StoreError> {
        let state = self.shared.lock()?;
        Ok(IndexStats {
            pending: state.queue.len() as u64 + state.in_flight,
            indexed_documents: state.indexed.len() as u64,
            paused: state.paused,
        })
    }
}

// ============================================================================
// SECTION: Shared Store
// ============================================================================

/// Shared document store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedDocumentStore {
    /// Inner store implementation.
    inner: Arc<dyn DocumentStore>,
}

impl SharedDocumentStore {
    /// Wraps a document store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl DocumentStore + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl std::fmt::Debug for SharedDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedDocumentStore").finish_non_exhaustive()
    }
}

impl DocumentStore for SharedDocumentStore {
    fn store(&self, collection: &str, body: Value) -> Result<DocumentId, StoreError> {
        self.inner.store(collection, body)
    }

    fn load(&self, id: &DocumentId) -> Result<Option<StoredDocument>, StoreError> {
        self.inner.load(id)
    }

    fn query(&self, query: &IndexQuery) -> Result<Vec<StoredDocument>, StoreError> {
        self.inner.query(query)
    }

    fn index_stats(&self) -> Result<IndexStats, StoreError> {
        self.inner.index_stats()
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.inner.readiness()
    }
}
