// crates/digitalis-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Document Store
// Description: Durable DocumentStore backed by SQLite with a queued indexer.
// Purpose: Persist documents and maintain an eventually consistent index.
// Dependencies: digitalis-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteDocumentStore`] writes each document, its per-collection counter
//! bump, and an `index_queue` row in a single transaction. A dedicated indexer
//! thread owns its own connection; it wakes on every write (or every
//! `index_poll_interval_ms`), moves up to `index_batch_size` queued documents
//! into `index_entries` and `index_terms`, and deletes their queue rows in the
//! same transaction. Outstanding index work is therefore exactly the number of
//! rows left in `index_queue`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::sync::mpsc::RecvTimeoutError;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use digitalis_core::DocumentId;
use digitalis_core::DocumentStore;
use digitalis_core::IndexQuery;
use digitalis_core::IndexStats;
use digitalis_core::StoreError;
use digitalis_core::StoredDocument;
use digitalis_core::index_terms;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default indexer poll interval (ms).
const DEFAULT_INDEX_POLL_INTERVAL_MS: u64 = 10;
/// Default number of queued documents indexed per transaction.
const DEFAULT_INDEX_BATCH_SIZE: usize = 64;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum serialized document size accepted by the store.
pub const MAX_DOCUMENT_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` document store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `index_poll_interval_ms` and `index_batch_size` must be greater than zero.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Indexer wake-up interval when no write signal arrives (milliseconds).
    #[serde(default = "default_index_poll_interval_ms")]
    pub index_poll_interval_ms: u64,
    /// Maximum queued documents indexed in one transaction.
    #[serde(default = "default_index_batch_size")]
    pub index_batch_size: usize,
}

impl SqliteStoreConfig {
    /// Builds a config for `path` with default settings.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            index_poll_interval_ms: DEFAULT_INDEX_POLL_INTERVAL_MS,
            index_batch_size: DEFAULT_INDEX_BATCH_SIZE,
        }
    }

    /// Validates runtime limits.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Invalid`] when a limit is zero.
    pub fn validate(&self) -> Result<(), SqliteStoreError> {
        if self.index_poll_interval_ms == 0 {
            return Err(SqliteStoreError::Invalid(
                "index_poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.index_batch_size == 0 {
            return Err(SqliteStoreError::Invalid(
                "index_batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Returns the default busy timeout in milliseconds.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Returns the default indexer poll interval in milliseconds.
const fn default_index_poll_interval_ms() -> u64 {
    DEFAULT_INDEX_POLL_INTERVAL_MS
}

/// Returns the default indexer batch size.
const fn default_index_batch_size() -> usize {
    DEFAULT_INDEX_BATCH_SIZE
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` document store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` reported an error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored data is corrupted.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Schema version is not supported.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Caller supplied invalid data or config.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Document exceeds the size limit.
    #[error("sqlite store payload too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload bytes.
        actual_bytes: usize,
    },
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) | SqliteStoreError::VersionMismatch(message) => {
                Self::Corrupt(message)
            }
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::TooLarge {
                ..
            } => Self::Invalid(error.to_string()),
        }
    }
}

/// Maps a rusqlite error into a store error.
#[allow(clippy::needless_pass_by_value, reason = "Used directly as a map_err adapter.")]
fn db_error(err: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Indexer Runtime
// ============================================================================

/// Signal delivered to the indexer thread.
enum IndexerSignal {
    /// New work was queued.
    Wake,
    /// Stop the indexer.
    Shutdown,
}

/// Owns the indexer thread; stops and joins it on drop.
struct IndexerRuntime {
    /// Signal channel into the indexer.
    sender: Mutex<mpsc::Sender<IndexerSignal>>,
    /// Pause flag shared with the indexer.
    paused: Arc<AtomicBool>,
    /// Indexer thread handle.
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl IndexerRuntime {
    /// Wakes the indexer; a stopped indexer is ignored.
    fn wake(&self) {
        if let Ok(sender) = self.sender.lock() {
            let _ = sender.send(IndexerSignal::Wake);
        }
    }
}

impl Drop for IndexerRuntime {
    fn drop(&mut self) {
        if let Ok(sender) = self.sender.get_mut() {
            let _ = sender.send(IndexerSignal::Shutdown);
        }
        let handle = match self.thread.get_mut() {
            Ok(slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

/// Spawns the dedicated indexer thread with its own connection.
fn spawn_indexer(
    config: &SqliteStoreConfig,
    paused: Arc<AtomicBool>,
) -> Result<IndexerRuntime, SqliteStoreError> {
    let connection = open_connection(config)?;
    let (sender, receiver) = mpsc::channel();
    let poll = Duration::from_millis(config.index_poll_interval_ms);
    let batch_size = config.index_batch_size;
    let flag = Arc::clone(&paused);
    let thread = thread::Builder::new()
        .name("digitalis-sqlite-indexer".to_string())
        .spawn(move || indexer_loop(&connection, &receiver, &flag, poll, batch_size))
        .map_err(|err| {
            SqliteStoreError::Io(format!("failed to spawn sqlite indexer thread: {err}"))
        })?;
    Ok(IndexerRuntime {
        sender: Mutex::new(sender),
        paused,
        thread: Mutex::new(Some(thread)),
    })
}

/// Drains the index queue until shutdown.
fn indexer_loop(
    connection: &Connection,
    receiver: &mpsc::Receiver<IndexerSignal>,
    paused: &AtomicBool,
    poll: Duration,
    batch_size: usize,
) {
    loop {
        match receiver.recv_timeout(poll) {
            Ok(IndexerSignal::Shutdown) | Err(RecvTimeoutError::Disconnected) => return,
            Ok(IndexerSignal::Wake) | Err(RecvTimeoutError::Timeout) => {}
        }
        while !paused.load(Ordering::Acquire) {
            match index_batch(connection, batch_size) {
                Ok(processed) if processed < batch_size => break,
                Ok(_) => {}
                Err(err) => {
                    report_indexer_failure(&err);
                    break;
                }
            }
        }
    }
}

/// Indexes one batch of queued documents; returns how many were processed.
fn index_batch(connection: &Connection, batch_size: usize) -> Result<usize, SqliteStoreError> {
    let limit = i64::try_from(batch_size)
        .map_err(|_| SqliteStoreError::Invalid("index batch size out of range".to_string()))?;
    let tx = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)
        .map_err(db_error)?;
    let queued: Vec<(i64, String, String, String)> = {
        let mut stmt = tx
            .prepare(
                "SELECT q.seq, d.id, d.collection, d.body
                 FROM index_queue q JOIN documents d ON d.id = q.document_id
                 ORDER BY q.seq LIMIT ?1",
            )
            .map_err(db_error)?;
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })
            .map_err(db_error)?;
        rows.collect::<Result<_, _>>().map_err(db_error)?
    };
    for (seq, id, collection, body) in &queued {
        let value: Value = serde_json::from_str(body)
            .map_err(|err| SqliteStoreError::Corrupt(format!("document {id}: {err}")))?;
        for (field, term) in index_terms(&value) {
            tx.execute(
                "INSERT OR IGNORE INTO index_terms (collection, field, term, document_id)
                 VALUES (?1, ?2, ?3, ?4)",
                params![collection, field, term, id],
            )
            .map_err(db_error)?;
        }
        tx.execute(
            "INSERT OR IGNORE INTO index_entries (document_id, collection) VALUES (?1, ?2)",
            params![id, collection],
        )
        .map_err(db_error)?;
        tx.execute("DELETE FROM index_queue WHERE seq = ?1", params![seq]).map_err(db_error)?;
    }
    tx.commit().map_err(db_error)?;
    Ok(queued.len())
}

/// Emits an indexer failure as a JSON line on stderr.
fn report_indexer_failure(error: &SqliteStoreError) {
    let event = serde_json::json!({
        "event": "sqlite_indexer_failure",
        "error": error.to_string(),
    });
    let _ = writeln!(std::io::stderr(), "{event}");
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed eventually consistent document store.
///
/// # Invariants
/// - Clones share the same connection and indexer thread.
/// - The indexer stops when the last clone is dropped.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Connection used for writes and reads.
    connection: Arc<Mutex<Connection>>,
    /// Indexer runtime owner.
    indexer: Arc<IndexerRuntime>,
}

impl SqliteDocumentStore {
    /// Opens an `SQLite`-backed document store and starts its indexer.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        config.validate()?;
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        let indexer = spawn_indexer(&config, Arc::new(AtomicBool::new(false)))?;
        let store = Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
            indexer: Arc::new(indexer),
        };
        store.indexer.wake();
        Ok(store)
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Stops the indexer from taking new batches. Writes stay pending.
    pub fn pause_indexing(&self) {
        self.indexer.paused.store(true, Ordering::Release);
    }

    /// Resumes a paused indexer.
    pub fn resume_indexing(&self) {
        self.indexer.paused.store(false, Ordering::Release);
        self.indexer.wake();
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite connection mutex poisoned".to_string()))
    }

    /// Writes a document and queues it for indexing.
    fn write_document(
        &self,
        collection: &str,
        body: &Value,
    ) -> Result<DocumentId, SqliteStoreError> {
        if collection.is_empty() || collection.contains('/') {
            return Err(SqliteStoreError::Invalid(format!(
                "invalid collection name: '{collection}'"
            )));
        }
        let payload =
            serde_json::to_string(body).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        if payload.len() > MAX_DOCUMENT_BYTES {
            return Err(SqliteStoreError::TooLarge {
                max_bytes: MAX_DOCUMENT_BYTES,
                actual_bytes: payload.len(),
            });
        }
        let guard = self.lock()?;
        let tx = Transaction::new_unchecked(&guard, TransactionBehavior::Immediate)
            .map_err(db_error)?;
        let previous: Option<i64> = tx
            .query_row(
                "SELECT last_seq FROM collection_counters WHERE collection = ?1",
                params![collection],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_error)?;
        let next = previous.unwrap_or(0) + 1;
        tx.execute(
            "INSERT INTO collection_counters (collection, last_seq) VALUES (?1, ?2)
             ON CONFLICT(collection) DO UPDATE SET last_seq = excluded.last_seq",
            params![collection, next],
        )
        .map_err(db_error)?;
        let sequence = u64::try_from(next)
            .map_err(|_| SqliteStoreError::Corrupt("negative collection counter".to_string()))?;
        let id = DocumentId::from_sequence(collection, sequence);
        tx.execute(
            "INSERT INTO documents (id, collection, body) VALUES (?1, ?2, ?3)",
            params![id.as_str(), collection, payload],
        )
        .map_err(db_error)?;
        tx.execute("INSERT INTO index_queue (document_id) VALUES (?1)", params![id.as_str()])
            .map_err(db_error)?;
        tx.commit().map_err(db_error)?;
        drop(guard);
        self.indexer.wake();
        Ok(id)
    }

    /// Loads a document row by id.
    fn read_document(&self, id: &DocumentId) -> Result<Option<StoredDocument>, SqliteStoreError> {
        let guard = self.lock()?;
        let body: Option<String> = guard
            .query_row("SELECT body FROM documents WHERE id = ?1", params![id.as_str()], |row| {
                row.get(0)
            })
            .optional()
            .map_err(db_error)?;
        body.map(|body| decode_document(id.as_str().to_string(), &body)).transpose()
    }

    /// Runs an index query.
    fn run_query(&self, query: &IndexQuery) -> Result<Vec<StoredDocument>, SqliteStoreError> {
        let guard = self.lock()?;
        let rows: Vec<(String, String)> = match query {
            IndexQuery::ById {
                collection,
                id,
            } => {
                let mut stmt = guard
                    .prepare(
                        "SELECT d.id, d.body FROM index_entries e
                         JOIN documents d ON d.id = e.document_id
                         WHERE e.document_id = ?1 AND e.collection = ?2",
                    )
                    .map_err(db_error)?;
                let mapped = stmt
                    .query_map(params![id.as_str(), collection], |row| {
                        Ok((row.get(0)?, row.get(1)?))
                    })
                    .map_err(db_error)?;
                mapped.collect::<Result<_, _>>().map_err(db_error)?
            }
            IndexQuery::Term {
                collection,
                field,
                term,
            } => {
                let mut stmt = guard
                    .prepare(
                        "SELECT d.id, d.body FROM index_terms t
                         JOIN documents d ON d.id = t.document_id
                         WHERE t.collection = ?1 AND t.field = ?2 AND t.term = ?3
                         ORDER BY d.rowid",
                    )
                    .map_err(db_error)?;
                let mapped = stmt
                    .query_map(params![collection, field, term], |row| {
                        Ok((row.get(0)?, row.get(1)?))
                    })
                    .map_err(db_error)?;
                mapped.collect::<Result<_, _>>().map_err(db_error)?
            }
        };
        rows.into_iter().map(|(id, body)| decode_document(id, &body)).collect()
    }

    /// Reads index progress counters.
    fn read_stats(&self) -> Result<IndexStats, SqliteStoreError> {
        let guard = self.lock()?;
        let pending: i64 = guard
            .query_row("SELECT COUNT(1) FROM index_queue", [], |row| row.get(0))
            .map_err(db_error)?;
        let indexed: i64 = guard
            .query_row("SELECT COUNT(1) FROM index_entries", [], |row| row.get(0))
            .map_err(db_error)?;
        Ok(IndexStats {
            pending: to_count(pending)?,
            indexed_documents: to_count(indexed)?,
            paused: self.indexer.paused.load(Ordering::Acquire),
        })
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn store(&self, collection: &str, body: Value) -> Result<DocumentId, StoreError> {
        self.write_document(collection, &body).map_err(StoreError::from)
    }

    fn load(&self, id: &DocumentId) -> Result<Option<StoredDocument>, StoreError> {
        self.read_document(id).map_err(StoreError::from)
    }

    fn query(&self, query: &IndexQuery) -> Result<Vec<StoredDocument>, StoreError> {
        self.run_query(query).map_err(StoreError::from)
    }

    fn index_stats(&self) -> Result<IndexStats, StoreError> {
        self.read_stats().map_err(StoreError::from)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        guard
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map(|_| ())
            .map_err(|err| StoreError::from(db_error(err)))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Decodes a stored JSON body.
fn decode_document(id: String, body: &str) -> Result<StoredDocument, SqliteStoreError> {
    let value = serde_json::from_str(body)
        .map_err(|err| SqliteStoreError::Corrupt(format!("document {id}: {err}")))?;
    Ok(StoredDocument {
        id: DocumentId::new(id),
        body: value,
    })
}

/// Converts a `SQLite` count into `u64`.
fn to_count(value: i64) -> Result<u64, SqliteStoreError> {
    u64::try_from(value).map_err(|_| SqliteStoreError::Corrupt(format!("negative count: {value}")))
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    if path.display().to_string().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies journal, sync, and busy-timeout pragmas.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_error)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_error)?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS collection_counters (
                    collection TEXT PRIMARY KEY,
                    last_seq INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS documents (
                    id TEXT PRIMARY KEY,
                    collection TEXT NOT NULL,
                    body TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS index_queue (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    document_id TEXT NOT NULL REFERENCES documents(id)
                );
                CREATE TABLE IF NOT EXISTS index_entries (
                    document_id TEXT PRIMARY KEY REFERENCES documents(id),
                    collection TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS index_terms (
                    collection TEXT NOT NULL,
                    field TEXT NOT NULL,
                    term TEXT NOT NULL,
                    document_id TEXT NOT NULL REFERENCES documents(id),
                    PRIMARY KEY (collection, field, term, document_id)
                );",
            )
            .map_err(db_error)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_error)?;
    Ok(())
}
