use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use moka::sync::Cache;
use rkyv::rancor::Error as RkyvError;
use rkyv::util::AlignedVec;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::error::{StoreError, StoreResult};
use super::model::ExclusionRecord;
use super::{UsedPairStore, WordPair};
use crate::hashing::user_storage_key;

const LOG_EXTENSION: &str = "pairs.rkyv";

/// First bytes of every log file.
const LOG_MAGIC: &[u8; 8] = b"WGPAIRS1";

/// Each record is framed as a little-endian `u32` length followed by its rkyv bytes.
const FRAME_HEADER: usize = 4;

#[derive(Debug, Default)]
struct UserPairs {
    pairs: HashSet<WordPair>,
    records: Vec<ExclusionRecord>,
}

impl UserPairs {
    fn from_records(records: Vec<ExclusionRecord>) -> Self {
        let pairs = records.iter().map(ExclusionRecord::pair).collect();
        Self { pairs, records }
    }
}

/// One user's log file and its in-memory copy.
///
/// The slot is empty until the log is first read. Any call that is cancelled
/// or fails while the slot is taken leaves it empty, so the next call reloads
/// from disk instead of trusting a copy that may disagree with the file.
struct UserLog {
    path: PathBuf,
    slot: Mutex<Option<UserPairs>>,
}

impl UserLog {
    async fn take_loaded(
        &self,
        slot: &mut Option<UserPairs>,
        user_id: &str,
    ) -> StoreResult<UserPairs> {
        if let Some(loaded) = slot.take() {
            return Ok(loaded);
        }

        let path = self.path.clone();
        let user_id = user_id.to_string();
        let records = blocking(move || load_log(&path, &user_id)).await?;
        Ok(UserPairs::from_records(records))
    }

    async fn read<T>(&self, user_id: &str, f: impl FnOnce(&UserPairs) -> T) -> StoreResult<T> {
        let mut slot = self.slot.lock().await;
        let loaded = self.take_loaded(&mut slot, user_id).await?;
        let value = f(&loaded);
        *slot = Some(loaded);
        Ok(value)
    }
}

/// File-backed store: one append-only rkyv log per user under `root`.
///
/// All file I/O runs on the blocking pool, so callers can time out a stalled
/// disk. Each user has their own lock; users never wait on each other. Loaded
/// logs live in a bounded cache and are re-read from disk after eviction.
///
/// A log is compacted when it is loaded with a torn tail or duplicate records.
pub struct FileUsedPairStore {
    root: PathBuf,
    users: Cache<String, Arc<UserLog>>,
}

impl FileUsedPairStore {
    /// Loaded user logs kept in memory by [`FileUsedPairStore::open`].
    pub const DEFAULT_CAPACITY: u64 = 10_000;

    /// Opens (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::with_capacity(root, Self::DEFAULT_CAPACITY)
    }

    /// Like [`FileUsedPairStore::open`], keeping at most `capacity` user logs loaded.
    pub fn with_capacity(root: impl Into<PathBuf>, capacity: u64) -> StoreResult<Self> {
        let root = root.into();
        if !root.exists() {
            fs::create_dir_all(&root).map_err(|e| StoreError::Unavailable {
                reason: format!("cannot create {}: {}", root.display(), e),
            })?;
        }
        if !root.is_dir() {
            return Err(StoreError::Unavailable {
                reason: format!("{} is not a directory", root.display()),
            });
        }

        info!(root = %root.display(), capacity, "Used-pair store opened");

        Ok(Self {
            root,
            users: Cache::builder().max_capacity(capacity).build(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the user's records in insertion order.
    pub async fn records(&self, user_id: &str) -> StoreResult<Vec<ExclusionRecord>> {
        self.user_log(user_id)
            .read(user_id, |loaded| loaded.records.clone())
            .await
    }

    /// Number of users whose logs are currently held in memory.
    ///
    /// Approximate until [`FileUsedPairStore::run_pending_tasks`] has run.
    pub fn loaded_users(&self) -> u64 {
        self.users.entry_count()
    }

    pub fn run_pending_tasks(&self) {
        self.users.run_pending_tasks();
    }

    /// Drops the user's in-memory copy. The log on disk is untouched.
    pub fn evict(&self, user_id: &str) {
        self.users.invalidate(user_id);
    }

    fn log_path(&self, user_id: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", user_storage_key(user_id), LOG_EXTENSION))
    }

    fn user_log(&self, user_id: &str) -> Arc<UserLog> {
        self.users.get_with(user_id.to_string(), || {
            Arc::new(UserLog {
                path: self.log_path(user_id),
                slot: Mutex::new(None),
            })
        })
    }
}

impl UsedPairStore for FileUsedPairStore {
    async fn is_used(&self, user_id: &str, pair: &WordPair) -> StoreResult<bool> {
        self.user_log(user_id)
            .read(user_id, |loaded| loaded.pairs.contains(pair))
            .await
    }

    async fn record_used(&self, user_id: &str, pair: &WordPair) -> StoreResult<bool> {
        let log = self.user_log(user_id);
        let mut slot = log.slot.lock().await;
        let mut loaded = log.take_loaded(&mut slot, user_id).await?;

        if loaded.pairs.contains(pair) {
            *slot = Some(loaded);
            return Ok(false);
        }

        let record = ExclusionRecord::new(user_id, pair, chrono::Utc::now().timestamp());
        let frame = match encode_frame(&record) {
            Ok(frame) => frame,
            Err(err) => {
                *slot = Some(loaded);
                return Err(err);
            }
        };

        // A failed append may leave a partial frame; the empty slot forces a
        // reload, which truncates it before the next write.
        let path = log.path.clone();
        blocking(move || append_frame(&path, &frame)).await?;

        loaded.pairs.insert(pair.clone());
        loaded.records.push(record);
        *slot = Some(loaded);

        debug!(user_id, pair = %pair, "Recorded used pair");
        Ok(true)
    }

    async fn all_used(&self, user_id: &str) -> StoreResult<HashSet<WordPair>> {
        self.user_log(user_id)
            .read(user_id, |loaded| loaded.pairs.clone())
            .await
    }
}

impl std::fmt::Debug for FileUsedPairStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUsedPairStore")
            .field("root", &self.root)
            .field("loaded_users", &self.loaded_users())
            .finish()
    }
}

async fn blocking<T, F>(f: F) -> StoreResult<T>
where
    F: FnOnce() -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Unavailable {
            reason: format!("store task failed: {e}"),
        })?
}

fn io_error(path: &Path) -> impl Fn(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn encode_frame(record: &ExclusionRecord) -> StoreResult<Vec<u8>> {
    let body = rkyv::to_bytes::<RkyvError>(record)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    let len = u32::try_from(body.len())
        .map_err(|_| StoreError::Serialization(format!("record of {} bytes", body.len())))?;

    let mut frame = Vec::with_capacity(FRAME_HEADER + body.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

fn append_frame(path: &Path, frame: &[u8]) -> StoreResult<()> {
    let io_err = io_error(path);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(&io_err)?;

    let fresh = file.metadata().map_err(&io_err)?.len() == 0;
    let mut bytes = Vec::with_capacity(LOG_MAGIC.len() + frame.len());
    if fresh {
        bytes.extend_from_slice(LOG_MAGIC);
    }
    bytes.extend_from_slice(frame);

    file.write_all(&bytes).map_err(&io_err)?;
    file.sync_data().map_err(&io_err)?;
    Ok(())
}

/// Reads every record of `user_id`'s log, compacting it if needed.
fn load_log(path: &Path, user_id: &str) -> StoreResult<Vec<ExclusionRecord>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let corrupt = |reason: String| StoreError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };

    if bytes.len() < LOG_MAGIC.len() {
        if LOG_MAGIC.starts_with(&bytes) {
            // Crashed while creating the log: nothing was ever recorded.
            if !bytes.is_empty() {
                rewrite_log(path, &[])?;
            }
            return Ok(Vec::new());
        }
        return Err(corrupt("missing log header".to_string()));
    }
    if &bytes[..LOG_MAGIC.len()] != LOG_MAGIC {
        return Err(corrupt("missing log header".to_string()));
    }

    let mut records = Vec::new();
    let mut seen = HashSet::new();
    let mut needs_compaction = false;
    let mut rest = &bytes[LOG_MAGIC.len()..];

    while !rest.is_empty() {
        let Some(body) = next_frame(rest) else {
            warn!(path = %path.display(), torn_bytes = rest.len(), "Used-pair log has a torn tail");
            needs_compaction = true;
            break;
        };
        rest = &rest[FRAME_HEADER + body.len()..];

        let mut aligned = AlignedVec::<16>::with_capacity(body.len());
        aligned.extend_from_slice(body);
        let record = rkyv::from_bytes::<ExclusionRecord, RkyvError>(&aligned)
            .map_err(|e| corrupt(e.to_string()))?;

        if record.user_id != user_id {
            return Err(corrupt(format!(
                "record belongs to user '{}'",
                record.user_id
            )));
        }
        if seen.insert(record.pair()) {
            records.push(record);
        } else {
            needs_compaction = true;
        }
    }

    if needs_compaction {
        rewrite_log(path, &records)?;
        info!(user_id, records = records.len(), "Compacted used-pair log");
    }

    debug!(user_id, records = records.len(), "Loaded used-pair log");
    Ok(records)
}

fn next_frame(bytes: &[u8]) -> Option<&[u8]> {
    let header: [u8; FRAME_HEADER] = bytes.get(..FRAME_HEADER)?.try_into().ok()?;
    let len = u32::from_le_bytes(header) as usize;
    bytes.get(FRAME_HEADER..FRAME_HEADER + len)
}

/// Replaces the log through a temp file and an atomic rename.
fn rewrite_log(path: &Path, records: &[ExclusionRecord]) -> StoreResult<()> {
    let mut bytes = LOG_MAGIC.to_vec();
    for record in records {
        bytes.extend_from_slice(&encode_frame(record)?);
    }

    let io_err = io_error(path);
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(&io_err)?;
    temp.write_all(&bytes).map_err(&io_err)?;
    temp.as_file().sync_all().map_err(&io_err)?;
    temp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
