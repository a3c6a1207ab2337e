//! Durable flat key-value store.
//!
//! Keys used by the colony:
//!
//! - `agents/<id>`: one [`AgentRecord`] per live agent
//! - `requests/<partition>`: the partition's pending [`RequestQueue`]
//! - `meta`: counters that must survive between cycles ([`Meta`])
//!
//! Keys enumerate in lexicographic order.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::agent::AgentRecord;
use crate::core::arbitration::RequestQueue;
use crate::io::{validate_schema, write_atomic};

pub const STORE_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/schemas/store.schema.json"
));

pub const STORE_VERSION: u64 = 1;

const AGENT_PREFIX: &str = "agents/";
const REQUEST_PREFIX: &str = "requests/";
const META_KEY: &str = "meta";

pub trait Store {
    fn get(&self, key: &str) -> Option<&Value>;

    fn put(&mut self, key: &str, value: Value);

    /// Returns `true` if the key existed.
    fn delete(&mut self, key: &str) -> bool;

    /// Keys starting with `prefix`, in lexicographic order.
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;
}

/// In-memory store, used by tests and by the simulation harness.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &BTreeMap<String, Value> {
        &self.entries
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    fn put(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        prefix_keys(&self.entries, prefix)
    }
}

fn prefix_keys(entries: &BTreeMap<String, Value>, prefix: &str) -> Vec<String> {
    entries
        .range(prefix.to_string()..)
        .take_while(|(key, _)| key.starts_with(prefix))
        .map(|(key, _)| key.clone())
        .collect()
}

/// Store backed by a single JSON file, written atomically on [`FileStore::commit`].
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct StoreFile {
    entries: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize)]
struct StoreFileRef<'a> {
    version: u64,
    entries: &'a BTreeMap<String, Value>,
}

impl FileStore {
    /// Open the store at `path`. A missing file opens empty.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "store missing; starting empty");
            return Ok(Self {
                path: path.to_path_buf(),
                entries: BTreeMap::new(),
            });
        }
        let contents =
            fs::read_to_string(path).with_context(|| format!("read store {}", path.display()))?;
        let value: Value = serde_json::from_str(&contents)
            .with_context(|| format!("parse store {}", path.display()))?;
        validate_store_schema(&value)?;
        let file: StoreFile = serde_json::from_value(value)
            .with_context(|| format!("deserialize store {}", path.display()))?;
        debug!(path = %path.display(), entries = file.entries.len(), "store loaded");
        Ok(Self {
            path: path.to_path_buf(),
            entries: file.entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate and atomically write every entry to disk.
    pub fn commit(&self) -> Result<()> {
        let value = serde_json::to_value(StoreFileRef {
            version: STORE_VERSION,
            entries: &self.entries,
        })
        .context("encode store")?;
        validate_store_schema(&value)?;
        let mut buf = serde_json::to_string_pretty(&value)?;
        buf.push('\n');
        debug!(path = %self.path.display(), entries = self.entries.len(), "committing store");
        write_atomic(&self.path, &buf)
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    fn put(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        prefix_keys(&self.entries, prefix)
    }
}

/// Validate a whole store document against the embedded schema.
pub fn validate_store_schema(value: &Value) -> Result<()> {
    validate_schema(STORE_SCHEMA, value, "store")
}

/// Counters persisted under `meta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// Next creation request submission number (1-indexed, monotonically increasing).
    pub next_submission: u64,
}

impl Default for Meta {
    fn default() -> Self {
        Self { next_submission: 1 }
    }
}

pub fn agent_key(id: &str) -> String {
    format!("{}{}", AGENT_PREFIX, id)
}

pub fn queue_key(partition: &str) -> String {
    format!("{}{}", REQUEST_PREFIX, partition)
}

/// All agent records, ordered by id.
pub fn load_agents(store: &dyn Store) -> Result<Vec<AgentRecord>> {
    store
        .keys_with_prefix(AGENT_PREFIX)
        .iter()
        .filter_map(|key| store.get(key).map(|value| (key, value)))
        .map(|(key, value)| {
            serde_json::from_value(value.clone()).with_context(|| format!("decode {}", key))
        })
        .collect()
}

pub fn put_agent(store: &mut dyn Store, record: &AgentRecord) -> Result<()> {
    let value = serde_json::to_value(record)
        .with_context(|| format!("encode agent {}", record.id))?;
    store.put(&agent_key(&record.id), value);
    Ok(())
}

pub fn delete_agent(store: &mut dyn Store, id: &str) -> bool {
    store.delete(&agent_key(id))
}

/// Pending requests for `partition`; empty if none are stored.
pub fn load_queue(store: &dyn Store, partition: &str) -> Result<RequestQueue> {
    let key = queue_key(partition);
    match store.get(&key) {
        Some(value) => {
            serde_json::from_value(value.clone()).with_context(|| format!("decode {}", key))
        }
        None => Ok(RequestQueue::default()),
    }
}

/// Persist `queue`; an empty queue deletes the key.
pub fn put_queue(store: &mut dyn Store, partition: &str, queue: &RequestQueue) -> Result<()> {
    let key = queue_key(partition);
    if queue.is_empty() {
        store.delete(&key);
        return Ok(());
    }
    let value = serde_json::to_value(queue).with_context(|| format!("encode {}", key))?;
    store.put(&key, value);
    Ok(())
}

/// Partitions with a stored request queue, in name order.
pub fn queued_partitions(store: &dyn Store) -> Vec<String> {
    store
        .keys_with_prefix(REQUEST_PREFIX)
        .iter()
        .filter_map(|key| key.strip_prefix(REQUEST_PREFIX))
        .map(str::to_string)
        .collect()
}

pub fn load_meta(store: &dyn Store) -> Result<Meta> {
    match store.get(META_KEY) {
        Some(value) => serde_json::from_value(value.clone()).context("decode meta"),
        None => Ok(Meta::default()),
    }
}

pub fn put_meta(store: &mut dyn Store, meta: &Meta) -> Result<()> {
    store.put(META_KEY, serde_json::to_value(meta).context("encode meta")?);
    Ok(())
}
