//! Durable key-value store for the collection run.
//!
//! The run state is written as one record on every mutation so that a
//! restarted process never sees items from one write next to the page index
//! of another.

use crate::error::StoreError;
use crate::results::{CollectionState, ItemRecord};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};

/// Keys of the persisted record
pub mod keys {
    pub const ITEMS: &str = "items";
    pub const CURRENT_PAGE: &str = "currentPage";
    pub const IS_COLLECTING: &str = "isCollecting";
    pub const TOTAL_PAGES: &str = "totalPages";
    pub const RESUME_URL: &str = "resumeUrl";
    pub const LAST_URL: &str = "lastUrl";
    pub const ENABLED: &str = "enabled";
}

const STATE_KEYS: [&str; 6] = [
    keys::ITEMS,
    keys::CURRENT_PAGE,
    keys::IS_COLLECTING,
    keys::TOTAL_PAGES,
    keys::RESUME_URL,
    keys::LAST_URL,
];

/// Asynchronous, fallible key-value store
#[allow(async_fn_in_trait)]
pub trait Store {
    /// Reads the given keys; absent keys are left out of the result
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError>;

    /// Merges a partial record into the store as one write
    async fn set(&self, record: Map<String, Value>) -> Result<(), StoreError>;
}

/// Store backed by a JSON object in a file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&contents)? {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::Unavailable(format!(
                "expected a JSON object in {}, found {}",
                self.path.display(),
                other
            ))),
        }
    }
}

impl Store for JsonFileStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError> {
        let mut all = self.read_all().await?;
        Ok(keys
            .iter()
            .filter_map(|key| all.remove(*key).map(|value| (key.to_string(), value)))
            .collect())
    }

    async fn set(&self, record: Map<String, Value>) -> Result<(), StoreError> {
        let mut all = self.read_all().await?;
        all.extend(record);

        // Write a sibling file and rename it so readers never see half a record
        let tmp = self.path.with_extension("tmp");
        let body = serde_json::to_vec_pretty(&Value::Object(all))?;
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        ::log::trace!("Wrote state to {}", self.path.display());
        Ok(())
    }
}

/// In-process store, used for tests and as a non-persistent fallback.
///
/// Clones share the same data.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    data: Arc<Mutex<Map<String, Value>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail, to simulate an unavailable store
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Copy of everything stored
    pub fn snapshot(&self) -> Map<String, Value> {
        self.data.lock().map(|data| data.clone()).unwrap_or_default()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }
}

impl Store for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError> {
        self.check()?;
        let data = self
            .data
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(keys
            .iter()
            .filter_map(|key| data.get(*key).map(|value| (key.to_string(), value.clone())))
            .collect())
    }

    async fn set(&self, record: Map<String, Value>) -> Result<(), StoreError> {
        self.check()?;
        let mut data = self
            .data
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        data.extend(record);
        Ok(())
    }
}

/// Encodes the full run record
pub fn state_record(state: &CollectionState) -> Result<Map<String, Value>, StoreError> {
    let mut record = Map::new();
    record.insert(keys::ITEMS.to_string(), serde_json::to_value(&state.items)?);
    record.insert(keys::CURRENT_PAGE.to_string(), json!(state.current_page));
    record.insert(keys::IS_COLLECTING.to_string(), json!(state.is_collecting));
    record.insert(
        keys::TOTAL_PAGES.to_string(),
        json!(state.total_pages_estimate),
    );
    record.insert(keys::RESUME_URL.to_string(), json!(state.resume_url));
    record.insert(keys::LAST_URL.to_string(), json!(state.last_url));
    Ok(record)
}

/// Writes the full run record in one operation
pub async fn save_state<S: Store>(store: &S, state: &CollectionState) -> Result<(), StoreError> {
    store.set(state_record(state)?).await
}

/// Clears the in-progress flag and empties the stored run
pub async fn reset_state<S: Store>(store: &S) -> Result<(), StoreError> {
    save_state(store, &CollectionState::default()).await
}

/// Loads the run in progress, if any
pub async fn load_state<S: Store>(store: &S) -> Result<Option<CollectionState>, StoreError> {
    let record = store.get(&STATE_KEYS).await?;

    let is_collecting = record
        .get(keys::IS_COLLECTING)
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !is_collecting {
        return Ok(None);
    }

    let items: Vec<ItemRecord> = match record.get(keys::ITEMS) {
        Some(Value::Null) | None => Vec::new(),
        Some(value) => serde_json::from_value(value.clone())?,
    };
    let current_page = record
        .get(keys::CURRENT_PAGE)
        .and_then(Value::as_u64)
        .and_then(|page| u32::try_from(page).ok())
        .unwrap_or(1)
        .max(1);
    let total_pages_estimate = record
        .get(keys::TOTAL_PAGES)
        .and_then(Value::as_u64)
        .and_then(|pages| u32::try_from(pages).ok())
        .unwrap_or(0);
    let resume_url = record
        .get(keys::RESUME_URL)
        .and_then(Value::as_str)
        .map(str::to_string);
    let last_url = record
        .get(keys::LAST_URL)
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(Some(CollectionState {
        items,
        current_page,
        is_collecting,
        total_pages_estimate,
        resume_url,
        last_url,
    }))
}

/// Reads the enable flag; anything but an explicit `false` counts as enabled
pub async fn load_enabled<S: Store>(store: &S) -> Result<bool, StoreError> {
    let record = store.get(&[keys::ENABLED]).await?;
    Ok(record.get(keys::ENABLED).and_then(Value::as_bool) != Some(false))
}

/// Persists the enable flag
pub async fn save_enabled<S: Store>(store: &S, enabled: bool) -> Result<(), StoreError> {
    let mut record = Map::new();
    record.insert(keys::ENABLED.to_string(), json!(enabled));
    store.set(record).await
}
