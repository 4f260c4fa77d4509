//! Session-scoped persistence.
//!
//! A [`SessionStore`] is a flat key-value store: `set` persists immediately,
//! `get` returns the last persisted value. [`SessionState`] layers the typed
//! session fields (account, list filter, tracked transactions) on top.

use offset_types::{ListState, Transaction};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

pub const ACCOUNT_ID_KEY: &str = "accountId";
pub const LIST_TYPE_KEY: &str = "listType";
pub const TRANSACTIONS_KEY: &str = "transactions";

/// Key-value persistence collaborator.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value) -> Result<(), crate::Error>;
}

/// In-process store; contents die with the process.
#[derive(Default)]
pub struct MemorySessionStore {
    values: Mutex<Map<String, Value>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<Value> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), crate::Error> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value);
        Ok(())
    }
}

/// One JSON object on disk, rewritten atomically on every `set`.
pub struct FileSessionStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl FileSessionStore {
    /// Open `path`; a missing file is an empty session.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, crate::Error> {
        let path = path.into();
        let values = if path.exists() {
            let data = std::fs::read(&path)
                .map_err(|e| crate::Error::Session(format!("Failed to read session: {e}")))?;
            if data.iter().all(u8::is_ascii_whitespace) {
                Map::new()
            } else {
                serde_json::from_slice(&data)
                    .map_err(|e| crate::Error::Session(format!("Failed to parse session: {e}")))?
            }
        } else {
            info!(path = %path.display(), "No session found, starting fresh");
            Map::new()
        };

        info!(path = %path.display(), keys = values.len(), "Session loaded");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn persist(&self, values: &Map<String, Value>) -> Result<(), crate::Error> {
        let json = serde_json::to_vec_pretty(values)
            .map_err(|e| crate::Error::Session(format!("Failed to serialize session: {e}")))?;

        // Atomic write: tmp + rename
        let tmp = self.path.with_extension("tmp");
        if let Some(parent) = tmp.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                crate::Error::Session(format!("Failed to create session directory: {e}"))
            })?;
        }
        std::fs::write(&tmp, &json)
            .map_err(|e| crate::Error::Session(format!("Failed to write session: {e}")))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| crate::Error::Session(format!("Failed to rename session: {e}")))?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<Value> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), crate::Error> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value);
        self.persist(&values)
    }
}

/// Typed view over the session store, owned by the application shell.
#[derive(Clone)]
pub struct SessionState {
    store: Arc<dyn SessionStore>,
}

impl SessionState {
    /// Seed defaults for keys that are absent or null, then hand out the view.
    pub fn load(store: Arc<dyn SessionStore>) -> Result<Self, crate::Error> {
        let defaults = [
            (ACCOUNT_ID_KEY, Value::String(String::new())),
            (LIST_TYPE_KEY, Value::String(ListState::All.to_string())),
            (TRANSACTIONS_KEY, Value::Array(vec![])),
        ];
        for (key, default) in defaults {
            if store.get(key).map_or(true, |v| v.is_null()) {
                store.set(key, default)?;
            }
        }
        Ok(Self { store })
    }

    pub fn account_id(&self) -> String {
        self.store
            .get(ACCOUNT_ID_KEY)
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    pub fn set_account_id(&self, account_id: &str) -> Result<(), crate::Error> {
        self.store
            .set(ACCOUNT_ID_KEY, Value::String(account_id.to_string()))
    }

    pub fn list_type(&self) -> ListState {
        let raw = self.store.get(LIST_TYPE_KEY);
        match raw.as_ref().and_then(Value::as_str).map(str::parse::<ListState>) {
            Some(Ok(state)) => state,
            Some(Err(e)) => {
                warn!(error = %e, "Stored list type invalid, using ALL");
                ListState::All
            }
            None => ListState::All,
        }
    }

    pub fn set_list_type(&self, list_type: ListState) -> Result<(), crate::Error> {
        self.store
            .set(LIST_TYPE_KEY, Value::String(list_type.to_string()))
    }

    pub fn transactions(&self) -> Result<Vec<Transaction>, crate::Error> {
        match self.store.get(TRANSACTIONS_KEY) {
            None | Some(Value::Null) => Ok(vec![]),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                crate::Error::Session(format!("Stored transactions are invalid: {e}"))
            }),
        }
    }

    pub fn set_transactions(&self, transactions: &[Transaction]) -> Result<(), crate::Error> {
        let value = serde_json::to_value(transactions)
            .map_err(|e| crate::Error::Session(format!("Failed to encode transactions: {e}")))?;
        self.store.set(TRANSACTIONS_KEY, value)
    }
}
