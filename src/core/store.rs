//! Ordered, persisted collection of chat sessions.
//!
//! The store owns every [`Session`] and writes the whole collection to its
//! [`SessionStorage`] after each mutation. Sessions are kept most-recent-first
//! and the collection is never left empty.

use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use directories::ProjectDirs;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::core::config::path_display;
use crate::core::persona::Persona;
use crate::core::session::Session;

/// Key under which the session collection is stored.
pub const STORAGE_KEY: &str = "nexus_sessions";

#[derive(Debug)]
pub enum StoreError {
    /// The storage backend failed to read or write.
    Storage(Box<dyn StdError + Send + Sync>),
    /// The stored blob could not be parsed.
    Corrupt {
        location: String,
        source: serde_json::Error,
    },
    /// The collection could not be serialized.
    Serialize(serde_json::Error),
    SessionNotFound(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Storage(source) => write!(f, "Failed to access session storage: {source}"),
            StoreError::Corrupt { location, source } => {
                write!(f, "Saved sessions at {location} are malformed: {source}")
            }
            StoreError::Serialize(source) => write!(f, "Failed to serialize sessions: {source}"),
            StoreError::SessionNotFound(id) => write!(f, "Session '{id}' not found"),
        }
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StoreError::Storage(source) => Some(source.as_ref()),
            StoreError::Corrupt { source, .. } => Some(source),
            StoreError::Serialize(source) => Some(source),
            StoreError::SessionNotFound(_) => None,
        }
    }
}

/// Key-value persistence for the single session blob.
pub trait SessionStorage: Send {
    fn read(&self) -> Result<Option<String>, StoreError>;
    fn write(&mut self, blob: &str) -> Result<(), StoreError>;
    /// Human readable location, used in error messages.
    fn location(&self) -> String;
}

/// Stores the blob as `<dir>/nexus_sessions.json`.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage in the platform data directory.
    pub fn default_location() -> Result<Self, StoreError> {
        let dir = data_dir().ok_or_else(|| {
            StoreError::Storage("Failed to determine data directory".into())
        })?;
        Ok(Self::new(dir.join(format!("{STORAGE_KEY}.json"))))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub(crate) fn data_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "nexus").map(|dirs| dirs.data_dir().to_path_buf())
}

impl SessionStorage for FileStorage {
    fn read(&self) -> Result<Option<String>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&self.path)
            .map(Some)
            .map_err(|err| StoreError::Storage(Box::new(err)))
    }

    fn write(&mut self, blob: &str) -> Result<(), StoreError> {
        let parent = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());

        let storage_err = |err: std::io::Error| StoreError::Storage(Box::new(err));

        if let Some(dir) = parent {
            fs::create_dir_all(dir).map_err(storage_err)?;
        }

        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .map_err(storage_err)?;

        temp_file.write_all(blob.as_bytes()).map_err(storage_err)?;
        temp_file.as_file_mut().sync_all().map_err(storage_err)?;
        temp_file
            .persist(&self.path)
            .map_err(|err| StoreError::Storage(Box::new(err)))?;
        Ok(())
    }

    fn location(&self) -> String {
        path_display(&self.path)
    }
}

/// In-memory storage. Clones share the same cell, so a test can keep a
/// handle and inspect what the store wrote.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryCell>>,
}

#[derive(Default)]
struct MemoryCell {
    blob: Option<String>,
    writes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        let storage = Self::default();
        if let Ok(mut cell) = storage.inner.lock() {
            cell.blob = Some(blob.into());
        }
        storage
    }

    pub fn blob(&self) -> Option<String> {
        self.inner.lock().ok().and_then(|cell| cell.blob.clone())
    }

    pub fn write_count(&self) -> usize {
        self.inner.lock().map(|cell| cell.writes).unwrap_or(0)
    }
}

impl SessionStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, StoreError> {
        let cell = self
            .inner
            .lock()
            .map_err(|_| StoreError::Storage("memory storage poisoned".into()))?;
        Ok(cell.blob.clone())
    }

    fn write(&mut self, blob: &str) -> Result<(), StoreError> {
        let mut cell = self
            .inner
            .lock()
            .map_err(|_| StoreError::Storage("memory storage poisoned".into()))?;
        cell.blob = Some(blob.to_string());
        cell.writes += 1;
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}

/// Parse the saved collection without taking ownership of the storage.
/// Nothing saved reads as an empty list.
pub fn read_sessions(storage: &dyn SessionStorage) -> Result<Vec<Session>, StoreError> {
    match storage.read()? {
        Some(blob) => serde_json::from_str(&blob).map_err(|source| StoreError::Corrupt {
            location: storage.location(),
            source,
        }),
        None => Ok(Vec::new()),
    }
}

pub struct SessionStore {
    sessions: Vec<Session>,
    active_id: String,
    default_persona: Persona,
    storage: Box<dyn SessionStorage>,
}

impl SessionStore {
    /// Restore the saved collection, or start with one fresh session when
    /// nothing (or an empty list) was saved.
    pub fn load(
        storage: Box<dyn SessionStorage>,
        default_persona: Persona,
    ) -> Result<Self, StoreError> {
        let sessions = read_sessions(storage.as_ref())?;

        let mut store = SessionStore {
            active_id: sessions.first().map(|s| s.id.clone()).unwrap_or_default(),
            sessions,
            default_persona,
            storage,
        };

        if store.sessions.is_empty() {
            info!(location = %store.storage.location(), "No saved sessions; starting fresh");
            store.create_session(default_persona)?;
        } else {
            debug!(count = store.sessions.len(), "Loaded saved sessions");
        }

        Ok(store)
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    pub fn active(&self) -> Option<&Session> {
        self.get(&self.active_id)
    }

    pub fn active_index(&self) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == self.active_id)
    }

    pub fn default_persona(&self) -> Persona {
        self.default_persona
    }

    pub fn set_default_persona(&mut self, persona: Persona) {
        self.default_persona = persona;
    }

    pub fn set_active(&mut self, id: &str) -> Result<(), StoreError> {
        if self.get(id).is_none() {
            return Err(StoreError::SessionNotFound(id.to_string()));
        }
        self.active_id = id.to_string();
        Ok(())
    }

    pub fn create_session(&mut self, persona: Persona) -> Result<&Session, StoreError> {
        let session = Session::new(persona);
        debug!(session_id = %session.id, %persona, "Created session");
        self.active_id = session.id.clone();
        self.sessions.insert(0, session);
        self.persist()?;
        Ok(&self.sessions[0])
    }

    /// Remove a session. The collection is refilled with a fresh session
    /// when the last one goes, and the first session becomes active when the
    /// active one was removed.
    pub fn delete_session(&mut self, id: &str) -> Result<(), StoreError> {
        let Some(index) = self.sessions.iter().position(|s| s.id == id) else {
            return Ok(());
        };
        self.sessions.remove(index);
        debug!(session_id = %id, "Deleted session");

        if self.sessions.is_empty() {
            return self.create_session(self.default_persona).map(|_| ());
        }

        if self.active_id == id {
            self.active_id = self.sessions[0].id.clone();
        }
        self.persist()
    }

    /// Apply `mutator` to one session, refresh its `updated_at`, and persist.
    pub fn update_session<F>(&mut self, id: &str, mutator: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Session),
    {
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::SessionNotFound(id.to_string()))?;
        mutator(session);
        session.updated_at = Utc::now();
        self.persist()
    }

    /// Write the entire collection.
    pub fn persist(&mut self) -> Result<(), StoreError> {
        let blob = serde_json::to_string(&self.sessions).map_err(StoreError::Serialize)?;
        self.storage.write(&blob)
    }
}
