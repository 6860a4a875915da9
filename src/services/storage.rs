//! Local key-value medium the trip lists live in.
//!
//! Values are whole strings under string keys, mirroring a browser's local
//! storage. A write replaces the previous value in one step.

use std::{
    collections::HashMap,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::AppError;

const VALUE_EXTENSION: &str = "json";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Replaces the value under `key` as a whole.
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
}

/// One file per key below `root`.
#[derive(Clone)]
pub struct FileStore {
    root: Arc<PathBuf>,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_structure(&self) -> Result<(), AppError> {
        fs::create_dir_all(self.root())?;
        Ok(())
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root()
            .join(format!("{}.{VALUE_EXTENSION}", escape_key(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        match fs::read(self.path_for(key)) {
            // Non-UTF-8 content is handed on lossily; the decoder rejects it.
            Ok(raw) => Ok(Some(String::from_utf8_lossy(&raw).into_owned())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.ensure_structure()?;
        let path = self.path_for(key);
        // Each write stages its own temp file, so overlapping writers never
        // publish each other's partial output.
        let mut staged = NamedTempFile::new_in(self.root())?;
        staged.write_all(value.as_bytes())?;
        staged.persist(&path).map_err(|err| err.error)?;
        debug!("wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

/// Volatile store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        inner.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn poisoned() -> AppError {
    AppError::Other(anyhow::anyhow!("memory store lock poisoned"))
}

/// Maps a key onto a file name. Injective: `[A-Za-z0-9._@-]` passes through,
/// every other byte (including `%`) becomes `%XX`.
fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'@' | b'-' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}
