//! Session persistence keyed by document content hash

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use firma_types::DocumentState;
use sha2::{Digest, Sha256};

use crate::error::FirmaError;
use crate::signatures::SignatureLibrary;

const LIBRARY_FILE: &str = "signatures.json";

/// Lower-case hex SHA-256 of the document bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Pick whichever state was modified last. Ties keep `local`.
pub fn prefer_newer(local: Option<DocumentState>, remote: Option<DocumentState>) -> Option<DocumentState> {
    match (local, remote) {
        (Some(local), Some(remote)) => {
            if remote.last_modified > local.last_modified {
                Some(remote)
            } else {
                Some(local)
            }
        }
        (local, remote) => local.or(remote),
    }
}

pub trait SessionStore {
    fn load(&self, hash: &str) -> Result<Option<DocumentState>, FirmaError>;
    fn save(&self, state: &DocumentState) -> Result<(), FirmaError>;
    fn clear(&self, hash: &str) -> Result<(), FirmaError>;
}

/// One JSON document per hash under a directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn state_path(&self, hash: &str) -> Result<PathBuf, FirmaError> {
        if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(FirmaError::StorageError(format!("invalid document hash: {:?}", hash)));
        }
        Ok(self.dir.join(format!("{}.json", hash)))
    }

    pub fn load_library(&self) -> Result<SignatureLibrary, FirmaError> {
        let path = self.dir.join(LIBRARY_FILE);
        if !path.exists() {
            return Ok(SignatureLibrary::new());
        }
        let data = std::fs::read(&path)?;
        serde_json::from_slice(&data).map_err(|e| FirmaError::SerializationError(e.to_string()))
    }

    pub fn save_library(&self, library: &SignatureLibrary) -> Result<(), FirmaError> {
        let json = serde_json::to_vec_pretty(library)
            .map_err(|e| FirmaError::SerializationError(e.to_string()))?;
        write_atomic(&self.dir.join(LIBRARY_FILE), &json)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self, hash: &str) -> Result<Option<DocumentState>, FirmaError> {
        let path = self.state_path(hash)?;
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read(&path)?;
        let state = serde_json::from_slice(&data)
            .map_err(|e| FirmaError::SerializationError(e.to_string()))?;
        Ok(Some(state))
    }

    fn save(&self, state: &DocumentState) -> Result<(), FirmaError> {
        let path = self.state_path(&state.hash)?;
        let json = serde_json::to_vec_pretty(state)
            .map_err(|e| FirmaError::SerializationError(e.to_string()))?;
        write_atomic(&path, &json)?;
        tracing::debug!(hash = %state.hash, fields = state.text_fields.len(), "Session saved");
        Ok(())
    }

    fn clear(&self, hash: &str) -> Result<(), FirmaError> {
        let path = self.state_path(hash)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write to a uniquely named temporary sibling, then rename over `path`.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<(), FirmaError> {
    if path.file_name().is_none() {
        return Err(FirmaError::StorageError(format!("not a file path: {}", path.display())));
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| FirmaError::Io(e.error))?;
    Ok(())
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    states: Mutex<HashMap<String, DocumentState>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, hash: &str) -> Result<Option<DocumentState>, FirmaError> {
        let states = self
            .states
            .lock()
            .map_err(|e| FirmaError::StorageError(e.to_string()))?;
        Ok(states.get(hash).cloned())
    }

    fn save(&self, state: &DocumentState) -> Result<(), FirmaError> {
        let mut states = self
            .states
            .lock()
            .map_err(|e| FirmaError::StorageError(e.to_string()))?;
        states.insert(state.hash.clone(), state.clone());
        Ok(())
    }

    fn clear(&self, hash: &str) -> Result<(), FirmaError> {
        let mut states = self
            .states
            .lock()
            .map_err(|e| FirmaError::StorageError(e.to_string()))?;
        states.remove(hash);
        Ok(())
    }
}
