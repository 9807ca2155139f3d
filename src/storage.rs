use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::crypto::{self, KdfParams, Passphrase};
use crate::models::CalendarDay;
use crate::symptoms::Symptom;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("crypto error: {0}")]
    Crypto(#[from] crypto::CryptoError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("data directory not found")]
    NoDataDir,
    #[error("no journal has been created yet")]
    Missing,
}

/// Persisted form of a journal. Days are stored as `YYYY-MM-DD` strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JournalData {
    pub period_days: Vec<CalendarDay>,
    #[serde(default)]
    pub symptoms: BTreeMap<CalendarDay, Vec<Symptom>>,
}

/// Somewhere a journal can be kept between sessions.
pub trait JournalStore {
    fn exists(&self) -> Result<bool, StorageError>;
    fn load(&self) -> Result<JournalData, StorageError>;
    fn save(&mut self, data: &JournalData) -> Result<(), StorageError>;
    fn wipe(&mut self) -> Result<(), StorageError>;
}

/// Default journal location under the platform's local data directory.
pub fn default_journal_path() -> Result<PathBuf, StorageError> {
    let dir = dirs::data_local_dir()
        .ok_or(StorageError::NoDataDir)?
        .join("cykel");
    Ok(dir.join("journal.cykel"))
}

/// Passphrase-encrypted journal file.
#[derive(Debug)]
pub struct EncryptedFileStore {
    path: PathBuf,
    passphrase: Passphrase,
    kdf: KdfParams,
}

impl EncryptedFileStore {
    pub fn new(path: impl Into<PathBuf>, passphrase: Passphrase, kdf: KdfParams) -> Self {
        Self {
            path: path.into(),
            passphrase,
            kdf,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl JournalStore for EncryptedFileStore {
    fn exists(&self) -> Result<bool, StorageError> {
        Ok(self.path.exists())
    }

    fn load(&self) -> Result<JournalData, StorageError> {
        if !self.path.exists() {
            return Err(StorageError::Missing);
        }
        let sealed = fs::read(&self.path)?;
        let json = crypto::open(&self.passphrase, &sealed, self.kdf)?;
        let data: JournalData = serde_json::from_slice(&json)?;
        info!(
            path = %self.path.display(),
            period_days = data.period_days.len(),
            "loaded journal"
        );
        Ok(data)
    }

    fn save(&mut self, data: &JournalData) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec(data)?;
        let sealed = crypto::seal(&self.passphrase, &json, self.kdf)?;
        fs::write(&self.path, sealed)?;
        info!(
            path = %self.path.display(),
            period_days = data.period_days.len(),
            "saved journal"
        );
        Ok(())
    }

    fn wipe(&mut self) -> Result<(), StorageError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            info!(path = %self.path.display(), "wiped journal");
        }
        Ok(())
    }
}

/// In-process store, useful for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Option<JournalData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JournalStore for MemoryStore {
    fn exists(&self) -> Result<bool, StorageError> {
        Ok(self.data.is_some())
    }

    fn load(&self) -> Result<JournalData, StorageError> {
        self.data.clone().ok_or(StorageError::Missing)
    }

    fn save(&mut self, data: &JournalData) -> Result<(), StorageError> {
        self.data = Some(data.clone());
        Ok(())
    }

    fn wipe(&mut self) -> Result<(), StorageError> {
        self.data = None;
        Ok(())
    }
}
