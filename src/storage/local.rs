//! Local filesystem storage implementation.
//!
//! State files are CSV with the header `url,title,location,rooms,rent,time`,
//! where `time` is the ISO 8601 first-seen timestamp. Files written before
//! rent was tracked may lack the `rent` column.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::fs;

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{Ad, AdRecord, Source};
use crate::storage::AdStorage;

const HEADER: [&str; 6] = ["url", "title", "location", "rooms", "rent", "time"];

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    pub fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    pub fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path)?;

        let tmp = self.path(&format!("{key}.tmp"));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    pub fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Modification time of a file, None if it doesn't exist.
    pub fn modified(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        match fs::metadata(self.path(key)) {
            Ok(metadata) => Ok(Some(DateTime::<Utc>::from(metadata.modified()?))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Remove a file if it exists.
    pub fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// State file key of a source.
    fn ads_key(source: &Source) -> String {
        format!("{}.csv", source.host())
    }
}

impl AdStorage for LocalStorage {
    fn load(&self, source: &Source) -> Result<Vec<Ad>> {
        let Some(bytes) = self.read_bytes(&Self::ads_key(source))? else {
            return Ok(Vec::new());
        };
        csv::Reader::from_reader(bytes.as_slice())
            .deserialize::<AdRecord>()
            .map(|record| Ad::try_from(record?))
            .collect()
    }

    fn save(&self, source: &Source, ads: &[Ad]) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(HEADER)?;
        for ad in ads {
            writer.serialize(AdRecord::from(ad))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Io(e.into_error()))?;
        self.write_bytes(&Self::ads_key(source), &bytes)
    }

    fn last_saved(&self, source: &Source) -> Result<Option<DateTime<Utc>>> {
        self.modified(&Self::ads_key(source))
    }
}
