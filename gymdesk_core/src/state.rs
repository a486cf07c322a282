//! Signed-in user persistence with file locking.
//!
//! The browser original parked the signed-in user in `localStorage`; the
//! CLI equivalent is a small JSON file in the data directory, written
//! atomically (temp file + rename) and read under a shared lock.

use crate::error::{Error, Result};
use crate::types::{CurrentUser, Role};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// On-disk record of the signed-in user
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StoredLogin {
    pub user_id: u64,
    pub name: String,
    pub role: Role,
    pub logged_in_at: DateTime<Utc>,
}

impl StoredLogin {
    pub fn current_user(&self) -> CurrentUser {
        CurrentUser {
            id: self.user_id,
            name: self.name.clone(),
            role: self.role,
        }
    }

    /// Load the stored login, if any.
    ///
    /// A missing file means signed out. A corrupted or unreadable file is
    /// logged and treated the same way.
    pub fn load(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("unable to open login state {:?}: {}", path, e);
                return None;
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("unable to lock login state {:?}: {}", path, e);
            return None;
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read = reader.read_to_string(&mut contents);
        let _ = file.unlock();
        if let Err(e) = read {
            tracing::warn!("failed to read login state {:?}: {}", path, e);
            return None;
        }

        match serde_json::from_str::<StoredLogin>(&contents) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!("failed to parse login state {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save the login record atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            Error::State("login state path is missing a parent directory".into())
        })?)?;

        temp.as_file().lock_exclusive()?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("saved login state to {:?}", path);
        Ok(())
    }

    /// Sign out: remove the state file. Missing file is fine.
    pub fn clear(path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }
}
