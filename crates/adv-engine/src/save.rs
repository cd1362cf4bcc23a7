//! Save data: the JSON codec and a directory of save slots.
//!
//! The codec only checks that a blob is well-formed and of a known version.
//! Whether the steps it names exist is checked by [`Session::restore`]
//! against the loaded document.
//!
//! [`Session::restore`]: crate::Session::restore

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{CorruptSaveError, EngineError, EngineResult};
use crate::session::SessionState;

/// Version written into every save.
pub const SAVE_VERSION: u32 = 1;

/// One saved session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveFile {
    /// Format version.
    pub version: u32,
    /// Adventure the save belongs to.
    pub game_name: String,
    /// Slot the save was written for.
    pub slot: String,
    /// When it was written.
    pub saved_at: DateTime<Utc>,
    /// The session state.
    pub state: SessionState,
}

/// Encode session state as save JSON.
pub fn serialize_session(state: &SessionState, game_name: &str, slot: &str) -> EngineResult<String> {
    let save = SaveFile {
        version: SAVE_VERSION,
        game_name: game_name.to_string(),
        slot: slot.to_string(),
        saved_at: Utc::now(),
        state: state.clone(),
    };
    serde_json::to_string_pretty(&save).map_err(EngineError::Encode)
}

/// Decode save JSON.
pub fn deserialize_session(blob: &str) -> Result<SaveFile, CorruptSaveError> {
    let save: SaveFile = serde_json::from_str(blob)?;
    if save.version != SAVE_VERSION {
        return Err(CorruptSaveError::UnsupportedVersion {
            found: save.version,
            expected: SAVE_VERSION,
        });
    }
    Ok(save)
}

/// Summary of a stored save.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSummary {
    /// Slot name.
    pub slot: String,
    /// Adventure the save belongs to.
    pub game_name: String,
    /// When it was written.
    pub saved_at: DateTime<Utc>,
    /// Where the session was.
    pub position: String,
}

/// A directory holding one `<slot>.json` file per save slot.
#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    /// A store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The store's directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a slot.
    pub fn path_for(&self, slot: &str) -> EngineResult<PathBuf> {
        if !is_valid_slot(slot) {
            return Err(EngineError::InvalidSlot(slot.to_string()));
        }
        Ok(self.dir.join(format!("{slot}.json")))
    }

    /// Write a save blob into a slot, replacing what was there.
    pub fn write(&self, slot: &str, blob: &str) -> EngineResult<PathBuf> {
        let path = self.path_for(slot)?;
        std::fs::create_dir_all(&self.dir).map_err(|source| EngineError::Io {
            path: self.dir.clone(),
            source,
        })?;
        std::fs::write(&path, blob).map_err(|source| EngineError::Io {
            path: path.clone(),
            source,
        })?;
        info!("saved slot {slot:?} to {}", path.display());
        Ok(path)
    }

    /// Read a slot's save blob.
    pub fn read(&self, slot: &str) -> EngineResult<String> {
        let path = self.path_for(slot)?;
        std::fs::read_to_string(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => EngineError::SlotNotFound(slot.to_string()),
            _ => EngineError::Io { path, source },
        })
    }

    /// Delete a slot. Returns whether there was anything to delete.
    pub fn remove(&self, slot: &str) -> EngineResult<bool> {
        let path = self.path_for(slot)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(EngineError::Io { path, source }),
        }
    }

    /// Slot names present in the store, sorted. A missing directory is an
    /// empty store.
    pub fn list(&self) -> EngineResult<Vec<String>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(source) if source.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(EngineError::Io {
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let mut slots: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem()?.to_str().map(str::to_string))
            .filter(|slot| is_valid_slot(slot))
            .collect();
        slots.sort();
        Ok(slots)
    }

    /// Summaries of every readable save. Files that fail to decode are
    /// skipped.
    pub fn summaries(&self) -> EngineResult<Vec<SlotSummary>> {
        let mut out = Vec::new();
        for slot in self.list()? {
            let blob = self.read(&slot)?;
            match deserialize_session(&blob) {
                Ok(save) => out.push(SlotSummary {
                    slot,
                    game_name: save.game_name,
                    saved_at: save.saved_at,
                    position: save.state.position.to_string(),
                }),
                Err(err) => debug!("skipping slot {slot:?}: {err}"),
            }
        }
        Ok(out)
    }
}

fn is_valid_slot(slot: &str) -> bool {
    !slot.is_empty()
        && slot
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
