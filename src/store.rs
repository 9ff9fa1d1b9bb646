//! Saved memes and user settings.
//!
//! Both stores are traits so the session can run against memory (tests, embedding) or JSON
//! files on disk (the CLI). File stores rewrite the whole file through a temp file and a rename,
//! so a crash never leaves a half-written document behind.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::config::RenderConfig;
use crate::foundation::error::{MemeError, MemeResult};

/// Number of records returned by a default history listing.
pub const HISTORY_LIMIT: usize = 20;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub created_at_ms: u64,
    pub title: String,
    pub config: RenderConfig,
}

pub trait HistoryStore: Send {
    /// Persist `config` as a new record.
    fn save(&mut self, config: &RenderConfig, created_at_ms: u64) -> MemeResult<HistoryRecord>;
    /// Up to `limit` records, newest first.
    fn list(&self, limit: usize) -> MemeResult<Vec<HistoryRecord>>;
    fn get(&self, id: &str) -> MemeResult<Option<HistoryRecord>>;
    /// Remove a record. Returns whether it existed; deleting twice is not an error.
    fn delete(&mut self, id: &str) -> MemeResult<bool>;
}

fn new_record(
    config: &RenderConfig,
    created_at_ms: u64,
    existing: &[HistoryRecord],
) -> HistoryRecord {
    let mut seed = created_at_ms;
    let id = loop {
        let candidate = format!(
            "{:016x}",
            xxhash_rust::xxh3::xxh3_64_with_seed(config.bubble_text.as_bytes(), seed)
        );
        if existing.iter().all(|r| r.id != candidate) {
            break candidate;
        }
        seed = seed.wrapping_add(1);
    };
    HistoryRecord {
        id,
        created_at_ms,
        title: config.title(),
        config: config.clone(),
    }
}

/// Newest first; records saved in the same millisecond keep reverse insertion order.
fn newest_first(records: &[HistoryRecord], limit: usize) -> Vec<HistoryRecord> {
    let mut out: Vec<HistoryRecord> = records.iter().rev().cloned().collect();
    out.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
    out.truncate(limit);
    out
}

#[derive(Debug, Default)]
pub struct MemoryHistory {
    records: Vec<HistoryRecord>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl HistoryStore for MemoryHistory {
    fn save(&mut self, config: &RenderConfig, created_at_ms: u64) -> MemeResult<HistoryRecord> {
        let record = new_record(config, created_at_ms, &self.records);
        self.records.push(record.clone());
        Ok(record)
    }

    fn list(&self, limit: usize) -> MemeResult<Vec<HistoryRecord>> {
        Ok(newest_first(&self.records, limit))
    }

    fn get(&self, id: &str) -> MemeResult<Option<HistoryRecord>> {
        Ok(self.records.iter().find(|r| r.id == id).cloned())
    }

    fn delete(&mut self, id: &str) -> MemeResult<bool> {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        Ok(self.records.len() != before)
    }
}

/// History kept as a JSON array in a single file.
#[derive(Debug)]
pub struct JsonFileHistory {
    path: PathBuf,
    records: Vec<HistoryRecord>,
}

impl JsonFileHistory {
    /// Open the history at `path`; a missing file is an empty history.
    pub fn open(path: impl Into<PathBuf>) -> MemeResult<Self> {
        let path = path.into();
        let records = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                MemeError::store(format!("history '{}' is malformed: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(MemeError::store(format!(
                    "read history '{}': {e}",
                    path.display()
                )));
            }
        };
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> MemeResult<()> {
        write_json_atomic(&self.path, &self.records)
    }
}

impl HistoryStore for JsonFileHistory {
    fn save(&mut self, config: &RenderConfig, created_at_ms: u64) -> MemeResult<HistoryRecord> {
        let record = new_record(config, created_at_ms, &self.records);
        self.records.push(record.clone());
        if let Err(e) = self.persist() {
            self.records.pop();
            return Err(e);
        }
        tracing::debug!(id = %record.id, "history record saved");
        Ok(record)
    }

    fn list(&self, limit: usize) -> MemeResult<Vec<HistoryRecord>> {
        Ok(newest_first(&self.records, limit))
    }

    fn get(&self, id: &str) -> MemeResult<Option<HistoryRecord>> {
        Ok(self.records.iter().find(|r| r.id == id).cloned())
    }

    fn delete(&mut self, id: &str) -> MemeResult<bool> {
        let Some(pos) = self.records.iter().position(|r| r.id == id) else {
            return Ok(false);
        };
        let removed = self.records.remove(pos);
        if let Err(e) = self.persist() {
            self.records.insert(pos, removed);
            return Err(e);
        }
        Ok(true)
    }
}

/// Per-user settings: the VIP flag and the last edited config.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub is_vip: bool,
    pub saved_config: Option<RenderConfig>,
}

pub trait SettingsStore: Send {
    fn load(&self) -> MemeResult<Settings>;
    fn save(&mut self, settings: &Settings) -> MemeResult<()>;
}

#[derive(Debug, Default)]
pub struct MemorySettings {
    settings: Settings,
}

impl MemorySettings {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

impl SettingsStore for MemorySettings {
    fn load(&self) -> MemeResult<Settings> {
        Ok(self.settings.clone())
    }

    fn save(&mut self, settings: &Settings) -> MemeResult<()> {
        self.settings = settings.clone();
        Ok(())
    }
}

/// Settings in a JSON file. Unreadable or malformed files load as defaults.
#[derive(Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
}

impl JsonFileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileSettings {
    fn load(&self) -> MemeResult<Settings> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Settings::default()),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "settings unreadable; using defaults");
                return Ok(Settings::default());
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "settings malformed; using defaults");
                Ok(Settings::default())
            }
        }
    }

    fn save(&mut self, settings: &Settings) -> MemeResult<()> {
        write_json_atomic(&self.path, settings)
    }
}

fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> MemeResult<()> {
    let write = || -> anyhow::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create store dir '{}'", parent.display()))?;
        }
        let bytes = serde_json::to_vec_pretty(value).context("serialize store document")?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, bytes).with_context(|| format!("write '{}'", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("rename '{}' into place", tmp.display()))?;
        Ok(())
    };
    write().map_err(|e| MemeError::store(format!("{e:#}")))
}

#[cfg(test)]
#[path = "../tests/unit/store/history.rs"]
mod tests;
