use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use chrono::NaiveDate;

use crate::error::Result;
use crate::options::{DEFAULT_ACCESSORY, DEFAULT_COLOR, DEFAULT_HAT};
use crate::types::{Character, TimingRecord};

pub const CHARACTER_KEY: &str = "character-profile";
pub const QUESTION_PROGRESS_KEY: &str = "question-progress";
pub const BEST_TIME_KEY: &str = "best-time";
pub const PREVIOUS_TIME_KEY: &str = "previous-time";

/// Durable string storage addressed by key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// One `<key>.json` file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.path_for(key))?;
        file.write_all(value.as_bytes())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// On-disk profile shape, tolerant of older saves that only carried `level`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCharacter {
    stages_cleared: Option<u32>,
    level: Option<u32>,
    cleared_dates: Option<BTreeSet<NaiveDate>>,
    color: Option<String>,
    hat: Option<String>,
    accessory: Option<String>,
}

impl From<StoredCharacter> for Character {
    fn from(stored: StoredCharacter) -> Self {
        let stages_cleared = match (stored.stages_cleared, stored.level) {
            (Some(stages), _) => stages,
            (None, Some(level)) => {
                info!(level = level, "Migrating legacy level field");
                level.saturating_sub(1)
            }
            (None, None) => 0,
        };

        fn or_default(value: Option<String>, default: &str) -> String {
            value
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        }

        Character {
            stages_cleared,
            cleared_dates: stored.cleared_dates.unwrap_or_default(),
            color: or_default(stored.color, DEFAULT_COLOR),
            hat: or_default(stored.hat, DEFAULT_HAT),
            accessory: or_default(stored.accessory, DEFAULT_ACCESSORY),
        }
    }
}

/// Reads and writes game records through a [`KeyValueStore`].
///
/// Loads never fail: absent or unreadable records come back as `None` and the
/// problem is logged. Saves report errors so the caller can log them.
pub struct Persistence<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn read_raw(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = key, error = %e, "Failed to read stored value");
                None
            }
        }
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = key, error = %e, "Discarding malformed stored value");
                None
            }
        }
    }

    fn write_json<T: serde::Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json)?;
        debug!(key = key, "Saved value");
        Ok(())
    }

    pub fn load_character(&self) -> Option<Character> {
        self.read_json::<StoredCharacter>(CHARACTER_KEY)
            .map(Character::from)
    }

    pub fn save_character(&mut self, character: &Character) -> Result<()> {
        self.write_json(CHARACTER_KEY, character)
    }

    /// Stored 1-based question index, clamped to `1..=questions_per_stage`.
    pub fn load_question_progress(&self, questions_per_stage: u32) -> Option<u32> {
        let index: i64 = self.read_json(QUESTION_PROGRESS_KEY)?;
        if index < 1 || index > questions_per_stage as i64 {
            warn!(index = index, "Stored question index out of range");
            return None;
        }
        Some(index as u32)
    }

    pub fn save_question_progress(&mut self, index: u32) -> Result<()> {
        self.write_json(QUESTION_PROGRESS_KEY, &index)
    }

    pub fn load_timings(&self) -> TimingRecord {
        TimingRecord {
            best_time: self.read_json(BEST_TIME_KEY),
            previous_time: self.read_json(PREVIOUS_TIME_KEY),
        }
    }

    pub fn save_timings(&mut self, timings: &TimingRecord) -> Result<()> {
        if let Some(best) = timings.best_time {
            self.write_json(BEST_TIME_KEY, &best)?;
        }
        if let Some(previous) = timings.previous_time {
            self.write_json(PREVIOUS_TIME_KEY, &previous)?;
        }
        Ok(())
    }
}
