//! Persistence boundary for learned patterns and notification settings.
//!
//! The core treats the store as an opaque key-value collection: two entries,
//! read on startup and written after every change. Read failures fall back to
//! defaults at the call site; nothing here retries.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::config::{Config, CONFIG_FILE};
use crate::error::StoreError;
use crate::estimation::UserPatterns;
use crate::notify::NotificationSettings;

pub const PATTERNS_FILE: &str = "patterns.json";

pub trait PatternStore: Send {
    /// `Ok(None)` when nothing has been saved yet.
    fn load_patterns(&self) -> Result<Option<UserPatterns>, StoreError>;
    fn save_patterns(&mut self, patterns: &UserPatterns) -> Result<(), StoreError>;
    fn load_settings(&self) -> Result<Option<NotificationSettings>, StoreError>;
    fn save_settings(&mut self, settings: &NotificationSettings) -> Result<(), StoreError>;
}

/// Patterns as JSON and settings inside `config.toml`, both in one directory.
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

    fn patterns_path(&self) -> PathBuf {
        self.dir.join(PATTERNS_FILE)
    }

    fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    fn read(path: &Path) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn write(path: &Path, content: &str) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    fn load_config(&self) -> Result<Option<Config>, StoreError> {
        let Some(content) = Self::read(&self.config_path())? else {
            return Ok(None);
        };
        toml::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                key: CONFIG_FILE.to_string(),
                message: e.to_string(),
            })
    }
}

impl PatternStore for FileStore {
    fn load_patterns(&self) -> Result<Option<UserPatterns>, StoreError> {
        let Some(content) = Self::read(&self.patterns_path())? else {
            return Ok(None);
        };
        serde_json::from_str::<UserPatterns>(&content)
            .map(|p| Some(p.sanitized()))
            .map_err(|e| StoreError::Corrupt {
                key: PATTERNS_FILE.to_string(),
                message: e.to_string(),
            })
    }

    fn save_patterns(&mut self, patterns: &UserPatterns) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(patterns).map_err(|e| StoreError::Corrupt {
            key: PATTERNS_FILE.to_string(),
            message: e.to_string(),
        })?;
        Self::write(&self.patterns_path(), &content)
    }

    fn load_settings(&self) -> Result<Option<NotificationSettings>, StoreError> {
        Ok(self.load_config()?.map(|cfg| cfg.notifications))
    }

    /// Rewrites `config.toml`, keeping its other keys.
    fn save_settings(&mut self, settings: &NotificationSettings) -> Result<(), StoreError> {
        let mut cfg = self.load_config()?.unwrap_or_default();
        cfg.notifications = settings.clone();
        let content = toml::to_string_pretty(&cfg).map_err(|e| StoreError::Corrupt {
            key: CONFIG_FILE.to_string(),
            message: e.to_string(),
        })?;
        Self::write(&self.config_path(), &content)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    patterns: Option<UserPatterns>,
    settings: Option<NotificationSettings>,
    fail: bool,
}

/// In-memory store. Clones share state, so a test can keep a handle and
/// inspect what the session saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every read and write fails.
    pub fn failing() -> Self {
        let store = Self::default();
        store.lock().fail = true;
        store
    }

    pub fn with_patterns(self, patterns: UserPatterns) -> Self {
        self.lock().patterns = Some(patterns);
        self
    }

    pub fn with_settings(self, settings: NotificationSettings) -> Self {
        self.lock().settings = Some(settings);
        self
    }

    pub fn patterns(&self) -> Option<UserPatterns> {
        self.lock().patterns.clone()
    }

    pub fn settings(&self) -> Option<NotificationSettings> {
        self.lock().settings.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(state: &MemoryState, key: &str) -> Result<(), StoreError> {
        if state.fail {
            return Err(StoreError::Corrupt {
                key: key.to_string(),
                message: "store unavailable".to_string(),
            });
        }
        Ok(())
    }
}

impl PatternStore for MemoryStore {
    fn load_patterns(&self) -> Result<Option<UserPatterns>, StoreError> {
        let state = self.lock();
        Self::check(&state, "patterns")?;
        Ok(state.patterns.clone())
    }

    fn save_patterns(&mut self, patterns: &UserPatterns) -> Result<(), StoreError> {
        let mut state = self.lock();
        Self::check(&state, "patterns")?;
        state.patterns = Some(patterns.clone());
        Ok(())
    }

    fn load_settings(&self) -> Result<Option<NotificationSettings>, StoreError> {
        let state = self.lock();
        Self::check(&state, "settings")?;
        Ok(state.settings.clone())
    }

    fn save_settings(&mut self, settings: &NotificationSettings) -> Result<(), StoreError> {
        let mut state = self.lock();
        Self::check(&state, "settings")?;
        state.settings = Some(settings.clone());
        Ok(())
    }
}
