//! Library configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// SQLite journal mode applied when a library is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    /// Rollback journal deleted after each transaction.
    #[default]
    Delete,
    /// Write-ahead log.
    Wal,
    /// Journal kept in memory.
    Memory,
}

impl JournalMode {
    /// Pragma value.
    pub fn as_str(&self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Wal => "WAL",
            JournalMode::Memory => "MEMORY",
        }
    }
}

/// SQLite `synchronous` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Synchronous {
    /// No syncs.
    Off,
    /// Sync at critical moments.
    Normal,
    /// Sync after every transaction.
    #[default]
    Full,
}

impl Synchronous {
    /// Pragma value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Synchronous::Off => "OFF",
            Synchronous::Normal => "NORMAL",
            Synchronous::Full => "FULL",
        }
    }
}

/// Configuration for opening or creating a library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Path to the library file.
    pub path: PathBuf,

    /// Keep the library in memory. `path` is ignored.
    pub temporary: bool,

    /// Journal mode.
    pub journal_mode: JournalMode,

    /// Synchronous setting.
    pub synchronous: Synchronous,

    /// How long to wait on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Capacity of the connection's prepared statement cache. Every compiled
    /// query keeps one statement per physical table in this cache.
    pub statement_cache_capacity: usize,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./library.db"),
            temporary: false,
            journal_mode: JournalMode::default(),
            synchronous: Synchronous::default(),
            busy_timeout_ms: 5_000,
            statement_cache_capacity: 128,
        }
    }
}

impl LibraryConfig {
    /// Create a new configuration with the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Create a temporary in-memory configuration for testing.
    pub fn temporary() -> Self {
        Self {
            path: PathBuf::new(),
            temporary: true,
            journal_mode: JournalMode::Memory,
            ..Default::default()
        }
    }

    /// Set the journal mode.
    pub fn with_journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = mode;
        self
    }

    /// Set the synchronous level.
    pub fn with_synchronous(mut self, synchronous: Synchronous) -> Self {
        self.synchronous = synchronous;
        self
    }

    /// Set the busy timeout.
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the statement cache capacity.
    pub fn with_statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.statement_cache_capacity = capacity;
        self
    }

    /// Busy timeout as a duration.
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let config = LibraryConfig::new("/tmp/lib.db")
            .with_journal_mode(JournalMode::Wal)
            .with_synchronous(Synchronous::Normal)
            .with_busy_timeout(Duration::from_secs(2))
            .with_statement_cache_capacity(16);

        assert_eq!(config.path, PathBuf::from("/tmp/lib.db"));
        assert!(!config.temporary);
        assert_eq!(config.journal_mode.as_str(), "WAL");
        assert_eq!(config.synchronous.as_str(), "NORMAL");
        assert_eq!(config.busy_timeout(), Duration::from_secs(2));
        assert_eq!(config.statement_cache_capacity, 16);
    }

    #[test]
    fn test_temporary() {
        let config = LibraryConfig::temporary();
        assert!(config.temporary);
        assert_eq!(config.journal_mode, JournalMode::Memory);
    }
}
