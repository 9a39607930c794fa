//! Persisted user preferences.
//!
//! Favorites, channel subscriptions and ban lists are kept as line-delimited
//! files so they stay trivially inspectable and editable by hand.

mod file_store;

pub use file_store::FilePreferenceStore;

use thiserror::Error;

/// Errors raised by a preference store.
#[derive(Debug, Error)]
pub enum PrefError {
    #[error("preference file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One preference list per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefFile {
    Favorites,
    Subscriptions,
    BannedInstances,
    BannedChannels,
}

impl PrefFile {
    pub fn file_name(&self) -> &'static str {
        match self {
            PrefFile::Favorites => "favorites",
            PrefFile::Subscriptions => "subscriptions",
            PrefFile::BannedInstances => "banned_instances",
            PrefFile::BannedChannels => "banned_channels",
        }
    }
}

/// Storage for user preference lists.
pub trait PreferenceStore: Send + Sync {
    /// All entries of a list, in file order.
    fn list(&self, file: PrefFile) -> Result<Vec<String>, PrefError>;

    /// Append a value unless it is already present.
    fn append(&self, file: PrefFile, value: &str) -> Result<(), PrefError>;

    /// Remove every line matching the value.
    fn remove(&self, file: PrefFile, value: &str) -> Result<(), PrefError>;
}
