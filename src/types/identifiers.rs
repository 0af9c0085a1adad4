use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Stable identity of a context item. Defaults to the normalized display path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

#[derive(Debug, Error)]
pub enum ItemIdError {
    #[error("Item id must not be empty")]
    Empty,
    #[error("Path involves invalid UTF-8")]
    InvalidUtf8,
}

impl ItemId {
    /// Build an id from a display path (`src\lib.rs`, `./src/lib.rs` and
    /// `src/lib.rs` all map to the same id).
    pub fn from_display_path(display_path: &str) -> Result<Self, ItemIdError> {
        let normalized = normalize_path(display_path);
        if normalized.is_empty() {
            return Err(ItemIdError::Empty);
        }
        Ok(ItemId(normalized))
    }

    pub fn from_path(path: &Path) -> Result<Self, ItemIdError> {
        let s = path.to_str().ok_or(ItemIdError::InvalidUtf8)?;
        Self::from_display_path(s)
    }

    /// Wrap an explicit id verbatim (virtual items, attachments).
    pub fn new(raw: impl Into<String>) -> Self {
        ItemId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        ItemId(value.to_string())
    }
}

/// Display paths keep their case: they are shown to the model verbatim.
pub(crate) fn normalize_path(path: &str) -> String {
    let forward = path.trim().replace('\\', "/");
    let mut s = forward.as_str();
    while let Some(rest) = s.strip_prefix("./") {
        s = rest;
    }
    s.to_string()
}

/// Content hash version of an item payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentVersion(String);

impl ContentVersion {
    pub fn from_content(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);

        let hash = hasher.finalize();
        let hex = hex::encode(hash);

        ContentVersion(format!("sha256:{hex}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
