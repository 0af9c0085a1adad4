use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::identifiers::{normalize_path, ContentVersion, ItemId, ItemIdError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Survives session resets.
    Persistent,
    /// Cleared when a new session starts.
    Conversation,
    /// Removed after the first turn that includes it.
    OneTime,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Persistent, Tier::Conversation, Tier::OneTime];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Persistent => "persistent",
            Tier::Conversation => "conversation",
            Tier::OneTime => "one_time",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Text,
    Image,
}

/// Where an item came from. Only workspace items are checked against disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSource {
    Workspace,
    Attachment,
    ToolOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Payload {
    Text(String),
    DataUrl(String),
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(s) | Payload::DataUrl(s) => s.as_bytes(),
        }
    }
}

/// A file or image pinned into the model context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    pub id: ItemId,
    pub source: ItemSource,
    pub tier: Tier,
    pub display_path: String,
    pub language: Option<String>,
    pub size_bytes: usize,
    /// Filled in by the store on upsert.
    pub token_count: usize,
    pub version: ContentVersion,
    pub added_at: DateTime<Utc>,
    /// Recency stamp; larger is more recent.
    pub order: u64,
    /// Highest turn sequence number that included this item.
    pub last_used_message: Option<u64>,
    /// Backing file's modification time when the payload was read.
    pub modified_at: Option<DateTime<Utc>>,
    pub missing_on_disk: bool,
    pub changed_on_disk: bool,
    pub is_virtual: bool,
    pub payload: Payload,
}

impl ContextItem {
    pub fn text(
        display_path: &str,
        text: impl Into<String>,
        source: ItemSource,
    ) -> Result<Self, ItemIdError> {
        Self::build(display_path, Payload::Text(text.into()), source)
    }

    pub fn image(
        display_path: &str,
        data_url: impl Into<String>,
        source: ItemSource,
    ) -> Result<Self, ItemIdError> {
        Self::build(display_path, Payload::DataUrl(data_url.into()), source)
    }

    fn build(
        display_path: &str,
        payload: Payload,
        source: ItemSource,
    ) -> Result<Self, ItemIdError> {
        let id = ItemId::from_display_path(display_path)?;
        let display_path = normalize_path(display_path);
        let language = match payload {
            Payload::Text(_) => language_for_path(&display_path).map(str::to_string),
            Payload::DataUrl(_) => None,
        };

        Ok(ContextItem {
            id,
            source,
            tier: Tier::Conversation,
            language,
            size_bytes: payload.as_bytes().len(),
            token_count: 0,
            version: ContentVersion::from_content(payload.as_bytes()),
            added_at: Utc::now(),
            order: 0,
            last_used_message: None,
            modified_at: None,
            missing_on_disk: false,
            changed_on_disk: false,
            is_virtual: false,
            display_path,
            payload,
        })
    }

    pub fn with_id(mut self, id: ItemId) -> Self {
        self.id = id;
        self
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_modified_at(mut self, modified_at: DateTime<Utc>) -> Self {
        self.modified_at = Some(modified_at);
        self
    }

    /// Mark as not backed by a file (scratch buffers, generated text).
    pub fn virtual_item(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    pub fn kind(&self) -> ItemKind {
        match self.payload {
            Payload::Text(_) => ItemKind::Text,
            Payload::DataUrl(_) => ItemKind::Image,
        }
    }

    pub fn text_payload(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text(s) => Some(s),
            Payload::DataUrl(_) => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.missing_on_disk || self.changed_on_disk
    }
}

/// Map a file extension to the fence language used in serialized blocks.
pub fn language_for_path(path: &str) -> Option<&'static str> {
    let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
    let lang = match ext.as_str() {
        "rs" => "rust",
        "ts" | "tsx" => "typescript",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "py" => "python",
        "go" => "go",
        "java" => "java",
        "kt" => "kotlin",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "php" => "php",
        "swift" => "swift",
        "sh" | "bash" => "shell",
        "md" => "markdown",
        "json" => "json",
        "toml" => "toml",
        "yaml" | "yml" => "yaml",
        "html" => "html",
        "css" => "css",
        "sql" => "sql",
        _ => return None,
    };
    Some(lang)
}
