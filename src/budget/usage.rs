use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: Role,
    pub content: String,
}

impl HistoryMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Everything the allocator may trim before a request is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatorInput {
    pub system_prompt: String,
    pub history: Vec<HistoryMessage>,
    pub loaded_files: Vec<String>,
    pub tool_results: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryUsage {
    pub system_prompt: usize,
    pub conversation_history: usize,
    pub loaded_files: usize,
    pub tool_results: usize,
}

impl CategoryUsage {
    pub fn total(&self) -> usize {
        self.system_prompt + self.conversation_history + self.loaded_files + self.tool_results
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextUsage {
    pub per_category: CategoryUsage,
    pub subtotal: usize,
    /// `subtotal + safety_buffer + output_reserved`.
    pub with_reserved: usize,
    pub total_window: usize,
}

impl ContextUsage {
    /// Fraction of the window consumed, reserves included.
    pub fn ratio(&self) -> f64 {
        if self.total_window == 0 {
            1.0
        } else {
            self.with_reserved as f64 / self.total_window as f64
        }
    }

    pub fn is_near_limit(&self, ratio: f64) -> bool {
        self.ratio() >= ratio
    }

    pub fn exceeds_window(&self) -> bool {
        self.with_reserved > self.total_window
    }
}

/// One trimming action taken while fitting the input into its budgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrimNote {
    SystemPromptTrimmed { from: usize, to: usize },
    HistoryTrimmed { dropped_messages: usize, kept_messages: usize },
    LoadedFilesTrimmed { dropped_sections: usize, clipped: bool },
    ToolResultsTrimmed { dropped_sections: usize, clipped: bool },
    GlobalCompression { before: usize, after: usize },
}

impl TrimNote {
    pub fn code(&self) -> &'static str {
        match self {
            TrimNote::SystemPromptTrimmed { .. } => "system_prompt_trimmed",
            TrimNote::HistoryTrimmed { .. } => "history_trimmed",
            TrimNote::LoadedFilesTrimmed { .. } => "loaded_files_trimmed",
            TrimNote::ToolResultsTrimmed { .. } => "tool_results_trimmed",
            TrimNote::GlobalCompression { .. } => "global_compression",
        }
    }
}

impl fmt::Display for TrimNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrimNote::SystemPromptTrimmed { from, to } => {
                write!(f, "system prompt clipped from {from} to {to} tokens")
            }
            TrimNote::HistoryTrimmed {
                dropped_messages,
                kept_messages,
            } => write!(
                f,
                "dropped {dropped_messages} older history messages, kept {kept_messages}"
            ),
            TrimNote::LoadedFilesTrimmed {
                dropped_sections,
                clipped,
            } => write!(
                f,
                "loaded files: dropped {dropped_sections} sections{}",
                if *clipped { ", clipped one" } else { "" }
            ),
            TrimNote::ToolResultsTrimmed {
                dropped_sections,
                clipped,
            } => write!(
                f,
                "tool results: dropped {dropped_sections} sections{}",
                if *clipped { ", clipped one" } else { "" }
            ),
            TrimNote::GlobalCompression { before, after } => write!(
                f,
                "context near window limit: compressed from {before} to {after} tokens"
            ),
        }
    }
}

/// Outcome of [`compress_to_budget`](super::TokenBudgetAllocator::compress_to_budget).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionResult {
    pub trimmed: AllocatorInput,
    pub usage: ContextUsage,
    pub compressed: bool,
    pub notes: Vec<TrimNote>,
}

impl CompressionResult {
    pub fn has_note(&self, code: &str) -> bool {
        self.notes.iter().any(|n| n.code() == code)
    }
}
