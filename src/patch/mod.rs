//! Atomic search/replace patching of text buffers.
//!
//! Edit instructions are marker-delimited units:
//!
//! ```text
//! <<<<<<< SEARCH
//! exact text currently in the file
//! =======
//! replacement text
//! >>>>>>> REPLACE
//! ```
//!
//! Each search span must occur exactly once in the buffer as it stands when
//! its block is applied.

pub mod apply;
pub mod parser;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use apply::{apply_blocks, apply_edits, estimate_line_ranges, LineRange, PatchOutcome};
pub use parser::{parse_edit_blocks, EditBlock, REPLACE_MARKER, SEARCH_MARKER, SEPARATOR_MARKER};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("Malformed edit block at line {line}: {reason}")]
    MalformedBlock { line: usize, reason: String },
    #[error("No edit blocks found")]
    NoBlocksFound,
    #[error("Edit block {block}: search text not found: {search_preview:?}")]
    NotFound { block: usize, search_preview: String },
    #[error("Edit block {block}: search text matches {occurrences} times, it must be unique")]
    NotUnique { block: usize, occurrences: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchErrorKind {
    MalformedBlock,
    NoBlocksFound,
    NotFound,
    NotUnique,
}

impl PatchError {
    pub fn kind(&self) -> PatchErrorKind {
        match self {
            PatchError::MalformedBlock { .. } => PatchErrorKind::MalformedBlock,
            PatchError::NoBlocksFound => PatchErrorKind::NoBlocksFound,
            PatchError::NotFound { .. } => PatchErrorKind::NotFound,
            PatchError::NotUnique { .. } => PatchErrorKind::NotUnique,
        }
    }
}
