use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::patch::parser::{parse_edit_blocks, EditBlock};
use crate::patch::PatchError;

const PREVIEW_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOutcome {
    pub updated: String,
    pub count: usize,
}

/// 1-based inclusive line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}

fn preview(search: &str) -> String {
    let mut out: String = search.chars().take(PREVIEW_CHARS).collect();
    if search.chars().count() > PREVIEW_CHARS {
        out.push('…');
    }
    out
}

/// Count occurrences of `needle`, overlapping ones included.
fn occurrences(haystack: &str, needle: &str) -> usize {
    let mut count = 0;
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        count += 1;
        let at = start + pos;
        // Advance one char so overlapping matches are seen.
        start = at + haystack[at..].chars().next().map_or(1, char::len_utf8);
    }
    count
}

/// Parse `source` and apply its blocks to `original`.
///
/// All or nothing: on error no partially edited buffer is returned and the
/// caller keeps `original`.
pub fn apply_edits(original: &str, source: &str) -> Result<PatchOutcome, PatchError> {
    let blocks = parse_edit_blocks(source)?;
    apply_blocks(original, &blocks)
}

pub fn apply_blocks(original: &str, blocks: &[EditBlock]) -> Result<PatchOutcome, PatchError> {
    if blocks.is_empty() {
        return Err(PatchError::NoBlocksFound);
    }

    let mut buffer = normalize_newlines(original);

    for (idx, block) in blocks.iter().enumerate() {
        let number = idx + 1;
        let search = normalize_newlines(&block.search);
        let replace = normalize_newlines(&block.replace);

        let found = if search.is_empty() {
            0
        } else {
            occurrences(&buffer, &search)
        };
        match found {
            0 => {
                warn!(block = number, "edit block search text not found");
                return Err(PatchError::NotFound {
                    block: number,
                    search_preview: preview(&search),
                });
            }
            1 => {}
            n => {
                warn!(block = number, "edit block search text is ambiguous");
                return Err(PatchError::NotUnique {
                    block: number,
                    occurrences: n,
                });
            }
        }

        if let Some(pos) = buffer.find(&search) {
            buffer.replace_range(pos..pos + search.len(), &replace);
            debug!(block = number, at = pos, "edit block applied");
        }
    }

    Ok(PatchOutcome {
        updated: buffer,
        count: blocks.len(),
    })
}

/// Where each block's search text sits in the unmodified `original`.
///
/// Informational only: later blocks are located against the original, not
/// against the buffer earlier blocks would produce.
pub fn estimate_line_ranges(original: &str, blocks: &[EditBlock]) -> Vec<Option<LineRange>> {
    let buffer = normalize_newlines(original);
    blocks
        .iter()
        .map(|block| {
            let search = normalize_newlines(&block.search);
            if search.is_empty() {
                return None;
            }
            let pos = buffer.find(&search)?;
            let start = buffer[..pos].matches('\n').count() + 1;
            let end = start + search.trim_end_matches('\n').matches('\n').count();
            Some(LineRange { start, end })
        })
        .collect()
}
