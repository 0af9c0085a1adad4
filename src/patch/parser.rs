use serde::{Deserialize, Serialize};

use crate::patch::PatchError;

pub const SEARCH_MARKER: &str = "<<<<<<< SEARCH";
pub const SEPARATOR_MARKER: &str = "=======";
pub const REPLACE_MARKER: &str = ">>>>>>> REPLACE";

/// One search/replace pair, both spans verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditBlock {
    pub search: String,
    pub replace: String,
}

impl EditBlock {
    pub fn new(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            replace: replace.into(),
        }
    }
}

enum State {
    Outside,
    Search { opened_at: usize, lines: Vec<String> },
    Replace { opened_at: usize, search: String, lines: Vec<String> },
}

fn is_marker(line: &str, marker: &str) -> bool {
    line.trim_end() == marker
}

/// Extract every marker-delimited unit from `source`.
///
/// Text outside the units (a `path:` header, prose, fences) is ignored.
pub fn parse_edit_blocks(source: &str) -> Result<Vec<EditBlock>, PatchError> {
    let normalized = source.replace("\r\n", "\n");
    let mut blocks = Vec::new();
    let mut state = State::Outside;

    for (idx, line) in normalized.split('\n').enumerate() {
        let line_no = idx + 1;
        state = match state {
            State::Outside => {
                if is_marker(line, SEARCH_MARKER) {
                    State::Search {
                        opened_at: line_no,
                        lines: Vec::new(),
                    }
                } else {
                    State::Outside
                }
            }
            State::Search { opened_at, mut lines } => {
                if is_marker(line, SEPARATOR_MARKER) {
                    State::Replace {
                        opened_at,
                        search: lines.join("\n"),
                        lines: Vec::new(),
                    }
                } else if is_marker(line, SEARCH_MARKER) || is_marker(line, REPLACE_MARKER) {
                    return Err(PatchError::MalformedBlock {
                        line: line_no,
                        reason: format!(
                            "block opened at line {opened_at} has no `{SEPARATOR_MARKER}` separator"
                        ),
                    });
                } else {
                    lines.push(line.to_string());
                    State::Search { opened_at, lines }
                }
            }
            State::Replace {
                opened_at,
                search,
                mut lines,
            } => {
                if is_marker(line, REPLACE_MARKER) {
                    blocks.push(EditBlock {
                        search,
                        replace: lines.join("\n"),
                    });
                    State::Outside
                } else if is_marker(line, SEARCH_MARKER) {
                    return Err(PatchError::MalformedBlock {
                        line: line_no,
                        reason: format!(
                            "block opened at line {opened_at} has no `{REPLACE_MARKER}` marker"
                        ),
                    });
                } else {
                    lines.push(line.to_string());
                    State::Replace {
                        opened_at,
                        search,
                        lines,
                    }
                }
            }
        };
    }

    match state {
        State::Outside => {}
        State::Search { opened_at, .. } => {
            return Err(PatchError::MalformedBlock {
                line: opened_at,
                reason: format!("input ended before the `{SEPARATOR_MARKER}` separator"),
            });
        }
        State::Replace { opened_at, .. } => {
            return Err(PatchError::MalformedBlock {
                line: opened_at,
                reason: format!("input ended before the `{REPLACE_MARKER}` marker"),
            });
        }
    }

    if blocks.is_empty() {
        return Err(PatchError::NoBlocksFound);
    }
    Ok(blocks)
}
