use serde::{Deserialize, Serialize};

use crate::diff::{EditKind, EditScript};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedDiff {
    pub added: usize,
    pub removed: usize,
    pub text: String,
}

fn range(len: usize) -> String {
    let start = if len == 0 { 0 } else { 1 };
    format!("{start},{len}")
}

/// Render the whole script as a single hunk, every line shown.
pub fn render_unified(script: &EditScript, path: &str) -> UnifiedDiff {
    let added = script.added();
    let removed = script.removed();
    let total: usize = script.runs.iter().map(|run| run.lines.len()).sum();
    let old_len = total - added;
    let new_len = total - removed;

    let mut text = format!("--- a/{path}\n+++ b/{path}\n");
    text.push_str(&format!("@@ -{} +{} @@\n", range(old_len), range(new_len)));

    for run in &script.runs {
        let prefix = match run.kind {
            EditKind::Equal => ' ',
            EditKind::Delete => '-',
            EditKind::Insert => '+',
        };
        for line in &run.lines {
            text.push(prefix);
            text.push_str(line);
            text.push('\n');
        }
    }

    UnifiedDiff {
        added,
        removed,
        text,
    }
}
