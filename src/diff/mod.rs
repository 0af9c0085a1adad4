//! Minimal line-level diffs and their unified rendering.

mod myers;
pub mod unified;

use serde::{Deserialize, Serialize};
use tracing::warn;

use myers::{shortest_edit, Op};
pub use unified::{render_unified, UnifiedDiff};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    Equal,
    Insert,
    Delete,
}

/// A run of consecutive lines sharing one edit kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRun {
    pub kind: EditKind,
    pub lines: Vec<String>,
}

impl DiffRun {
    pub fn new(kind: EditKind, lines: Vec<String>) -> Self {
        Self { kind, lines }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditScript {
    pub runs: Vec<DiffRun>,
}

impl EditScript {
    fn count(&self, kind: EditKind) -> usize {
        self.runs
            .iter()
            .filter(|run| run.kind == kind)
            .map(|run| run.lines.len())
            .sum()
    }

    pub fn added(&self) -> usize {
        self.count(EditKind::Insert)
    }

    pub fn removed(&self) -> usize {
        self.count(EditKind::Delete)
    }

    pub fn is_identity(&self) -> bool {
        self.runs.iter().all(|run| run.kind == EditKind::Equal)
    }

    /// The old side: equal and deleted lines, in order.
    pub fn old_lines(&self) -> Vec<String> {
        self.side(EditKind::Delete)
    }

    /// The new side: equal and inserted lines, in order.
    pub fn new_lines(&self) -> Vec<String> {
        self.side(EditKind::Insert)
    }

    fn side(&self, changed: EditKind) -> Vec<String> {
        self.runs
            .iter()
            .filter(|run| run.kind == EditKind::Equal || run.kind == changed)
            .flat_map(|run| run.lines.iter().cloned())
            .collect()
    }

    /// Replay the script's inserts and deletes against `old`.
    ///
    /// Equal runs advance through `old` and copy from it, so replaying a
    /// script against the input it was computed from yields the new side.
    pub fn apply<S: AsRef<str>>(&self, old: &[S]) -> Vec<String> {
        let mut out = Vec::with_capacity(old.len() + self.added());
        let mut cursor = 0;
        for run in &self.runs {
            match run.kind {
                EditKind::Equal => {
                    let end = (cursor + run.lines.len()).min(old.len());
                    out.extend(old[cursor..end].iter().map(|l| l.as_ref().to_string()));
                    cursor = end;
                }
                EditKind::Delete => cursor = (cursor + run.lines.len()).min(old.len()),
                EditKind::Insert => out.extend(run.lines.iter().cloned()),
            }
        }
        out
    }

    fn push(&mut self, kind: EditKind, line: &str) {
        match self.runs.last_mut() {
            Some(run) if run.kind == kind => run.lines.push(line.to_string()),
            _ => self.runs.push(DiffRun::new(kind, vec![line.to_string()])),
        }
    }
}

/// Shortest line edit script from `old` to `new`, with same-kind runs merged.
///
/// Inputs whose edit distance exceeds the search cap get a script that
/// deletes every old line and inserts every new one.
pub fn diff_lines<A, B>(old: &[A], new: &[B]) -> EditScript
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let mut script = EditScript::default();

    let Some(ops) = shortest_edit(old, new) else {
        warn!(
            old = old.len(),
            new = new.len(),
            max_steps = myers::MAX_EDIT_STEPS,
            "edit distance over search cap; replacing every line"
        );
        for line in old {
            script.push(EditKind::Delete, line.as_ref());
        }
        for line in new {
            script.push(EditKind::Insert, line.as_ref());
        }
        return script;
    };

    for op in ops {
        match op {
            Op::Equal(i) => script.push(EditKind::Equal, old[i].as_ref()),
            Op::Delete(i) => script.push(EditKind::Delete, old[i].as_ref()),
            Op::Insert(j) => script.push(EditKind::Insert, new[j].as_ref()),
        }
    }
    script
}

/// Split text into lines for diffing: CRLF is folded to LF and a trailing
/// newline does not produce an empty last line.
pub fn split_lines(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n");
    normalized.lines().map(str::to_string).collect()
}

pub fn diff_text(old: &str, new: &str) -> EditScript {
    diff_lines(&split_lines(old), &split_lines(new))
}
