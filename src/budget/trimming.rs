use crate::budget::usage::HistoryMessage;
use crate::tokens::Tokenizer;

/// Appended to a section clipped at the budget boundary.
pub const SECTION_TRIMMED_MARKER: &str = "[section trimmed for token budget]";

pub struct HistoryTrim {
    pub kept: Vec<HistoryMessage>,
    pub tokens_used: usize,
    pub dropped: usize,
}

/// Keep the newest messages whose cumulative cost fits `budget`.
///
/// Scans newest to oldest and stops at the first message that does not fit,
/// so the kept history is always a contiguous recent suffix.
pub fn trim_history<F>(history: Vec<HistoryMessage>, budget: usize, cost: F) -> HistoryTrim
where
    F: Fn(&HistoryMessage) -> usize,
{
    let total = history.len();
    let mut kept = Vec::new();
    let mut tokens_used = 0;

    for msg in history.into_iter().rev() {
        let msg_cost = cost(&msg);
        if tokens_used + msg_cost > budget {
            break;
        }
        tokens_used += msg_cost;
        kept.push(msg);
    }

    // Restore chronological order
    kept.reverse();

    HistoryTrim {
        dropped: total - kept.len(),
        kept,
        tokens_used,
    }
}

pub struct SectionTrim {
    pub kept: Vec<String>,
    pub tokens_used: usize,
    pub dropped: usize,
    pub clipped: bool,
}

/// Keep whole sections in order while they fit; clip the first overflowing
/// section to the remaining allowance and drop everything after it.
pub fn trim_sections<T: Tokenizer>(
    sections: Vec<String>,
    budget: usize,
    tokenizer: &T,
) -> SectionTrim {
    let total = sections.len();
    let mut kept = Vec::with_capacity(total);
    let mut tokens_used = 0;
    let mut clipped = false;

    for section in sections {
        let section_cost = tokenizer.count_tokens(&section);
        if tokens_used + section_cost <= budget {
            tokens_used += section_cost;
            kept.push(section);
            continue;
        }

        let remaining = budget - tokens_used;
        if remaining > 0 {
            let prefix = tokenizer.truncate_to_tokens(&section, remaining);
            let clipped_section = format!("{prefix}\n{SECTION_TRIMMED_MARKER}");
            tokens_used += tokenizer.count_tokens(&clipped_section);
            kept.push(clipped_section);
            clipped = true;
        }
        break;
    }

    SectionTrim {
        dropped: total - kept.len(),
        kept,
        tokens_used,
        clipped,
    }
}
