use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::item::{ContextItem, Payload, Tier};
use crate::tokens::Tokenizer;
use crate::types::identifiers::ItemId;

pub const SUMMARY_MAX_LINES: usize = 20;
pub const SUMMARY_MAX_CHARS: usize = 1_200;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSerialization {
    pub text: String,
    /// Items included in full or as a summary, in output order.
    pub used_ids: Vec<ItemId>,
    /// True when at least one item had to be reduced to a summary. Items
    /// dropped entirely do not set it; check `omitted` for those.
    pub warning: bool,
    pub tokens_used: usize,
    /// Items left out because neither the full block nor the summary fit.
    pub omitted: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBudgets {
    pub persistent: usize,
    pub conversation: usize,
    pub one_time: usize,
}

impl TierBudgets {
    pub fn for_tier(&self, tier: Tier) -> usize {
        match tier {
            Tier::Persistent => self.persistent,
            Tier::Conversation => self.conversation,
            Tier::OneTime => self.one_time,
        }
    }
}

fn header(item: &ContextItem) -> String {
    let mut header = format!("--- {}", item.display_path);
    match &item.payload {
        Payload::Text(_) => {
            if let Some(lang) = &item.language {
                header.push_str(&format!(" [{lang}]"));
            }
        }
        Payload::DataUrl(_) => header.push_str(&format!(" (image, {} bytes)", item.size_bytes)),
    }
    header.push_str(&format!(" ({})", item.tier));
    if item.missing_on_disk {
        header.push_str(" [missing on disk]");
    } else if item.changed_on_disk {
        header.push_str(" [changed on disk]");
    }
    header
}

pub fn format_block(item: &ContextItem) -> String {
    let body = match &item.payload {
        Payload::Text(text) => text.trim_end_matches('\n'),
        Payload::DataUrl(url) => url.as_str(),
    };
    format!("{}\n{}\n", header(item), body)
}

/// Header plus the first lines of a text item; images keep only the header.
pub fn format_summary(item: &ContextItem) -> String {
    let mut out = format!("{} (summary)\n", header(item));
    if let Payload::Text(text) = &item.payload {
        let mut chars = 0;
        for line in text.lines().take(SUMMARY_MAX_LINES) {
            let room = SUMMARY_MAX_CHARS - chars;
            if room == 0 {
                break;
            }
            let piece: String = line.chars().take(room).collect();
            chars += piece.chars().count();
            out.push_str(&piece);
            out.push('\n');
        }
        out.push_str("…\n");
    }
    out
}

/// Serialize `items` (already in priority order) within `budget` tokens.
pub fn serialize_items<'a, T, I>(items: I, budget: usize, tokenizer: &T) -> TierSerialization
where
    T: Tokenizer,
    I: IntoIterator<Item = &'a ContextItem>,
{
    let mut blocks: Vec<String> = Vec::new();
    let mut result = TierSerialization::default();

    for item in items {
        if result.tokens_used >= budget {
            result.omitted += 1;
            continue;
        }

        let block = format_block(item);
        let cost = tokenizer.count_tokens(&block);
        if result.tokens_used + cost <= budget {
            result.tokens_used += cost;
            result.used_ids.push(item.id.clone());
            blocks.push(block);
            continue;
        }

        let summary = format_summary(item);
        let summary_cost = tokenizer.count_tokens(&summary);
        if result.tokens_used + summary_cost <= budget {
            warn!(
                item = %item.id,
                full_tokens = cost,
                summary_tokens = summary_cost,
                "context item reduced to summary"
            );
            result.tokens_used += summary_cost;
            result.used_ids.push(item.id.clone());
            result.warning = true;
            blocks.push(summary);
        } else {
            result.omitted += 1;
        }
    }

    result.text = blocks.join("\n");
    result
}
