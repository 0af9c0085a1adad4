//! Tiered storage for reference items pinned into the model context.
//!
//! Items live in one of three [`Tier`]s. Every mutating call stamps the
//! touched items with a store-wide monotonically increasing `order`, which
//! defines recency within a tier. Serialization walks a tier in priority
//! order and spends that tier's token budget, degrading to summaries and
//! then omission when the budget runs out.

pub mod item;
pub mod serialize;
pub mod staleness;

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::tokens::{HeuristicTokenizer, Tokenizer};
use crate::types::identifiers::{normalize_path, ItemId};
pub use item::{language_for_path, ContextItem, ItemKind, ItemSource, Payload, Tier};
pub use serialize::{format_block, format_summary, serialize_items, TierBudgets, TierSerialization};
pub use staleness::{DiskProbe, FsProbe, StalenessReport};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unknown context item: {0}")]
    UnknownItem(ItemId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// Same content, path and tier as the stored item; only re-stamped.
    Unchanged,
}

pub struct TieredContextStore<T = HeuristicTokenizer> {
    items: BTreeMap<ItemId, ContextItem>,
    next_order: u64,
    tokenizer: T,
}

impl Default for TieredContextStore<HeuristicTokenizer> {
    fn default() -> Self {
        Self::new()
    }
}

impl TieredContextStore<HeuristicTokenizer> {
    pub fn new() -> Self {
        Self::with_tokenizer(HeuristicTokenizer)
    }
}

impl<T> TieredContextStore<T>
where
    T: Tokenizer,
{
    pub fn with_tokenizer(tokenizer: T) -> Self {
        Self {
            items: BTreeMap::new(),
            next_order: 0,
            tokenizer,
        }
    }

    fn stamp(&mut self) -> u64 {
        self.next_order += 1;
        self.next_order
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContextItem> {
        self.items.values()
    }

    /// Insert or replace the item with the same id.
    ///
    /// A replacement keeps the stored `added_at` and `last_used_message`.
    /// Staleness flags are kept too, unless the incoming item was read from
    /// disk at a different modification time.
    pub fn upsert(&mut self, mut item: ContextItem) -> UpsertOutcome {
        item.token_count = match &item.payload {
            Payload::Text(text) => self.tokenizer.count_tokens(text),
            Payload::DataUrl(url) => self.tokenizer.count_tokens(url),
        };
        item.order = self.stamp();

        let outcome = match self.items.get(&item.id) {
            None => UpsertOutcome::Inserted,
            Some(existing) => {
                let unchanged = existing.version == item.version
                    && existing.tier == item.tier
                    && existing.display_path == item.display_path;

                item.added_at = existing.added_at;
                item.last_used_message = item.last_used_message.max(existing.last_used_message);
                if item.modified_at.is_none() || item.modified_at == existing.modified_at {
                    item.modified_at = existing.modified_at;
                    item.missing_on_disk = existing.missing_on_disk;
                    item.changed_on_disk = existing.changed_on_disk;
                }

                if unchanged {
                    UpsertOutcome::Unchanged
                } else {
                    UpsertOutcome::Updated
                }
            }
        };

        debug!(
            id = %item.id,
            tier = %item.tier,
            tokens = item.token_count,
            ?outcome,
            "context item upserted"
        );
        self.items.insert(item.id.clone(), item);
        outcome
    }

    pub fn remove(&mut self, id: &ItemId) -> Option<ContextItem> {
        let removed = self.items.remove(id);
        if removed.is_some() {
            debug!(%id, "context item removed");
        }
        removed
    }

    pub fn get(&self, id: &ItemId) -> Option<&ContextItem> {
        self.items.get(id)
    }

    pub fn get_by_path(&self, path: &str) -> Option<&ContextItem> {
        let wanted = normalize_path(path);
        self.items.values().find(|item| item.display_path == wanted)
    }

    pub fn set_tier(&mut self, id: &ItemId, tier: Tier) -> Result<(), StoreError> {
        let order = self.stamp();
        let item = self
            .items
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownItem(id.clone()))?;
        item.tier = tier;
        item.order = order;
        Ok(())
    }

    /// Re-stamp a tier so `ordered_ids` come first, in the given order,
    /// followed by the rest of the tier in its previous order. Ids that are
    /// unknown or live in another tier are ignored.
    pub fn reorder_within_tier(&mut self, tier: Tier, ordered_ids: &[ItemId]) {
        let mut sequence: Vec<ItemId> = Vec::new();
        for id in ordered_ids {
            let in_tier = self.items.get(id).is_some_and(|item| item.tier == tier);
            if in_tier && !sequence.contains(id) {
                sequence.push(id.clone());
            }
        }
        let rest: Vec<ItemId> = self
            .list_tier(tier)
            .into_iter()
            .map(|item| item.id.clone())
            .filter(|id| !sequence.contains(id))
            .collect();
        sequence.extend(rest);

        for id in sequence {
            let order = self.stamp();
            if let Some(item) = self.items.get_mut(&id) {
                item.order = order;
            }
        }
    }

    /// Record that `ids` were included in turn `message_seq`. Unknown ids
    /// are skipped; `last_used_message` never decreases.
    pub fn mark_used(&mut self, ids: &[ItemId], message_seq: u64) -> usize {
        let mut updated = 0;
        for id in ids {
            let order = self.stamp();
            if let Some(item) = self.items.get_mut(id) {
                let seen = item.last_used_message.map_or(message_seq, |seen| seen.max(message_seq));
                item.last_used_message = Some(seen);
                item.order = order;
                updated += 1;
            }
        }
        updated
    }

    /// Drop one-time items consumed in turn `message_seq` or later.
    ///
    /// Must run after [`mark_used`](Self::mark_used) for the same turn:
    /// items never included are kept for a later turn.
    pub fn remove_one_time_after_use(&mut self, message_seq: u64) -> Vec<ContextItem> {
        let expired: Vec<ItemId> = self
            .items
            .values()
            .filter(|item| {
                item.tier == Tier::OneTime
                    && item.last_used_message.is_some_and(|seen| seen >= message_seq)
            })
            .map(|item| item.id.clone())
            .collect();

        let removed: Vec<ContextItem> = expired
            .iter()
            .filter_map(|id| self.items.remove(id))
            .collect();
        if !removed.is_empty() {
            debug!(count = removed.len(), message_seq, "one-time context items expired");
        }
        removed
    }

    /// Items of `tier` in ascending `order`.
    pub fn list_tier(&self, tier: Tier) -> Vec<&ContextItem> {
        let mut items: Vec<&ContextItem> = self
            .items
            .values()
            .filter(|item| item.tier == tier)
            .collect();
        items.sort_by_key(|item| item.order);
        items
    }

    /// Items of `tier` in serialization priority. The conversation tier puts
    /// the most recently referenced items first.
    pub fn priority_order(&self, tier: Tier) -> Vec<&ContextItem> {
        let mut items = self.list_tier(tier);
        if tier == Tier::Conversation {
            // Stable sort keeps `order` ascending within equal last-use.
            items.sort_by(|a, b| b.last_used_message.cmp(&a.last_used_message));
        }
        items
    }

    pub fn clear_tier(&mut self, tier: Tier) -> Vec<ContextItem> {
        let ids: Vec<ItemId> = self
            .list_tier(tier)
            .into_iter()
            .map(|item| item.id.clone())
            .collect();
        ids.iter().filter_map(|id| self.items.remove(id)).collect()
    }

    /// Reset for a new session: persistent items survive, everything else goes.
    pub fn start_new_session(&mut self) -> Vec<ContextItem> {
        let mut removed = self.clear_tier(Tier::Conversation);
        removed.extend(self.clear_tier(Tier::OneTime));
        debug!(removed = removed.len(), "context store reset for new session");
        removed
    }

    pub fn serialize_tier(&self, tier: Tier, budget_tokens: usize) -> TierSerialization {
        serialize_items(self.priority_order(tier), budget_tokens, &self.tokenizer)
    }

    pub fn serialize_all(&self, budgets: TierBudgets) -> Vec<(Tier, TierSerialization)> {
        Tier::ALL
            .iter()
            .map(|&tier| (tier, self.serialize_tier(tier, budgets.for_tier(tier))))
            .collect()
    }

    /// Recompute `changed_on_disk` / `missing_on_disk` for workspace items.
    /// The flags are advisory and never affect serialization eligibility.
    pub fn refresh_staleness<P: DiskProbe + ?Sized>(&mut self, probe: &P) -> StalenessReport {
        let mut report = StalenessReport::default();
        for item in self.items.values_mut() {
            staleness::refresh_item(item, probe);
            if item.missing_on_disk {
                report.missing.push(item.id.clone());
            } else if item.changed_on_disk {
                report.changed.push(item.id.clone());
            }
        }
        report
    }
}
