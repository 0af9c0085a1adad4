mod common;

use context_patch_core::store::{
    ContextItem, ItemSource, StoreError, Tier, TierBudgets, TieredContextStore, UpsertOutcome,
};
use context_patch_core::tokens::{HeuristicTokenizer, TokenCounter};
use context_patch_core::types::ItemId;
use common::{init_test_tracing, words};
use pretty_assertions::assert_eq;

fn text_item(path: &str, body: &str, tier: Tier) -> ContextItem {
    ContextItem::text(path, body, ItemSource::Workspace)
        .unwrap()
        .with_tier(tier)
}

fn id(s: &str) -> ItemId {
    ItemId::from_display_path(s).unwrap()
}

fn ids_of(items: &[&ContextItem]) -> Vec<String> {
    items.iter().map(|i| i.id.as_str().to_string()).collect()
}

#[test]
fn upsert_keeps_one_item_per_id_and_preserves_usage() {
    let mut store = TieredContextStore::new();
    assert_eq!(
        store.upsert(text_item("a.rs", "fn a() {}", Tier::Conversation)),
        UpsertOutcome::Inserted
    );
    store.mark_used(&[id("a.rs")], 3);

    let outcome = store.upsert(text_item("./a.rs", "fn a() { 1 }", Tier::Conversation));
    assert_eq!(outcome, UpsertOutcome::Updated);
    assert_eq!(store.len(), 1);

    let item = store.get(&id("a.rs")).unwrap();
    assert_eq!(item.text_payload(), Some("fn a() { 1 }"));
    assert_eq!(item.last_used_message, Some(3));
    assert_eq!(item.token_count, HeuristicTokenizer.count_tokens("fn a() { 1 }"));

    let again = store.upsert(text_item("a.rs", "fn a() { 1 }", Tier::Conversation));
    assert_eq!(again, UpsertOutcome::Unchanged);
}

#[test]
fn order_is_monotonic_across_tiers() {
    let mut store = TieredContextStore::new();
    store.upsert(text_item("p.rs", "p", Tier::Persistent));
    store.upsert(text_item("c.rs", "c", Tier::Conversation));
    store.upsert(text_item("o.rs", "o", Tier::OneTime));

    let orders: Vec<u64> = ["p.rs", "c.rs", "o.rs"]
        .iter()
        .map(|p| store.get(&id(p)).unwrap().order)
        .collect();
    assert!(orders.windows(2).all(|w| w[0] < w[1]));

    store.set_tier(&id("p.rs"), Tier::Conversation).unwrap();
    let moved = store.get(&id("p.rs")).unwrap();
    assert_eq!(moved.tier, Tier::Conversation);
    assert!(moved.order > orders[2]);
    assert_eq!(ids_of(&store.list_tier(Tier::Conversation)), vec!["c.rs", "p.rs"]);
}

#[test]
fn set_tier_on_unknown_item_fails() {
    let mut store = TieredContextStore::new();
    let err = store.set_tier(&id("ghost.rs"), Tier::Persistent).unwrap_err();
    assert!(matches!(err, StoreError::UnknownItem(ref missing) if missing.as_str() == "ghost.rs"));
}

#[test]
fn reorder_within_tier_puts_listed_ids_first() {
    let mut store = TieredContextStore::new();
    for p in ["a.rs", "b.rs", "c.rs", "d.rs"] {
        store.upsert(text_item(p, p, Tier::Persistent));
    }
    store.upsert(text_item("other.rs", "x", Tier::Conversation));

    store.reorder_within_tier(
        Tier::Persistent,
        &[id("c.rs"), id("other.rs"), id("missing.rs"), id("a.rs")],
    );

    assert_eq!(ids_of(&store.list_tier(Tier::Persistent)), vec!["c.rs", "a.rs", "b.rs", "d.rs"]);
    assert_eq!(store.get(&id("other.rs")).unwrap().tier, Tier::Conversation);
}

#[test]
fn get_by_path_normalizes() {
    let mut store = TieredContextStore::new();
    store.upsert(text_item("src/main.rs", "fn main() {}", Tier::Conversation));
    assert!(store.get_by_path("./src/main.rs").is_some());
    assert!(store.get_by_path("src\\main.rs").is_some());
    assert!(store.get_by_path("src/lib.rs").is_none());
}

#[test]
fn one_time_expiry_follows_message_sequence() {
    for (seq, expect_removed) in [(4, true), (5, true), (6, false)] {
        let mut store = TieredContextStore::new();
        store.upsert(text_item("once.txt", "look at this", Tier::OneTime));
        store.upsert(text_item("later.txt", "not yet used", Tier::OneTime));
        store.upsert(text_item("keep.rs", "persistent", Tier::Persistent));
        store.mark_used(&[id("once.txt"), id("keep.rs")], 5);

        let removed = store.remove_one_time_after_use(seq);
        let removed_ids: Vec<&str> = removed.iter().map(|i| i.id.as_str()).collect();
        if expect_removed {
            assert_eq!(removed_ids, vec!["once.txt"], "seq {seq}");
        } else {
            assert!(removed_ids.is_empty(), "seq {seq}");
        }
        assert!(store.get(&id("later.txt")).is_some());
        assert!(store.get(&id("keep.rs")).is_some());

        // Running expiry again is a no-op.
        assert!(store.remove_one_time_after_use(seq).is_empty());
    }
}

#[test]
fn mark_used_never_lowers_last_use() {
    let mut store = TieredContextStore::new();
    store.upsert(text_item("a.rs", "a", Tier::Conversation));
    assert_eq!(store.mark_used(&[id("a.rs"), id("nope.rs")], 7), 1);
    store.mark_used(&[id("a.rs")], 2);
    assert_eq!(store.get(&id("a.rs")).unwrap().last_used_message, Some(7));
}

#[test]
fn conversation_tier_serializes_most_recent_first() {
    let mut store = TieredContextStore::new();
    store.upsert(text_item("old.rs", "old", Tier::Conversation));
    store.upsert(text_item("new.rs", "new", Tier::Conversation));
    store.upsert(text_item("never.rs", "never", Tier::Conversation));
    store.mark_used(&[id("old.rs")], 9);
    store.mark_used(&[id("new.rs")], 4);

    let out = store.serialize_tier(Tier::Conversation, 10_000);
    assert_eq!(out.used_ids, vec![id("old.rs"), id("new.rs"), id("never.rs")]);
    assert!(!out.warning);
    assert_eq!(out.omitted, 0);
    assert!(out.text.starts_with("--- old.rs [rust] (conversation)\nold\n"));
}

#[test]
fn tight_budget_falls_back_to_summary_then_omits() {
    init_test_tracing();
    let mut store = TieredContextStore::new();
    let big_body: String = (0..60).map(|i| format!("line {i} {}\n", words(10))).collect();
    store.upsert(text_item("small.rs", "fn s() {}", Tier::Persistent));
    store.upsert(text_item("big.rs", &big_body, Tier::Persistent));
    store.upsert(text_item("tail.rs", &words(400), Tier::Persistent));

    let out = store.serialize_tier(Tier::Persistent, 350);

    assert_eq!(out.used_ids, vec![id("small.rs"), id("big.rs")]);
    assert!(out.warning);
    assert_eq!(out.omitted, 1);
    assert!(out.tokens_used <= 350);
    assert!(out.text.contains("--- big.rs [rust] (persistent) (summary)"));
    assert!(!out.text.contains("line 59"));
}

#[test]
fn serialize_all_covers_every_tier_in_order() {
    let mut store = TieredContextStore::new();
    store.upsert(text_item("p.md", "persist", Tier::Persistent));
    store.upsert(text_item("o.md", "once", Tier::OneTime));

    let budgets = TierBudgets {
        persistent: 100,
        conversation: 100,
        one_time: 100,
    };
    let all = store.serialize_all(budgets);
    let tiers: Vec<Tier> = all.iter().map(|(t, _)| *t).collect();
    assert_eq!(tiers, vec![Tier::Persistent, Tier::Conversation, Tier::OneTime]);
    assert_eq!(all[0].1.used_ids, vec![id("p.md")]);
    assert!(all[1].1.text.is_empty());
    assert_eq!(all[2].1.used_ids, vec![id("o.md")]);
}

#[test]
fn new_session_keeps_only_persistent_items() {
    let mut store = TieredContextStore::new();
    store.upsert(text_item("p.rs", "p", Tier::Persistent));
    store.upsert(text_item("c.rs", "c", Tier::Conversation));
    store.upsert(text_item("o.rs", "o", Tier::OneTime));

    let removed = store.start_new_session();
    assert_eq!(removed.len(), 2);
    assert_eq!(store.len(), 1);
    assert!(store.get(&id("p.rs")).is_some());

    assert_eq!(store.clear_tier(Tier::Persistent).len(), 1);
    assert!(store.is_empty());
}

#[test]
fn removal_is_explicit_and_idempotent() {
    let mut store = TieredContextStore::new();
    store.upsert(text_item("a.rs", "a", Tier::Conversation));
    assert!(store.remove(&id("a.rs")).is_some());
    assert!(store.remove(&id("a.rs")).is_none());
}
