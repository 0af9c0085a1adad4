use context_patch_core::diff::{
    diff_lines, diff_text, render_unified, DiffRun, EditKind, EditScript,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn substitution_scenario() {
    let old = ["a", "b", "c"];
    let new = ["a", "x", "c"];
    let script = diff_lines(&old, &new);

    assert_eq!(
        script.runs,
        vec![
            DiffRun::new(EditKind::Equal, lines(&["a"])),
            DiffRun::new(EditKind::Delete, lines(&["b"])),
            DiffRun::new(EditKind::Insert, lines(&["x"])),
            DiffRun::new(EditKind::Equal, lines(&["c"])),
        ]
    );
    assert_eq!(script.added(), 1);
    assert_eq!(script.removed(), 1);
}

#[test]
fn identical_inputs_yield_single_equal_run() {
    let text = ["fn main() {", "    println!(\"hi\");", "}"];
    let script = diff_lines(&text, &text);
    assert_eq!(script.runs, vec![DiffRun::new(EditKind::Equal, lines(&text))]);
    assert!(script.is_identity());
    assert_eq!((script.added(), script.removed()), (0, 0));
}

#[test]
fn runs_are_coalesced() {
    let script = diff_lines(&["a", "b", "c"], &["x", "y"]);
    assert_eq!(
        script.runs,
        vec![
            DiffRun::new(EditKind::Delete, lines(&["a", "b", "c"])),
            DiffRun::new(EditKind::Insert, lines(&["x", "y"])),
        ]
    );
}

#[test]
fn diff_text_normalizes_line_endings() {
    let script = diff_text("one\r\ntwo\r\n", "one\ntwo\nthree\n");
    assert_eq!(script.added(), 1);
    assert_eq!(script.removed(), 0);
    assert_eq!(script.new_lines(), lines(&["one", "two", "three"]));
}

#[test]
fn unified_render_shows_every_line() {
    let script = diff_lines(&["a", "b", "c"], &["a", "x", "c"]);
    let rendered = render_unified(&script, "src/lib.rs");
    assert_eq!(rendered.added, 1);
    assert_eq!(rendered.removed, 1);
    assert_eq!(
        rendered.text,
        "--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -1,3 +1,3 @@\n a\n-b\n+x\n c\n"
    );
}

#[test]
fn unified_render_of_new_file() {
    let empty: [&str; 0] = [];
    let rendered = render_unified(&diff_lines(&empty, &["x"]), "new.txt");
    assert_eq!(rendered.text, "--- a/new.txt\n+++ b/new.txt\n@@ -0,0 +1,1 @@\n+x\n");
}

#[test]
fn empty_script_is_identity() {
    let script = EditScript::default();
    assert!(script.is_identity());
    let empty: [&str; 0] = [];
    assert!(script.apply(&empty).is_empty());
}

#[test]
fn unrelated_large_buffers_replace_every_line() {
    let old: Vec<String> = (0..1_500).map(|i| format!("old {i}")).collect();
    let new: Vec<String> = (0..1_500).map(|i| format!("new {i}")).collect();
    let script = diff_lines(&old, &new);
    assert_eq!(script.removed(), 1_500);
    assert_eq!(script.added(), 1_500);
    assert_eq!(script.runs.len(), 2);
    assert_eq!(script.apply(&old), new);
}

fn line_vec() -> impl Strategy<Value = Vec<String>> {
    // Small alphabet so lines repeat and the search has real choices.
    proptest::collection::vec(prop::sample::select(vec!["a", "b", "c", "d", ""]), 0..24)
        .prop_map(|v| v.into_iter().map(String::from).collect())
}

/// Longest common subsequence length by dynamic programming.
fn lcs_len(a: &[String], b: &[String]) -> usize {
    let mut table = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            table[i][j] = if a[i - 1] == b[j - 1] {
                table[i - 1][j - 1] + 1
            } else {
                table[i - 1][j].max(table[i][j - 1])
            };
        }
    }
    table[a.len()][b.len()]
}

proptest! {
    #[test]
    fn replay_reconstructs_new(old in line_vec(), new in line_vec()) {
        let script = diff_lines(&old, &new);
        prop_assert_eq!(script.apply(&old), new.clone());
        prop_assert_eq!(script.old_lines(), old);
        prop_assert_eq!(script.new_lines(), new);
    }

    #[test]
    fn swapping_inputs_swaps_counts(old in line_vec(), new in line_vec()) {
        let forward = diff_lines(&old, &new);
        let backward = diff_lines(&new, &old);
        prop_assert_eq!(forward.added(), backward.removed());
        prop_assert_eq!(forward.removed(), backward.added());
    }

    #[test]
    fn script_length_matches_lcs_distance(old in line_vec(), new in line_vec()) {
        let script = diff_lines(&old, &new);
        let common = lcs_len(&old, &new);
        prop_assert_eq!(script.added() + script.removed(), old.len() + new.len() - 2 * common);
        prop_assert_eq!(script.removed(), old.len() - common);
    }

    #[test]
    fn diff_is_deterministic(old in line_vec(), new in line_vec()) {
        prop_assert_eq!(diff_lines(&old, &new), diff_lines(&old, &new));
    }
}
