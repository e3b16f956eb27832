//! Line-level diff stats for result messages.

use similar::{ChangeTag, TextDiff};

/// Compute diff stats (additions and deletions) between old and new content.
#[must_use]
pub fn compute_diff_stats(old_text: &str, new_text: &str) -> (u32, u32) {
    let diff = TextDiff::from_lines(old_text, new_text);

    let mut additions: u32 = 0;
    let mut deletions: u32 = 0;

    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => additions += 1,
            ChangeTag::Delete => deletions += 1,
            ChangeTag::Equal => {}
        }
    }

    (additions, deletions)
}

/// Format stats as a compact `(+a, -d)` suffix, or empty when unchanged.
#[must_use]
pub fn format_stats(additions: u32, deletions: u32) -> String {
    if additions == 0 && deletions == 0 {
        String::new()
    } else {
        format!(" (+{additions}, -{deletions})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_count_insert_and_delete_lines() {
        let old = "a\nb\nc\n";
        let new = "a\nB\nc\nd\n";
        let (adds, dels) = compute_diff_stats(old, new);
        assert_eq!(adds, 2); // B, d
        assert_eq!(dels, 1); // b
    }

    #[test]
    fn stats_zero_for_identical_content() {
        let (adds, dels) = compute_diff_stats("same\n", "same\n");
        assert_eq!((adds, dels), (0, 0));
        assert_eq!(format_stats(adds, dels), "");
    }

    #[test]
    fn format_stats_suffix() {
        assert_eq!(format_stats(3, 1), " (+3, -1)");
    }
}
