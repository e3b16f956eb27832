//! Outcome assembly: messages, change summaries, preview info.

use typeshift_types::{FileChangeReport, PreviewInfo};

/// "… across N file(s) (M edit(s))" summary with per-file detail lines.
pub(crate) fn summarize(action: &str, reports: &[FileChangeReport]) -> String {
    let edit_count: usize = reports.iter().map(|r| r.edits.len()).sum();
    let mut message = format!(
        "{action} across {} file{} ({edit_count} edit{}).",
        reports.len(),
        plural(reports.len()),
        plural(edit_count),
    );

    for report in reports {
        let (adds, dels) = report_stats(report);
        message.push_str(&format!(
            "\n- {}{}",
            report.path.display(),
            typeshift_utils::format_stats(adds, dels)
        ));
    }

    message
}

/// Line-level stats approximated from the edit records.
fn report_stats(report: &FileChangeReport) -> (u32, u32) {
    let mut adds = 0;
    let mut dels = 0;
    for edit in &report.edits {
        let (a, d) = typeshift_utils::compute_diff_stats(&edit.old, &edit.new);
        adds += a;
        dels += d;
    }
    (adds, dels)
}

pub(crate) fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

/// Preview details: the same operation re-run without `--preview` applies
/// exactly these edits.
pub(crate) fn preview_info(files_affected: usize, command: String) -> PreviewInfo {
    let estimated_time = if files_affected <= 5 { "<1s" } else { "~5s" };
    PreviewInfo {
        files_affected,
        estimated_time: estimated_time.to_string(),
        command,
    }
}

#[cfg(test)]
mod tests {
    use typeshift_types::EditRecord;

    use super::*;

    #[test]
    fn test_summarize_counts_files_and_edits() {
        let reports = vec![
            FileChangeReport::new(
                "src/a.ts",
                vec![
                    EditRecord {
                        line: 1,
                        old: "processData".into(),
                        new: "handleData".into(),
                    },
                    EditRecord {
                        line: 8,
                        old: "processData".into(),
                        new: "handleData".into(),
                    },
                ],
            ),
            FileChangeReport::new(
                "src/b.ts",
                vec![EditRecord {
                    line: 3,
                    old: "processData".into(),
                    new: "handleData".into(),
                }],
            ),
        ];
        let message = summarize("Renamed 'processData' to 'handleData'", &reports);
        assert!(message.contains("across 2 files (3 edits)."));
        assert!(message.contains("src/a.ts"));
        assert!(message.contains("src/b.ts"));
    }

    #[test]
    fn test_summarize_singular_forms() {
        let reports = vec![FileChangeReport::new(
            "a.ts",
            vec![EditRecord {
                line: 1,
                old: "x".into(),
                new: "y".into(),
            }],
        )];
        let message = summarize("Organized imports", &reports);
        assert!(message.contains("1 file (1 edit)."));
    }

    #[test]
    fn test_preview_estimate_scales() {
        assert_eq!(preview_info(2, String::new()).estimated_time, "<1s");
        assert_eq!(preview_info(40, String::new()).estimated_time, "~5s");
    }
}
