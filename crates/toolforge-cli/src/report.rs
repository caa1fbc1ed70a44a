//! Plain-text output for `show` and `check`

use std::fmt::Write as _;
use toolforge_manifest::{LintIssue, Manifest};

/// Column layout of the manifest table
const HEADERS: [&str; 5] = ["KEY", "LABEL", "MODULE", "TIER", "SECTION"];

/// Render the manifest as an aligned table
#[must_use]
pub fn manifest_table(manifest: &Manifest) -> String {
    if manifest.is_empty() {
        return "(no tools registered)\n".to_string();
    }

    let rows: Vec<[String; 5]> = manifest
        .records()
        .iter()
        .map(|r| {
            [
                r.key.clone(),
                r.label.clone(),
                r.target.clone(),
                r.tier().as_str().to_string(),
                r.section().unwrap_or("-").to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS.map(str::to_string), &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let mut line = String::new();
    for (cell, width) in cells.iter().zip(widths) {
        let _ = write!(line, "{cell:<width$}  ");
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Render lint findings; returns the text and whether any is fatal
#[must_use]
pub fn lint_report(source: &str, issues: &[LintIssue]) -> (String, bool) {
    if issues.is_empty() {
        return (format!("{source}: OK\n"), false);
    }

    let fatal = issues.iter().any(LintIssue::is_fatal);
    let mut out = String::new();
    for issue in issues {
        let level = if issue.is_fatal() { "error" } else { "warning" };
        let _ = writeln!(out, "{source}: {level}: {issue}");
    }
    let errors = issues.iter().filter(|i| i.is_fatal()).count();
    let _ = writeln!(
        out,
        "{source}: {errors} error(s), {} warning(s)",
        issues.len() - errors
    );
    (out, fatal)
}
