//! Output formatting utilities.

use qgs_canonical::Digest;
use qgs_normalize::Outcome;

const PATH_WIDTH: usize = 48;

/// Prints table header.
#[allow(clippy::print_literal)]
pub fn print_table_header() {
    println!("{:<48} {}", "FILE", "RESULT");
    println!("{}", "-".repeat(80));
}

/// Formats one file's result as a table row.
pub fn format_row(path: &str, result: &str) -> String {
    format!("{:<48} {}", truncate_left(path, PATH_WIDTH), result)
}

/// Formats a normalize outcome as a table row.
pub fn format_outcome_row(path: &str, outcome: &Outcome) -> String {
    let result = match outcome {
        Outcome::Skipped { reason } => format!("skipped: {}", reason),
        Outcome::Unchanged { report } => format!("unchanged {}", short_digest(report.digest.as_ref())),
        Outcome::Rewritten { report } => format!(
            "rewritten {} (removed {}, reordered {}, symbols {})",
            short_digest(report.digest.as_ref()),
            report.removed_attributes.len(),
            report.collections_reordered,
            report.fragments_rewritten
        ),
    };
    format_row(path, &result)
}

/// Formats a failure as a table row.
pub fn format_error_row(path: &str, error: &str) -> String {
    format_row(path, &format!("error: {}", error))
}

fn short_digest(digest: Option<&Digest>) -> String {
    match digest {
        Some(digest) => digest.b64.chars().take(12).collect(),
        None => "?".to_string(),
    }
}

/// Keeps the end of long paths, where the file name is.
fn truncate_left(s: &str, max_len: usize) -> String {
    let count = s.chars().count();
    if count <= max_len {
        s.to_string()
    } else {
        let tail: String = s.chars().skip(count - max_len.saturating_sub(3)).collect();
        format!("...{}", tail)
    }
}
