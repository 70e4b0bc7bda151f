//! Check command implementation.

use crate::output;
use qgs_normalize::{normalize_bytes, ProjectFile, SkipReason};
use serde_json::json;
use tracing::debug;

/// Per-file verdict of a check run.
enum Verdict {
    Canonical,
    NeedsNormalization,
    Skipped(SkipReason),
    Failed(String),
}

impl Verdict {
    fn label(&self) -> String {
        match self {
            Verdict::Canonical => "ok".to_string(),
            Verdict::NeedsNormalization => "needs normalization".to_string(),
            Verdict::Skipped(reason) => format!("skipped: {}", reason),
            Verdict::Failed(error) => format!("error: {}", error),
        }
    }

    fn passes(&self) -> bool {
        matches!(self, Verdict::Canonical | Verdict::Skipped(_))
    }
}

fn check_file(file: &str) -> Verdict {
    let project = ProjectFile::detect(file);
    debug!(?project, "checking");
    if let Some(reason) = project.skip_reason() {
        return Verdict::Skipped(reason);
    }

    let source = match std::fs::read(&project.path) {
        Ok(source) => source,
        Err(e) => return Verdict::Failed(format!("Failed to read file: {}", e)),
    };
    match normalize_bytes(&source) {
        Ok(normalized) if normalized.report.changed => Verdict::NeedsNormalization,
        Ok(_) => Verdict::Canonical,
        Err(e) => Verdict::Failed(e.to_string()),
    }
}

pub fn run(files: Vec<String>, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let verdicts: Vec<(String, Verdict)> = files
        .into_iter()
        .map(|file| {
            let verdict = check_file(&file);
            (file, verdict)
        })
        .collect();
    let all_ok = verdicts.iter().all(|(_, verdict)| verdict.passes());

    // Output results
    if json_output {
        let json_results: Vec<_> = verdicts
            .iter()
            .map(|(path, verdict)| {
                json!({
                    "path": path,
                    "canonical": matches!(verdict, Verdict::Canonical),
                    "verdict": verdict.label(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json_results)?);
    } else {
        output::print_table_header();
        for (path, verdict) in &verdicts {
            println!("{}", output::format_row(path, &verdict.label()));
        }
    }

    if !all_ok {
        std::process::exit(1);
    }

    Ok(())
}
