//! Normalize command implementation.

use crate::output;
use qgs_normalize::{normalize_project, ProjectFile, WriteOptions};
use serde_json::json;
use tracing::debug;

pub fn run(files: Vec<String>, json_output: bool, sync: bool) -> Result<(), Box<dyn std::error::Error>> {
    let options = WriteOptions { sync };
    let mut failures = 0usize;
    let mut results = Vec::new();

    if !json_output {
        output::print_table_header();
    }

    for file in &files {
        let project = ProjectFile::detect(file);
        debug!(?project, "normalizing");
        match normalize_project(&project, &options) {
            Ok(outcome) => {
                if json_output {
                    results.push(json!({ "path": file, "outcome": outcome }));
                } else {
                    println!("{}", output::format_outcome_row(file, &outcome));
                }
            }
            Err(e) => {
                failures += 1;
                if json_output {
                    results.push(json!({ "path": file, "error": e.to_string() }));
                } else {
                    println!("{}", output::format_error_row(file, &e.to_string()));
                }
            }
        }
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    if failures > 0 {
        return Err(format!("{} of {} files could not be normalized", failures, files.len()).into());
    }
    Ok(())
}
