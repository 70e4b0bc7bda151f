//! Canonicalize command implementation.

use qgs_normalize::normalize_bytes;
use std::io::{self, Read, Write};

pub fn run(input: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    // Read project XML from file or stdin
    let source = if let Some(path) = input {
        std::fs::read(&path).map_err(|e| format!("Failed to read file {}: {}", path, e))?
    } else {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer)?;
        buffer
    };

    let normalized =
        normalize_bytes(&source).map_err(|e| format!("Normalization failed: {}", e))?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(&normalized.bytes)?;
    stdout.flush()?;
    Ok(())
}
