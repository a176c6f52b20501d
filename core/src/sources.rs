//! Newline-delimited data sources (wordlists, salt lists, target lists).

use log::debug;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Split text into ordered entries, one per line, each trimmed.
/// Blank lines stay as empty entries; a final newline does not add one.
pub fn parse_lines(content: &str) -> Vec<String> {
    content.lines().map(|l| l.trim().to_string()).collect()
}

/// Read a newline-delimited file into ordered entries, as [`parse_lines`] does.
pub fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut out = Vec::new();
    for line in reader.lines() {
        out.push(line?.trim().to_string());
    }
    debug!("loaded {} entries from {}", out.len(), path.display());
    Ok(out)
}
