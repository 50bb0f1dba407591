use crate::error::{AskdbError, Result};
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

/// Loads the table catalog that grounds SQL generation.
///
/// The file is a CSV with `Table` and `Description` columns (any casing).
/// Each row with a non-empty table name becomes one `- {table}: {description}`
/// line, in file order. A missing file is not an error: the system keeps
/// working without schema hints, it just prompts blind.
pub fn load(path: &Path) -> String {
    match read_catalog(path) {
        Ok(text) => text,
        Err(AskdbError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            debug!(
                "Catalog file {} not found, continuing without schema hints",
                path.display()
            );
            String::new()
        }
        Err(e) => {
            warn!("Failed to read catalog {}: {}", path.display(), e);
            String::new()
        }
    }
}

fn read_catalog(path: &Path) -> Result<String> {
    let file = std::fs::File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AskdbError::Catalog(format!("Failed to read catalog headers: {}", e)))?
        .clone();

    let table_idx = find_column(&headers, "table");
    let desc_idx = find_column(&headers, "description");

    let mut lines = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| AskdbError::Catalog(format!("Failed to read catalog row: {}", e)))?;
        let table = table_idx
            .and_then(|i| record.get(i))
            .unwrap_or("")
            .trim();
        if table.is_empty() {
            continue;
        }
        let description = desc_idx.and_then(|i| record.get(i)).unwrap_or("").trim();
        lines.push(format!("- {}: {}", table, description));
    }

    Ok(lines.join("\n"))
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}
