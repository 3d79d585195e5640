// src/process/split.rs
use std::collections::HashSet;
use tracing::{debug, instrument, trace};

use crate::error::{PipelineError, Result};
use crate::process::raw_table::{RawRow, RawTable};
use crate::process::utils::split_fields;

/// Split the concatenated input into one `RawTable` per header block.
///
/// A trimmed line starting with `header_token` opens a new block; every other
/// non-blank line is a data row of the current block. Blocks with no rows
/// are skipped, so consecutive header lines yield a single table.
#[instrument(level = "info", skip(text), fields(bytes = text.len()))]
pub fn split_tables(text: &str, header_token: &str) -> Result<Vec<RawTable>> {
    let mut tables: Vec<RawTable> = Vec::new();
    let mut header: Option<Vec<String>> = None;
    let mut rows: Vec<RawRow> = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with(header_token) {
            if let Some(cols) = header.take() {
                flush(&mut tables, cols, &mut rows);
            }
            let cols = split_fields(line);
            if let Some(dup) = first_duplicate(&cols) {
                return Err(PipelineError::DuplicateColumn {
                    table: format!("header at line {}", line_no),
                    column: dup.to_string(),
                });
            }
            trace!(line = line_no, columns = cols.len(), "header");
            header = Some(cols);
            continue;
        }

        let expected = match header.as_ref() {
            Some(cols) => cols.len(),
            None => return Err(PipelineError::MissingHeader { line: line_no }),
        };
        let fields = split_fields(line);
        if fields.len() != expected {
            return Err(PipelineError::MalformedInput {
                line: line_no,
                expected,
                found: fields.len(),
            });
        }
        rows.push(RawRow {
            line: line_no,
            fields,
        });
    }

    if let Some(cols) = header {
        flush(&mut tables, cols, &mut rows);
    }

    debug!(tables = tables.len(), "split complete");
    Ok(tables)
}

fn first_duplicate(cols: &[String]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(cols.len());
    cols.iter().map(String::as_str).find(|c| !seen.insert(*c))
}

fn flush(tables: &mut Vec<RawTable>, headers: Vec<String>, rows: &mut Vec<RawRow>) {
    if rows.is_empty() {
        return;
    }
    let index = tables.len();
    debug!(table = index, rows = rows.len(), "table block");
    tables.push(RawTable {
        index,
        headers,
        rows: std::mem::take(rows),
    });
}
