// src/process/normalize.rs
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::TableLayout;
use crate::error::{PipelineError, Result};
use crate::process::raw_table::RawTable;

/// A named column of integer counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntColumn {
    pub name: String,
    pub values: Vec<i64>,
}

/// A sub-region table with its date column split off and every other
/// column coerced to integers.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub index: usize,
    /// Compact `YYYYMMDD` dates, parallel to every column.
    pub dates: Vec<String>,
    pub columns: Vec<IntColumn>,
    /// Rows removed because a cell held the missing sentinel.
    pub dropped_rows: usize,
}

impl NormalizedTable {
    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    pub fn column(&self, name: &str) -> Option<&IntColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Append a column; `values` must have one entry per row.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<i64>) {
        debug_assert_eq!(values.len(), self.row_count());
        self.columns.push(IntColumn {
            name: name.into(),
            values,
        });
    }
}

/// Drop rows holding the missing sentinel, split off the date column, drop
/// the match column, and parse what remains as `i64`.
#[instrument(level = "debug", skip(raw, layout), fields(table = raw.index))]
pub fn normalize_table(raw: &RawTable, layout: &TableLayout) -> Result<NormalizedTable> {
    let table_name = format!("table {}", raw.index);

    // 1) rows with any absent cell go entirely
    let kept: Vec<_> = raw
        .rows
        .iter()
        .filter(|r| !r.fields.iter().any(|f| *f == layout.missing_sentinel))
        .collect();
    let dropped_rows = raw.rows.len() - kept.len();
    if dropped_rows > 0 {
        debug!(dropped_rows, "dropped rows with missing cells");
    }

    // 2) date column
    let date_idx = raw
        .column_index(&layout.date_column)
        .ok_or_else(|| PipelineError::MissingColumn {
            table: table_name.clone(),
            column: layout.date_column.clone(),
        })?;
    let dates: Vec<String> = kept.iter().map(|r| r.fields[date_idx].clone()).collect();

    // 3) match column is recomputed after merging
    let match_idx = raw.column_index(&layout.match_column);
    if match_idx.is_none() {
        debug!(column = %layout.match_column, "match column absent; nothing to drop");
    }

    // 4) everything else must be an integer
    let mut columns = Vec::with_capacity(raw.headers.len().saturating_sub(2));
    for (col_idx, name) in raw.headers.iter().enumerate() {
        if col_idx == date_idx || Some(col_idx) == match_idx {
            continue;
        }
        let values = kept
            .iter()
            .map(|r| {
                let cell = &r.fields[col_idx];
                cell.parse::<i64>()
                    .map_err(|_| PipelineError::TypeConversion {
                        source_name: table_name.clone(),
                        line: r.line,
                        column: name.clone(),
                        value: cell.clone(),
                    })
            })
            .collect::<Result<Vec<i64>>>()?;
        columns.push(IntColumn {
            name: name.clone(),
            values,
        });
    }

    debug!(rows = dates.len(), columns = columns.len(), "normalized");
    Ok(NormalizedTable {
        index: raw.index,
        dates,
        columns,
        dropped_rows,
    })
}
