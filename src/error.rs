// src/error.rs

use serde::Serialize;
use thiserror::Error;

/// Fatal conditions. Any of these aborts the whole run with no partial output.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("line {line}: data row has {found} fields but the header has {expected}")]
    MalformedInput {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: data row appears before any header line")]
    MissingHeader { line: usize },

    #[error("table {table}: missing column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("{source_name} line {line}: column '{column}' value {value:?} is not an integer")]
    TypeConversion {
        source_name: String,
        line: usize,
        column: String,
        value: String,
    },

    #[error("{series} series has {found} values but the tables hold {expected} rows")]
    LengthMismatch {
        series: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid compact date {value:?} (expected YYYYMMDD)")]
    InvalidDate { value: String },

    #[error("table {table}: date {date} occurs more than once")]
    DuplicateDate { table: usize, date: String },

    #[error("{table}: column '{column}' appears more than once")]
    DuplicateColumn { table: String, column: String },

    #[error("region {region}, {date}: column '{column}' sum overflows")]
    Overflow {
        region: String,
        column: String,
        date: String,
    },

    #[error("{labels} region labels configured but the input yields {regions} regions")]
    RegionCountMismatch { labels: usize, regions: usize },
}

pub type Result<T> = core::result::Result<T, PipelineError>;

/// Which half of a region pair a row or column came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    First,
    Second,
}

/// Recoverable conditions. Recorded in the run summary and logged; never abort.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum PipelineWarning {
    /// Odd table count; the trailing table had no partner and was dropped.
    UnpairedRegion { table: usize },
    /// Total was zero so Match% is NaN for this day.
    DivisionByZero { region: String, date: String },
    /// A date was present in only one table of a pair.
    DateMismatch {
        region: String,
        date: String,
        present_in: Side,
    },
    /// A column was present in only one table of a pair.
    ColumnMismatch {
        region: String,
        column: String,
        present_in: Side,
    },
    /// The region has no row for a day of the global date index.
    MissingDay { region: String, date: String },
}
