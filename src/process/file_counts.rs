// src/process/file_counts.rs
use anyhow::{Context, Result as AnyResult};
use std::{fs, path::Path};
use tracing::{debug, instrument};

use crate::error::{PipelineError, Result};
use crate::process::normalize::NormalizedTable;

pub const FTP_FILES_COUNT: &str = "FtpFilesCount";
pub const IPDR_FILES_COUNT: &str = "IpdrFilesCount";

/// Per-day file counts from the two collectors, one value per table row,
/// concatenated in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileCountSeries {
    pub ftp: Vec<i64>,
    pub ipdr: Vec<i64>,
}

impl FileCountSeries {
    pub fn from_files(ftp: &Path, ipdr: &Path) -> AnyResult<Self> {
        Ok(Self {
            ftp: read_count_file(ftp)?,
            ipdr: read_count_file(ipdr)?,
        })
    }
}

/// The slices of both series that belong to one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts<'a> {
    pub ftp: &'a [i64],
    pub ipdr: &'a [i64],
}

pub fn read_count_file(path: &Path) -> AnyResult<Vec<i64>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let counts = parse_count_lines(&text, &path.display().to_string())?;
    debug!(path = %path.display(), values = counts.len(), "read count file");
    Ok(counts)
}

/// First whitespace-delimited token of every non-blank line, as an integer.
pub fn parse_count_lines(text: &str, source_name: &str) -> Result<Vec<i64>> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, line)| line.split_whitespace().next().map(|tok| (idx + 1, tok)))
        .map(|(line, tok)| {
            tok.parse::<i64>().map_err(|_| PipelineError::TypeConversion {
                source_name: source_name.to_string(),
                line,
                column: "count".into(),
                value: tok.to_string(),
            })
        })
        .collect()
}

/// Hand out consecutive slices of each series, one per table, sized by the
/// table's row count. Every value must be consumed exactly once.
pub fn attribute_file_counts<'a>(
    series: &'a FileCountSeries,
    row_counts: &[usize],
) -> Result<Vec<TableCounts<'a>>> {
    let expected: usize = row_counts.iter().sum();
    check_len("ftp", expected, series.ftp.len())?;
    check_len("ipdr", expected, series.ipdr.len())?;

    let mut offset = 0;
    let slices = row_counts
        .iter()
        .map(|&n| {
            let range = offset..offset + n;
            offset += n;
            TableCounts {
                ftp: &series.ftp[range.clone()],
                ipdr: &series.ipdr[range],
            }
        })
        .collect();
    Ok(slices)
}

fn check_len(series: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(PipelineError::LengthMismatch {
            series,
            expected,
            found,
        });
    }
    Ok(())
}

/// Append `FtpFilesCount` and `IpdrFilesCount` to every table.
#[instrument(level = "debug", skip_all, fields(tables = tables.len()))]
pub fn attach_file_counts(tables: &mut [NormalizedTable], series: &FileCountSeries) -> Result<()> {
    for table in tables.iter() {
        for name in [FTP_FILES_COUNT, IPDR_FILES_COUNT] {
            if table.column(name).is_some() {
                return Err(PipelineError::DuplicateColumn {
                    table: format!("table {}", table.index),
                    column: name.to_string(),
                });
            }
        }
    }
    let row_counts: Vec<usize> = tables.iter().map(NormalizedTable::row_count).collect();
    let slices = attribute_file_counts(series, &row_counts)?;
    for (table, counts) in tables.iter_mut().zip(slices) {
        table.push_column(FTP_FILES_COUNT, counts.ftp.to_vec());
        table.push_column(IPDR_FILES_COUNT, counts.ipdr.to_vec());
    }
    Ok(())
}
