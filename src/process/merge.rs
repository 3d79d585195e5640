// src/process/merge.rs
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

use crate::error::{PipelineError, PipelineWarning, Result, Side};
use crate::process::date_parser::{canonical_date, DateIndex};
use crate::process::normalize::{IntColumn, NormalizedTable};
use crate::region::RegionLabels;

pub const NO_RADIUS: &str = "NoRadius";
pub const TOTAL: &str = "Total";
pub const MATCH_PERCENT: &str = "Match%";

/// Two sub-region tables summed into one region, one row per day of the
/// global date index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRegion {
    pub label: String,
    /// Canonical `YYYY-MM-DD` row labels, in date index order.
    pub dates: Vec<String>,
    pub columns: Vec<IntColumn>,
    /// `NoRadius / Total * 100`; NaN where Total is zero or the day is absent.
    pub match_percent: Vec<f64>,
}

impl MergedRegion {
    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    pub fn column(&self, name: &str) -> Option<&IntColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Values of an integer column, or a structured error naming the region.
    pub fn series(&self, name: &str) -> Result<&[i64]> {
        self.column(name)
            .map(|c| c.values.as_slice())
            .ok_or_else(|| PipelineError::MissingColumn {
                table: self.label.clone(),
                column: name.to_string(),
            })
    }

    /// Mean Match% over the days where it is defined; `None` if there are none.
    pub fn mean_match_percent(&self) -> Option<f64> {
        let (sum, n) = self
            .match_percent
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
        (n > 0).then(|| sum / n as f64)
    }
}

#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub regions: Vec<MergedRegion>,
    pub warnings: Vec<PipelineWarning>,
}

/// `NoRadius / Total * 100`, NaN for a zero total.
pub fn match_percent(no_radius: i64, total: i64) -> f64 {
    if total == 0 {
        return f64::NAN;
    }
    no_radius as f64 / total as f64 * 100.0
}

/// Pair tables by adjacency (0+1, 2+3, ...) and merge each pair. A trailing
/// table without a partner is dropped with a warning.
#[instrument(level = "info", skip_all, fields(tables = tables.len(), days = index.len()))]
pub fn merge_regions(
    tables: Vec<NormalizedTable>,
    labels: &RegionLabels,
    index: &DateIndex,
) -> Result<MergeOutcome> {
    let mut out = MergeOutcome::default();
    let mut iter = tables.into_iter();
    let mut region = 0;

    while let Some(first) = iter.next() {
        let second = match iter.next() {
            Some(t) => t,
            None => {
                record(
                    &mut out.warnings,
                    PipelineWarning::UnpairedRegion { table: first.index },
                );
                break;
            }
        };
        let label = labels
            .get(region)
            .ok_or(PipelineError::RegionCountMismatch {
                labels: labels.len(),
                regions: region + 1,
            })?;
        let merged = merge_pair(&first, &second, label, index, &mut out.warnings)?;
        out.regions.push(merged);
        region += 1;
    }

    info!(
        regions = out.regions.len(),
        warnings = out.warnings.len(),
        "regions merged"
    );
    Ok(out)
}

/// Sum two sub-region tables column by column, joining rows on date.
///
/// Every day of `index` becomes one row. A day held by only one table is
/// summed against zeros; a day held by neither is all zeros with NaN Match%.
pub fn merge_pair(
    first: &NormalizedTable,
    second: &NormalizedTable,
    label: &str,
    index: &DateIndex,
    warnings: &mut Vec<PipelineWarning>,
) -> Result<MergedRegion> {
    let rows_a = rows_by_day(first)?;
    let rows_b = rows_by_day(second)?;

    // column union, first table's order, then anything only the second has
    let mut names: Vec<&str> = first.columns.iter().map(|c| c.name.as_str()).collect();
    for c in &second.columns {
        if !names.contains(&c.name.as_str()) {
            names.push(&c.name);
        }
    }
    let pairs: Vec<(&str, Option<&IntColumn>, Option<&IntColumn>)> = names
        .iter()
        .map(|&name| (name, first.column(name), second.column(name)))
        .collect();
    for (name, a, b) in &pairs {
        let present_in = match (a, b) {
            (Some(_), None) => Side::First,
            (None, Some(_)) => Side::Second,
            _ => continue,
        };
        record(
            warnings,
            PipelineWarning::ColumnMismatch {
                region: label.to_string(),
                column: name.to_string(),
                present_in,
            },
        );
    }
    let no_radius_at = position_of(&names, NO_RADIUS, label)?;
    let total_at = position_of(&names, TOTAL, label)?;

    let days = index.days();
    let mut columns: Vec<IntColumn> = names
        .iter()
        .map(|name| IntColumn {
            name: name.to_string(),
            values: Vec::with_capacity(days.len()),
        })
        .collect();
    let mut match_pct = Vec::with_capacity(days.len());

    for (row, day) in days.iter().enumerate() {
        let ra = rows_a.get(day.as_str()).copied();
        let rb = rows_b.get(day.as_str()).copied();
        match (ra, rb) {
            (None, None) => record(
                warnings,
                PipelineWarning::MissingDay {
                    region: label.to_string(),
                    date: day.clone(),
                },
            ),
            (Some(_), None) | (None, Some(_)) => record(
                warnings,
                PipelineWarning::DateMismatch {
                    region: label.to_string(),
                    date: day.clone(),
                    present_in: if ra.is_some() { Side::First } else { Side::Second },
                },
            ),
            (Some(_), Some(_)) => {}
        }

        for ((name, a, b), out) in pairs.iter().zip(columns.iter_mut()) {
            let va = a.zip(ra).map(|(c, r)| c.values[r]).unwrap_or(0);
            let vb = b.zip(rb).map(|(c, r)| c.values[r]).unwrap_or(0);
            let sum = va.checked_add(vb).ok_or_else(|| PipelineError::Overflow {
                region: label.to_string(),
                column: name.to_string(),
                date: day.clone(),
            })?;
            out.values.push(sum);
        }

        if ra.is_none() && rb.is_none() {
            match_pct.push(f64::NAN);
            continue;
        }
        let total = columns[total_at].values[row];
        let no_radius = columns[no_radius_at].values[row];
        if total == 0 {
            record(
                warnings,
                PipelineWarning::DivisionByZero {
                    region: label.to_string(),
                    date: day.clone(),
                },
            );
        }
        match_pct.push(match_percent(no_radius, total));
    }

    debug!(
        region = label,
        rows = days.len(),
        first_rows = first.row_count(),
        second_rows = second.row_count(),
        "pair merged"
    );
    Ok(MergedRegion {
        label: label.to_string(),
        dates: days.to_vec(),
        columns,
        match_percent: match_pct,
    })
}

/// Canonical day → row position. A repeated day makes the join ambiguous.
fn rows_by_day(table: &NormalizedTable) -> Result<HashMap<String, usize>> {
    let mut map = HashMap::with_capacity(table.row_count());
    for (row, compact) in table.dates.iter().enumerate() {
        let day = canonical_date(compact)?;
        if map.insert(day, row).is_some() {
            return Err(PipelineError::DuplicateDate {
                table: table.index,
                date: compact.clone(),
            });
        }
    }
    Ok(map)
}

fn position_of(names: &[&str], column: &str, label: &str) -> Result<usize> {
    names
        .iter()
        .position(|n| *n == column)
        .ok_or_else(|| PipelineError::MissingColumn {
            table: label.to_string(),
            column: column.to_string(),
        })
}

fn record(warnings: &mut Vec<PipelineWarning>, warning: PipelineWarning) {
    warn!(?warning, "recoverable input problem");
    warnings.push(warning);
}
