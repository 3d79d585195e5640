// src/output.rs

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info, instrument};

use crate::error::PipelineWarning;
use crate::process::merge::{MergedRegion, MATCH_PERCENT};
use crate::process::Reconciled;
use crate::report::{ColumnReport, DateRange};

pub const DATE_COLUMN: &str = "Date";
pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Debug, Serialize)]
pub struct RegionSummary<'a> {
    pub label: &'a str,
    pub rows: usize,
    pub columns: Vec<&'a str>,
    /// Mean Match% over defined days, as shown in the mismatch chart legend.
    pub mean_match_percent: Option<f64>,
}

/// Machine-readable account of one run.
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub date_range: Option<DateRange>,
    pub tables: usize,
    pub dropped_rows: usize,
    pub regions: Vec<RegionSummary<'a>>,
    pub warnings: &'a [PipelineWarning],
    pub column_report: &'a [ColumnReport],
}

impl<'a> RunSummary<'a> {
    pub fn new(reconciled: &'a Reconciled, column_report: &'a [ColumnReport]) -> Self {
        Self {
            date_range: DateRange::of(&reconciled.date_index),
            tables: reconciled.tables,
            dropped_rows: reconciled.dropped_rows,
            regions: reconciled
                .regions
                .iter()
                .map(|r| RegionSummary {
                    label: &r.label,
                    rows: r.row_count(),
                    columns: r.columns.iter().map(|c| c.name.as_str()).collect(),
                    mean_match_percent: r.mean_match_percent(),
                })
                .collect(),
            warnings: &reconciled.warnings,
            column_report,
        }
    }
}

/// `Date` + every integer column + `Match%`, one row per day.
pub fn region_batch(region: &MergedRegion) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(region.columns.len() + 2);
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(region.columns.len() + 2);

    fields.push(Field::new(DATE_COLUMN, DataType::Utf8, false));
    arrays.push(Arc::new(StringArray::from(region.dates.clone())));
    for col in &region.columns {
        fields.push(Field::new(&col.name, DataType::Int64, false));
        arrays.push(Arc::new(Int64Array::from(col.values.clone())));
    }
    fields.push(Field::new(MATCH_PERCENT, DataType::Float64, false));
    arrays.push(Arc::new(Float64Array::from(region.match_percent.clone())));

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
        .with_context(|| format!("building record batch for region {}", region.label))
}

/// Write `<dir>/<label>.parquet` (Snappy) and return its path.
pub fn write_region(region: &MergedRegion, dir: &Path) -> Result<PathBuf> {
    let batch = region_batch(region)?;
    let path = dir.join(format!("{}.parquet", region.label));
    let file = File::create(&path).with_context(|| format!("creating {:?}", &path))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("creating Arrow writer for region")?;
    writer.write(&batch).context("writing region batch")?;
    writer.close().context("closing region writer")?;
    debug!(path = %path.display(), rows = batch.num_rows(), "region written");
    Ok(path)
}

/// One parquet file per region plus `summary.json`, all under `dir`.
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub fn write_all(
    reconciled: &Reconciled,
    column_report: &[ColumnReport],
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating output directory {:?}", dir))?;

    let mut written = Vec::with_capacity(reconciled.regions.len() + 1);
    for region in &reconciled.regions {
        written.push(write_region(region, dir)?);
    }

    let summary_path = dir.join(SUMMARY_FILE);
    let file = File::create(&summary_path)
        .with_context(|| format!("creating {:?}", &summary_path))?;
    serde_json::to_writer_pretty(file, &RunSummary::new(reconciled, column_report))
        .context("writing run summary")?;
    written.push(summary_path);

    info!(files = written.len(), "output written");
    Ok(written)
}
