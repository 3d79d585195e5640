// src/process/mod.rs
use anyhow::{Context, Result as AnyResult};
use std::fs;
use tracing::{info, instrument};

use crate::config::PipelineConfig;
use crate::error::{PipelineWarning, Result};
use crate::region::RegionLabels;

pub mod date_parser;
pub mod file_counts;
pub mod merge;
pub mod normalize;
pub mod raw_table;
pub mod split;
pub mod utils;

use date_parser::DateIndex;
use file_counts::{attach_file_counts, FileCountSeries};
use merge::{merge_regions, MergeOutcome, MergedRegion};
use normalize::normalize_table;
use split::split_tables;

/// Everything downstream reporting needs from one run.
#[derive(Debug)]
pub struct Reconciled {
    pub date_index: DateIndex,
    pub regions: Vec<MergedRegion>,
    pub warnings: Vec<PipelineWarning>,
    pub tables: usize,
    /// Rows removed for holding the missing sentinel, across all tables.
    pub dropped_rows: usize,
}

/// Split → normalize → attribute file counts → index dates → merge pairs.
///
/// Stops at the first fatal error; nothing partial is returned.
#[instrument(level = "info", skip_all, fields(bytes = text.len()))]
pub fn reconcile(text: &str, counts: &FileCountSeries, cfg: &PipelineConfig) -> Result<Reconciled> {
    let raw = split_tables(text, &cfg.layout.header_token)?;
    let labels = RegionLabels::for_tables(&cfg.regions, raw.len())?;

    let mut tables = raw
        .iter()
        .map(|t| normalize_table(t, &cfg.layout))
        .collect::<Result<Vec<_>>>()?;
    drop(raw);
    let table_count = tables.len();
    let dropped_rows: usize = tables.iter().map(|t| t.dropped_rows).sum();

    attach_file_counts(&mut tables, counts)?;
    let date_index = DateIndex::build(tables.iter().map(|t| t.dates.as_slice()))?;

    let MergeOutcome { regions, warnings } = merge_regions(tables, &labels, &date_index)?;
    info!(
        tables = table_count,
        regions = regions.len(),
        days = date_index.len(),
        dropped_rows,
        warnings = warnings.len(),
        "reconciled"
    );
    Ok(Reconciled {
        date_index,
        regions,
        warnings,
        tables: table_count,
        dropped_rows,
    })
}

/// Read the configured input and count files, then [`reconcile`].
pub fn reconcile_files(cfg: &PipelineConfig) -> AnyResult<Reconciled> {
    let text = fs::read_to_string(&cfg.input)
        .with_context(|| format!("reading input {:?}", cfg.input))?;
    let counts = FileCountSeries::from_files(&cfg.ftp_counts, &cfg.ipdr_counts)?;
    let reconciled = reconcile(&text, &counts, cfg)
        .with_context(|| format!("reconciling {:?}", cfg.input))?;
    Ok(reconciled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use super::merge::{NO_RADIUS, TOTAL};
    use tempfile::tempdir;
    use tracing_subscriber::{fmt, EnvFilter};

    fn init_logging() {
        let _ = fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .with_target(false)
            .with_test_writer()
            .try_init();
    }

    fn config(regions: &[&str]) -> PipelineConfig {
        PipelineConfig {
            regions: regions.iter().map(|s| s.to_string()).collect(),
            ..PipelineConfig::default()
        }
    }

    fn counts(ftp: &[i64], ipdr: &[i64]) -> FileCountSeries {
        FileCountSeries {
            ftp: ftp.to_vec(),
            ipdr: ipdr.to_vec(),
        }
    }

    #[test]
    fn two_tables_merge_into_one_region() {
        init_logging();
        let text = "Date,NoRadius,Total,Match%\n20240101,5,10,50\nDate,NoRadius,Total,Match%\n20240101,3,10,30\n";
        let out = reconcile(text, &counts(&[2, 4], &[1, 1]), &config(&["tee"])).unwrap();

        assert_eq!(out.tables, 2);
        assert_eq!(out.regions.len(), 1);
        let r = &out.regions[0];
        assert_eq!(r.label, "tee");
        assert_eq!(r.dates, vec!["2024-01-01"]);
        assert_eq!(r.series(NO_RADIUS).unwrap(), &[8]);
        assert_eq!(r.series(TOTAL).unwrap(), &[20]);
        assert_eq!(r.series(file_counts::FTP_FILES_COUNT).unwrap(), &[6]);
        assert_eq!(r.series(file_counts::IPDR_FILES_COUNT).unwrap(), &[2]);
        assert!((r.match_percent[0] - 40.0).abs() < 1e-9);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn input_carrying_its_own_file_count_column_is_rejected() {
        let text = "Date,NoRadius,Total,FtpFilesCount\n20240101,5,10,7\nDate,NoRadius,Total,FtpFilesCount\n20240101,3,10,9\n";
        let err = reconcile(text, &counts(&[2, 4], &[1, 1]), &config(&["tee"])).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DuplicateColumn { ref column, .. } if column == file_counts::FTP_FILES_COUNT
        ));
    }

    #[test]
    fn three_tables_give_one_region_and_an_orphan_warning() {
        let block = "Date,NoRadius,Total,Match%\n20240101,1,2,50\n";
        let text = block.repeat(3);
        let out = reconcile(&text, &counts(&[0, 0, 0], &[0, 0, 0]), &config(&["tee"])).unwrap();

        assert_eq!(out.regions.len(), 1);
        assert_eq!(out.warnings, vec![PipelineWarning::UnpairedRegion { table: 2 }]);
    }

    #[test]
    fn dropped_rows_shrink_the_file_count_share() {
        let text = "\
Date,NoRadius,Total,Match%
20240101,1,2,50
20240102,None,None,None
20240103,1,2,50
Date,NoRadius,Total,Match%
20240101,1,2,50
20240103,1,2,50
";
        // 2 surviving rows per table, 4 count values in total
        let out = reconcile(text, &counts(&[1, 2, 3, 4], &[5, 6, 7, 8]), &config(&["ta"])).unwrap();
        let r = &out.regions[0];

        assert_eq!(out.dropped_rows, 1);
        assert_eq!(r.dates, vec!["2024-01-01", "2024-01-03"]);
        assert_eq!(r.series(file_counts::FTP_FILES_COUNT).unwrap(), &[1 + 3, 2 + 4]);
    }

    #[test]
    fn label_count_must_match_region_count() {
        let text = "Date,NoRadius,Total\n20240101,1,2\nDate,NoRadius,Total\n20240101,1,2\n";
        let err = reconcile(text, &counts(&[0, 0], &[0, 0]), &config(&["a", "b"])).unwrap_err();
        assert!(matches!(err, PipelineError::RegionCountMismatch { .. }));
    }

    #[test]
    fn count_length_mismatch_aborts() {
        let text = "Date,NoRadius,Total\n20240101,1,2\nDate,NoRadius,Total\n20240101,1,2\n";
        let err = reconcile(text, &counts(&[0], &[0, 0]), &config(&["a"])).unwrap_err();
        assert!(matches!(err, PipelineError::LengthMismatch { series: "ftp", .. }));
    }

    #[test]
    fn reads_inputs_from_disk() {
        init_logging();
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        fs::write(
            dir.join("all_regions_daily.csv"),
            "Date,NoRadius,WithRadius,Total,Match%\n20240102,4,6,10,40\n20240101,5,5,10,50\n\
             Date,NoRadius,WithRadius,Total,Match%\n20240101,3,7,10,30\n20240102,2,8,10,20\n\n",
        )
        .unwrap();
        fs::write(dir.join("ftp.txt"), "10 a\n11 b\n12 c\n13 d\n").unwrap();
        fs::write(dir.join("ipdr.txt"), "1\n1\n1\n1\n").unwrap();

        let cfg = PipelineConfig {
            input: dir.join("all_regions_daily.csv"),
            ftp_counts: dir.join("ftp.txt"),
            ipdr_counts: dir.join("ipdr.txt"),
            output_dir: dir.join("out"),
            regions: vec!["tee".into()],
            ..PipelineConfig::default()
        };
        let out = reconcile_files(&cfg).unwrap();
        let r = &out.regions[0];

        assert_eq!(r.dates, vec!["2024-01-01", "2024-01-02"]);
        // rows joined by date even though the first table lists them out of order
        assert_eq!(r.series(NO_RADIUS).unwrap(), &[5 + 3, 4 + 2]);
        assert_eq!(r.series("WithRadius").unwrap(), &[5 + 7, 6 + 8]);
        assert_eq!(r.series(file_counts::FTP_FILES_COUNT).unwrap(), &[11 + 12, 10 + 13]);
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let tmp = tempdir().unwrap();
        let cfg = PipelineConfig {
            input: tmp.path().join("nope.csv"),
            ..PipelineConfig::default()
        };
        assert!(reconcile_files(&cfg).is_err());
    }
}
