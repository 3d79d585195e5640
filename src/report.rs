// src/report.rs
use serde::Serialize;
use tracing::{debug, warn};

use crate::process::date_parser::DateIndex;
use crate::process::file_counts::{FTP_FILES_COUNT, IPDR_FILES_COUNT};
use crate::process::merge::{MergedRegion, MATCH_PERCENT, NO_RADIUS, TOTAL};

/// Something downstream that reads columns out of every merged region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consumer {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

/// The pivot table and per-column charts built from the merged regions.
pub const CONSUMERS: &[Consumer] = &[
    Consumer {
        name: "pivot_table",
        columns: &[NO_RADIUS, TOTAL, FTP_FILES_COUNT, IPDR_FILES_COUNT, MATCH_PERCENT],
    },
    Consumer {
        name: "radius_mismatch",
        columns: &[MATCH_PERCENT],
    },
    Consumer {
        name: "total_records",
        columns: &[TOTAL],
    },
    Consumer {
        name: "total_no_radius",
        columns: &[NO_RADIUS],
    },
    Consumer {
        name: "total_with_radius",
        columns: &["WithRadius"],
    },
    Consumer {
        name: "total_SPR",
        columns: &["SPR"],
    },
    Consumer {
        name: "total_SP",
        columns: &["SP"],
    },
    Consumer {
        name: "total_SR",
        columns: &["SR"],
    },
    Consumer {
        name: "total_S",
        columns: &["S"],
    },
    Consumer {
        name: "ftp_files_count",
        columns: &[FTP_FILES_COUNT],
    },
    Consumer {
        name: "ipdr_files_count",
        columns: &[IPDR_FILES_COUNT],
    },
];

/// A consumer that cannot be fully served for one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnReport {
    pub region: String,
    pub consumer: &'static str,
    pub missing: Vec<String>,
}

fn has_column(region: &MergedRegion, name: &str) -> bool {
    name == MATCH_PERCENT || region.column(name).is_some()
}

/// One entry per region × consumer with at least one missing column.
pub fn check_consumers(regions: &[MergedRegion], consumers: &[Consumer]) -> Vec<ColumnReport> {
    let mut reports = Vec::new();
    for region in regions {
        for consumer in consumers {
            let missing: Vec<String> = consumer
                .columns
                .iter()
                .filter(|c| !has_column(region, c))
                .map(|c| c.to_string())
                .collect();
            if missing.is_empty() {
                continue;
            }
            warn!(
                region = %region.label,
                consumer = consumer.name,
                ?missing,
                "consumer columns missing"
            );
            reports.push(ColumnReport {
                region: region.label.clone(),
                consumer: consumer.name,
                missing,
            });
        }
    }
    debug!(problems = reports.len(), "consumer columns checked");
    reports
}

/// First and last day covered, for report titles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub first: String,
    pub last: String,
}

impl DateRange {
    pub fn of(index: &DateIndex) -> Option<Self> {
        Some(Self {
            first: index.first()?.to_string(),
            last: index.last()?.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::normalize::IntColumn;

    fn region(label: &str, cols: &[&str]) -> MergedRegion {
        MergedRegion {
            label: label.into(),
            dates: vec!["2024-01-01".into()],
            columns: cols
                .iter()
                .map(|c| IntColumn {
                    name: c.to_string(),
                    values: vec![1],
                })
                .collect(),
            match_percent: vec![50.0],
        }
    }

    #[test]
    fn complete_region_has_no_reports() {
        let all = [
            NO_RADIUS,
            "WithRadius",
            TOTAL,
            "SPR",
            "SP",
            "SR",
            "S",
            FTP_FILES_COUNT,
            IPDR_FILES_COUNT,
        ];
        assert!(check_consumers(&[region("tee", &all)], CONSUMERS).is_empty());
    }

    #[test]
    fn missing_columns_are_reported_per_consumer() {
        let r = region("tew", &[NO_RADIUS, TOTAL, FTP_FILES_COUNT]);
        let reports = check_consumers(&[r], CONSUMERS);

        let pivot = reports.iter().find(|r| r.consumer == "pivot_table").unwrap();
        assert_eq!(pivot.missing, vec![IPDR_FILES_COUNT.to_string()]);
        assert!(reports.iter().all(|r| r.region == "tew"));
        assert!(reports.iter().any(|r| r.consumer == "total_SPR"));
        assert!(!reports.iter().any(|r| r.consumer == "radius_mismatch"));
        assert!(!reports.iter().any(|r| r.consumer == "total_records"));
    }

    #[test]
    fn date_range_spans_the_index() {
        let a: Vec<String> = vec!["20240105".into(), "20240101".into()];
        let idx = DateIndex::build([a.as_slice()]).unwrap();
        let range = DateRange::of(&idx).unwrap();
        assert_eq!(range.first, "2024-01-01");
        assert_eq!(range.last, "2024-01-05");
        assert!(DateRange::of(&DateIndex::build(std::iter::empty::<&[String]>()).unwrap()).is_none());
    }
}
