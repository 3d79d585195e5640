// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Column names and markers that describe the concatenated input tables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TableLayout {
    /// A trimmed line starting with this token is a header line.
    pub header_token: String,
    pub date_column: String,
    /// Dropped on load; recomputed from the summed counts.
    pub match_column: String,
    /// Cell value meaning "no data"; rows containing it are dropped.
    pub missing_sentinel: String,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            header_token: "Date".into(),
            date_column: "Date".into(),
            match_column: "Match%".into(),
            missing_sentinel: "None".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub ftp_counts: PathBuf,
    pub ipdr_counts: PathBuf,
    pub output_dir: PathBuf,
    /// One label per merged region, in merge order.
    pub regions: Vec<String>,
    pub layout: TableLayout,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("all_regions_daily.csv"),
            ftp_counts: PathBuf::from("file_counts_ftp.txt"),
            ipdr_counts: PathBuf::from("file_counts_ipdr.txt"),
            output_dir: PathBuf::from("out"),
            regions: ["tee", "tew", "ta", "is", "sh", "ma", "ah", "al", "bl"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            layout: TableLayout::default(),
        }
    }
}

impl PipelineConfig {
    /// Name of the optional override file looked up in the working directory.
    pub const FILE_NAME: &'static str = "report.yaml";

    /// Parse a YAML override file. Fields it leaves out keep their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening config {:?}", path))?;
        let cfg: Self = serde_yaml::from_reader(file)
            .with_context(|| format!("parsing config {:?}", path))?;
        Ok(cfg)
    }

    /// Load `report.yaml` from `dir` if present, otherwise the built-in defaults.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(Self::FILE_NAME);
        if path.is_file() {
            info!(path = %path.display(), "loading config");
            Self::from_yaml_file(&path)
        } else {
            debug!("no {} found; using defaults", Self::FILE_NAME);
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = tempdir().unwrap();
        let cfg = PipelineConfig::load(tmp.path()).unwrap();
        assert_eq!(cfg, PipelineConfig::default());
        assert_eq!(cfg.regions.len(), 9);
        assert_eq!(cfg.layout.missing_sentinel, "None");
    }

    #[test]
    fn partial_yaml_overrides_only_named_fields() {
        let tmp = tempdir().unwrap();
        let mut f = File::create(tmp.path().join(PipelineConfig::FILE_NAME)).unwrap();
        writeln!(f, "regions: [north, south]").unwrap();
        writeln!(f, "layout:").unwrap();
        writeln!(f, "  missing_sentinel: \"NA\"").unwrap();
        drop(f);

        let cfg = PipelineConfig::load(tmp.path()).unwrap();
        assert_eq!(cfg.regions, vec!["north".to_string(), "south".to_string()]);
        assert_eq!(cfg.layout.missing_sentinel, "NA");
        assert_eq!(cfg.layout.date_column, "Date");
        assert_eq!(cfg.input, PathBuf::from("all_regions_daily.csv"));
    }

    #[test]
    fn bad_yaml_is_an_error() {
        let tmp = tempdir().unwrap();
        std::fs::write(tmp.path().join(PipelineConfig::FILE_NAME), "regions: {").unwrap();
        assert!(PipelineConfig::load(tmp.path()).is_err());
    }
}
