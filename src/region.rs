// src/region.rs
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Labels for merged regions, by merge index. Sub-region tables are paired
/// by adjacency, so `n` tables make `n / 2` regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionLabels {
    labels: Vec<String>,
}

impl RegionLabels {
    /// Fails unless there is exactly one label per region the tables will produce.
    pub fn for_tables(labels: &[String], table_count: usize) -> Result<Self> {
        let regions = table_count / 2;
        if labels.len() != regions {
            return Err(PipelineError::RegionCountMismatch {
                labels: labels.len(),
                regions,
            });
        }
        debug!(regions, "region labels validated");
        Ok(Self {
            labels: labels.to_vec(),
        })
    }

    pub fn get(&self, region: usize) -> Option<&str> {
        self.labels.get(region).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn odd_table_count_rounds_down() {
        let l = RegionLabels::for_tables(&labels(&["tee"]), 3).unwrap();
        assert_eq!(l.get(0), Some("tee"));
        assert_eq!(l.get(1), None);
    }

    #[test]
    fn count_disagreement_fails_fast() {
        let err = RegionLabels::for_tables(&labels(&["tee", "tew"]), 6).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::RegionCountMismatch {
                labels: 2,
                regions: 3
            }
        ));
    }
}
