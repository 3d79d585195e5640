use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

use crate::error::{PipelineError, Result};

/// `"YYYYMMDD"` → `"YYYY-MM-DD"`, rejecting anything that is not a real day.
pub fn canonical_date(compact: &str) -> Result<String> {
    let invalid = || PipelineError::InvalidDate {
        value: compact.to_string(),
    };
    if compact.len() != 8 || !compact.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let year: i32 = compact[0..4].parse().map_err(|_| invalid())?;
    let month: u32 = compact[4..6].parse().map_err(|_| invalid())?;
    let day: u32 = compact[6..8].parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;

    Ok(format!("{}-{}-{}", &compact[0..4], &compact[4..6], &compact[6..8]))
}

/// Every day seen across all tables, sorted and deduplicated, in
/// canonical `YYYY-MM-DD` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateIndex {
    days: Vec<String>,
}

impl DateIndex {
    /// Compact dates sort chronologically as strings, so the set is
    /// ordered before reformatting.
    #[instrument(level = "debug", skip(date_columns))]
    pub fn build<'a, I>(date_columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [String]>,
    {
        let unique: BTreeSet<&str> = date_columns
            .into_iter()
            .flat_map(|col| col.iter().map(String::as_str))
            .collect();
        let days = unique
            .into_iter()
            .map(canonical_date)
            .collect::<Result<Vec<_>>>()?;
        debug!(days = days.len(), "date index built");
        Ok(Self { days })
    }

    pub fn days(&self) -> &[String] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn first(&self) -> Option<&str> {
        self.days.first().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.days.last().map(String::as_str)
    }
}
