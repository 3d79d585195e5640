//! Rebuilds per-region daily radius mismatch tables from one concatenated
//! export, merges sub-region pairs, and derives Match% per region per day.

pub mod config;
pub mod error;
pub mod output;
pub mod process;
pub mod region;
pub mod report;

pub use config::{PipelineConfig, TableLayout};
pub use error::{PipelineError, PipelineWarning};
pub use process::{reconcile, reconcile_files, Reconciled};
