use anyhow::Result;
use radiusrecon::{config::PipelineConfig, output, process, report};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) config ───────────────────────────────────────────────────
    let cfg = PipelineConfig::load(Path::new("."))?;
    info!(
        input = %cfg.input.display(),
        ftp = %cfg.ftp_counts.display(),
        ipdr = %cfg.ipdr_counts.display(),
        regions = cfg.regions.len(),
        "configured"
    );

    // ─── 3) split, normalize, merge ──────────────────────────────────
    let reconciled = process::reconcile_files(&cfg)?;
    if let Some(range) = report::DateRange::of(&reconciled.date_index) {
        info!(from = %range.first, till = %range.last, "date range");
    }

    // ─── 4) consumer checks + output ─────────────────────────────────
    let column_report = report::check_consumers(&reconciled.regions, report::CONSUMERS);
    let written = output::write_all(&reconciled, &column_report, &cfg.output_dir)?;
    info!(
        files = written.len(),
        warnings = reconciled.warnings.len(),
        missing_columns = column_report.len(),
        "done"
    );
    Ok(())
}
