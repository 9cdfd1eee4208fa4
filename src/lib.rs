pub mod config;
pub mod docx;
pub mod error;
pub mod excel;
pub mod models;
pub mod services;
pub mod types;

use config::ReportConfig;
use error::Result;
use services::aggregator::{self, Aggregation};
use services::report_assembler::{self, AssemblyOutcome};

/// What one report run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub aggregation: Aggregation,
    pub outcome: AssemblyOutcome,
}

/// Read the statement, aggregate it, and write the report.
/// Missing statement rows are reported and leave their totals at zero.
pub fn run(config: &ReportConfig) -> Result<RunSummary> {
    config.validate()?;

    let rows = excel::read_statement_rows(&config.statement)?;
    let aggregation = aggregator::aggregate(&rows);
    tracing::info!(
        rows = rows.len(),
        considered = aggregation.rows_considered,
        skipped = aggregation.rows_skipped,
        complete = aggregation.is_complete(),
        "statement aggregated"
    );
    for metric in aggregation.missing() {
        tracing::warn!(?metric, "no statement row matched, total left at 0.00");
    }

    let outcome = report_assembler::assemble_report(config, &aggregation.totals)?;
    Ok(RunSummary {
        aggregation,
        outcome,
    })
}
