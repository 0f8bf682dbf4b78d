//! Batch conversion
//!
//! Runs the orchestrator over a list of files strictly sequentially, one
//! in-flight request at a time. Per-file failures are recorded and the
//! batch continues; only fatal errors (connection loss, cancellation)
//! abort the remaining files.

use tracing::{error, info, warn};

use crate::client::orchestrator::ConversionOrchestrator;
use crate::domain::{BatchReport, BatchStatus, FileOutcome, FileSpec};
use crate::error::ConvertError;

/// Iterates the orchestrator over a batch of files.
pub struct BatchRunner<'a> {
    orchestrator: &'a ConversionOrchestrator,
}

impl<'a> BatchRunner<'a> {
    /// Create a runner over the given orchestrator.
    pub fn new(orchestrator: &'a ConversionOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Convert every file in `files`, returning one outcome per input in
    /// input order.
    ///
    /// When a fatal error occurs, it is recorded for the current file and
    /// every remaining file, so the report still has one entry per input.
    pub async fn convert_all(&self, files: &[FileSpec]) -> BatchReport {
        let mut report = BatchReport::default();
        let total = files.len();

        let mut aborted = false;
        for (index, spec) in files.iter().enumerate() {
            if aborted {
                report.outcomes.push(FileOutcome {
                    input: spec.input.clone(),
                    output: spec.output.clone(),
                    outcome: Err(ConvertError::Cancelled),
                });
                continue;
            }

            info!(
                "processing file {}/{}: {}",
                index + 1,
                total,
                spec.input.display()
            );

            let outcome = self.orchestrator.convert_file(spec).await;
            if let Err(err) = &outcome {
                error!(input = %spec.input.display(), "{err}");
                if err.is_fatal() {
                    aborted = true;
                }
            }
            report.outcomes.push(FileOutcome {
                input: spec.input.clone(),
                output: spec.output.clone(),
                outcome,
            });
        }

        match report.status() {
            BatchStatus::AllConverted => {
                info!("all {} file(s) converted successfully", report.outcomes.len());
            }
            BatchStatus::Partial => {
                warn!(
                    "{}/{} file(s) converted successfully",
                    report.succeeded(),
                    report.outcomes.len()
                );
            }
            BatchStatus::NoneConverted => {
                error!("no files were converted successfully");
            }
        }

        report
    }
}
