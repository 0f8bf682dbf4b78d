//! Per-file conversion orchestration
//!
//! Each `convert_file` call walks one file through the full exchange:
//! discover agents, select one, read and encode the input, send the
//! request, await the correlated response, then decode and persist the
//! result. Every step maps onto the error taxonomy so the batch runner
//! can tell per-file failures from fatal ones.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::correlator::RequestCorrelator;
use crate::client::discovery::AgentDiscovery;
use crate::domain::{ConversionRequest, FileSpec};
use crate::error::{ConvertError, ConvertResult};

/// Drives single-file conversions end to end.
pub struct ConversionOrchestrator {
    discovery: AgentDiscovery,
    correlator: Arc<RequestCorrelator>,
    timeout: Duration,
    cancel: CancellationToken,
}

impl ConversionOrchestrator {
    /// Create an orchestrator with the given per-file timeout.
    pub fn new(
        discovery: AgentDiscovery,
        correlator: Arc<RequestCorrelator>,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            discovery,
            correlator,
            timeout,
            cancel,
        }
    }

    /// Convert one file according to `spec`.
    ///
    /// The first discovered agent is always selected; there is no failover
    /// to later candidates on error or timeout. Re-running the same spec is
    /// safe: discovery and the send are simply repeated.
    pub async fn convert_file(&self, spec: &FileSpec) -> ConvertResult<()> {
        info!(
            input = %spec.input.display(),
            "converting {} -> {}",
            spec.source_format,
            spec.target_format
        );

        let agents = self
            .discovery
            .discover(&spec.source_format, &spec.target_format)
            .await?;
        let Some(agent) = agents.first() else {
            return Err(ConvertError::NoCapableAgent {
                source: spec.source_format.clone(),
                target: spec.target_format.clone(),
            });
        };
        info!(agent_id = %agent.agent_id, "using agent");

        let payload = tokio::fs::read(&spec.input)
            .await
            .map_err(|e| ConvertError::Input(format!("{}: {}", spec.input.display(), e)))?;
        let filename = spec
            .input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_string());

        if let Some(prompt) = &spec.prompt {
            debug!(prompt, "forwarding conversion prompt");
        }

        let request = ConversionRequest {
            payload,
            filename,
            source_format: spec.source_format.clone(),
            target_format: spec.target_format.clone(),
            prompt: spec.prompt.clone(),
        };

        self.correlator.send(&agent.agent_id, request).await?;
        let response = self
            .correlator
            .wait(&agent.agent_id, self.timeout, &self.cancel)
            .await?;

        let converted = response.decode_payload()?;

        if let Some(parent) = spec.output.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ConvertError::Persist(format!("{}: {}", parent.display(), e)))?;
            }
        }
        tokio::fs::write(&spec.output, &converted)
            .await
            .map_err(|e| ConvertError::Persist(format!("{}: {}", spec.output.display(), e)))?;

        info!(output = %spec.output.display(), "conversion successful");
        Ok(())
    }
}
