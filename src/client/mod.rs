//! Conversion client
//!
//! [`OpenConvertClient`] ties the pieces together for a whole session: it
//! owns the network connection (opened once, closed on every exit path),
//! the request correlator registered as the connection's inbound handler,
//! and the orchestrator/batch layers on top.

pub mod batch;
pub mod correlator;
pub mod discovery;
pub mod orchestrator;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::adapters::ws::WsConnection;
use crate::client::batch::BatchRunner;
use crate::client::correlator::RequestCorrelator;
use crate::client::discovery::AgentDiscovery;
use crate::client::orchestrator::ConversionOrchestrator;
use crate::config::Settings;
use crate::domain::{BatchReport, FileSpec, MessagingPort};
use crate::error::{ConvertError, ConvertResult};
use crate::formats;

/// One conversion offered by the network, as reported by `--list-formats`.
#[derive(Debug, Clone)]
pub struct AvailableConversion {
    /// Source content type
    pub source: String,
    /// Target content type
    pub target: String,
    /// Ids of the agents advertising this conversion
    pub agents: Vec<String>,
}

struct Session {
    connection: Arc<WsConnection>,
    correlator: Arc<RequestCorrelator>,
}

/// Client for the OpenConvert agent network.
pub struct OpenConvertClient {
    agent_id: String,
    settings: Settings,
    cancel: CancellationToken,
    session: Option<Session>,
}

impl OpenConvertClient {
    /// Create a client with a generated agent id.
    pub fn new(settings: Settings, cancel: CancellationToken) -> Self {
        let agent_id = format!(
            "openconvert-client-{}",
            &Uuid::new_v4().simple().to_string()[..8]
        );
        Self::with_agent_id(agent_id, settings, cancel)
    }

    /// Create a client with a caller-chosen agent id.
    pub fn with_agent_id(agent_id: String, settings: Settings, cancel: CancellationToken) -> Self {
        Self {
            agent_id,
            settings,
            cancel,
            session: None,
        }
    }

    /// This client's id on the network.
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Connect to the network and register the inbound handler.
    pub async fn connect(&mut self) -> ConvertResult<()> {
        let host = &self.settings.network.host;
        let port = self.settings.network.port;
        info!("connecting to OpenConvert network at {host}:{port}");

        let connection = Arc::new(
            WsConnection::connect(
                host,
                port,
                &self.agent_id,
                Duration::from_secs(self.settings.conversion.discovery_timeout_seconds),
            )
            .await?,
        );

        let correlator = Arc::new(RequestCorrelator::new(connection.clone()));
        connection.register_handler(correlator.clone()).await;

        self.session = Some(Session {
            connection,
            correlator,
        });
        info!("connected to OpenConvert network");
        Ok(())
    }

    /// Close the network session. Safe to call when not connected.
    pub async fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            info!("disconnecting from OpenConvert network");
            session.connection.close().await;
        }
    }

    fn orchestrator(&self) -> ConvertResult<ConversionOrchestrator> {
        let session = self.session.as_ref().ok_or(ConvertError::NotConnected)?;
        Ok(ConversionOrchestrator::new(
            AgentDiscovery::new(session.connection.clone()),
            session.correlator.clone(),
            Duration::from_secs(self.settings.conversion.timeout_seconds),
            self.cancel.clone(),
        ))
    }

    /// Convert a single file.
    pub async fn convert_file(&self, spec: &FileSpec) -> ConvertResult<()> {
        self.orchestrator()?.convert_file(spec).await
    }

    /// Convert a batch of files sequentially, tolerating per-file failures.
    pub async fn convert_all(&self, files: &[FileSpec]) -> ConvertResult<BatchReport> {
        let orchestrator = self.orchestrator()?;
        Ok(BatchRunner::new(&orchestrator).convert_all(files).await)
    }

    /// Probe the network for every conversion between the common formats.
    ///
    /// Issues one discovery query per ordered format pair, so this is a
    /// slow operation by design.
    pub async fn list_available_conversions(&self) -> ConvertResult<Vec<AvailableConversion>> {
        let session = self.session.as_ref().ok_or(ConvertError::NotConnected)?;
        let discovery = AgentDiscovery::new(session.connection.clone());

        let mut available = Vec::new();
        for source in formats::COMMON_FORMATS {
            for target in formats::COMMON_FORMATS {
                if source == target {
                    continue;
                }
                if self.cancel.is_cancelled() {
                    return Err(ConvertError::Cancelled);
                }
                let agents = discovery.discover(source, target).await?;
                if !agents.is_empty() {
                    available.push(AvailableConversion {
                        source: (*source).to_string(),
                        target: (*target).to_string(),
                        agents: agents.into_iter().map(|a| a.agent_id).collect(),
                    });
                }
            }
        }
        Ok(available)
    }
}

/// Convert one file: connect, convert, disconnect.
///
/// Formats default to extension detection on the input and output paths.
/// The session is closed on every exit path.
pub async fn convert_single(
    settings: Settings,
    input: &Path,
    output: &Path,
    source_format: Option<String>,
    target_format: Option<String>,
    prompt: Option<String>,
) -> ConvertResult<()> {
    let spec = FileSpec {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        source_format: source_format.unwrap_or_else(|| formats::detect(input)),
        target_format: target_format.unwrap_or_else(|| formats::detect(output)),
        prompt,
    };

    let mut client = OpenConvertClient::new(settings, CancellationToken::new());
    client.connect().await?;
    let result = client.convert_file(&spec).await;
    client.disconnect().await;
    result
}
