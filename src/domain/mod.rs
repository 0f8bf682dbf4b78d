//! Domain types and port traits for the conversion client
//!
//! The orchestration core depends only on the narrow capabilities defined
//! here, never on a concrete network implementation.

mod descriptor;
mod message;
mod outcome;

pub use descriptor::*;
pub use message::*;
pub use outcome::*;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::error::ConvertResult;

/// Port for discovering agents that advertise a conversion capability.
#[async_trait]
pub trait DiscoveryPort: Send + Sync {
    /// Query the network for agents supporting `source_format` -> `target_format`.
    ///
    /// An empty list is a valid result meaning no capable agent is currently
    /// known; errors are reserved for transport-level failure.
    async fn discover(
        &self,
        source_format: &str,
        target_format: &str,
    ) -> ConvertResult<Vec<AgentDescriptor>>;
}

/// Callback for messages delivered by the connection's own reader.
///
/// Runs concurrently with the orchestrator's wait loop, so implementations
/// must guard any shared state.
#[async_trait]
pub trait InboundHandler: Send + Sync {
    /// Called for every direct message addressed to this client.
    async fn on_direct_message(&self, sender_id: &str, content: Value);
}

/// Port for direct messaging over the agent network.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Send a content map to a specific agent.
    async fn send_direct(&self, target_id: &str, content: Value) -> ConvertResult<()>;

    /// Register the handler invoked for inbound direct messages.
    ///
    /// A later registration replaces an earlier one.
    async fn register_handler(&self, handler: Arc<dyn InboundHandler>);
}
