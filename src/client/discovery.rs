//! Agent discovery
//!
//! Thin wrapper over the discovery port: one query per call, logging the
//! candidates. Zero results is a normal outcome, not an error; transport
//! failures surface as [`crate::error::ConvertError::Discovery`].

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{AgentDescriptor, DiscoveryPort};
use crate::error::ConvertResult;

/// Queries the network for agents capable of a given conversion.
pub struct AgentDiscovery {
    port: Arc<dyn DiscoveryPort>,
}

impl AgentDiscovery {
    /// Create a discovery component over the given port.
    pub fn new(port: Arc<dyn DiscoveryPort>) -> Self {
        Self { port }
    }

    /// Discover agents supporting `source_format` -> `target_format`.
    ///
    /// Returns whatever agents responded within the connection's own
    /// discovery window. Given stable network state, repeated calls return
    /// the same agent set.
    pub async fn discover(
        &self,
        source_format: &str,
        target_format: &str,
    ) -> ConvertResult<Vec<AgentDescriptor>> {
        debug!(source_format, target_format, "discovering agents");

        let agents = self.port.discover(source_format, target_format).await?;

        info!(
            "found {} capable agent(s) for {} -> {}",
            agents.len(),
            source_format,
            target_format
        );
        for agent in &agents {
            debug!(agent_id = %agent.agent_id, description = %agent.description, "candidate");
        }

        Ok(agents)
    }
}
