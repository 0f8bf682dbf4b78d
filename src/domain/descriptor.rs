//! Agent descriptors returned by discovery

use serde::{Deserialize, Serialize};

/// An agent advertising one or more conversion capabilities.
///
/// Produced by a discovery query; immutable, and only meaningful for the
/// lifetime of that query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// Unique agent identifier on the network
    pub agent_id: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Advertised (source, target) content-type pairs, when reported
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<ConversionPair>,
}

/// A single supported conversion direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionPair {
    /// Source content type (e.g. `text/plain`)
    pub source: String,
    /// Target content type (e.g. `application/pdf`)
    pub target: String,
}
