//! Error types for conversion operations

use std::fmt;

/// Errors that can occur while orchestrating conversions
#[derive(Debug)]
pub enum ConvertError {
    /// Could not establish or maintain the network session
    Connection(String),

    /// An operation was attempted before connecting
    NotConnected,

    /// Transport-level failure during agent discovery
    Discovery(String),

    /// Discovery succeeded but returned no capable agents
    NoCapableAgent {
        /// Source content type of the attempted conversion
        source: String,
        /// Target content type of the attempted conversion
        target: String,
    },

    /// The chosen agent explicitly reported a conversion error
    Agent(String),

    /// No response arrived within the configured window
    Timeout(u64),

    /// The response payload was malformed or missing
    Decode(String),

    /// The converted output could not be written
    Persist(String),

    /// The input file could not be read
    Input(String),

    /// The operation was cancelled by the caller
    Cancelled,
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::Connection(msg) => write!(f, "Connection error: {msg}"),
            ConvertError::NotConnected => write!(f, "Client is not connected to the network"),
            ConvertError::Discovery(msg) => write!(f, "Discovery error: {msg}"),
            ConvertError::NoCapableAgent { source, target } => {
                write!(f, "No agents found for {source} -> {target} conversion")
            }
            ConvertError::Agent(msg) => write!(f, "Conversion failed: {msg}"),
            ConvertError::Timeout(secs) => write!(f, "Conversion timeout after {secs}s"),
            ConvertError::Decode(msg) => write!(f, "Decode error: {msg}"),
            ConvertError::Persist(msg) => write!(f, "Failed to write output: {msg}"),
            ConvertError::Input(msg) => write!(f, "Failed to read input: {msg}"),
            ConvertError::Cancelled => write!(f, "Operation was cancelled"),
        }
    }
}

impl std::error::Error for ConvertError {}

impl ConvertError {
    /// Whether this error aborts the whole batch rather than a single file.
    ///
    /// Only connection-level failures and cancellation are fatal; every
    /// other variant is converted into a per-file failure outcome and the
    /// batch continues.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConvertError::Connection(_) | ConvertError::NotConnected | ConvertError::Cancelled
        )
    }
}

impl From<base64::DecodeError> for ConvertError {
    fn from(err: base64::DecodeError) -> Self {
        ConvertError::Decode(err.to_string())
    }
}

impl From<serde_json::Error> for ConvertError {
    fn from(err: serde_json::Error) -> Self {
        ConvertError::Decode(err.to_string())
    }
}

/// Result type alias for conversion operations
pub type ConvertResult<T> = Result<T, ConvertError>;
