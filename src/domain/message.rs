//! Conversion request/response wire content
//!
//! Requests and responses travel as JSON content maps inside direct
//! messages. The request schema is fixed; responses are recognized by
//! marker fields because different agents report results with slightly
//! different shapes.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::{json, Value};

use crate::error::{ConvertError, ConvertResult};

/// A conversion request for a single file.
///
/// Owned exclusively by the orchestrator until handed to the connection;
/// never reused across invocations.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Raw input file bytes (whole-file buffering)
    pub payload: Vec<u8>,
    /// Original filename, forwarded so agents can name intermediates
    pub filename: String,
    /// Source content type
    pub source_format: String,
    /// Target content type
    pub target_format: String,
    /// Optional free-form conversion instructions
    pub prompt: Option<String>,
}

impl ConversionRequest {
    /// Serialize into the content map sent to the agent.
    pub fn into_content(self) -> Value {
        let mut content = json!({
            "file_data": BASE64.encode(&self.payload),
            "filename": self.filename,
            "source_format": self.source_format,
            "target_format": self.target_format,
        });
        if let Some(prompt) = self.prompt {
            content["prompt"] = Value::String(prompt);
        }
        content
    }
}

/// A conversion result reported by an agent.
///
/// "Not yet arrived" is represented by absence from the correlator map,
/// not by a variant here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionResponse {
    /// The agent converted the file; `payload` is base64 output data,
    /// `None` when the agent claimed success but omitted the data.
    Success {
        /// Base64-encoded converted bytes, if present
        payload: Option<String>,
    },
    /// The agent reported a conversion failure.
    Error {
        /// Agent-supplied failure message
        message: String,
    },
}

impl ConversionResponse {
    /// Recognize a conversion result in an inbound content map.
    ///
    /// A map is a conversion result if it carries `conversion_status` or
    /// `action == "conversion_result"`. Returns `None` for unrelated
    /// messages so they can be ignored.
    pub fn from_content(content: &Value) -> Option<Self> {
        let status = content.get("conversion_status").and_then(Value::as_str);
        let action = content.get("action").and_then(Value::as_str);
        if status.is_none() && action != Some("conversion_result") {
            return None;
        }

        let success_flag = content.get("success").and_then(Value::as_bool);
        if status == Some("success") || success_flag == Some(true) {
            let payload = content
                .get("file_data")
                .or_else(|| content.get("output_data"))
                .and_then(Value::as_str)
                .map(str::to_string);
            return Some(ConversionResponse::Success { payload });
        }
        if status == Some("error") || success_flag == Some(false) {
            let message = content
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            return Some(ConversionResponse::Error { message });
        }

        // Carries a result marker but neither a success nor an error shape.
        Some(ConversionResponse::Error {
            message: "Unknown error".to_string(),
        })
    }

    /// Decode the converted bytes from a success response.
    pub fn decode_payload(&self) -> ConvertResult<Vec<u8>> {
        match self {
            ConversionResponse::Success {
                payload: Some(data),
            } => Ok(BASE64.decode(data)?),
            ConversionResponse::Success { payload: None } => Err(ConvertError::Decode(
                "response carried no converted data".to_string(),
            )),
            ConversionResponse::Error { message } => Err(ConvertError::Agent(message.clone())),
        }
    }
}
