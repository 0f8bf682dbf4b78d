//! Request/response correlation
//!
//! Tracks at most one outstanding conversion request per agent id and
//! matches asynchronously delivered replies back to the waiting caller.
//! The response map is the only shared mutable state in the client: it is
//! written by the connection's inbound callback and read here, so both
//! sides go through one mutex, and a [`Notify`] provides the
//! happens-before edge between "response recorded" and "wait observes it".

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::{ConversionRequest, ConversionResponse, InboundHandler, MessagingPort};
use crate::error::{ConvertError, ConvertResult};

/// Granularity of the cooperative wait loop.
///
/// The contract only guarantees a response is observed within one poll
/// interval of arrival; in practice the notify wakes the waiter as soon as
/// the callback records it.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Correlates conversion responses with outstanding requests, keyed by
/// the responding agent's id.
pub struct RequestCorrelator {
    messaging: Arc<dyn MessagingPort>,
    responses: Mutex<HashMap<String, ConversionResponse>>,
    arrived: Notify,
}

impl RequestCorrelator {
    /// Create a correlator dispatching over the given messaging port.
    pub fn new(messaging: Arc<dyn MessagingPort>) -> Self {
        Self {
            messaging,
            responses: Mutex::new(HashMap::new()),
            arrived: Notify::new(),
        }
    }

    /// Dispatch a conversion request to `agent_id`.
    ///
    /// Any stale entry for the same agent is cleared first: exactly one
    /// outstanding request per agent id is tracked, and a second send
    /// discards tracking of the first.
    pub async fn send(&self, agent_id: &str, request: ConversionRequest) -> ConvertResult<()> {
        self.responses.lock().await.remove(agent_id);
        self.messaging
            .send_direct(agent_id, request.into_content())
            .await
    }

    /// Wait until a response from `agent_id` has been recorded.
    ///
    /// Returns [`ConvertError::Timeout`] once `timeout` elapses and
    /// [`ConvertError::Cancelled`] promptly when `cancel` fires; never
    /// blocks longer than `timeout` plus one poll interval. A response
    /// recorded for a different agent is never delivered here.
    pub async fn wait(
        &self,
        agent_id: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> ConvertResult<ConversionResponse> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(response) = self.take(agent_id).await {
                return Ok(response);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ConvertError::Timeout(timeout.as_secs()));
            }
            let tick = POLL_INTERVAL.min(deadline - now);

            tokio::select! {
                _ = self.arrived.notified() => {}
                _ = tokio::time::sleep(tick) => {}
                _ = cancel.cancelled() => return Err(ConvertError::Cancelled),
            }
        }
    }

    /// Consume the recorded response for `agent_id`, if any.
    async fn take(&self, agent_id: &str) -> Option<ConversionResponse> {
        self.responses.lock().await.remove(agent_id)
    }
}

#[async_trait]
impl InboundHandler for RequestCorrelator {
    async fn on_direct_message(&self, sender_id: &str, content: Value) {
        let Some(response) = ConversionResponse::from_content(&content) else {
            return;
        };
        debug!(sender_id, "received conversion response");
        // A newer response overwrites an unconsumed one for the same agent.
        self.responses
            .lock()
            .await
            .insert(sender_id.to_string(), response);
        self.arrived.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct RecordingMessaging {
        sent: Mutex<Vec<(String, Value)>>,
    }

    impl RecordingMessaging {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MessagingPort for RecordingMessaging {
        async fn send_direct(&self, target_id: &str, content: Value) -> ConvertResult<()> {
            self.sent.lock().await.push((target_id.to_string(), content));
            Ok(())
        }

        async fn register_handler(&self, _handler: Arc<dyn InboundHandler>) {}
    }

    fn correlator() -> RequestCorrelator {
        RequestCorrelator::new(Arc::new(RecordingMessaging::new()))
    }

    fn request() -> ConversionRequest {
        ConversionRequest {
            payload: b"data".to_vec(),
            filename: "a.txt".to_string(),
            source_format: "text/plain".to_string(),
            target_format: "text/markdown".to_string(),
            prompt: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_without_response() {
        let correlator = correlator();
        let cancel = CancellationToken::new();

        let result = correlator
            .wait("doc-agent", Duration::from_secs(3), &cancel)
            .await;
        assert!(matches!(result, Err(ConvertError::Timeout(3))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_returns_recorded_response() {
        let correlator = correlator();
        let cancel = CancellationToken::new();

        correlator
            .on_direct_message("doc-agent", json!({"conversion_status": "success", "file_data": "aGk="}))
            .await;

        let response = correlator
            .wait("doc-agent", Duration::from_secs(60), &cancel)
            .await
            .unwrap();
        assert_eq!(response.decode_payload().unwrap(), b"hi");
    }

    #[tokio::test(start_paused = true)]
    async fn test_correlation_does_not_cross_agent_ids() {
        let correlator = correlator();
        let cancel = CancellationToken::new();

        correlator
            .on_direct_message("agent-x", json!({"conversion_status": "success", "file_data": "eA=="}))
            .await;

        // A response from X must never satisfy a wait on Y.
        let result = correlator
            .wait("agent-y", Duration::from_secs(2), &cancel)
            .await;
        assert!(matches!(result, Err(ConvertError::Timeout(_))));

        // The entry for X is still there afterwards.
        let response = correlator
            .wait("agent-x", Duration::from_secs(1), &cancel)
            .await
            .unwrap();
        assert!(matches!(response, ConversionResponse::Success { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_arriving_mid_wait_is_observed() {
        let correlator = Arc::new(correlator());
        let cancel = CancellationToken::new();

        let waiter = {
            let correlator = correlator.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                correlator
                    .wait("doc-agent", Duration::from_secs(30), &cancel)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_secs(5)).await;
        correlator
            .on_direct_message("doc-agent", json!({"success": true, "output_data": "b2s="}))
            .await;

        let response = waiter.await.unwrap().unwrap();
        assert_eq!(response.decode_payload().unwrap(), b"ok");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_aborts_wait_promptly() {
        let correlator = Arc::new(correlator());
        let cancel = CancellationToken::new();

        let waiter = {
            let correlator = correlator.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                correlator
                    .wait("doc-agent", Duration::from_secs(600), &cancel)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();

        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(ConvertError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_clears_stale_entry() {
        let messaging = Arc::new(RecordingMessaging::new());
        let correlator = RequestCorrelator::new(messaging.clone());
        let cancel = CancellationToken::new();

        // A leftover response from an earlier exchange must not satisfy a
        // wait for the request sent after it.
        correlator
            .on_direct_message("doc-agent", json!({"conversion_status": "error", "error": "stale"}))
            .await;
        correlator.send("doc-agent", request()).await.unwrap();

        let result = correlator
            .wait("doc-agent", Duration::from_secs(1), &cancel)
            .await;
        assert!(matches!(result, Err(ConvertError::Timeout(_))));
        assert_eq!(messaging.sent.lock().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_response_overwrites_unconsumed_entry() {
        let correlator = correlator();
        let cancel = CancellationToken::new();

        correlator
            .on_direct_message("doc-agent", json!({"conversion_status": "error", "error": "first"}))
            .await;
        correlator
            .on_direct_message("doc-agent", json!({"conversion_status": "error", "error": "second"}))
            .await;

        let response = correlator
            .wait("doc-agent", Duration::from_secs(1), &cancel)
            .await
            .unwrap();
        assert_eq!(
            response,
            ConversionResponse::Error {
                message: "second".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrelated_messages_are_ignored() {
        let correlator = correlator();
        let cancel = CancellationToken::new();

        correlator
            .on_direct_message("doc-agent", json!({"text": "hello there"}))
            .await;

        let result = correlator
            .wait("doc-agent", Duration::from_secs(1), &cancel)
            .await;
        assert!(matches!(result, Err(ConvertError::Timeout(_))));
    }
}
