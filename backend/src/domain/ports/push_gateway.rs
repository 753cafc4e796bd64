//! Driven port for the external push notification gateway.
//!
//! The domain owns the message shape; adapters own the wire encoding. A
//! response with any status is returned as data so the dispatcher decides
//! what counts as failure.

use async_trait::async_trait;

use super::define_port_error;

/// One push message addressed to a single device token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    /// Destination device token.
    pub to: String,
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
    /// Optional sound name played on delivery.
    pub sound: Option<String>,
}

/// Raw gateway response for one batch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushGatewayResponse {
    /// HTTP status code returned by the gateway.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl PushGatewayResponse {
    /// Return whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

define_port_error! {
    /// Errors raised before a gateway response was received.
    pub enum PushGatewayError {
        /// Network transport failed.
        Transport { message: String } => "push gateway transport failed: {message}",
        /// Call exceeded the client timeout.
        Timeout { message: String } => "push gateway timeout: {message}",
    }
}

/// Port for batch push delivery.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Submit all messages in a single outbound request.
    async fn send_batch(
        &self,
        messages: &[PushMessage],
    ) -> Result<PushGatewayResponse, PushGatewayError>;
}
