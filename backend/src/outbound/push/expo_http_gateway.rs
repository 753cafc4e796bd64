//! Reqwest-backed Expo push gateway adapter.
//!
//! Owns transport details only: JSON encoding of the batch, the client
//! timeout, and transport error mapping. Any HTTP status is returned to the
//! dispatcher, which decides what counts as failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use super::dto::ExpoPushMessageDto;
use crate::domain::ports::{PushGateway, PushGatewayError, PushGatewayResponse, PushMessage};

/// Expo's batch send endpoint.
pub const DEFAULT_EXPO_PUSH_ENDPOINT: &str = "https://exp.host/--/api/v2/push/send";

/// Push gateway adapter that POSTs one JSON array per batch.
pub struct ExpoHttpGateway {
    client: Client,
    endpoint: Url,
}

impl ExpoHttpGateway {
    /// Build an adapter with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl PushGateway for ExpoHttpGateway {
    async fn send_batch(
        &self,
        messages: &[PushMessage],
    ) -> Result<PushGatewayResponse, PushGatewayError> {
        let payload: Vec<ExpoPushMessageDto<'_>> =
            messages.iter().map(ExpoPushMessageDto::from).collect();
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_transport_error)?;
        let preview = body_preview(body.as_ref());
        debug!(status, body = %preview, messages = messages.len(), "push gateway responded");

        Ok(PushGatewayResponse {
            status,
            body: preview,
        })
    }
}

fn map_transport_error(error: reqwest::Error) -> PushGatewayError {
    if error.is_timeout() {
        PushGatewayError::timeout(error.to_string())
    } else {
        PushGatewayError::transport(error.to_string())
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        let preview: String = compact.chars().take(PREVIEW_CHAR_LIMIT).collect();
        format!("{preview}...")
    } else {
        compact
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network gateway helpers.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"{\"data\": [ {\"status\": \"ok\"} ]}", "{\"data\": [ {\"status\": \"ok\"} ]}")]
    #[case(b"  line one\n\n  line two ", "line one line two")]
    #[case(b"", "")]
    fn previews_compact_whitespace(#[case] body: &[u8], #[case] expected: &str) {
        assert_eq!(body_preview(body), expected);
    }

    #[rstest]
    fn long_bodies_are_truncated() {
        let body = "あ".repeat(200);
        let preview = body_preview(body.as_bytes());
        assert_eq!(preview.chars().count(), 163);
        assert!(preview.ends_with("..."));
    }

    #[rstest]
    fn default_endpoint_parses() {
        let url = Url::parse(DEFAULT_EXPO_PUSH_ENDPOINT).expect("valid endpoint");
        assert_eq!(url.host_str(), Some("exp.host"));
    }

    #[rstest]
    fn builds_with_a_timeout() {
        let gateway = ExpoHttpGateway::new(
            Url::parse(DEFAULT_EXPO_PUSH_ENDPOINT).expect("valid endpoint"),
            Duration::from_secs(5),
        );
        assert!(gateway.is_ok());
    }
}
