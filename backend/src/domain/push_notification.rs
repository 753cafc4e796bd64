//! Daily reminder push dispatch.
//!
//! Sends one reminder to every registered device in a single gateway call.
//! Independent of assignment state; the job fires once a day regardless.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::DailyTaskError;
use crate::domain::ports::{DeviceTokenStore, PushGateway, PushGatewayError, PushMessage};

/// Reminder text and sound sent to every device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderContent {
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
    /// Platform sound name; `None` sends a silent notification.
    pub sound: Option<String>,
}

impl ReminderContent {
    /// Title sent when none is configured.
    pub const DEFAULT_TITLE: &'static str = "デイリータスクをやろう！";
    /// Body sent when none is configured.
    pub const DEFAULT_BODY: &'static str = "今日のデイリータスクを忘れずにチェックしよう🐾";
    /// Sound sent with every reminder.
    pub const DEFAULT_SOUND: &'static str = "default";

    fn message_for(&self, token: String) -> PushMessage {
        PushMessage {
            to: token,
            title: self.title.clone(),
            body: self.body.clone(),
            sound: self.sound.clone(),
        }
    }
}

impl Default for ReminderContent {
    fn default() -> Self {
        Self {
            title: Self::DEFAULT_TITLE.to_owned(),
            body: Self::DEFAULT_BODY.to_owned(),
            sound: Some(Self::DEFAULT_SOUND.to_owned()),
        }
    }
}

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Messages handed to the gateway.
    pub message_count: usize,
    /// Gateway status; `None` when nothing was sent.
    pub gateway_status: Option<u16>,
}

impl DispatchReport {
    /// Report for a run with no registered devices.
    pub const fn empty() -> Self {
        Self {
            message_count: 0,
            gateway_status: None,
        }
    }
}

/// Sends the daily reminder to all registered devices.
pub struct PushNotificationDispatcher {
    tokens: Arc<dyn DeviceTokenStore>,
    gateway: Arc<dyn PushGateway>,
    content: ReminderContent,
}

impl PushNotificationDispatcher {
    /// Dispatcher sending `content` to every token in `tokens`.
    pub fn new(
        tokens: Arc<dyn DeviceTokenStore>,
        gateway: Arc<dyn PushGateway>,
        content: ReminderContent,
    ) -> Self {
        Self {
            tokens,
            gateway,
            content,
        }
    }

    /// Read every token and submit one batched reminder.
    ///
    /// An empty token set succeeds without calling the gateway. A non-2xx
    /// status or a transport failure is a [`DailyTaskError::DispatchFailure`];
    /// nothing is retried here.
    pub async fn dispatch(&self) -> Result<DispatchReport, DailyTaskError> {
        let tokens = self
            .tokens
            .list_all()
            .await
            .map_err(DailyTaskError::from_device_tokens)?;
        if tokens.is_empty() {
            info!("no registered devices; skipping reminder dispatch");
            return Ok(DispatchReport::empty());
        }

        let messages: Vec<PushMessage> = tokens
            .into_iter()
            .map(|device| self.content.message_for(device.token))
            .collect();
        let response = self
            .gateway
            .send_batch(&messages)
            .await
            .map_err(map_gateway_error)?;

        if !response.is_success() {
            warn!(
                status = response.status,
                body = %response.body,
                "push gateway rejected reminder batch"
            );
            return Err(DailyTaskError::DispatchFailure {
                status: Some(response.status),
                message: format!("gateway responded with status {}", response.status),
            });
        }

        info!(
            status = response.status,
            messages = messages.len(),
            "reminder batch dispatched"
        );
        Ok(DispatchReport {
            message_count: messages.len(),
            gateway_status: Some(response.status),
        })
    }
}

fn map_gateway_error(error: PushGatewayError) -> DailyTaskError {
    warn!(error = %error, "push gateway unreachable");
    DailyTaskError::DispatchFailure {
        status: None,
        message: error.to_string(),
    }
}
