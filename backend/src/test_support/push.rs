//! Push notification doubles that record what the dispatcher sends.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    DeviceToken, DeviceTokenStore, DeviceTokenStoreError, PushGateway, PushGatewayError,
    PushGatewayResponse, PushMessage,
};

/// Device token store returning a fixed token list.
#[derive(Debug, Clone, Default)]
pub struct StaticDeviceTokenStore(pub Vec<DeviceToken>);

impl StaticDeviceTokenStore {
    /// Store holding one `ios` token per entry.
    pub fn with_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            tokens
                .into_iter()
                .map(|token| DeviceToken {
                    token: token.into(),
                    platform: "ios".to_owned(),
                })
                .collect(),
        )
    }
}

#[async_trait]
impl DeviceTokenStore for StaticDeviceTokenStore {
    async fn list_all(&self) -> Result<Vec<DeviceToken>, DeviceTokenStoreError> {
        Ok(self.0.clone())
    }
}

/// Gateway answering every batch with a fixed status and recording it.
pub struct RecordingPushGateway {
    status: u16,
    batches: Mutex<Vec<Vec<PushMessage>>>,
}

impl RecordingPushGateway {
    /// Gateway answering every batch with `status`.
    pub fn responding(status: u16) -> Self {
        Self {
            status,
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Every batch received so far, in call order.
    pub fn batches(&self) -> Vec<Vec<PushMessage>> {
        self.lock_batches().clone()
    }

    fn lock_batches(&self) -> MutexGuard<'_, Vec<Vec<PushMessage>>> {
        self.batches.lock().expect("gateway mutex")
    }
}

#[async_trait]
impl PushGateway for RecordingPushGateway {
    async fn send_batch(
        &self,
        messages: &[PushMessage],
    ) -> Result<PushGatewayResponse, PushGatewayError> {
        self.lock_batches().push(messages.to_vec());
        Ok(PushGatewayResponse {
            status: self.status,
            body: String::from("{\"data\":[]}"),
        })
    }
}
