//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod daily_task_store;
mod device_token_store;
mod push_gateway;
mod user_store;

pub use daily_task_store::{DailyTaskStore, DailyTaskStoreError};
#[cfg(test)]
pub use device_token_store::MockDeviceTokenStore;
pub use device_token_store::{DeviceToken, DeviceTokenStore, DeviceTokenStoreError};
#[cfg(test)]
pub use push_gateway::MockPushGateway;
pub use push_gateway::{PushGateway, PushGatewayError, PushGatewayResponse, PushMessage};
pub use user_store::{UserIdStream, UserStore, UserStoreError};
