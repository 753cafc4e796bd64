//! Push gateway outbound adapters.
//!
//! Thin HTTP implementation of the `PushGateway` port for the Expo push API.

mod dto;
mod expo_http_gateway;

pub use expo_http_gateway::{DEFAULT_EXPO_PUSH_ENDPOINT, ExpoHttpGateway};
