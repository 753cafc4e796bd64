//! Daily task streak and reminder engine for the pet-care backend.
//!
//! The domain module owns scheduling and dispatch rules behind ports;
//! outbound adapters bind those ports to PostgreSQL and the push gateway.

pub mod config;
pub mod domain;
pub mod outbound;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
