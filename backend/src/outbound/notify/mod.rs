//! Outbound notification adapters.

pub mod relay;

pub use relay::{HttpNotificationRelay, LogOnlyNotificationRelay};
