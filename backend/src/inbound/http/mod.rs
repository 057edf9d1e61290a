//! HTTP inbound adapter exposing REST endpoints.

pub mod availability;
pub mod bookings;
pub mod error;
pub mod health;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;
