//! Domain layer: booking rules, aggregates, and the ports they speak through.
//!
//! Nothing in this layer knows about HTTP, Diesel, or any other adapter
//! technology; inbound and outbound adapters depend on this module, never
//! the reverse.

pub mod accounts;
pub mod admission;
pub mod availability;
pub mod blackout;
pub mod catalog;
pub mod clock;
pub mod error;
pub mod ports;
pub mod reservation;
pub mod user;

pub use error::{Error, ErrorCode, TRACE_ID_HEADER};
