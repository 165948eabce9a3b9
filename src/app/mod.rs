//! Application core: session orchestration over port traits.
//!
//! The runtime engine lives in [`crate::runtime`]; this layer drives it
//! once per telemetry tick and moves readings and change events out
//! through the ports defined in [`ports`], keeping it fully testable
//! without a network.

pub mod ports;
pub mod service;
