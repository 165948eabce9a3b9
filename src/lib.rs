//! PanelBot simulator library.
//!
//! Exposes the runtime parameter control engine, the telemetry generator,
//! the control listener and the backend adapters for the binary, for
//! integration testing and for external inspection.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod runtime;
pub mod scheduler;
pub mod sensors;
