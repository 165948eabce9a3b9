//! HTTP control listener.
//!
//! [`routes`] maps requests onto the runtime without any I/O; [`server`]
//! runs those routes on a `tiny_http` thread.

pub mod routes;
pub mod server;

pub use routes::{ControlApi, ControlResponse};
pub use server::ControlServer;
