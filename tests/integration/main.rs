//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  Nothing here talks to a real backend; the
//! control listener tests bind an ephemeral localhost port.

mod control_tests;
mod mock_ports;
mod runtime_tests;
mod service_tests;
