//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to              |
//! |----------------|--------------------|--------------------------|
//! | `change_queue` | EventSubscriber    | mpsc channel to the loop |
//! | `http_backend` | TelemetryPort      | Backend REST API         |
//! |                | SessionPort        |                          |
//! | `log_sink`     | TelemetryPort      | `log` output (dry run)   |
//! |                | SessionPort        |                          |
//! | `time`         | Clock              | Wall clock / manual      |

pub mod change_queue;
pub mod http_backend;
pub mod log_sink;
pub mod time;
