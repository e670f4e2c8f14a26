//! System-level modules
//!
//! Logging initialization lives here; lifecycle and mode routing are in
//! `runtime`.

pub mod logging;

pub use logging::init_logging;
