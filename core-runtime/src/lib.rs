//! # Core Runtime Module
//!
//! Runtime infrastructure shared by hosts embedding the part decoder:
//! - Logging and tracing initialization
//! - Runtime error type
//!
//! Nothing here is required to decode parts; the decoding crate only emits
//! `tracing` events and leaves subscriber setup to the host.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
