//! Workspace facade crate.
//!
//! Re-exports the part decoder and, with the `runtime` feature, the logging
//! runtime, so hosts can depend on `callpart-workspace` and toggle features
//! without wiring each crate individually.

pub use core_streaming_part::*;

#[cfg(feature = "runtime")]
pub use core_runtime as runtime;
