//! # Part Decoder Configuration
//!
//! Tuning knobs for the symphonia-backed part pipeline.

use crate::error::{PartError, Result};
use crate::source::DEFAULT_CHUNK_SIZE;
use serde::{Deserialize, Serialize};

/// Duration of one tick of decode-and-remap work.
pub const FRAME_DURATION_MS: u32 = 10;

/// Part decoder configuration.
///
/// Controls the I/O transfer granularity and how much packet-level corruption
/// a part tolerates before it is treated as finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartDecoderConfig {
    /// Bytes copied to the demuxer per read call.
    ///
    /// Default: 4 KiB.
    #[serde(default = "default_io_chunk_bytes")]
    pub io_chunk_bytes: usize,

    /// Consecutive unreadable or undecodable packets skipped before the part
    /// reports end of stream.
    ///
    /// Default: 10.
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: usize,

    /// Sample rate assumed when the track does not declare one.
    ///
    /// Default: 48000 Hz (Opus).
    #[serde(default = "default_fallback_sample_rate")]
    pub fallback_sample_rate: u32,
}

impl Default for PartDecoderConfig {
    fn default() -> Self {
        Self {
            io_chunk_bytes: default_io_chunk_bytes(),
            max_consecutive_errors: default_max_consecutive_errors(),
            fallback_sample_rate: default_fallback_sample_rate(),
        }
    }
}

impl PartDecoderConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.io_chunk_bytes == 0 {
            return Err(PartError::InvalidConfig(
                "io_chunk_bytes must be > 0".to_string(),
            ));
        }

        if self.max_consecutive_errors == 0 {
            return Err(PartError::InvalidConfig(
                "max_consecutive_errors must be > 0".to_string(),
            ));
        }

        // Below 100 Hz a 10 ms tick holds no samples.
        if self.fallback_sample_rate < 100 {
            return Err(PartError::InvalidConfig(
                "fallback_sample_rate must be >= 100".to_string(),
            ));
        }

        Ok(())
    }

    /// Frames per channel in one tick at `sample_rate`.
    pub fn frames_per_tick(sample_rate: u32) -> usize {
        (sample_rate as usize * FRAME_DURATION_MS as usize) / 1000
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_io_chunk_bytes() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_max_consecutive_errors() -> usize {
    10
}

fn default_fallback_sample_rate() -> u32 {
    48_000
}
