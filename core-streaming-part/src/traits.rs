//! # Streaming Part Traits
//!
//! Defines the seam between the part state machine and the container
//! demux/codec pipeline that feeds it, plus the value types that cross it.
//!
//! ## Architecture
//!
//! ```text
//! bytes → PartPipeline (demux + decode, 10 ms of interleaved i16)
//!       → PartState (channel remapping, silence fill)
//!       → Vec<StreamingPartChannel>
//! ```
//!
//! The pipeline owns the part bytes. The persistent decoder is owned by the
//! caller and lent to the pipeline on every tick so codec state can be reused
//! across consecutive parts.
//!
//! ## Threading Model
//!
//! Everything here is synchronous and pull-based. A pipeline is driven from a
//! single thread; distinct parts may run on distinct threads as long as each
//! has its own persistent decoder.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Value Types
// ============================================================================

/// How decoder channels relate to logical sources, fixed per part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelMode {
    /// Channel `i` is always SSRC `i + 1`; channel updates are ignored.
    SingleChannel,
    /// Channel updates bind decoder channels to SSRCs over time.
    Multiplexed,
}

impl ChannelMode {
    /// Map the caller's single-channel flag to a mode.
    pub fn from_single_channel_flag(is_single_channel: bool) -> Self {
        if is_single_channel {
            Self::SingleChannel
        } else {
            Self::Multiplexed
        }
    }

    pub fn is_single_channel(&self) -> bool {
        matches!(self, Self::SingleChannel)
    }
}

/// Result of pulling one tick of PCM from a [`PartPipeline`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PcmReadResult {
    /// Samples per channel written to the output buffer.
    pub num_samples: usize,
    /// Interleaved channel count of the output buffer.
    pub num_channels: usize,
}

impl PcmReadResult {
    pub fn new(num_samples: usize, num_channels: usize) -> Self {
        Self {
            num_samples,
            num_channels,
        }
    }

    /// End of stream: nothing was decoded.
    pub fn end_of_stream() -> Self {
        Self::default()
    }

    /// Returns `true` if this read produced no samples.
    pub fn is_end_of_stream(&self) -> bool {
        self.num_samples == 0
    }
}

/// One logical source's PCM for a single 10 ms tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamingPartChannel {
    /// Synchronization source the samples belong to
    pub ssrc: u32,
    /// Mono 16-bit PCM
    pub pcm_data: Vec<i16>,
    /// Number of samples in `pcm_data`
    pub num_samples: usize,
}

impl StreamingPartChannel {
    /// A tick of digital silence for `ssrc`.
    pub fn silence(ssrc: u32, num_samples: usize) -> Self {
        Self {
            ssrc,
            pcm_data: vec![0; num_samples],
            num_samples,
        }
    }

    /// Copy channel `channel` out of an interleaved buffer.
    ///
    /// Always yields `num_samples` samples; a short buffer is padded with
    /// silence.
    pub fn deinterleave(
        ssrc: u32,
        interleaved: &[i16],
        channel: usize,
        num_channels: usize,
        num_samples: usize,
    ) -> Self {
        let mut pcm_data: Vec<i16> = interleaved
            .iter()
            .skip(channel)
            .step_by(num_channels.max(1))
            .take(num_samples)
            .copied()
            .collect();
        pcm_data.resize(num_samples, 0);

        Self {
            ssrc,
            pcm_data,
            num_samples,
        }
    }

    /// Returns `true` if every sample is zero.
    pub fn is_silent(&self) -> bool {
        self.pcm_data.iter().all(|&sample| sample == 0)
    }
}

// ============================================================================
// Core Traits
// ============================================================================

/// Container demux and codec decode for a single part.
///
/// Implementations are created from the part bytes and a container hint and
/// then pulled one tick at a time by [`PartState`](crate::PartState).
///
/// ## Implementation Notes
///
/// - `read_pcm` fills `out` with interleaved i16 samples for at most one
///   10 ms tick and reports how many samples per channel it produced
/// - End of stream is a zero sample count, never an error
/// - Metadata queries are answered from data gathered at open time
#[cfg_attr(test, mockall::automock(type Decoder = ();))]
pub trait PartPipeline {
    /// Caller-owned decoder state reused across parts.
    type Decoder;

    /// Raw channel-update section from the part metadata, if present.
    fn channel_update_metadata(&self) -> Option<Vec<u8>>;

    /// Total part duration in milliseconds (0 if unknown).
    fn duration_milliseconds(&self) -> u32;

    /// Endpoint name to channel identifier table carried by the part.
    fn endpoint_mapping(&self) -> BTreeMap<String, i32>;

    /// Decode the next 10 ms of interleaved PCM into `out`.
    fn read_pcm(&mut self, decoder: &mut Self::Decoder, out: &mut Vec<i16>) -> PcmReadResult;
}
