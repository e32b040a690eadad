//! # Streaming Part
//!
//! Public entry point for decoding one group-call audio part.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use core_streaming_part::{PersistentDecoder, StreamingPart};
//!
//! # fn example(part_bytes: Vec<u8>) {
//! let mut decoder = PersistentDecoder::new();
//! let mut part = StreamingPart::new(part_bytes, "ogg", false);
//!
//! loop {
//!     let channels = part.next_10ms_per_channel(&mut decoder);
//!     if channels.is_empty() {
//!         break;
//!     }
//!     for channel in &channels {
//!         println!("ssrc {}: {} samples", channel.ssrc, channel.num_samples);
//!     }
//! }
//! # }
//! ```

use crate::config::PartDecoderConfig;
use crate::decoder::SymphoniaPartPipeline;
use crate::state::PartState;
use crate::traits::{ChannelMode, PartPipeline, StreamingPartChannel};
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// One group-call audio part.
///
/// A part that could not be opened is inert: it reports no endpoints, zero
/// remaining time and yields no frames. Construction never fails.
pub struct StreamingPart<P: PartPipeline = SymphoniaPartPipeline> {
    state: Option<PartState<P>>,
}

impl StreamingPart<SymphoniaPartPipeline> {
    /// Open a part with the default decoder configuration.
    ///
    /// `container` names the container format (e.g. `"ogg"`); an empty name
    /// lets the probe detect it.
    pub fn new(data: Vec<u8>, container: &str, is_single_channel: bool) -> Self {
        Self::with_config(data, container, is_single_channel, &PartDecoderConfig::default())
    }

    /// Open a part with an explicit decoder configuration.
    #[instrument(skip(data, config), fields(bytes = data.len()))]
    pub fn with_config(
        data: Vec<u8>,
        container: &str,
        is_single_channel: bool,
        config: &PartDecoderConfig,
    ) -> Self {
        if data.is_empty() {
            debug!("Empty part data");
            return Self::empty();
        }

        match SymphoniaPartPipeline::open(data.into(), container, config) {
            Ok(pipeline) => Self::from_pipeline(
                pipeline,
                ChannelMode::from_single_channel_flag(is_single_channel),
            ),
            Err(e) if e.is_format_error() => {
                warn!("Part is not decodable audio: {}", e);
                Self::empty()
            }
            Err(e) => {
                warn!("Failed to open streaming part: {}", e);
                Self::empty()
            }
        }
    }
}

impl<P: PartPipeline> StreamingPart<P> {
    /// Wrap an already opened pipeline.
    pub fn from_pipeline(pipeline: P, mode: ChannelMode) -> Self {
        Self {
            state: Some(PartState::new(pipeline, mode)),
        }
    }

    /// An inert part.
    pub fn empty() -> Self {
        Self { state: None }
    }

    /// Endpoint name to channel index table carried by the part.
    pub fn endpoint_mapping(&self) -> BTreeMap<String, i32> {
        self.state
            .as_ref()
            .map(PartState::endpoint_mapping)
            .unwrap_or_default()
    }

    /// Milliseconds of audio left, counted down by 10 per produced tick.
    pub fn remaining_milliseconds(&self) -> u32 {
        self.state
            .as_ref()
            .map_or(0, PartState::remaining_milliseconds)
    }

    /// Decode the next 10 ms, one entry per SSRC.
    ///
    /// Returns an empty list once the part is exhausted.
    pub fn next_10ms_per_channel(&mut self, decoder: &mut P::Decoder) -> Vec<StreamingPartChannel> {
        match self.state.as_mut() {
            Some(state) => state.next_frame(decoder),
            None => Vec::new(),
        }
    }

    /// Returns `true` if the part will yield no more frames.
    pub fn is_finished(&self) -> bool {
        self.state.as_ref().map_or(true, PartState::is_finished)
    }
}
