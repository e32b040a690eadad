//! # Part Decode State Machine
//!
//! Drives one part tick by tick: applies channel updates at their frame
//! boundaries, pulls 10 ms of interleaved PCM from the pipeline and re-slices
//! it into one buffer per SSRC.
//!
//! ## Modes
//!
//! - **Single channel**: decoder channel `i` is SSRC `i + 1`.
//! - **Multiplexed**: channel updates define a time-varying binding over the
//!   fixed set of SSRCs they mention. Every SSRC in that set is present in
//!   every tick, with silence while it has no channel.

use crate::channel_update::{parse_channel_updates, ChannelUpdate};
use crate::config::FRAME_DURATION_MS;
use crate::mapping::ChannelMappingTable;
use crate::traits::{ChannelMode, PartPipeline, StreamingPartChannel};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace, warn};

/// Per-part decode state.
pub struct PartState<P: PartPipeline> {
    mode: ChannelMode,
    pipeline: P,
    channel_updates: Vec<ChannelUpdate>,
    all_ssrcs: BTreeSet<u32>,
    mapping: ChannelMappingTable,
    pcm_10ms: Vec<i16>,
    frame_index: u32,
    remaining_milliseconds: u32,
    did_read_to_end: bool,
}

impl<P: PartPipeline> PartState<P> {
    /// Build the state for a part around an opened pipeline.
    ///
    /// A multiplexed part without channel updates has nothing to demultiplex
    /// and starts finished.
    pub fn new(pipeline: P, mode: ChannelMode) -> Self {
        let channel_updates = match mode {
            ChannelMode::SingleChannel => Vec::new(),
            ChannelMode::Multiplexed => Self::load_channel_updates(&pipeline),
        };

        let mut state = Self {
            mode,
            pipeline,
            channel_updates,
            all_ssrcs: BTreeSet::new(),
            mapping: ChannelMappingTable::new(),
            pcm_10ms: Vec::new(),
            frame_index: 0,
            remaining_milliseconds: 0,
            did_read_to_end: false,
        };

        if state.channel_updates.is_empty() && !mode.is_single_channel() {
            debug!("Multiplexed part has no channel updates, nothing to decode");
            state.did_read_to_end = true;
            return state;
        }

        state.remaining_milliseconds = state.pipeline.duration_milliseconds();
        state.all_ssrcs = state.channel_updates.iter().map(|u| u.ssrc).collect();

        debug!(
            mode = ?mode,
            updates = state.channel_updates.len(),
            ssrcs = state.all_ssrcs.len(),
            duration_ms = state.remaining_milliseconds,
            "Part state initialized"
        );

        state
    }

    fn load_channel_updates(pipeline: &P) -> Vec<ChannelUpdate> {
        let Some(metadata) = pipeline.channel_update_metadata() else {
            return Vec::new();
        };

        let mut offset = 0;
        let updates = parse_channel_updates(&metadata, &mut offset);
        if updates.is_empty() && !metadata.is_empty() {
            warn!(
                bytes = metadata.len(),
                "Channel update metadata is malformed or empty, ignoring"
            );
        }
        updates
    }

    pub fn endpoint_mapping(&self) -> BTreeMap<String, i32> {
        self.pipeline.endpoint_mapping()
    }

    pub fn remaining_milliseconds(&self) -> u32 {
        self.remaining_milliseconds
    }

    /// Index of the next tick to be decoded.
    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    pub fn mode(&self) -> ChannelMode {
        self.mode
    }

    /// Every SSRC mentioned by the part's channel updates, ascending.
    pub fn all_ssrcs(&self) -> &BTreeSet<u32> {
        &self.all_ssrcs
    }

    pub fn current_mapping(&self) -> &ChannelMappingTable {
        &self.mapping
    }

    /// Returns `true` once the part has no more audio.
    pub fn is_finished(&self) -> bool {
        self.did_read_to_end
    }

    /// Decode the next 10 ms tick and split it per SSRC.
    ///
    /// Returns an empty list once the part is finished.
    pub fn next_frame(&mut self, decoder: &mut P::Decoder) -> Vec<StreamingPartChannel> {
        if self.did_read_to_end {
            return Vec::new();
        }

        if !self.mode.is_single_channel() {
            self.apply_due_updates();
        }

        let read = self.pipeline.read_pcm(decoder, &mut self.pcm_10ms);
        if read.is_end_of_stream() || read.num_channels == 0 {
            debug!(frame_index = self.frame_index, "Reached end of part");
            self.did_read_to_end = true;
            return Vec::new();
        }

        let channels = match self.mode {
            ChannelMode::SingleChannel => (0..read.num_channels)
                .map(|channel| {
                    StreamingPartChannel::deinterleave(
                        channel as u32 + 1,
                        &self.pcm_10ms,
                        channel,
                        read.num_channels,
                        read.num_samples,
                    )
                })
                .collect(),
            ChannelMode::Multiplexed => self
                .all_ssrcs
                .iter()
                .map(|&ssrc| match self.mapped_channel(ssrc, read.num_channels) {
                    Some(channel) => StreamingPartChannel::deinterleave(
                        ssrc,
                        &self.pcm_10ms,
                        channel,
                        read.num_channels,
                        read.num_samples,
                    ),
                    None => StreamingPartChannel::silence(ssrc, read.num_samples),
                })
                .collect(),
        };

        trace!(
            frame_index = self.frame_index,
            samples = read.num_samples,
            decoder_channels = read.num_channels,
            "Decoded tick"
        );

        self.remaining_milliseconds = self
            .remaining_milliseconds
            .saturating_sub(FRAME_DURATION_MS);
        self.frame_index += 1;

        channels
    }

    fn apply_due_updates(&mut self) {
        let frame_index = self.frame_index;
        for update in &self.channel_updates {
            if u32::try_from(update.frame_index).ok() == Some(frame_index) {
                self.mapping.apply(update.ssrc, update.channel_id);
            }
        }
    }

    /// Decoder channel for `ssrc`, if bound to one that exists this tick.
    fn mapped_channel(&self, ssrc: u32, num_channels: usize) -> Option<usize> {
        let channel = self.mapping.channel_for(ssrc)?;
        match usize::try_from(channel) {
            Ok(index) if index < num_channels => Some(index),
            _ => {
                warn!(
                    ssrc,
                    channel,
                    num_channels,
                    "SSRC mapped to a channel the decoder does not produce, emitting silence"
                );
                None
            }
        }
    }
}
