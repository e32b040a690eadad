//! Tests for the part decode state machine driven by a scripted pipeline
//!
//! This test suite verifies:
//! - Channel updates take effect at their frame boundaries
//! - Single-channel SSRC numbering
//! - Stable SSRC set and silence fill in multiplexed mode
//! - Remaining time and end-of-part behavior

use core_streaming_part::{
    encode_channel_updates, ChannelMode, ChannelUpdate, PartPipeline, PartState, PcmReadResult,
    StreamingPart,
};
use std::collections::BTreeMap;

// ============================================================================
// Scripted Pipeline
// ============================================================================

/// Pipeline that produces `ticks` ticks of `num_channels` channels, where
/// every sample of channel `c` in tick `t` is `(t * 10 + c + 1)`.
struct ScriptedPipeline {
    metadata: Option<Vec<u8>>,
    duration_ms: u32,
    num_channels: usize,
    samples_per_tick: usize,
    ticks: usize,
    produced: usize,
    endpoints: BTreeMap<String, i32>,
}

impl ScriptedPipeline {
    fn new(num_channels: usize, samples_per_tick: usize, ticks: usize) -> Self {
        Self {
            metadata: None,
            duration_ms: (ticks * 10) as u32,
            num_channels,
            samples_per_tick,
            ticks,
            produced: 0,
            endpoints: BTreeMap::new(),
        }
    }

    fn with_updates(mut self, updates: &[ChannelUpdate]) -> Self {
        self.metadata = Some(encode_channel_updates(self.num_channels as i32, updates));
        self
    }

    fn with_duration(mut self, duration_ms: u32) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    fn with_endpoint(mut self, name: &str, channel: i32) -> Self {
        self.endpoints.insert(name.to_string(), channel);
        self
    }

    fn sample(tick: usize, channel: usize) -> i16 {
        (tick * 10 + channel + 1) as i16
    }
}

/// Counts how many ticks were pulled through it.
#[derive(Default)]
struct TickCounter {
    reads: usize,
}

impl PartPipeline for ScriptedPipeline {
    type Decoder = TickCounter;

    fn channel_update_metadata(&self) -> Option<Vec<u8>> {
        self.metadata.clone()
    }

    fn duration_milliseconds(&self) -> u32 {
        self.duration_ms
    }

    fn endpoint_mapping(&self) -> BTreeMap<String, i32> {
        self.endpoints.clone()
    }

    fn read_pcm(&mut self, decoder: &mut TickCounter, out: &mut Vec<i16>) -> PcmReadResult {
        decoder.reads += 1;
        out.clear();
        if self.produced >= self.ticks {
            return PcmReadResult::end_of_stream();
        }

        let tick = self.produced;
        for _ in 0..self.samples_per_tick {
            for channel in 0..self.num_channels {
                out.push(Self::sample(tick, channel));
            }
        }
        self.produced += 1;
        PcmReadResult::new(self.samples_per_tick, self.num_channels)
    }
}

// ============================================================================
// Multiplexed Mode
// ============================================================================

#[test]
fn test_ssrc_switch_at_frame_boundary() {
    let pipeline = ScriptedPipeline::new(1, 480, 8)
        .with_updates(&[ChannelUpdate::new(0, 0, 100), ChannelUpdate::new(5, 0, 200)]);
    let mut decoder = TickCounter::default();
    let mut state = PartState::new(pipeline, ChannelMode::Multiplexed);

    for tick in 0..8 {
        let channels = state.next_frame(&mut decoder);
        assert_eq!(channels.len(), 2, "tick {}", tick);
        assert_eq!(channels[0].ssrc, 100);
        assert_eq!(channels[1].ssrc, 200);

        let expected = ScriptedPipeline::sample(tick, 0);
        if tick < 5 {
            assert!(channels[0].pcm_data.iter().all(|&s| s == expected));
            assert!(channels[1].is_silent());
        } else {
            assert!(channels[0].is_silent());
            assert!(channels[1].pcm_data.iter().all(|&s| s == expected));
        }
        assert_eq!(channels[0].num_samples, 480);
        assert_eq!(channels[1].num_samples, 480);
    }

    assert!(state.next_frame(&mut decoder).is_empty());
    assert!(state.is_finished());
}

#[test]
fn test_ssrc_set_is_stable() {
    let pipeline = ScriptedPipeline::new(2, 160, 6).with_updates(&[
        ChannelUpdate::new(0, 0, 30),
        ChannelUpdate::new(0, 1, 10),
        ChannelUpdate::new(3, 0, 20),
    ]);
    let mut decoder = TickCounter::default();
    let mut part = StreamingPart::from_pipeline(pipeline, ChannelMode::Multiplexed);

    let mut ticks = 0;
    loop {
        let channels = part.next_10ms_per_channel(&mut decoder);
        if channels.is_empty() {
            break;
        }
        let ssrcs: Vec<u32> = channels.iter().map(|c| c.ssrc).collect();
        assert_eq!(ssrcs, vec![10, 20, 30]);
        ticks += 1;
    }
    assert_eq!(ticks, 6);
}

#[test]
fn test_channel_swap_evicts_previous_owner() {
    let pipeline = ScriptedPipeline::new(2, 4, 3).with_updates(&[
        ChannelUpdate::new(0, 0, 1),
        ChannelUpdate::new(0, 1, 2),
        ChannelUpdate::new(1, 0, 2),
    ]);
    let mut decoder = TickCounter::default();
    let mut state = PartState::new(pipeline, ChannelMode::Multiplexed);

    let first = state.next_frame(&mut decoder);
    assert_eq!(first[0].pcm_data, vec![ScriptedPipeline::sample(0, 0); 4]);
    assert_eq!(first[1].pcm_data, vec![ScriptedPipeline::sample(0, 1); 4]);

    // SSRC 2 moves to channel 0, SSRC 1 loses its channel.
    let second = state.next_frame(&mut decoder);
    assert!(second[0].is_silent());
    assert_eq!(second[1].pcm_data, vec![ScriptedPipeline::sample(1, 0); 4]);
    assert_eq!(state.current_mapping().len(), 1);
    assert_eq!(state.current_mapping().channel_for(2), Some(0));
}

#[test]
fn test_channel_beyond_decoder_is_silent() {
    let pipeline =
        ScriptedPipeline::new(1, 8, 2).with_updates(&[ChannelUpdate::new(0, 3, 42)]);
    let mut decoder = TickCounter::default();
    let mut state = PartState::new(pipeline, ChannelMode::Multiplexed);

    let channels = state.next_frame(&mut decoder);
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].ssrc, 42);
    assert_eq!(channels[0].num_samples, 8);
    assert!(channels[0].is_silent());
}

#[test]
fn test_no_updates_means_nothing_to_decode() {
    let pipeline = ScriptedPipeline::new(2, 480, 10);
    let mut decoder = TickCounter::default();
    let mut part = StreamingPart::from_pipeline(pipeline, ChannelMode::Multiplexed);

    assert_eq!(part.remaining_milliseconds(), 0);
    assert!(part.next_10ms_per_channel(&mut decoder).is_empty());
    assert_eq!(decoder.reads, 0);
}

#[test]
fn test_truncated_update_section_means_nothing_to_decode() {
    let mut metadata = encode_channel_updates(1, &[ChannelUpdate::new(0, 0, 7)]);
    metadata.pop();

    let mut pipeline = ScriptedPipeline::new(1, 480, 10);
    pipeline.metadata = Some(metadata);
    let mut decoder = TickCounter::default();
    let mut state = PartState::new(pipeline, ChannelMode::Multiplexed);

    assert!(state.is_finished());
    assert!(state.next_frame(&mut decoder).is_empty());
}

// ============================================================================
// Single-Channel Mode
// ============================================================================

#[test]
fn test_single_channel_ssrcs_follow_channel_index() {
    let pipeline = ScriptedPipeline::new(2, 160, 1);
    let mut decoder = TickCounter::default();
    let mut part = StreamingPart::from_pipeline(pipeline, ChannelMode::SingleChannel);

    let channels = part.next_10ms_per_channel(&mut decoder);
    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0].ssrc, 1);
    assert_eq!(channels[1].ssrc, 2);
    assert_eq!(channels[0].num_samples, 160);
    assert_eq!(channels[0].pcm_data, vec![ScriptedPipeline::sample(0, 0); 160]);
    assert_eq!(channels[1].pcm_data, vec![ScriptedPipeline::sample(0, 1); 160]);
}

#[test]
fn test_single_channel_ignores_updates() {
    let pipeline =
        ScriptedPipeline::new(1, 16, 2).with_updates(&[ChannelUpdate::new(0, 0, 999)]);
    let mut decoder = TickCounter::default();
    let mut state = PartState::new(pipeline, ChannelMode::SingleChannel);

    assert!(state.all_ssrcs().is_empty());
    let channels = state.next_frame(&mut decoder);
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].ssrc, 1);
}

// ============================================================================
// Timing
// ============================================================================

#[test]
fn test_remaining_milliseconds_counts_down() {
    let pipeline = ScriptedPipeline::new(1, 480, 4).with_duration(35);
    let mut decoder = TickCounter::default();
    let mut part = StreamingPart::from_pipeline(pipeline, ChannelMode::SingleChannel);

    let mut observed = vec![part.remaining_milliseconds()];
    while !part.next_10ms_per_channel(&mut decoder).is_empty() {
        observed.push(part.remaining_milliseconds());
    }

    assert_eq!(observed, vec![35, 25, 15, 5, 0]);
    assert!(observed.windows(2).all(|w| w[1] <= w[0]));
    assert_eq!(part.remaining_milliseconds(), 0);
}

#[test]
fn test_finished_part_stops_reading() {
    let pipeline = ScriptedPipeline::new(1, 480, 1);
    let mut decoder = TickCounter::default();
    let mut state = PartState::new(pipeline, ChannelMode::SingleChannel);

    assert_eq!(state.next_frame(&mut decoder).len(), 1);
    assert!(state.next_frame(&mut decoder).is_empty());
    assert!(state.next_frame(&mut decoder).is_empty());
    assert_eq!(decoder.reads, 2);
    assert_eq!(state.frame_index(), 1);
}

#[test]
fn test_endpoint_mapping_passthrough() {
    let pipeline = ScriptedPipeline::new(1, 480, 1)
        .with_updates(&[ChannelUpdate::new(0, 0, 5)])
        .with_endpoint("alice", 2);
    let part = StreamingPart::from_pipeline(pipeline, ChannelMode::Multiplexed);

    assert_eq!(part.endpoint_mapping().get("alice"), Some(&2));
}
