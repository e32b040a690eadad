//! # Streaming Part Decoding
//!
//! Decodes group-call audio "parts": short container files carrying one or
//! more audio channels plus side information that says which participant
//! (SSRC) each channel belongs to at every 10 ms frame.
//!
//! ## Overview
//!
//! This crate handles:
//! - Parsing the binary channel-update section of a part
//! - Serving in-memory part bytes to the demuxer
//! - Demuxing and decoding with symphonia, reusing a caller-owned decoder
//! - Slicing decoded PCM into 10 ms per-SSRC buffers with silence fill
//!
//! The entry point is [`StreamingPart`].

pub mod channel_update;
pub mod config;
pub mod decoder;
pub mod error;
pub mod mapping;
pub mod part;
pub mod source;
pub mod state;
pub mod traits;

pub use channel_update::{encode_channel_updates, parse_channel_updates, ChannelUpdate};
pub use config::{PartDecoderConfig, FRAME_DURATION_MS};
pub use decoder::{PartMetadata, PersistentDecoder, SymphoniaPartPipeline};
pub use error::{PartError, Result};
pub use mapping::{ChannelMapping, ChannelMappingTable};
pub use part::StreamingPart;
pub use source::{ByteBufferSource, SeekRequest, SourceRead};
pub use state::PartState;
pub use traits::{ChannelMode, PartPipeline, PcmReadResult, StreamingPartChannel};
