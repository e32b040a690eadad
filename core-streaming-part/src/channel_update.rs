//! # Channel Update Parsing
//!
//! Decodes the channel-reassignment section embedded in a part's metadata.
//!
//! ## Layout
//!
//! All integers are 32-bit little-endian:
//!
//! ```text
//! [channel_count: i32][update_count: i32]
//! update_count × [frame_index: i32][channel_id: i32][ssrc: u32]
//! ```
//!
//! `channel_count` is read as a presence check only. Any truncation yields an
//! empty list rather than an error.

use serde::{Deserialize, Serialize};

/// A channel-reassignment event.
///
/// Starting at the frame whose index equals `frame_index`, decoder output
/// channel `channel_id` carries audio for source `ssrc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelUpdate {
    /// 10 ms frame at which the binding takes effect
    pub frame_index: i32,
    /// Decoder output channel
    pub channel_id: i32,
    /// Logical audio source carried by the channel
    pub ssrc: u32,
}

impl ChannelUpdate {
    /// Create a new channel update.
    pub fn new(frame_index: i32, channel_id: i32, ssrc: u32) -> Self {
        Self {
            frame_index,
            channel_id,
            ssrc,
        }
    }
}

fn read_u32(data: &[u8], offset: &mut usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    let bytes: [u8; 4] = data.get(*offset..end)?.try_into().ok()?;
    *offset = end;
    Some(u32::from_le_bytes(bytes))
}

fn read_i32(data: &[u8], offset: &mut usize) -> Option<i32> {
    read_u32(data, offset).map(|value| value as i32)
}

/// Parse the channel-update section starting at `offset`.
///
/// Advances `offset` past every integer successfully read. Returns an empty
/// list as soon as fewer than 4 bytes remain for a required read.
pub fn parse_channel_updates(data: &[u8], offset: &mut usize) -> Vec<ChannelUpdate> {
    try_parse(data, offset).unwrap_or_default()
}

fn try_parse(data: &[u8], offset: &mut usize) -> Option<Vec<ChannelUpdate>> {
    // Declared channel count; not enforced against the decoder.
    let _channels = read_i32(data, offset)?;
    let count = read_i32(data, offset)?;

    let mut updates = Vec::new();
    for _ in 0..count {
        let frame_index = read_i32(data, offset)?;
        let channel_id = read_i32(data, offset)?;
        let ssrc = read_u32(data, offset)?;
        updates.push(ChannelUpdate::new(frame_index, channel_id, ssrc));
    }

    Some(updates)
}

/// Encode updates in the layout read by [`parse_channel_updates`].
pub fn encode_channel_updates(channel_count: i32, updates: &[ChannelUpdate]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + updates.len() * 12);
    out.extend_from_slice(&channel_count.to_le_bytes());
    out.extend_from_slice(&(updates.len() as i32).to_le_bytes());
    for update in updates {
        out.extend_from_slice(&update.frame_index.to_le_bytes());
        out.extend_from_slice(&update.channel_id.to_le_bytes());
        out.extend_from_slice(&update.ssrc.to_le_bytes());
    }
    out
}
