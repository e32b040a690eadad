//! Active channel-to-SSRC bindings.

/// One current binding of a logical source to a decoder channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMapping {
    pub ssrc: u32,
    pub channel_index: i32,
}

/// Ordered one-to-one table of active bindings.
///
/// No two entries share an `ssrc` or a `channel_index`. The table stays a
/// plain vector: it holds one entry per concurrent speaker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelMappingTable {
    entries: Vec<ChannelMapping>,
}

impl ChannelMappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `ssrc` to `channel_index`.
    ///
    /// Re-applying an existing binding is a no-op. Otherwise every binding
    /// sharing the ssrc or the channel is evicted before the new one is added.
    pub fn apply(&mut self, ssrc: u32, channel_index: i32) {
        let mapping = ChannelMapping {
            ssrc,
            channel_index,
        };
        if self.entries.contains(&mapping) {
            return;
        }

        self.entries
            .retain(|entry| entry.ssrc != ssrc && entry.channel_index != channel_index);
        self.entries.push(mapping);
    }

    /// Decoder channel currently carrying `ssrc`.
    pub fn channel_for(&self, ssrc: u32) -> Option<i32> {
        self.entries
            .iter()
            .find(|entry| entry.ssrc == ssrc)
            .map(|entry| entry.channel_index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelMapping> {
        self.entries.iter()
    }
}
