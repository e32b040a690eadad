//! # Part Metadata Tags
//!
//! Group-call parts carry their side information as container tags:
//!
//! | Tag | Content |
//! |-----|---------|
//! | `TG_META` | base64 channel-update section |
//! | `ACTIVE_MASK` | decimal u32, one bit per active video channel |
//! | `ENDPOINTS` | space-separated endpoint names, one per set bit |

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::BTreeMap;
use tracing::warn;

pub const CHANNEL_UPDATES_TAG: &str = "TG_META";
pub const ACTIVE_MASK_TAG: &str = "ACTIVE_MASK";
pub const ENDPOINTS_TAG: &str = "ENDPOINTS";

/// Side information extracted from a part's container tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartMetadata {
    /// Decoded channel-update section, if the tag was present and valid.
    pub channel_updates: Option<Vec<u8>>,
    /// Endpoint name to channel index.
    pub endpoint_mapping: BTreeMap<String, i32>,
}

impl PartMetadata {
    /// Build from `(key, value)` tag pairs. Later duplicates win.
    pub fn from_tags<'a, I>(tags: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut channel_updates_tag = None;
        let mut active_mask_tag = None;
        let mut endpoints_tag = None;

        for (key, value) in tags {
            match key {
                CHANNEL_UPDATES_TAG => channel_updates_tag = Some(value),
                ACTIVE_MASK_TAG => active_mask_tag = Some(value),
                ENDPOINTS_TAG => endpoints_tag = Some(value),
                _ => {}
            }
        }

        let channel_updates = channel_updates_tag.and_then(decode_channel_updates);

        let active_mask = active_mask_tag.map(parse_leading_u32).unwrap_or(0);
        let endpoints: Vec<&str> = endpoints_tag
            .map(|value| value.split(' ').filter(|name| !name.is_empty()).collect())
            .unwrap_or_default();

        Self {
            channel_updates,
            endpoint_mapping: build_endpoint_mapping(active_mask, &endpoints),
        }
    }
}

fn decode_channel_updates(value: &str) -> Option<Vec<u8>> {
    match STANDARD.decode(value.trim()) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!("Ignoring undecodable {} tag: {}", CHANNEL_UPDATES_TAG, e);
            None
        }
    }
}

/// Parse the leading decimal digits of `value`, 0 if there are none.
fn parse_leading_u32(value: &str) -> u32 {
    let trimmed = value.trim_start();
    let digits = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .map_or(trimmed, |end| &trimmed[..end]);
    digits.parse().unwrap_or(0)
}

/// Pair the k-th endpoint with the bit index of the k-th set bit.
///
/// Empty unless the number of set bits equals the number of endpoints.
fn build_endpoint_mapping(active_mask: u32, endpoints: &[&str]) -> BTreeMap<String, i32> {
    if active_mask.count_ones() as usize != endpoints.len() {
        if !endpoints.is_empty() {
            warn!(
                mask_bits = active_mask.count_ones(),
                endpoints = endpoints.len(),
                "Endpoint list does not match active channel mask"
            );
        }
        return BTreeMap::new();
    }

    (0..32)
        .filter(|bit| active_mask & (1 << bit) != 0)
        .zip(endpoints)
        .map(|(bit, name)| (name.to_string(), bit))
        .collect()
}
