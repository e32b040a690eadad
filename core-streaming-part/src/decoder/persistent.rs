//! # Persistent Decoder
//!
//! Caller-owned codec decoder reused across consecutive parts. Building a
//! codec decoder is the expensive part of opening a part; parts of one call
//! almost always share codec parameters, so the decoder is kept and reset
//! instead of rebuilt.

use crate::error::{PartError, Result};
use symphonia::core::codecs::{CodecParameters, CodecRegistry, CodecType, Decoder, DecoderOptions};
use tracing::{debug, info};

/// Codec parameters that decide whether a cached decoder can be reused.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DecoderKey {
    codec: CodecType,
    sample_rate: Option<u32>,
    channels: Option<usize>,
    extra_data: Option<Box<[u8]>>,
}

impl DecoderKey {
    fn from_params(params: &CodecParameters) -> Self {
        Self {
            codec: params.codec,
            sample_rate: params.sample_rate,
            channels: params.channels.map(|channels| channels.count()),
            extra_data: params.extra_data.clone(),
        }
    }
}

/// Codec registry used for part decoding.
///
/// With the `opus` feature, libopus is registered ahead of symphonia's own
/// codecs, which cannot decode Opus.
#[cfg(feature = "opus")]
pub fn codec_registry() -> &'static CodecRegistry {
    use std::sync::OnceLock;

    static CODEC_REGISTRY: OnceLock<CodecRegistry> = OnceLock::new();
    CODEC_REGISTRY.get_or_init(|| {
        let mut registry = CodecRegistry::new();
        registry.register_all::<symphonia_adapter_libopus::OpusDecoder>();
        symphonia::default::register_enabled_codecs(&mut registry);
        registry
    })
}

/// Codec registry used for part decoding.
#[cfg(not(feature = "opus"))]
pub fn codec_registry() -> &'static CodecRegistry {
    symphonia::default::get_codecs()
}

/// Decoder state shared by the parts of one stream.
///
/// Holds at most one codec decoder. Not safe to share between parts decoded
/// concurrently; give each concurrently driven part its own instance.
#[derive(Default)]
pub struct PersistentDecoder {
    decoder: Option<Box<dyn Decoder>>,
    key: Option<DecoderKey>,
    created: usize,
}

impl PersistentDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the decoder ready for a new part with `params`.
    ///
    /// Reuses (and resets) the cached decoder when the codec parameters match,
    /// otherwise builds a new one.
    pub fn prepare(&mut self, params: &CodecParameters) -> Result<&mut dyn Decoder> {
        let key = DecoderKey::from_params(params);

        let reusable = self.key.as_ref() == Some(&key) && self.decoder.is_some();
        if reusable {
            debug!(codec = ?key.codec, "Reusing persistent decoder");
            if let Some(decoder) = self.decoder.as_mut() {
                decoder.reset();
            }
        } else {
            let decoder = codec_registry()
                .make(params, &DecoderOptions::default())
                .map_err(|e| {
                    PartError::UnsupportedCodec(format!("Failed to create codec decoder: {}", e))
                })?;
            info!(codec = ?key.codec, "Created persistent decoder");
            self.decoder = Some(decoder);
            self.key = Some(key);
            self.created += 1;
        }

        self.current()
            .ok_or_else(|| PartError::DecoderError("Decoder missing after prepare".to_string()))
    }

    /// Keep decoding a part already started with [`prepare`](Self::prepare).
    ///
    /// Returns the cached decoder untouched while it matches `params`. If
    /// another part replaced it in between, a decoder for `params` is rebuilt.
    pub fn ensure(&mut self, params: &CodecParameters) -> Result<&mut dyn Decoder> {
        let key = DecoderKey::from_params(params);
        if self.key.as_ref() != Some(&key) || self.decoder.is_none() {
            debug!(codec = ?key.codec, "Persistent decoder was switched, rebuilding");
            return self.prepare(params);
        }

        self.current()
            .ok_or_else(|| PartError::DecoderError("Decoder missing after ensure".to_string()))
    }

    /// Decoder prepared by the last successful [`prepare`](Self::prepare).
    pub fn current(&mut self) -> Option<&mut dyn Decoder> {
        match self.decoder.as_mut() {
            Some(decoder) => Some(decoder.as_mut()),
            None => None,
        }
    }

    /// Returns `true` if a decoder is cached.
    pub fn is_initialized(&self) -> bool {
        self.decoder.is_some()
    }

    /// Number of codec decoders built over this instance's lifetime.
    pub fn decoders_created(&self) -> usize {
        self.created
    }

    /// Drop the cached decoder.
    pub fn clear(&mut self) {
        self.decoder = None;
        self.key = None;
    }
}

impl std::fmt::Debug for PersistentDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentDecoder")
            .field("key", &self.key)
            .field("created", &self.created)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symphonia::core::audio::Channels;
    use symphonia::core::codecs::{CODEC_TYPE_NULL, CODEC_TYPE_PCM_S16LE};

    fn pcm_params(sample_rate: u32) -> CodecParameters {
        let mut params = CodecParameters::new();
        params
            .for_codec(CODEC_TYPE_PCM_S16LE)
            .with_sample_rate(sample_rate)
            .with_bits_per_coded_sample(16)
            .with_bits_per_sample(16)
            .with_max_frames_per_packet(1152)
            .with_channels(Channels::FRONT_LEFT | Channels::FRONT_RIGHT);
        params
    }

    #[test]
    fn test_reuses_decoder_for_matching_params() {
        let mut persistent = PersistentDecoder::new();
        assert!(!persistent.is_initialized());

        persistent.prepare(&pcm_params(48_000)).unwrap();
        persistent.prepare(&pcm_params(48_000)).unwrap();

        assert!(persistent.is_initialized());
        assert_eq!(persistent.decoders_created(), 1);
    }

    #[test]
    fn test_rebuilds_decoder_when_params_change() {
        let mut persistent = PersistentDecoder::new();
        persistent.prepare(&pcm_params(48_000)).unwrap();
        persistent.prepare(&pcm_params(16_000)).unwrap();
        assert_eq!(persistent.decoders_created(), 2);

        persistent.clear();
        assert!(!persistent.is_initialized());
        assert!(persistent.current().is_none());
    }

    #[test]
    fn test_ensure_keeps_matching_decoder() {
        let mut persistent = PersistentDecoder::new();
        persistent.prepare(&pcm_params(48_000)).unwrap();
        persistent.ensure(&pcm_params(48_000)).unwrap();
        persistent.ensure(&pcm_params(48_000)).unwrap();
        assert_eq!(persistent.decoders_created(), 1);
    }

    #[test]
    fn test_ensure_rebuilds_after_switch() {
        let mut persistent = PersistentDecoder::new();
        persistent.prepare(&pcm_params(48_000)).unwrap();
        persistent.prepare(&pcm_params(16_000)).unwrap();

        persistent.ensure(&pcm_params(48_000)).unwrap();
        assert_eq!(persistent.decoders_created(), 3);

        persistent.clear();
        persistent.ensure(&pcm_params(48_000)).unwrap();
        assert_eq!(persistent.decoders_created(), 4);
    }

    #[test]
    fn test_unknown_codec_fails() {
        let mut persistent = PersistentDecoder::new();
        let mut params = CodecParameters::new();
        params.for_codec(CODEC_TYPE_NULL);

        let err = persistent
            .prepare(&params)
            .err()
            .expect("null codec should not build a decoder");
        assert!(err.is_format_error());
        assert!(!persistent.is_initialized());
    }
}
