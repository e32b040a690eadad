//! # Part Decoder Module
//!
//! Symphonia-backed demuxing and decoding of streaming parts.
//!
//! ## Architecture
//!
//! ```text
//! Bytes → ByteBufferSource → MediaSourceStream → FormatReader → PersistentDecoder → i16 PCM
//! ```
//!
//! 1. **ByteBufferSource**: Serves the part's bytes in bounded chunks
//! 2. **FormatReader**: Demultiplexes the container and exposes its tags
//! 3. **PersistentDecoder**: Caller-owned codec decoder, reused across parts
//!
//! ## Codecs
//!
//! Everything symphonia's `all` feature enables. Opus requires the `opus`
//! feature, which registers libopus through `symphonia-adapter-libopus`.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use core_streaming_part::{PartDecoderConfig, PartPipeline, PersistentDecoder, SymphoniaPartPipeline};
//!
//! # fn example(bytes: Vec<u8>) -> core_streaming_part::Result<()> {
//! let mut pipeline = SymphoniaPartPipeline::open(bytes.into(), "ogg", &PartDecoderConfig::default())?;
//! let mut decoder = PersistentDecoder::new();
//! let mut pcm = Vec::new();
//!
//! loop {
//!     let read = pipeline.read_pcm(&mut decoder, &mut pcm);
//!     if read.is_end_of_stream() {
//!         break;
//!     }
//!     println!("{} frames x {} channels", read.num_samples, read.num_channels);
//! }
//! # Ok(())
//! # }
//! ```

mod format_detector;
mod metadata;
mod persistent;
mod sample_converter;
mod symphonia;

pub use self::symphonia::SymphoniaPartPipeline;
pub use format_detector::FormatDetector;
pub use metadata::{PartMetadata, ACTIVE_MASK_TAG, CHANNEL_UPDATES_TAG, ENDPOINTS_TAG};
pub use persistent::{codec_registry, PersistentDecoder};
pub use sample_converter::SampleConverter;
