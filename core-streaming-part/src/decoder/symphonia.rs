//! # Symphonia Part Pipeline
//!
//! Demuxes and decodes one streaming part with symphonia, handing out
//! interleaved i16 PCM in 10 ms ticks.

use crate::config::PartDecoderConfig;
use crate::decoder::format_detector::FormatDetector;
use crate::decoder::metadata::PartMetadata;
use crate::decoder::persistent::PersistentDecoder;
use crate::decoder::sample_converter::SampleConverter;
use crate::error::{PartError, Result};
use crate::source::ByteBufferSource;
use crate::traits::{PartPipeline, PcmReadResult};
use bytes::Bytes;
use std::collections::BTreeMap;
use symphonia::core::codecs::{CodecParameters, Decoder, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, MetadataRevision};
use tracing::{debug, error, info, instrument, warn};

/// Symphonia-backed [`PartPipeline`].
///
/// Opening a part probes the container, selects the first decodable track and
/// reads its tags. Decoding is deferred to the first [`read_pcm`] call, which
/// prepares the caller's [`PersistentDecoder`] for this track.
///
/// ## State Management
///
/// Decoded packets are buffered and handed out in `sample_rate / 100` frame
/// slices; a packet may span several ticks and a tick several packets.
///
/// [`read_pcm`]: PartPipeline::read_pcm
pub struct SymphoniaPartPipeline {
    /// Format reader (demuxer) - owns the media source stream
    format_reader: Box<dyn FormatReader>,

    /// Parameters of the selected track
    codec_params: CodecParameters,

    /// Selected track ID
    track_id: u32,

    /// Side information from container tags
    metadata: PartMetadata,

    /// Total duration in milliseconds (0 if unknown)
    duration_ms: u32,

    /// Sample rate driving the tick size
    sample_rate: u32,

    /// Interleaved channel count, 0 until known
    channels: usize,

    /// Decoded interleaved samples of the current packet
    pcm_buffer: Vec<i16>,

    /// Frames of `pcm_buffer` already handed out
    pcm_offset: usize,

    /// Frames held by `pcm_buffer`
    pcm_frames: usize,

    /// First packet already decoded with a freshly prepared decoder
    decoder_ready: bool,

    /// End-of-stream flag
    eof: bool,

    /// Consecutive packet failures tolerated before giving up
    max_consecutive_errors: usize,
}

impl SymphoniaPartPipeline {
    /// Open a part from its container bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - The container is not recognized
    /// - No decodable audio track is found
    #[instrument(skip(data, config), fields(bytes = data.len()))]
    pub fn open(data: Bytes, container: &str, config: &PartDecoderConfig) -> Result<Self> {
        config.validate()?;

        let source = ByteBufferSource::with_chunk_size(data, config.io_chunk_bytes);
        let mss = MediaSourceStream::new(Box::new(source), Default::default());
        let hint = FormatDetector::hint_from_container(container);

        let mut probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| {
                warn!("Part format probe failed: {}", e);
                PartError::InvalidFormat(format!("Failed to probe format: {}", e))
            })?;

        let probe_revision = probed.metadata.get().and_then(|m| m.current().cloned());
        let mut format_reader = probed.format;
        let container_revision = format_reader.metadata().current().cloned();
        let metadata = part_metadata(probe_revision.as_ref(), container_revision.as_ref());

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| {
                error!("No decodable audio track in part");
                PartError::NoAudioTrack(format!("container '{}'", container))
            })?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();
        let sample_rate = codec_params
            .sample_rate
            .unwrap_or(config.fallback_sample_rate);
        let channels = codec_params.channels.map_or(0, |ch| ch.count());
        let duration_ms = duration_milliseconds(&codec_params);

        info!(
            track_id,
            codec = ?codec_params.codec,
            sample_rate,
            channels,
            duration_ms,
            has_channel_updates = metadata.channel_updates.is_some(),
            endpoints = metadata.endpoint_mapping.len(),
            "Opened streaming part"
        );

        Ok(Self {
            format_reader,
            codec_params,
            track_id,
            metadata,
            duration_ms,
            sample_rate,
            channels,
            pcm_buffer: Vec::new(),
            pcm_offset: 0,
            pcm_frames: 0,
            decoder_ready: false,
            eof: false,
            max_consecutive_errors: config.max_consecutive_errors,
        })
    }

    /// Sample rate used to size ticks.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count, 0 until declared by the track or the first packet.
    pub fn channels(&self) -> usize {
        self.channels
    }

    fn buffered_frames(&self) -> usize {
        self.pcm_frames.saturating_sub(self.pcm_offset)
    }

    /// Replace the PCM buffer with the next decoded packet.
    ///
    /// Leaves the buffer empty at end of stream or after an unrecoverable
    /// error; both end the part.
    fn fill_pcm_buffer(&mut self, decoder: &mut PersistentDecoder) {
        self.pcm_buffer.clear();
        self.pcm_offset = 0;
        self.pcm_frames = 0;

        if self.eof {
            return;
        }

        // The first packet starts from a reset decoder; later packets only
        // need the decoder to still match this part's track.
        let codec = if self.decoder_ready {
            decoder.ensure(&self.codec_params)
        } else {
            decoder.prepare(&self.codec_params)
        };
        let codec = match codec {
            Ok(codec) => codec,
            Err(e) => {
                warn!("Cannot decode part: {}", e);
                self.eof = true;
                return;
            }
        };
        self.decoder_ready = true;

        match self.decode_next_packet(codec) {
            Ok(Some(samples)) => {
                self.pcm_frames = samples.len() / self.channels.max(1);
                self.pcm_buffer = samples;
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Ending part early: {}", e);
                self.eof = true;
            }
        }
    }

    /// Read and decode the next packet of the selected track.
    ///
    /// Transient failures are skipped until `max_consecutive_errors` of them
    /// in a row.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(samples))` - Interleaved i16 samples of one packet
    /// - `Ok(None)` - End of stream reached
    /// - `Err(PartError)` - Unrecoverable error
    fn decode_next_packet(&mut self, codec: &mut dyn Decoder) -> Result<Option<Vec<i16>>> {
        let mut consecutive_errors = 0;

        loop {
            let packet = match self.format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    debug!("Reached end of part stream");
                    self.eof = true;
                    return Ok(None);
                }
                Err(e) => {
                    self.skip_or_fail(packet_error(e), &mut consecutive_errors)?;
                    continue;
                }
            };

            while !self.format_reader.metadata().is_latest() {
                self.format_reader.metadata().pop();
            }

            if packet.track_id() != self.track_id {
                continue;
            }

            match codec.decode(&packet) {
                Ok(decoded) => {
                    consecutive_errors = 0;

                    if decoded.frames() == 0 {
                        continue;
                    }

                    let decoded_channels = SampleConverter::channel_count(&decoded);
                    if self.channels == 0 {
                        debug!("Channel count detected from decoded audio: {}", decoded_channels);
                        self.channels = decoded_channels;
                        if self.codec_params.sample_rate.is_none() {
                            self.sample_rate = decoded.spec().rate;
                        }
                    } else if decoded_channels != self.channels {
                        warn!(
                            "Dropping packet with {} channels, part decodes {} channels",
                            decoded_channels, self.channels
                        );
                        continue;
                    }

                    return Ok(Some(SampleConverter::to_interleaved_i16(&decoded)));
                }
                Err(e) => self.skip_or_fail(packet_error(e), &mut consecutive_errors)?,
            }
        }
    }

    /// Count a failed packet, or give up on the part.
    fn skip_or_fail(&self, err: PartError, consecutive_errors: &mut usize) -> Result<()> {
        if !err.is_transient() {
            return Err(err);
        }

        *consecutive_errors += 1;
        warn!(
            "Skipping packet (attempt {}/{}): {}",
            consecutive_errors, self.max_consecutive_errors, err
        );
        if *consecutive_errors >= self.max_consecutive_errors {
            return Err(PartError::CorruptedStream(format!(
                "{} consecutive failed packets: {}",
                consecutive_errors, err
            )));
        }
        Ok(())
    }
}

/// Classify a symphonia packet error. I/O and decode errors are transient.
fn packet_error(err: SymphoniaError) -> PartError {
    match err {
        SymphoniaError::IoError(e) => PartError::IoError(e),
        SymphoniaError::DecodeError(msg) => PartError::DecoderError(msg.to_string()),
        SymphoniaError::Unsupported(msg) => PartError::UnsupportedCodec(msg.to_string()),
        SymphoniaError::ResetRequired => {
            PartError::CorruptedStream("Track list changed, reset required".to_string())
        }
        other => PartError::CorruptedStream(other.to_string()),
    }
}

impl PartPipeline for SymphoniaPartPipeline {
    type Decoder = PersistentDecoder;

    fn channel_update_metadata(&self) -> Option<Vec<u8>> {
        self.metadata.channel_updates.clone()
    }

    fn duration_milliseconds(&self) -> u32 {
        self.duration_ms
    }

    fn endpoint_mapping(&self) -> BTreeMap<String, i32> {
        self.metadata.endpoint_mapping.clone()
    }

    fn read_pcm(&mut self, decoder: &mut PersistentDecoder, out: &mut Vec<i16>) -> PcmReadResult {
        out.clear();

        if self.buffered_frames() == 0 {
            self.fill_pcm_buffer(decoder);
        }
        if self.channels == 0 {
            return PcmReadResult::end_of_stream();
        }

        let channels = self.channels;
        let tick_frames = PartDecoderConfig::frames_per_tick(self.sample_rate);
        out.reserve(tick_frames * channels);

        let mut written = 0;
        while written < tick_frames {
            if self.buffered_frames() == 0 {
                self.fill_pcm_buffer(decoder);
                if self.buffered_frames() == 0 {
                    break;
                }
            }

            let frames = self.buffered_frames().min(tick_frames - written);
            let start = self.pcm_offset * channels;
            out.extend_from_slice(&self.pcm_buffer[start..start + frames * channels]);
            self.pcm_offset += frames;
            written += frames;
        }

        PcmReadResult::new(written, channels)
    }
}

/// Side information from probe-level and container-level tags.
///
/// Container-level tags are read last, so they win over probe-level ones.
fn part_metadata(
    probe: Option<&MetadataRevision>,
    container: Option<&MetadataRevision>,
) -> PartMetadata {
    let tags: Vec<(String, String)> = [probe, container]
        .into_iter()
        .flatten()
        .flat_map(|revision| revision.tags())
        .map(|tag| (tag.key.clone(), tag.value.to_string()))
        .collect();

    PartMetadata::from_tags(tags.iter().map(|(k, v)| (k.as_str(), v.as_str())))
}

/// Track duration in milliseconds from its frame count, 0 if unknown.
fn duration_milliseconds(params: &CodecParameters) -> u32 {
    let Some(n_frames) = params.n_frames else {
        return 0;
    };

    let millis = if let Some(time_base) = params.time_base {
        let time = time_base.calc_time(n_frames);
        time.seconds.saturating_mul(1000) + (time.frac * 1000.0).round() as u64
    } else {
        match params.sample_rate {
            Some(rate) if rate > 0 => n_frames.saturating_mul(1000) / u64::from(rate),
            _ => 0,
        }
    };

    u32::try_from(millis).unwrap_or(u32::MAX)
}
