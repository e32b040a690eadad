//! # Sample Format Converter
//!
//! Converts decoded symphonia buffers to interleaved 16-bit PCM.

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;
use symphonia::core::sample::{i24, u24, Sample};

/// Sample converter that normalizes audio to interleaved i16.
///
/// Symphonia outputs planar buffers in the codec's native sample format; the
/// part state machine consumes interleaved i16 regardless of codec.
pub struct SampleConverter;

impl SampleConverter {
    /// Convert a decoded buffer to interleaved i16 samples.
    ///
    /// Output layout is frame-major: `[c0, c1, .., cN, c0, c1, ..]`.
    pub fn to_interleaved_i16(buffer: &AudioBufferRef<'_>) -> Vec<i16> {
        match buffer {
            AudioBufferRef::S16(buf) => Self::interleave(&**buf, |sample: i16| sample),
            AudioBufferRef::F32(buf) => Self::interleave(&**buf, |sample: f32| sample.into_sample()),
            AudioBufferRef::F64(buf) => Self::interleave(&**buf, |sample: f64| sample.into_sample()),
            AudioBufferRef::S32(buf) => Self::interleave(&**buf, |sample: i32| sample.into_sample()),
            AudioBufferRef::S24(buf) => Self::interleave(&**buf, |sample: i24| sample.into_sample()),
            AudioBufferRef::S8(buf) => Self::interleave(&**buf, |sample: i8| sample.into_sample()),
            AudioBufferRef::U32(buf) => Self::interleave(&**buf, |sample: u32| sample.into_sample()),
            AudioBufferRef::U24(buf) => Self::interleave(&**buf, |sample: u24| sample.into_sample()),
            AudioBufferRef::U16(buf) => Self::interleave(&**buf, |sample: u16| sample.into_sample()),
            AudioBufferRef::U8(buf) => Self::interleave(&**buf, |sample: u8| sample.into_sample()),
        }
    }

    /// Number of channels in a decoded buffer.
    pub fn channel_count(buffer: &AudioBufferRef<'_>) -> usize {
        buffer.spec().channels.count()
    }

    fn interleave<T: Sample>(buf: &AudioBuffer<T>, convert: fn(T) -> i16) -> Vec<i16> {
        let num_channels = buf.spec().channels.count();
        let num_frames = buf.frames();
        let mut interleaved = Vec::with_capacity(num_frames * num_channels);

        for frame_idx in 0..num_frames {
            for chan_idx in 0..num_channels {
                interleaved.push(convert(buf.chan(chan_idx)[frame_idx]));
            }
        }

        interleaved
    }
}
