//! # Part Decoding Error Types
//!
//! Errors raised by the demux/decode pipeline while opening or reading a
//! streaming part. They never reach the callers of [`StreamingPart`]: the
//! facade and the state machine log them and degrade to silence or an inert
//! part instead.
//!
//! [`StreamingPart`]: crate::StreamingPart

use thiserror::Error;

/// Errors that can occur while demuxing or decoding a streaming part.
#[derive(Error, Debug)]
pub enum PartError {
    // ========================================================================
    // Format/Codec Errors
    // ========================================================================
    /// Container format is not recognized or cannot be parsed.
    #[error("Unsupported or invalid container format: {0}")]
    InvalidFormat(String),

    /// Container holds no track with a decodable codec.
    #[error("No decodable audio track: {0}")]
    NoAudioTrack(String),

    /// Codec is not supported by the registered decoders.
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    // ========================================================================
    // Decoding Errors
    // ========================================================================
    /// Decoder encountered an internal error.
    #[error("Decoder error: {0}")]
    DecoderError(String),

    /// Part contains too many consecutive undecodable packets.
    #[error("Corrupted part stream: {0}")]
    CorruptedStream(String),

    /// Embedded part metadata could not be decoded.
    #[error("Invalid part metadata: {0}")]
    InvalidMetadata(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Decoder configuration is invalid.
    #[error("Invalid decoder configuration: {0}")]
    InvalidConfig(String),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PartError {
    /// Returns `true` if a later packet may still decode after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, PartError::IoError(_) | PartError::DecoderError(_))
    }

    /// Returns `true` if this error is related to container/codec issues.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            PartError::InvalidFormat(_)
                | PartError::NoAudioTrack(_)
                | PartError::UnsupportedCodec(_)
        )
    }
}

/// Result type for part decoding operations.
pub type Result<T> = std::result::Result<T, PartError>;
