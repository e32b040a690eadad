//! # Container Hint Detection
//!
//! Turns the container name attached to a part into a probe hint.

use symphonia::core::probe::Hint;
use tracing::debug;

/// Container format detector for streaming parts.
pub struct FormatDetector;

impl FormatDetector {
    /// Normalize a container name to the extension symphonia registers.
    ///
    /// Unknown names are passed through lower-cased so the probe can still
    /// try them.
    pub fn container_extension(container: &str) -> String {
        let normalized = container.trim().trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "ogg" | "opus" | "oga" => "ogg".to_string(),
            "mp4" | "m4a" | "mov" => "mp4".to_string(),
            "webm" | "mkv" | "mka" => "mkv".to_string(),
            "wav" | "wave" => "wav".to_string(),
            "mp3" | "mpeg" => "mp3".to_string(),
            "flac" => "flac".to_string(),
            "aac" | "adts" => "aac".to_string(),
            _ => normalized,
        }
    }

    /// Create a probe hint from the part's container name.
    ///
    /// An empty name yields an empty hint and the probe auto-detects.
    pub fn hint_from_container(container: &str) -> Hint {
        let mut hint = Hint::new();

        let extension = Self::container_extension(container);
        if extension.is_empty() {
            debug!("No container hint, probe will auto-detect");
        } else {
            debug!("Setting probe hint extension: {}", extension);
            hint.with_extension(&extension);
        }

        hint
    }
}
