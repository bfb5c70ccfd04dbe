//! Best-effort local duration detection for a video file before upload.
//!
//! Probing never blocks an upload: any failure, including the timeout,
//! becomes [`ProbeOutcome::Unavailable`] and the user is asked to enter the
//! duration by hand.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

/// Error type for duration probing.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("ffprobe binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffprobe execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse ffprobe output: {0}")]
    ParseError(String),

    #[error("video file not found: {0}")]
    VideoNotFound(String),

    #[error("no duration reported for {0}")]
    NoDuration(String),

    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
}

/// Reads the duration of a local media file, in seconds.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<f64, ProbeError>;
}

/// What the caller should do with a probe attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeOutcome {
    /// Raw seconds as reported; rounding happens in the editor.
    Detected(f64),
    /// Ask the user to set the duration manually.
    Unavailable,
}

impl ProbeOutcome {
    pub fn seconds(self) -> Option<f64> {
        match self {
            Self::Detected(seconds) => Some(seconds),
            Self::Unavailable => None,
        }
    }
}

/// Run `probe` bounded by `timeout`, folding every failure into
/// [`ProbeOutcome::Unavailable`].
pub async fn probe_with_timeout(
    probe: &dyn DurationProbe,
    path: &Path,
    timeout: Duration,
) -> ProbeOutcome {
    let result = match tokio::time::timeout(timeout, probe.probe(path)).await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::Timeout(timeout)),
    };
    match result {
        Ok(seconds) if seconds.is_finite() && seconds > 0.0 => {
            tracing::debug!(path = %path.display(), seconds, "Probed video duration");
            ProbeOutcome::Detected(seconds)
        }
        Ok(seconds) => {
            tracing::warn!(path = %path.display(), seconds, "Probe returned unusable duration");
            ProbeOutcome::Unavailable
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Duration probe failed");
            ProbeOutcome::Unavailable
        }
    }
}

// ---------------------------------------------------------------------------
// ffprobe
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Parse the duration in seconds from ffprobe JSON output, preferring the
/// container duration over the first video stream's.
fn parse_duration(output: &FfprobeOutput) -> Option<f64> {
    let format = output
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok());
    format.or_else(|| {
        output
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .and_then(|s| s.duration.as_deref())
            .and_then(|d| d.parse::<f64>().ok())
    })
}

/// [`DurationProbe`] backed by the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeDurationProbe {
    binary: String,
}

impl FfprobeDurationProbe {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfprobeDurationProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

#[async_trait]
impl DurationProbe for FfprobeDurationProbe {
    async fn probe(&self, path: &Path) -> Result<f64, ProbeError> {
        if !path.exists() {
            return Err(ProbeError::VideoNotFound(path.to_string_lossy().to_string()));
        }

        let output = tokio::process::Command::new(&self.binary)
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(ProbeError::NotFound)?;

        if !output.status.success() {
            return Err(ProbeError::ExecutionFailed {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed = serde_json::from_str::<FfprobeOutput>(&stdout)
            .map_err(|e| ProbeError::ParseError(format!("{e}: {stdout}")))?;
        parse_duration(&parsed).ok_or_else(|| ProbeError::NoDuration(path.to_string_lossy().to_string()))
    }
}
