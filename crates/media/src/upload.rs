//! Video upload collaborator contract.
//!
//! An uploader starts a transfer in the background and hands back an
//! [`UploadHandle`]: a stream of [`UploadEvent`]s plus the
//! [`CancellationToken`] that aborts the transfer.

use std::path::{Path, PathBuf};

use courseware_core::VideoRef;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Buffer size of the per-upload event channel.
pub const UPLOAD_EVENT_CAPACITY: usize = 64;

/// Extensions accepted as video files, with their MIME types.
const VIDEO_TYPES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("m4v", "video/x-m4v"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
    ("mkv", "video/x-matroska"),
    ("avi", "video/x-msvideo"),
    ("wmv", "video/x-ms-wmv"),
    ("flv", "video/x-flv"),
    ("mpeg", "video/mpeg"),
    ("mpg", "video/mpeg"),
    ("ogv", "video/ogg"),
    ("3gp", "video/3gpp"),
];

/// MIME type for a path with a known video extension.
pub fn video_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    VIDEO_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

/// Errors raised while preparing or performing an upload.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Only video files are allowed: {0}")]
    NotAVideo(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Upload API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("Upload completed but the response is missing '{0}'")]
    MissingResponseField(&'static str),
}

/// A local video file ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
    pub mime_type: &'static str,
}

impl VideoFile {
    /// Stat `path` and check that it looks like a video.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, UploadError> {
        let path = path.into();
        let mime_type = video_mime_type(&path)
            .ok_or_else(|| UploadError::NotAVideo(path.to_string_lossy().to_string()))?;
        let metadata = tokio::fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(UploadError::NotAVideo(path.to_string_lossy().to_string()));
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string());
        Ok(Self {
            path,
            file_name,
            size: metadata.len(),
            mime_type,
        })
    }
}

/// Progress report from a running upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    /// Percent of bytes sent, 0..=100.
    Progress(u8),
    Completed(VideoRef),
    Failed(String),
}

/// Handle to a running upload.
#[derive(Debug)]
pub struct UploadHandle {
    pub events: mpsc::Receiver<UploadEvent>,
    pub cancel: CancellationToken,
}

impl UploadHandle {
    /// Channel pair for an uploader implementation: the sender side for the
    /// background task and the handle to give back to the caller.
    pub fn channel() -> (mpsc::Sender<UploadEvent>, Self) {
        let (tx, events) = mpsc::channel(UPLOAD_EVENT_CAPACITY);
        let handle = Self {
            events,
            cancel: CancellationToken::new(),
        };
        (tx, handle)
    }
}

/// Starts video uploads.
///
/// `start` must not block: the transfer runs in a spawned task that stops
/// as soon as the handle's token is cancelled. After cancellation no
/// further events are required.
pub trait VideoUploader: Send + Sync {
    fn start(&self, file: VideoFile) -> UploadHandle;
}

/// Integer percentage of `done` over `total`, 100 for empty totals.
pub(crate) fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn recognises_video_extensions() {
        assert_eq!(video_mime_type(Path::new("intro.MP4")), Some("video/mp4"));
        assert_eq!(video_mime_type(Path::new("a/b/clip.webm")), Some("video/webm"));
        assert_eq!(video_mime_type(Path::new("notes.pdf")), None);
        assert_eq!(video_mime_type(Path::new("no_extension")), None);
    }

    #[tokio::test]
    async fn open_rejects_non_video_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slides.pdf");
        tokio::fs::write(&path, b"%PDF").await.unwrap();
        assert_matches!(VideoFile::open(&path).await, Err(UploadError::NotAVideo(_)));
    }

    #[tokio::test]
    async fn open_reads_size_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lesson.mov");
        tokio::fs::write(&path, vec![0u8; 2048]).await.unwrap();
        let file = VideoFile::open(&path).await.unwrap();
        assert_eq!(file.size, 2048);
        assert_eq!(file.file_name, "lesson.mov");
        assert_eq!(file.mime_type, "video/quicktime");
    }

    #[test]
    fn percent_is_bounded() {
        assert_eq!(percent(0, 10), 0);
        assert_eq!(percent(5, 10), 50);
        assert_eq!(percent(11, 10), 100);
        assert_eq!(percent(0, 0), 100);
    }
}
