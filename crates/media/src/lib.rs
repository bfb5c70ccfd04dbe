//! Async collaborators of the course content editor.
//!
//! - [`probe`]: best-effort video duration detection (ffprobe).
//! - [`upload`] / [`http_upload`]: cancellable video uploads with progress.
//! - [`session`]: [`EditorSession`], the single owner of the tree that
//!   applies collaborator callbacks.
//! - [`config`]: environment-driven settings.

pub mod config;
pub mod http_upload;
pub mod probe;
pub mod session;
pub mod upload;

pub use config::EditorConfig;
pub use http_upload::HttpVideoUploader;
pub use probe::{DurationProbe, FfprobeDurationProbe, ProbeOutcome};
pub use session::{EditorSession, SessionEvent, SessionEventKind};
pub use upload::{UploadEvent, UploadHandle, VideoFile, VideoUploader};
