//! Courseware domain core.
//!
//! Pure, synchronous building blocks of the course authoring wizard:
//!
//! - [`content`]: the section / lecture / resource-link tree.
//! - [`editor`]: structural edits (add, remove, reorder, field edits).
//! - [`upload`]: per-lecture video upload and duration state machine.
//! - [`validation`]: submit gating and completion statistics.
//! - [`persistence`]: backend document shape, hydration and id mapping.
//! - [`course_wizard`]: wizard steps and per-step validation.

pub mod collapse;
pub mod content;
pub mod course_info;
pub mod course_options;
pub mod course_wizard;
pub mod duration;
pub mod editor;
pub mod error;
pub mod ordering;
pub mod persistence;
pub mod types;
pub mod upload;
pub mod validation;

pub use content::{CourseContent, Lecture, ResourceLink, Section, UploadState, VideoRef};
pub use editor::Rejection;
pub use error::CoreError;
pub use types::NodeId;
