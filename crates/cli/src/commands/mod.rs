mod create;
mod probe;
mod upload;
mod validate;

pub use create::{create, CreateArgs};
pub use probe::{probe, ProbeArgs};
pub use upload::{upload, UploadArgs};
pub use validate::{validate, ValidateArgs};

use std::path::Path;

use anyhow::{Context, Result};
use courseware_core::course_wizard::CourseDraft;
use courseware_core::persistence::{hydrate, CourseDocument};
use courseware_events::{Notice, NoticeBus, NoticeLevel};
use tokio::sync::broadcast;

/// Read a course document from a JSON file. Both the bare document and the
/// backend's `{ "course": ... }` envelope are accepted.
pub(crate) fn read_document(path: &Path) -> Result<CourseDocument> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    if let Some(course) = value.get_mut("course") {
        value = course.take();
    }
    serde_json::from_value(value)
        .with_context(|| format!("{} is not a course document", path.display()))
}

/// Split a stored document into the editor's draft.
pub(crate) fn draft_from_document(document: &CourseDocument) -> Result<CourseDraft> {
    Ok(CourseDraft {
        information: document.information.clone(),
        options: document.options.clone(),
        content: hydrate(&document.course_data)?,
    })
}

pub(crate) fn render_notice(notice: &Notice) -> String {
    let tag = match notice.level {
        NoticeLevel::Success => "ok",
        NoticeLevel::Info => "info",
        NoticeLevel::Warning => "warn",
        NoticeLevel::Error => "error",
    };
    format!("[{tag}] {}", notice.message)
}

/// Print notices until the bus is dropped.
pub(crate) fn print_notices(bus: &NoticeBus) -> tokio::task::JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(notice) => println!("{}", render_notice(&notice)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Notice printer lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
