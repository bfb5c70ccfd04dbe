//! Per-lecture video upload and duration-detection state machine.
//!
//! ```text
//! Idle ──begin──▶ Uploading ──complete──▶ Complete
//!   ▲                │  │                    │
//!   └────cancel──────┘  └──fail──▶ Failed    │
//!                                    │       │
//!                Uploading ◀──begin──┴───────┘
//! ```
//!
//! A probed duration is written to the lecture as soon as the upload starts.
//! Failure and cancellation put back the duration fields that were in place
//! before the attempt (unless the user typed a value meanwhile) and never
//! touch the previously committed video reference.

use crate::content::{CourseContent, UploadState, VideoRef, MAX_PROGRESS_PERCENT};
use crate::duration::ceil_seconds;
use crate::editor::Rejection;
use crate::types::NodeId;

/// Start (or restart) an upload on a lecture.
///
/// `probed_seconds` is the best-effort duration read from the local file.
/// When present it becomes both the lecture duration and the auto-detected
/// value; when absent the current duration is left alone and the caller
/// should prompt for manual entry. Either way detection state is reset.
pub fn begin_upload(
    tree: &CourseContent,
    section_id: &NodeId,
    lecture_id: &NodeId,
    probed_seconds: Option<f64>,
) -> Result<CourseContent, Rejection> {
    let mut next = tree.clone();
    let lecture = next.lecture_mut(section_id, lecture_id)?;

    if lecture.pre_upload.is_none() {
        lecture.pre_upload = Some(lecture.snapshot_duration());
    }

    lecture.is_manually_edited_duration = false;
    lecture.auto_detected_duration_seconds = probed_seconds.and_then(ceil_seconds);
    if let Some(seconds) = lecture.auto_detected_duration_seconds {
        lecture.duration_seconds = seconds;
    }
    lecture.upload_state = UploadState::Uploading {
        progress_percent: 0,
    };
    Ok(next)
}

/// Record transfer progress. Ignored unless the lecture is uploading;
/// values are clamped to 100 and never move backwards.
pub fn update_upload_progress(
    tree: &CourseContent,
    section_id: &NodeId,
    lecture_id: &NodeId,
    percent: u8,
) -> Result<CourseContent, Rejection> {
    let current = tree
        .lecture(section_id, lecture_id)
        .ok_or_else(|| not_found(tree, section_id, lecture_id))?;
    let UploadState::Uploading { progress_percent } = current.upload_state else {
        return Ok(tree.clone());
    };
    let percent = percent.min(MAX_PROGRESS_PERCENT).max(progress_percent);
    if percent == progress_percent {
        return Ok(tree.clone());
    }

    let mut next = tree.clone();
    next.lecture_mut(section_id, lecture_id)?.upload_state = UploadState::Uploading {
        progress_percent: percent,
    };
    Ok(next)
}

/// Record a probe result that arrived after the upload started.
///
/// Adopted only while the attempt is running, nothing was detected yet and
/// the user has not typed a duration in the meantime.
pub fn record_probed_duration(
    tree: &CourseContent,
    section_id: &NodeId,
    lecture_id: &NodeId,
    probed_seconds: f64,
) -> Result<CourseContent, Rejection> {
    let current = tree
        .lecture(section_id, lecture_id)
        .ok_or_else(|| not_found(tree, section_id, lecture_id))?;
    if !current.upload_state.is_uploading()
        || current.auto_detected_duration_seconds.is_some()
        || current.is_manually_edited_duration
    {
        return Ok(tree.clone());
    }
    let Some(seconds) = ceil_seconds(probed_seconds) else {
        return Ok(tree.clone());
    };

    let mut next = tree.clone();
    let lecture = next.lecture_mut(section_id, lecture_id)?;
    lecture.auto_detected_duration_seconds = Some(seconds);
    lecture.duration_seconds = seconds;
    Ok(next)
}

/// Attach the hosted video and finish the attempt.
///
/// The duration set at probe time is kept. A duration reported by the host
/// is adopted only when probing produced nothing for this attempt and the
/// user has not typed a value.
pub fn complete_upload(
    tree: &CourseContent,
    section_id: &NodeId,
    lecture_id: &NodeId,
    video: VideoRef,
    detected_seconds: Option<f64>,
) -> Result<CourseContent, Rejection> {
    let mut next = tree.clone();
    let lecture = next.lecture_mut(section_id, lecture_id)?;
    if !lecture.upload_state.is_uploading() {
        return Err(Rejection::NotUploading);
    }

    lecture.video = video;
    lecture.upload_state = UploadState::Complete;
    lecture.pre_upload = None;

    if lecture.auto_detected_duration_seconds.is_none() && !lecture.is_manually_edited_duration {
        if let Some(seconds) = detected_seconds.and_then(ceil_seconds) {
            lecture.auto_detected_duration_seconds = Some(seconds);
            lecture.duration_seconds = seconds;
        }
    }
    Ok(next)
}

/// Mark the attempt as failed. The previous video reference survives.
pub fn fail_upload(
    tree: &CourseContent,
    section_id: &NodeId,
    lecture_id: &NodeId,
    reason: impl Into<String>,
) -> Result<CourseContent, Rejection> {
    let mut next = tree.clone();
    let lecture = next.lecture_mut(section_id, lecture_id)?;
    if !lecture.upload_state.is_uploading() {
        return Err(Rejection::NotUploading);
    }
    lecture.restore_pre_upload_duration();
    lecture.upload_state = UploadState::Failed {
        reason: reason.into(),
    };
    Ok(next)
}

/// Abandon an in-flight attempt and return to `Idle`.
///
/// Cancelling a lecture that is not uploading is a no-op, so repeated or
/// late cancellations are harmless. Aborting the actual transfer is the
/// caller's job.
pub fn cancel_upload(
    tree: &CourseContent,
    section_id: &NodeId,
    lecture_id: &NodeId,
) -> Result<CourseContent, Rejection> {
    let current = tree
        .lecture(section_id, lecture_id)
        .ok_or_else(|| not_found(tree, section_id, lecture_id))?;
    if !current.upload_state.is_uploading() {
        return Ok(tree.clone());
    }

    let mut next = tree.clone();
    let lecture = next.lecture_mut(section_id, lecture_id)?;
    lecture.restore_pre_upload_duration();
    lecture.upload_state = UploadState::Idle;
    Ok(next)
}

/// Detach the lecture's video and forget the detected duration.
pub fn remove_video(
    tree: &CourseContent,
    section_id: &NodeId,
    lecture_id: &NodeId,
) -> Result<CourseContent, Rejection> {
    let mut next = tree.clone();
    let lecture = next.lecture_mut(section_id, lecture_id)?;
    if lecture.upload_state.is_uploading() {
        return Err(Rejection::UploadInProgress);
    }
    lecture.video = VideoRef::default();
    lecture.auto_detected_duration_seconds = None;
    lecture.is_manually_edited_duration = false;
    lecture.upload_state = UploadState::Idle;
    lecture.pre_upload = None;
    Ok(next)
}

fn not_found(tree: &CourseContent, section_id: &NodeId, lecture_id: &NodeId) -> Rejection {
    if tree.section(section_id).is_none() {
        Rejection::SectionNotFound(section_id.clone())
    } else {
        Rejection::LectureNotFound(lecture_id.clone())
    }
}
