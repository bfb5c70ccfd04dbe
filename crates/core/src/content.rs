//! Course content tree: sections own lectures, lectures own resource links.
//!
//! Nodes are held behind [`Arc`] so that every editor operation can return a
//! new tree while sharing the subtrees it did not touch. Mutation goes through
//! the functions in [`crate::editor`] and [`crate::upload`]; the tree itself
//! only exposes read accessors publicly.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::editor::Rejection;
use crate::types::NodeId;

/// Title prefix for sections created by [`crate::editor::add_section`].
pub const DEFAULT_SECTION_TITLE_PREFIX: &str = "Untitled Section";

/// Maximum upload progress value.
pub const MAX_PROGRESS_PERCENT: u8 = 100;

// ---------------------------------------------------------------------------
// Leaf value types
// ---------------------------------------------------------------------------

/// Reference to a hosted video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRef {
    pub url: String,
    /// Id assigned by the video host (Cloudinary `public_id`).
    pub external_id: Option<String>,
}

impl VideoRef {
    pub fn new(url: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            external_id: Some(external_id.into()),
        }
    }

    /// `true` when no video has been attached.
    pub fn is_empty(&self) -> bool {
        self.url.trim().is_empty()
    }

    /// `true` when both the url and the host id are present.
    pub fn is_complete(&self) -> bool {
        !self.is_empty()
            && self
                .external_id
                .as_deref()
                .is_some_and(|id| !id.trim().is_empty())
    }
}

/// Per-lecture upload progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UploadState {
    #[default]
    Idle,
    Uploading {
        progress_percent: u8,
    },
    Complete,
    Failed {
        reason: String,
    },
}

impl UploadState {
    /// `true` while a transfer is in flight.
    pub fn is_uploading(&self) -> bool {
        matches!(self, Self::Uploading { .. })
    }

    /// Current progress; zero outside of `Uploading`.
    pub fn progress_percent(&self) -> u8 {
        match self {
            Self::Uploading { progress_percent } => *progress_percent,
            _ => 0,
        }
    }
}

/// A supplementary resource attached to a lecture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLink {
    pub title: String,
    pub url: String,
}

impl ResourceLink {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }

    /// `true` when the title is set and the url looks like an http(s) url.
    pub fn is_filled(&self) -> bool {
        !self.title.trim().is_empty() && has_http_scheme(&self.url)
    }
}

/// Basic url check: `http://` or `https://` followed by at least one character.
pub fn has_http_scheme(url: &str) -> bool {
    let url = url.trim();
    ["http://", "https://"]
        .iter()
        .any(|scheme| url.strip_prefix(scheme).is_some_and(|rest| !rest.is_empty()))
}

// ---------------------------------------------------------------------------
// Lecture
// ---------------------------------------------------------------------------

/// Duration fields captured when an upload attempt starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DurationSnapshot {
    pub(crate) duration_seconds: u32,
    pub(crate) auto_detected_duration_seconds: Option<u32>,
    pub(crate) is_manually_edited_duration: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lecture {
    pub(crate) id: NodeId,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) video: VideoRef,
    pub(crate) duration_seconds: u32,
    pub(crate) auto_detected_duration_seconds: Option<u32>,
    pub(crate) is_manually_edited_duration: bool,
    pub(crate) upload_state: UploadState,
    pub(crate) links: Vec<ResourceLink>,
    pub(crate) pre_upload: Option<DurationSnapshot>,
}

impl Lecture {
    /// Blank lecture with a fresh temporary id and no links.
    pub(crate) fn blank() -> Self {
        Self::blank_with_id(NodeId::temporary())
    }

    pub(crate) fn blank_with_id(id: NodeId) -> Self {
        Self {
            id,
            title: String::new(),
            description: String::new(),
            video: VideoRef::default(),
            duration_seconds: 0,
            auto_detected_duration_seconds: None,
            is_manually_edited_duration: false,
            upload_state: UploadState::Idle,
            links: Vec::new(),
            pre_upload: None,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn video(&self) -> &VideoRef {
        &self.video
    }

    /// Effective duration shown and saved for the lecture.
    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    /// Last duration read from the video file, if any.
    pub fn auto_detected_duration_seconds(&self) -> Option<u32> {
        self.auto_detected_duration_seconds
    }

    /// `true` once the user typed a duration that differs from the detected
    /// one. Later detections then leave `duration_seconds` alone.
    pub fn is_manually_edited_duration(&self) -> bool {
        self.is_manually_edited_duration
    }

    pub fn upload_state(&self) -> &UploadState {
        &self.upload_state
    }

    pub fn links(&self) -> &[ResourceLink] {
        &self.links
    }

    /// Apply a user-entered duration.
    ///
    /// A value that differs from the auto-detected one (or any value when
    /// nothing was detected) marks the duration as manually edited. The flag
    /// is never cleared here.
    pub(crate) fn set_manual_duration(&mut self, seconds: u32) {
        self.duration_seconds = seconds;
        if self.auto_detected_duration_seconds != Some(seconds) {
            self.is_manually_edited_duration = true;
        }
    }

    pub(crate) fn snapshot_duration(&self) -> DurationSnapshot {
        DurationSnapshot {
            duration_seconds: self.duration_seconds,
            auto_detected_duration_seconds: self.auto_detected_duration_seconds,
            is_manually_edited_duration: self.is_manually_edited_duration,
        }
    }

    /// Put back the duration fields from before the current attempt, unless
    /// the user typed a value while it was running.
    pub(crate) fn restore_pre_upload_duration(&mut self) {
        if let Some(snapshot) = self.pre_upload.take() {
            if !self.is_manually_edited_duration {
                self.duration_seconds = snapshot.duration_seconds;
                self.auto_detected_duration_seconds = snapshot.auto_detected_duration_seconds;
                self.is_manually_edited_duration = snapshot.is_manually_edited_duration;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub(crate) id: NodeId,
    pub(crate) title: String,
    pub(crate) lectures: Vec<Arc<Lecture>>,
}

impl Section {
    /// New section holding one blank lecture.
    pub(crate) fn with_title(title: impl Into<String>) -> Self {
        Self {
            id: NodeId::temporary(),
            title: title.into(),
            lectures: vec![Arc::new(Lecture::blank())],
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn lectures(&self) -> impl ExactSizeIterator<Item = &Lecture> + '_ {
        self.lectures.iter().map(|l| l.as_ref())
    }

    pub fn lecture_count(&self) -> usize {
        self.lectures.len()
    }

    /// Lecture of this section by id.
    pub fn lecture(&self, id: &NodeId) -> Option<&Lecture> {
        self.lectures.iter().map(|l| l.as_ref()).find(|l| &l.id == id)
    }

    pub fn lecture_at(&self, index: usize) -> Option<&Lecture> {
        self.lectures.get(index).map(|l| l.as_ref())
    }

    /// Lecture ids in display order.
    pub fn lecture_ids(&self) -> Vec<NodeId> {
        self.lectures.iter().map(|l| l.id.clone()).collect()
    }

    pub(crate) fn lecture_position(&self, id: &NodeId) -> Option<usize> {
        self.lectures.iter().position(|l| &l.id == id)
    }

    pub(crate) fn lecture_mut(&mut self, id: &NodeId) -> Result<&mut Lecture, Rejection> {
        let position = self
            .lecture_position(id)
            .ok_or_else(|| Rejection::LectureNotFound(id.clone()))?;
        Ok(Arc::make_mut(&mut self.lectures[position]))
    }
}

// ---------------------------------------------------------------------------
// CourseContent
// ---------------------------------------------------------------------------

/// The whole editable tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseContent {
    pub(crate) sections: Vec<Arc<Section>>,
}

impl CourseContent {
    /// Tree for a new course: one default section with one blank lecture.
    pub fn new() -> Self {
        Self {
            sections: vec![Arc::new(Section::with_title(format!(
                "{DEFAULT_SECTION_TITLE_PREFIX} 1"
            )))],
        }
    }

    pub(crate) fn from_sections(sections: Vec<Section>) -> Self {
        Self {
            sections: sections.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn sections(&self) -> impl ExactSizeIterator<Item = &Section> + '_ {
        self.sections.iter().map(|s| s.as_ref())
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn section(&self, id: &NodeId) -> Option<&Section> {
        self.sections.iter().map(|s| s.as_ref()).find(|s| &s.id == id)
    }

    /// Section at a 0-based display position.
    pub fn section_at(&self, index: usize) -> Option<&Section> {
        self.sections.get(index).map(|s| s.as_ref())
    }

    pub fn section_ids(&self) -> Vec<NodeId> {
        self.sections.iter().map(|s| s.id.clone()).collect()
    }

    /// Lecture addressed by its section; `None` if either id is unknown or
    /// the lecture lives in another section.
    pub fn lecture(&self, section_id: &NodeId, lecture_id: &NodeId) -> Option<&Lecture> {
        self.section(section_id)?.lecture(lecture_id)
    }

    /// Every lecture in display order, paired with its owning section.
    pub fn lectures(&self) -> impl Iterator<Item = (&Section, &Lecture)> + '_ {
        self.sections()
            .flat_map(|section| section.lectures().map(move |lecture| (section, lecture)))
    }

    /// `true` while any lecture has an upload in flight.
    pub fn has_active_uploads(&self) -> bool {
        self.lectures()
            .any(|(_, lecture)| lecture.upload_state.is_uploading())
    }

    /// Whether `self` and `other` hold the very same allocation for the
    /// given section, i.e. the subtree was shared rather than copied.
    pub fn shares_section_with(&self, other: &CourseContent, id: &NodeId) -> bool {
        let find = |tree: &CourseContent| tree.sections.iter().find(|s| &s.id == id).cloned();
        match (find(self), find(other)) {
            (Some(a), Some(b)) => Arc::ptr_eq(&a, &b),
            _ => false,
        }
    }

    pub(crate) fn section_position(&self, id: &NodeId) -> Option<usize> {
        self.sections.iter().position(|s| &s.id == id)
    }

    pub(crate) fn section_mut(&mut self, id: &NodeId) -> Result<&mut Section, Rejection> {
        let position = self
            .section_position(id)
            .ok_or_else(|| Rejection::SectionNotFound(id.clone()))?;
        Ok(Arc::make_mut(&mut self.sections[position]))
    }

    pub(crate) fn lecture_mut(
        &mut self,
        section_id: &NodeId,
        lecture_id: &NodeId,
    ) -> Result<&mut Lecture, Rejection> {
        self.section_mut(section_id)?.lecture_mut(lecture_id)
    }
}

impl Default for CourseContent {
    fn default() -> Self {
        Self::new()
    }
}
