//! Structural editing of the course content tree.
//!
//! Every operation takes the current tree by reference and returns a new
//! one; the input is never modified. Untouched sections and lectures are
//! shared between the two trees. Structural rejections are returned as a
//! [`Rejection`] and leave the caller's tree as it was.

use std::sync::Arc;

use crate::content::{CourseContent, Lecture, ResourceLink, Section, DEFAULT_SECTION_TITLE_PREFIX};
use crate::ordering::move_by_key;
use crate::types::NodeId;

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// Named conditions under which an edit is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("need at least one section")]
    NeedAtLeastOneSection,

    #[error("need at least one content item")]
    NeedAtLeastOneContentItem,

    #[error("finish current link first")]
    FinishCurrentLinkFirst,

    #[error("section {0} not found")]
    SectionNotFound(NodeId),

    #[error("lecture {0} not found")]
    LectureNotFound(NodeId),

    #[error("link {index} out of range ({len} links)")]
    LinkIndexOutOfRange { index: usize, len: usize },

    #[error("field '{field}' does not apply to a {target}")]
    FieldNotApplicable { field: Field, target: &'static str },

    #[error("invalid value for field '{0}'")]
    InvalidFieldValue(Field),

    #[error("no upload in progress")]
    NotUploading,

    #[error("video upload in progress")]
    UploadInProgress,
}

// ---------------------------------------------------------------------------
// Field addressing
// ---------------------------------------------------------------------------

/// Location of the node a field edit applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodePath {
    Section {
        section: NodeId,
    },
    Lecture {
        section: NodeId,
        lecture: NodeId,
    },
    Link {
        section: NodeId,
        lecture: NodeId,
        index: usize,
    },
}

impl NodePath {
    pub fn section(section: &NodeId) -> Self {
        Self::Section {
            section: section.clone(),
        }
    }

    pub fn lecture(section: &NodeId, lecture: &NodeId) -> Self {
        Self::Lecture {
            section: section.clone(),
            lecture: lecture.clone(),
        }
    }

    pub fn link(section: &NodeId, lecture: &NodeId, index: usize) -> Self {
        Self::Link {
            section: section.clone(),
            lecture: lecture.clone(),
            index,
        }
    }
}

/// Scalar fields editable in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Description,
    /// Video url on a lecture, resource url on a link.
    Url,
    Duration,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Url => "url",
            Self::Duration => "duration",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Seconds(u32),
}

impl FieldValue {
    fn into_text(self, field: Field) -> Result<String, Rejection> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Seconds(_) => Err(Rejection::InvalidFieldValue(field)),
        }
    }

    fn into_seconds(self, field: Field) -> Result<u32, Rejection> {
        match self {
            Self::Seconds(seconds) => Ok(seconds),
            Self::Text(_) => Err(Rejection::InvalidFieldValue(field)),
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Append a section titled `"Untitled Section N"` with one blank lecture.
pub fn add_section(tree: &CourseContent) -> CourseContent {
    let mut next = tree.clone();
    let title = format!("{DEFAULT_SECTION_TITLE_PREFIX} {}", tree.section_count() + 1);
    next.sections.push(Arc::new(Section::with_title(title)));
    next
}

/// Remove a section and its lectures. The last remaining section stays.
pub fn remove_section(
    tree: &CourseContent,
    section_id: &NodeId,
) -> Result<CourseContent, Rejection> {
    if tree.section_count() <= 1 {
        return Err(Rejection::NeedAtLeastOneSection);
    }
    let position = tree
        .section_position(section_id)
        .ok_or_else(|| Rejection::SectionNotFound(section_id.clone()))?;
    let mut next = tree.clone();
    next.sections.remove(position);
    Ok(next)
}

/// Move `moved_id` to where `target_id` currently sits.
///
/// Unknown ids and `moved_id == target_id` return an unchanged copy.
pub fn reorder_sections(tree: &CourseContent, moved_id: &NodeId, target_id: &NodeId) -> CourseContent {
    let mut next = tree.clone();
    move_by_key(&mut next.sections, moved_id, target_id, |s| &s.id);
    next
}

// ---------------------------------------------------------------------------
// Lectures
// ---------------------------------------------------------------------------

/// Append a blank lecture carrying one empty link.
pub fn add_lecture(tree: &CourseContent, section_id: &NodeId) -> Result<CourseContent, Rejection> {
    let mut next = tree.clone();
    let mut lecture = Lecture::blank();
    lecture.links.push(ResourceLink::default());
    next.section_mut(section_id)?
        .lectures
        .push(Arc::new(lecture));
    Ok(next)
}

/// Remove a lecture, cascading to its section when it was the only one.
pub fn remove_lecture(
    tree: &CourseContent,
    section_id: &NodeId,
    lecture_id: &NodeId,
) -> Result<CourseContent, Rejection> {
    let section = tree
        .section(section_id)
        .ok_or_else(|| Rejection::SectionNotFound(section_id.clone()))?;
    let position = section
        .lecture_position(lecture_id)
        .ok_or_else(|| Rejection::LectureNotFound(lecture_id.clone()))?;

    if section.lecture_count() == 1 {
        if tree.section_count() == 1 {
            return Err(Rejection::NeedAtLeastOneContentItem);
        }
        return remove_section(tree, section_id);
    }

    let mut next = tree.clone();
    next.section_mut(section_id)?.lectures.remove(position);
    Ok(next)
}

/// Reorder lectures inside one section with array-move semantics.
pub fn reorder_lectures(
    tree: &CourseContent,
    section_id: &NodeId,
    moved_id: &NodeId,
    target_id: &NodeId,
) -> Result<CourseContent, Rejection> {
    let section = tree
        .section(section_id)
        .ok_or_else(|| Rejection::SectionNotFound(section_id.clone()))?;
    if moved_id == target_id
        || section.lecture_position(moved_id).is_none()
        || section.lecture_position(target_id).is_none()
    {
        return Ok(tree.clone());
    }
    let mut next = tree.clone();
    move_by_key(
        &mut next.section_mut(section_id)?.lectures,
        moved_id,
        target_id,
        |l| &l.id,
    );
    Ok(next)
}

// ---------------------------------------------------------------------------
// Field edits
// ---------------------------------------------------------------------------

/// Set one scalar field on the addressed node.
///
/// Duration edits follow the manual-override rule of
/// [`Lecture::is_manually_edited_duration`]; no other field has side effects.
pub fn edit_field(
    tree: &CourseContent,
    path: &NodePath,
    field: Field,
    value: FieldValue,
) -> Result<CourseContent, Rejection> {
    let mut next = tree.clone();
    match path {
        NodePath::Section { section } => match field {
            Field::Title => next.section_mut(section)?.title = value.into_text(field)?,
            _ => {
                return Err(Rejection::FieldNotApplicable {
                    field,
                    target: "section",
                })
            }
        },
        NodePath::Lecture { section, lecture } => {
            let lecture = next.lecture_mut(section, lecture)?;
            match field {
                Field::Title => lecture.title = value.into_text(field)?,
                Field::Description => lecture.description = value.into_text(field)?,
                Field::Url => lecture.video.url = value.into_text(field)?,
                Field::Duration => lecture.set_manual_duration(value.into_seconds(field)?),
            }
        }
        NodePath::Link {
            section,
            lecture,
            index,
        } => {
            let lecture = next.lecture_mut(section, lecture)?;
            let len = lecture.links.len();
            let link = lecture
                .links
                .get_mut(*index)
                .ok_or(Rejection::LinkIndexOutOfRange { index: *index, len })?;
            match field {
                Field::Title => link.title = value.into_text(field)?,
                Field::Url => link.url = value.into_text(field)?,
                _ => {
                    return Err(Rejection::FieldNotApplicable {
                        field,
                        target: "link",
                    })
                }
            }
        }
    }
    Ok(next)
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// Append an empty link, refusing while the last link is incomplete.
pub fn add_link(
    tree: &CourseContent,
    section_id: &NodeId,
    lecture_id: &NodeId,
) -> Result<CourseContent, Rejection> {
    let lecture = tree
        .section(section_id)
        .ok_or_else(|| Rejection::SectionNotFound(section_id.clone()))?
        .lecture(lecture_id)
        .ok_or_else(|| Rejection::LectureNotFound(lecture_id.clone()))?;
    if lecture.links.last().is_some_and(|link| !link.is_filled()) {
        return Err(Rejection::FinishCurrentLinkFirst);
    }
    let mut next = tree.clone();
    next.lecture_mut(section_id, lecture_id)?
        .links
        .push(ResourceLink::default());
    Ok(next)
}

/// Remove the link at `index`. A lecture may end up with no links.
pub fn remove_link(
    tree: &CourseContent,
    section_id: &NodeId,
    lecture_id: &NodeId,
    index: usize,
) -> Result<CourseContent, Rejection> {
    let mut next = tree.clone();
    let lecture = next.lecture_mut(section_id, lecture_id)?;
    let len = lecture.links.len();
    if index >= len {
        return Err(Rejection::LinkIndexOutOfRange { index, len });
    }
    lecture.links.remove(index);
    Ok(next)
}
