//! Content validation run before the wizard advances or the course is
//! submitted.
//!
//! Validation fails closed: the tree is walked in display order and the
//! first violation is reported with its 1-based position.

use std::fmt;

use crate::content::{has_http_scheme, CourseContent, Lecture, ResourceLink, Section};

// ---------------------------------------------------------------------------
// Failure reporting
// ---------------------------------------------------------------------------

/// 1-based position of a node in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub section: usize,
    pub lecture: Option<usize>,
    pub link: Option<usize>,
}

impl Location {
    fn section(index: usize) -> Self {
        Self {
            section: index + 1,
            lecture: None,
            link: None,
        }
    }

    fn lecture(section: usize, lecture: usize) -> Self {
        Self {
            lecture: Some(lecture + 1),
            ..Self::section(section)
        }
    }

    fn link(section: usize, lecture: usize, link: usize) -> Self {
        Self {
            link: Some(link + 1),
            ..Self::lecture(section, lecture)
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Section {}", self.section)?;
        if let Some(lecture) = self.lecture {
            write!(f, ", Lecture {lecture}")?;
        }
        if let Some(link) = self.link {
            write!(f, ", Resource {link}")?;
        }
        Ok(())
    }
}

/// Field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidField {
    SectionTitle,
    LectureTitle,
    LectureDescription,
    LectureVideo,
    LectureDuration,
    LinkTitle,
    LinkUrl,
}

impl InvalidField {
    fn message(self) -> &'static str {
        match self {
            Self::SectionTitle => "Section title is required",
            Self::LectureTitle => "Lecture title is required",
            Self::LectureDescription => "Lecture description is required",
            Self::LectureVideo => "Video is required",
            Self::LectureDuration => "Video length is required",
            Self::LinkTitle => "Resource link title is required",
            Self::LinkUrl => {
                "Resource link URL must be a valid URL (starting with http:// or https://)"
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{location}: {}", .field.message())]
pub struct ValidationFailure {
    pub location: Location,
    pub field: InvalidField,
}

/// Why a submission could not go ahead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitBlocked {
    #[error("Please wait for all uploads to finish")]
    UploadsInProgress,

    #[error(transparent)]
    Invalid(#[from] ValidationFailure),
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

fn check_link(link: &ResourceLink) -> Option<InvalidField> {
    if link.title.trim().is_empty() {
        Some(InvalidField::LinkTitle)
    } else if !has_http_scheme(&link.url) {
        Some(InvalidField::LinkUrl)
    } else {
        None
    }
}

fn check_lecture_fields(lecture: &Lecture) -> Option<InvalidField> {
    if lecture.title().trim().is_empty() {
        Some(InvalidField::LectureTitle)
    } else if lecture.description().trim().is_empty() {
        Some(InvalidField::LectureDescription)
    } else if !lecture.video().is_complete() {
        Some(InvalidField::LectureVideo)
    } else if lecture.duration_seconds() == 0 {
        Some(InvalidField::LectureDuration)
    } else {
        None
    }
}

/// `true` when the lecture's required fields and links are all valid.
pub fn is_lecture_complete(lecture: &Lecture) -> bool {
    check_lecture_fields(lecture).is_none() && lecture.links().iter().all(|l| check_link(l).is_none())
}

/// `true` when the title is set and every lecture is complete.
pub fn is_section_complete(section: &Section) -> bool {
    !section.title().trim().is_empty() && section.lectures().all(is_lecture_complete)
}

/// Validate the whole tree, stopping at the first violation.
pub fn validate_content(tree: &CourseContent) -> Result<(), ValidationFailure> {
    for (si, section) in tree.sections().enumerate() {
        if section.title().trim().is_empty() {
            return Err(ValidationFailure {
                location: Location::section(si),
                field: InvalidField::SectionTitle,
            });
        }
        for (li, lecture) in section.lectures().enumerate() {
            if let Some(field) = check_lecture_fields(lecture) {
                return Err(ValidationFailure {
                    location: Location::lecture(si, li),
                    field,
                });
            }
            for (ki, link) in lecture.links().iter().enumerate() {
                if let Some(field) = check_link(link) {
                    return Err(ValidationFailure {
                        location: Location::link(si, li, ki),
                        field,
                    });
                }
            }
        }
    }
    Ok(())
}

/// Gate for advancing past the content step: no uploads in flight and a
/// valid tree.
pub fn validate_for_submit(tree: &CourseContent) -> Result<(), SubmitBlocked> {
    if tree.has_active_uploads() {
        return Err(SubmitBlocked::UploadsInProgress);
    }
    validate_content(tree)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Progress summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionStats {
    pub completed_sections: usize,
    pub total_sections: usize,
}

impl CompletionStats {
    pub fn is_complete(&self) -> bool {
        self.completed_sections == self.total_sections
    }
}

/// Completed vs. total sections, for the progress header.
pub fn completion_stats(tree: &CourseContent) -> CompletionStats {
    CompletionStats {
        completed_sections: tree.sections().filter(|s| is_section_complete(s)).count(),
        total_sections: tree.section_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::VideoRef;
    use crate::editor::{add_link, add_section, edit_field, Field, FieldValue, NodePath};
    use crate::types::NodeId;
    use crate::upload::{begin_upload, complete_upload};

    fn ids(tree: &CourseContent, section: usize) -> (NodeId, NodeId) {
        let s = tree.section_at(section).unwrap();
        (s.id().clone(), s.lecture_at(0).unwrap().id().clone())
    }

    fn text(tree: &CourseContent, path: NodePath, field: Field, value: &str) -> CourseContent {
        edit_field(tree, &path, field, FieldValue::Text(value.into())).unwrap()
    }

    fn fill_lecture(tree: &CourseContent, s: &NodeId, l: &NodeId) -> CourseContent {
        let path = NodePath::lecture(s, l);
        let tree = text(tree, path.clone(), Field::Title, "Intro");
        let tree = text(&tree, path, Field::Description, "Overview of the course");
        let tree = begin_upload(&tree, s, l, Some(42.0)).unwrap();
        complete_upload(
            &tree,
            s,
            l,
            VideoRef::new("https://cdn.example.com/intro.mp4", "intro"),
            None,
        )
        .unwrap()
    }

    #[test]
    fn complete_tree_passes() {
        let tree = CourseContent::new();
        let (s, l) = ids(&tree, 0);
        let tree = fill_lecture(&tree, &s, &l);
        assert_eq!(validate_content(&tree), Ok(()));
        assert_eq!(validate_for_submit(&tree), Ok(()));
    }

    #[test]
    fn empty_section_title_is_first_violation() {
        let tree = CourseContent::new();
        let (s, _) = ids(&tree, 0);
        let tree = text(&tree, NodePath::section(&s), Field::Title, "  ");
        let failure = validate_content(&tree).unwrap_err();
        assert_eq!(failure.field, InvalidField::SectionTitle);
        assert_eq!(failure.to_string(), "Section 1: Section title is required");
    }

    #[test]
    fn lecture_checks_run_in_order() {
        let tree = CourseContent::new();
        let (s, l) = ids(&tree, 0);
        let failure = validate_content(&tree).unwrap_err();
        assert_eq!(failure.field, InvalidField::LectureTitle);
        assert_eq!(failure.location.to_string(), "Section 1, Lecture 1");

        let tree = text(&tree, NodePath::lecture(&s, &l), Field::Title, "Intro");
        assert_eq!(
            validate_content(&tree).unwrap_err().field,
            InvalidField::LectureDescription
        );

        let tree = text(&tree, NodePath::lecture(&s, &l), Field::Description, "About");
        assert_eq!(
            validate_content(&tree).unwrap_err().field,
            InvalidField::LectureVideo
        );
    }

    #[test]
    fn zero_duration_is_rejected() {
        let tree = CourseContent::new();
        let (s, l) = ids(&tree, 0);
        let path = NodePath::lecture(&s, &l);
        let tree = text(&tree, path.clone(), Field::Title, "Intro");
        let tree = text(&tree, path, Field::Description, "About");
        let tree = begin_upload(&tree, &s, &l, None).unwrap();
        let tree = complete_upload(&tree, &s, &l, VideoRef::new("https://cdn/x.mp4", "x"), None)
            .unwrap();
        assert_eq!(
            validate_content(&tree).unwrap_err().field,
            InvalidField::LectureDuration
        );
    }

    #[test]
    fn incomplete_link_is_reported_with_position() {
        let tree = CourseContent::new();
        let (s, l) = ids(&tree, 0);
        let tree = fill_lecture(&tree, &s, &l);
        let tree = add_link(&tree, &s, &l).unwrap();
        let tree = text(&tree, NodePath::link(&s, &l, 0), Field::Title, "Slides");
        let failure = validate_content(&tree).unwrap_err();
        assert_eq!(failure.field, InvalidField::LinkUrl);
        assert_eq!(failure.location.to_string(), "Section 1, Lecture 1, Resource 1");
    }

    #[test]
    fn second_section_failure_reports_its_index() {
        let tree = CourseContent::new();
        let (s, l) = ids(&tree, 0);
        let tree = fill_lecture(&tree, &s, &l);
        let tree = add_section(&tree);
        let failure = validate_content(&tree).unwrap_err();
        assert_eq!(failure.location.section, 2);
        assert_eq!(failure.location.lecture, Some(1));
    }

    #[test]
    fn submit_blocked_while_uploading() {
        let tree = CourseContent::new();
        let (s, l) = ids(&tree, 0);
        let tree = begin_upload(&tree, &s, &l, None).unwrap();
        assert_eq!(
            validate_for_submit(&tree),
            Err(SubmitBlocked::UploadsInProgress)
        );
    }

    #[test]
    fn completion_stats_count_complete_sections() {
        let tree = CourseContent::new();
        let (s, l) = ids(&tree, 0);
        let tree = fill_lecture(&tree, &s, &l);
        let tree = add_section(&tree);
        let stats = completion_stats(&tree);
        assert_eq!(stats.completed_sections, 1);
        assert_eq!(stats.total_sections, 2);
        assert!(!stats.is_complete());
    }
}
