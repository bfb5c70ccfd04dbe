//! Whole-tree properties of the content editor, exercised through the
//! public API only.
//!
//! Edit sequences are generated from a fixed-seed linear congruential
//! generator so every run walks the same trees.

use std::collections::HashSet;

use assert_matches::assert_matches;
use courseware_core::editor::{
    add_lecture, add_link, add_section, edit_field, remove_lecture, remove_link, remove_section,
    reorder_lectures, reorder_sections, Field, FieldValue, NodePath,
};
use courseware_core::upload::{begin_upload, cancel_upload, complete_upload, update_upload_progress};
use courseware_core::{CourseContent, NodeId, Rejection, UploadState, VideoRef};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }
}

/// Two sections, each with two lectures and distinct titles.
fn two_by_two() -> CourseContent {
    let tree = add_section(&CourseContent::new());
    let ids = tree.section_ids();
    let mut tree = tree;
    for (n, id) in ids.iter().enumerate() {
        tree = add_lecture(&tree, id).unwrap();
        for (m, lecture) in tree.section(id).unwrap().lecture_ids().iter().enumerate() {
            tree = edit_field(
                &tree,
                &NodePath::lecture(id, lecture),
                Field::Title,
                FieldValue::Text(format!("Lecture {n}.{m}")),
            )
            .unwrap();
        }
    }
    tree
}

fn all_ids(tree: &CourseContent) -> HashSet<NodeId> {
    tree.sections()
        .flat_map(|s| std::iter::once(s.id().clone()).chain(s.lecture_ids()))
        .collect()
}

/// Apply one random non-removing edit.
fn random_edit(tree: &CourseContent, rng: &mut Lcg) -> CourseContent {
    let sections = tree.section_ids();
    let section = &sections[rng.below(sections.len())];
    let lectures = tree.section(section).unwrap().lecture_ids();
    let lecture = &lectures[rng.below(lectures.len())];
    match rng.below(6) {
        0 => add_section(tree),
        1 => add_lecture(tree, section).unwrap(),
        2 => reorder_sections(tree, section, &sections[rng.below(sections.len())]),
        3 => reorder_lectures(tree, section, lecture, &lectures[rng.below(lectures.len())]).unwrap(),
        4 => edit_field(
            tree,
            &NodePath::lecture(section, lecture),
            Field::Description,
            FieldValue::Text(format!("edit {}", rng.next())),
        )
        .unwrap(),
        _ => add_link(tree, section, lecture).unwrap_or_else(|_| tree.clone()),
    }
}

// ---------------------------------------------------------------------------
// Structural minimums
// ---------------------------------------------------------------------------

/// Removing the only section is rejected and the input tree is untouched.
#[test]
fn single_section_cannot_be_removed() {
    let tree = CourseContent::new();
    let before = tree.clone();
    let id = tree.section_ids()[0].clone();
    assert_eq!(remove_section(&tree, &id), Err(Rejection::NeedAtLeastOneSection));
    assert_eq!(tree, before);
}

/// The only lecture of the only section cannot go; the only lecture of
/// another section takes its section with it.
#[test]
fn last_lecture_rules() {
    let tree = CourseContent::new();
    let s = tree.section_ids()[0].clone();
    let l = tree.section(&s).unwrap().lecture_ids()[0].clone();
    assert_eq!(
        remove_lecture(&tree, &s, &l),
        Err(Rejection::NeedAtLeastOneContentItem)
    );

    let tree = add_section(&tree);
    let second = tree.section_ids()[1].clone();
    let only = tree.section(&second).unwrap().lecture_ids()[0].clone();
    let tree = remove_lecture(&tree, &second, &only).unwrap();
    assert_eq!(tree.section_ids(), vec![s]);
}

// ---------------------------------------------------------------------------
// Reordering
// ---------------------------------------------------------------------------

/// Every valid reorder is a permutation that relocates exactly one element.
#[test]
fn reorder_is_a_single_relocation() {
    let mut tree = CourseContent::new();
    for _ in 0..4 {
        tree = add_section(&tree);
    }
    let ids = tree.section_ids();

    for moved in &ids {
        for target in &ids {
            let after = reorder_sections(&tree, moved, target).section_ids();
            assert_eq!(after.len(), ids.len());

            let without_moved_before: Vec<_> = ids.iter().filter(|id| *id != moved).collect();
            let without_moved_after: Vec<_> = after.iter().filter(|id| *id != moved).collect();
            assert_eq!(without_moved_before, without_moved_after);

            let target_index = ids.iter().position(|id| id == target).unwrap();
            assert_eq!(&after[target_index], moved);
        }
    }
}

/// Moving B onto A in a two-section tree yields [B, A] with contents intact.
#[test]
fn reorder_two_sections() {
    let tree = two_by_two();
    let ids = tree.section_ids();
    let (a, b) = (&ids[0], &ids[1]);

    let reordered = reorder_sections(&tree, b, a);
    assert_eq!(reordered.section_ids(), vec![b.clone(), a.clone()]);
    assert_eq!(reordered.section(a), tree.section(a));
    assert_eq!(reordered.section(b), tree.section(b));
    assert!(reordered.shares_section_with(&tree, a));
}

/// Lecture reorders stay inside their section.
#[test]
fn lecture_reorder_is_scoped() {
    let tree = two_by_two();
    let ids = tree.section_ids();
    let lectures = tree.section(&ids[0]).unwrap().lecture_ids();
    let other = tree.section(&ids[1]).unwrap().lecture_ids();

    let swapped = reorder_lectures(&tree, &ids[0], &lectures[1], &lectures[0]).unwrap();
    assert_eq!(
        swapped.section(&ids[0]).unwrap().lecture_ids(),
        vec![lectures[1].clone(), lectures[0].clone()]
    );

    let cross = reorder_lectures(&tree, &ids[0], &lectures[0], &other[0]).unwrap();
    assert_eq!(cross, tree);
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Non-removing edit sequences never change an existing node's id.
#[test]
fn ids_survive_random_edits() {
    let mut rng = Lcg(0x5eed);
    let mut tree = two_by_two();
    let original = all_ids(&tree);

    for _ in 0..200 {
        tree = random_edit(&tree, &mut rng);
        let now = all_ids(&tree);
        assert!(original.is_subset(&now));
    }
}

/// Removal drops exactly the removed ids.
#[test]
fn removal_drops_only_removed_ids() {
    let tree = two_by_two();
    let ids = tree.section_ids();
    let lecture = tree.section(&ids[1]).unwrap().lecture_ids()[0].clone();
    let before = all_ids(&tree);

    let after = all_ids(&remove_lecture(&tree, &ids[1], &lecture).unwrap());
    let removed: Vec<_> = before.difference(&after).collect();
    assert_eq!(removed, vec![&lecture]);
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// The second empty link is refused until the first is filled in.
#[test]
fn add_link_requires_finished_previous_link() {
    let tree = CourseContent::new();
    let s = tree.section_ids()[0].clone();
    let l = tree.section(&s).unwrap().lecture_ids()[0].clone();

    let tree = add_link(&tree, &s, &l).unwrap();
    let err = add_link(&tree, &s, &l).unwrap_err();
    assert_eq!(err, Rejection::FinishCurrentLinkFirst);
    assert_eq!(err.to_string(), "finish current link first");

    let path = NodePath::link(&s, &l, 0);
    let tree = edit_field(&tree, &path, Field::Title, FieldValue::Text("Slides".into())).unwrap();
    let tree = edit_field(&tree, &path, Field::Url, FieldValue::Text("https://x.io/s".into())).unwrap();
    let tree = add_link(&tree, &s, &l).unwrap();
    assert_eq!(tree.lecture(&s, &l).unwrap().links().len(), 2);

    let tree = remove_link(&tree, &s, &l, 0).unwrap();
    let tree = remove_link(&tree, &s, &l, 0).unwrap();
    assert!(tree.lecture(&s, &l).unwrap().links().is_empty());
    assert_matches!(
        remove_link(&tree, &s, &l, 0),
        Err(Rejection::LinkIndexOutOfRange { index: 0, len: 0 })
    );
}

// ---------------------------------------------------------------------------
// Upload and duration
// ---------------------------------------------------------------------------

/// Probe 12s, complete, then override to 20s.
#[test]
fn auto_detected_then_manual_duration() {
    let tree = CourseContent::new();
    let s = tree.section_ids()[0].clone();
    let l = tree.section(&s).unwrap().lecture_ids()[0].clone();

    let tree = begin_upload(&tree, &s, &l, Some(12.0)).unwrap();
    let tree = complete_upload(&tree, &s, &l, VideoRef::new("https://cdn/v.mp4", "v"), None)
        .unwrap();
    let lecture = tree.lecture(&s, &l).unwrap();
    assert_eq!(lecture.duration_seconds(), 12);
    assert_eq!(lecture.auto_detected_duration_seconds(), Some(12));
    assert!(!lecture.is_manually_edited_duration());

    let tree = edit_field(
        &tree,
        &NodePath::lecture(&s, &l),
        Field::Duration,
        FieldValue::Seconds(20),
    )
    .unwrap();
    let lecture = tree.lecture(&s, &l).unwrap();
    assert_eq!(lecture.duration_seconds(), 20);
    assert_eq!(lecture.auto_detected_duration_seconds(), Some(12));
    assert!(lecture.is_manually_edited_duration());
}

/// Cancelling mid-upload returns to Idle and keeps the previous video.
#[test]
fn cancel_mid_upload_restores_idle() {
    let tree = CourseContent::new();
    let s = tree.section_ids()[0].clone();
    let l = tree.section(&s).unwrap().lecture_ids()[0].clone();
    let video_before = tree.lecture(&s, &l).unwrap().video().clone();

    let tree = begin_upload(&tree, &s, &l, None).unwrap();
    let tree = update_upload_progress(&tree, &s, &l, 45).unwrap();
    assert_eq!(tree.lecture(&s, &l).unwrap().upload_state().progress_percent(), 45);

    let tree = cancel_upload(&tree, &s, &l).unwrap();
    let lecture = tree.lecture(&s, &l).unwrap();
    assert_eq!(lecture.upload_state(), &UploadState::Idle);
    assert_eq!(lecture.upload_state().progress_percent(), 0);
    assert_eq!(lecture.video(), &video_before);
}
