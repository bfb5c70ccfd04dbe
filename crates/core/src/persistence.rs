//! Backend course document shape, hydration into a [`CourseContent`] tree,
//! the save payload, and temporary-to-persisted id mapping.
//!
//! Persisted nodes travel with `_id`, unsaved ones with `id` (rendered as
//! `temp-<uuid>`). UI-only lecture state (upload progress, auto-detected
//! duration, manual-edit flag) never leaves the client.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::content::{CourseContent, Lecture, ResourceLink, Section, UploadState, VideoRef};
use crate::course_info::{CourseInformation, MediaRef};
use crate::course_options::CourseOptions;
use crate::error::CoreError;
use crate::types::{NodeId, TEMP_ID_PREFIX};

// ---------------------------------------------------------------------------
// Wire documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub persisted_id: Option<String>,
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default)]
    pub video_title: String,
    #[serde(default)]
    pub video_description: String,
    #[serde(default)]
    pub video: MediaRef,
    /// Seconds.
    #[serde(default)]
    pub video_length: u32,
    #[serde(default)]
    pub video_links: Vec<LinkDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub persisted_id: Option<String>,
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default)]
    pub section_title: String,
    #[serde(default)]
    pub section_contents: Vec<LectureDocument>,
}

/// Full course as returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub information: CourseInformation,
    #[serde(flatten)]
    pub options: CourseOptions,
    #[serde(default)]
    pub course_data: Vec<SectionDocument>,
}

/// Body of a content save request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPayload {
    pub course_data: Vec<SectionDocument>,
}

// ---------------------------------------------------------------------------
// Hydration
// ---------------------------------------------------------------------------

fn node_id(persisted: Option<&str>, client: Option<&str>) -> NodeId {
    fn non_empty(v: Option<&str>) -> Option<&str> {
        v.map(str::trim).filter(|v| !v.is_empty())
    }
    if let Some(value) = non_empty(persisted) {
        return NodeId::persisted(value);
    }
    match non_empty(client) {
        Some(value) => {
            NodeId::temporary_with(value.strip_prefix(TEMP_ID_PREFIX).unwrap_or(value))
        }
        None => NodeId::temporary(),
    }
}

fn hydrate_lecture(doc: &LectureDocument) -> Lecture {
    let id = node_id(doc.persisted_id.as_deref(), doc.client_id.as_deref());
    let video = if doc.video.url.trim().is_empty() {
        VideoRef::default()
    } else {
        VideoRef {
            url: doc.video.url.clone(),
            external_id: Some(doc.video.public_id.clone()).filter(|id| !id.is_empty()),
        }
    };
    let upload_state = if video.is_empty() {
        UploadState::Idle
    } else {
        UploadState::Complete
    };
    Lecture {
        title: doc.video_title.clone(),
        description: doc.video_description.clone(),
        video,
        duration_seconds: doc.video_length,
        upload_state,
        links: doc
            .video_links
            .iter()
            .map(|l| ResourceLink::new(l.title.clone(), l.url.clone()))
            .collect(),
        ..Lecture::blank_with_id(id)
    }
}

/// Build an editable tree from the backend's `courseData`.
///
/// An empty document yields the new-course tree; a section without lectures
/// gets one blank lecture. Repeated ids are a [`CoreError::Conflict`].
pub fn hydrate(sections: &[SectionDocument]) -> Result<CourseContent, CoreError> {
    if sections.is_empty() {
        return Ok(CourseContent::new());
    }

    let mut seen = HashSet::new();
    let mut check_unique = |id: &NodeId| {
        if seen.insert(id.clone()) {
            Ok(())
        } else {
            Err(CoreError::Conflict(format!("Duplicate node id '{id}' in course document")))
        }
    };

    let mut hydrated = Vec::with_capacity(sections.len());
    for doc in sections {
        let id = node_id(doc.persisted_id.as_deref(), doc.client_id.as_deref());
        check_unique(&id)?;

        let mut lectures = Vec::with_capacity(doc.section_contents.len().max(1));
        for lecture_doc in &doc.section_contents {
            let lecture = hydrate_lecture(lecture_doc);
            check_unique(&lecture.id)?;
            lectures.push(Arc::new(lecture));
        }
        if lectures.is_empty() {
            lectures.push(Arc::new(Lecture::blank()));
        }

        hydrated.push(Section {
            id,
            title: doc.section_title.clone(),
            lectures,
        });
    }
    Ok(CourseContent::from_sections(hydrated))
}

// ---------------------------------------------------------------------------
// Save payload
// ---------------------------------------------------------------------------

fn split_id(id: &NodeId) -> (Option<String>, Option<String>) {
    if id.is_temporary() {
        (None, Some(id.key()))
    } else {
        (Some(id.value().to_string()), None)
    }
}

/// Serialize the tree for saving, dropping UI-only lecture state.
pub fn to_payload(tree: &CourseContent) -> ContentPayload {
    let course_data = tree
        .sections()
        .map(|section| {
            let (persisted_id, client_id) = split_id(section.id());
            SectionDocument {
                persisted_id,
                client_id,
                section_title: section.title().to_string(),
                section_contents: section
                    .lectures()
                    .map(|lecture| {
                        let (persisted_id, client_id) = split_id(lecture.id());
                        LectureDocument {
                            persisted_id,
                            client_id,
                            video_title: lecture.title().to_string(),
                            video_description: lecture.description().to_string(),
                            video: MediaRef {
                                public_id: lecture.video().external_id.clone().unwrap_or_default(),
                                url: lecture.video().url.clone(),
                            },
                            video_length: lecture.duration_seconds(),
                            video_links: lecture
                                .links()
                                .iter()
                                .map(|l| LinkDocument {
                                    title: l.title.clone(),
                                    url: l.url.clone(),
                                })
                                .collect(),
                        }
                    })
                    .collect(),
            }
        })
        .collect();
    ContentPayload { course_data }
}

// ---------------------------------------------------------------------------
// Id mapping
// ---------------------------------------------------------------------------

/// Temporary id key (`temp-<uuid>`) to the id the server assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdMapping {
    #[serde(rename = "idMap", default)]
    entries: HashMap<String, String>,
}

impl IdMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, temporary_key: impl Into<String>, persisted: impl Into<String>) {
        self.entries.insert(temporary_key.into(), persisted.into());
    }

    /// Persisted replacement for `id`, if `id` is temporary and mapped.
    pub fn resolve(&self, id: &NodeId) -> Option<NodeId> {
        if !id.is_temporary() {
            return None;
        }
        self.entries.get(&id.key()).map(NodeId::persisted)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pair the sent payload with the saved document position by position
    /// and record every node that went out temporary and came back with
    /// an `_id`.
    pub fn derive(sent: &[SectionDocument], saved: &[SectionDocument]) -> Self {
        let mut mapping = Self::new();
        let mut record = |client: &Option<String>, persisted: &Option<String>| {
            if let (Some(client), Some(persisted)) = (client, persisted) {
                mapping.insert(client.clone(), persisted.clone());
            }
        };
        for (out, back) in sent.iter().zip(saved) {
            record(&out.client_id, &back.persisted_id);
            for (out, back) in out.section_contents.iter().zip(&back.section_contents) {
                record(&out.client_id, &back.persisted_id);
            }
        }
        mapping
    }
}

/// Replace mapped temporary ids with their persisted ids. Other ids and
/// subtrees without mapped ids are left as they are.
pub fn apply_id_mapping(tree: &CourseContent, mapping: &IdMapping) -> CourseContent {
    if mapping.is_empty() {
        return tree.clone();
    }
    let mut next = tree.clone();
    for section in &mut next.sections {
        let section_hit = mapping.resolve(&section.id);
        let lecture_hits: Vec<(usize, NodeId)> = section
            .lectures
            .iter()
            .enumerate()
            .filter_map(|(i, l)| mapping.resolve(&l.id).map(|id| (i, id)))
            .collect();
        if section_hit.is_none() && lecture_hits.is_empty() {
            continue;
        }

        let section = Arc::make_mut(section);
        if let Some(id) = section_hit {
            section.id = id;
        }
        for (index, id) in lecture_hits {
            Arc::make_mut(&mut section.lectures[index]).id = id;
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{add_link, add_section, edit_field, Field, FieldValue, NodePath};
    use crate::upload::begin_upload;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn sample_document() -> Vec<SectionDocument> {
        serde_json::from_value(json!([
            {
                "_id": "s1",
                "sectionTitle": "Getting started",
                "sectionContents": [
                    {
                        "_id": "l1",
                        "videoTitle": "Install",
                        "videoDescription": "Toolchain setup",
                        "video": { "public_id": "vid/1", "url": "https://cdn/1.mp4" },
                        "videoLength": 125,
                        "videoLinks": [{ "title": "Docs", "url": "https://docs.rs" }]
                    },
                    { "_id": "l2", "videoTitle": "Hello" }
                ]
            },
            { "_id": "s2", "sectionTitle": "Empty", "sectionContents": [] }
        ]))
        .unwrap()
    }

    #[test]
    fn hydrate_assigns_persisted_ids_and_completes_hosted_videos() {
        let tree = hydrate(&sample_document()).unwrap();
        assert_eq!(tree.section_count(), 2);
        let section = tree.section_at(0).unwrap();
        assert_eq!(section.id(), &NodeId::persisted("s1"));

        let lecture = section.lecture_at(0).unwrap();
        assert_eq!(lecture.id(), &NodeId::persisted("l1"));
        assert_eq!(lecture.duration_seconds(), 125);
        assert_eq!(lecture.upload_state(), &UploadState::Complete);
        assert_eq!(lecture.video().external_id.as_deref(), Some("vid/1"));
        assert!(!lecture.is_manually_edited_duration());
        assert_eq!(lecture.links().len(), 1);

        assert_eq!(section.lecture_at(1).unwrap().upload_state(), &UploadState::Idle);
    }

    #[test]
    fn hydrate_fills_empty_sections_and_documents() {
        let tree = hydrate(&sample_document()).unwrap();
        let empty = tree.section_at(1).unwrap();
        assert_eq!(empty.lecture_count(), 1);
        assert!(empty.lecture_at(0).unwrap().id().is_temporary());

        let fresh = hydrate(&[]).unwrap();
        assert_eq!(fresh.section_count(), 1);
    }

    #[test]
    fn hydrate_keeps_client_ids_as_temporary() {
        let docs: Vec<SectionDocument> = serde_json::from_value(json!([
            { "id": "temp-abc", "sectionTitle": "Draft" }
        ]))
        .unwrap();
        let tree = hydrate(&docs).unwrap();
        assert_eq!(tree.section_at(0).unwrap().id(), &NodeId::temporary_with("abc"));
    }

    #[test]
    fn hydrate_trims_ids_and_skips_blank_ones() {
        let docs: Vec<SectionDocument> = serde_json::from_value(json!([
            {
                "_id": "  s1 ",
                "sectionTitle": "Padded",
                "sectionContents": [{ "_id": "   ", "id": " temp-xyz ", "videoTitle": "Blank _id" }]
            }
        ]))
        .unwrap();
        let tree = hydrate(&docs).unwrap();
        let section = tree.section_at(0).unwrap();
        assert_eq!(section.id(), &NodeId::persisted("s1"));
        assert_eq!(section.lecture_at(0).unwrap().id(), &NodeId::temporary_with("xyz"));
    }

    #[test]
    fn hydrate_rejects_duplicate_ids() {
        let docs: Vec<SectionDocument> = serde_json::from_value(json!([
            { "_id": "dup", "sectionTitle": "A" },
            { "_id": "dup", "sectionTitle": "B" }
        ]))
        .unwrap();
        assert_matches!(hydrate(&docs), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn payload_strips_ui_state_and_splits_ids() {
        let tree = add_section(&hydrate(&sample_document()).unwrap());
        let s1 = NodeId::persisted("s1");
        let l2 = NodeId::persisted("l2");
        let tree = begin_upload(&tree, &s1, &l2, Some(30.0)).unwrap();

        let payload = to_payload(&tree);
        let value = serde_json::to_value(&payload).unwrap();
        let lecture = &value["courseData"][0]["sectionContents"][1];
        assert_eq!(lecture["_id"], "l2");
        assert_eq!(lecture["videoLength"], 30);
        assert!(lecture.get("uploadState").is_none());
        assert!(lecture.get("autoDetectedDurationSeconds").is_none());
        assert!(lecture.get("isManuallyEditedDuration").is_none());

        let new_section = &value["courseData"][2];
        assert!(new_section.get("_id").is_none());
        assert!(new_section["id"].as_str().unwrap().starts_with("temp-"));
    }

    #[test]
    fn payload_then_hydrate_preserves_content() {
        let tree = hydrate(&sample_document()).unwrap();
        let s1 = NodeId::persisted("s1");
        let l2 = NodeId::persisted("l2");
        let tree = add_link(&tree, &s1, &l2).unwrap();
        let tree = edit_field(
            &tree,
            &NodePath::link(&s1, &l2, 0),
            Field::Url,
            FieldValue::Text("https://example.com".into()),
        )
        .unwrap();

        let rehydrated = hydrate(&to_payload(&tree).course_data).unwrap();
        let a = tree.lecture(&s1, &l2).unwrap();
        let b = rehydrated.lecture(&s1, &l2).unwrap();
        assert_eq!(a.title(), b.title());
        assert_eq!(a.links(), b.links());
        assert_eq!(tree.section_ids(), rehydrated.section_ids());
    }

    #[test]
    fn mapping_replaces_only_temporary_ids() {
        let tree = add_section(&hydrate(&sample_document()).unwrap());
        let new_section = tree.section_at(2).unwrap();
        let new_lecture = new_section.lecture_at(0).unwrap().id().clone();

        let mut mapping = IdMapping::new();
        mapping.insert(new_section.id().key(), "s3");
        mapping.insert(new_lecture.key(), "l3");
        mapping.insert("s1", "should-not-apply");

        let mapped = apply_id_mapping(&tree, &mapping);
        assert_eq!(mapped.section_ids()[0], NodeId::persisted("s1"));
        assert_eq!(mapped.section_ids()[2], NodeId::persisted("s3"));
        assert_eq!(
            mapped.section_at(2).unwrap().lecture_ids(),
            vec![NodeId::persisted("l3")]
        );
        assert!(mapped.shares_section_with(&tree, &NodeId::persisted("s1")));
    }

    #[test]
    fn mapping_derived_from_saved_document() {
        let tree = add_section(&hydrate(&sample_document()).unwrap());
        let sent = to_payload(&tree).course_data;

        let mut saved = sent.clone();
        saved[2].persisted_id = Some("s3".into());
        saved[2].client_id = None;
        saved[2].section_contents[0].persisted_id = Some("l3".into());

        let mapping = IdMapping::derive(&sent, &saved);
        assert_eq!(mapping.len(), 2);
        let mapped = apply_id_mapping(&tree, &mapping);
        assert!(mapped.sections().all(|s| !s.id().is_temporary()));
    }

    #[test]
    fn mapping_deserializes_from_response() {
        let mapping: IdMapping =
            serde_json::from_value(json!({ "idMap": { "temp-x": "650000000000000000000001" } }))
                .unwrap();
        assert_eq!(
            mapping.resolve(&NodeId::temporary_with("x")),
            Some(NodeId::persisted("650000000000000000000001"))
        );
        assert_eq!(mapping.resolve(&NodeId::persisted("temp-x")), None);
    }

    #[test]
    fn course_document_reads_flattened_fields() {
        let doc: CourseDocument = serde_json::from_value(json!({
            "_id": "c1",
            "name": "Rust course",
            "description": "",
            "categories": [],
            "price": 0,
            "estimatedPrice": 0,
            "tags": "",
            "level": "",
            "benefits": [{ "title": "Ship it" }],
            "prerequisites": [],
            "courseData": []
        }))
        .unwrap();
        assert_eq!(doc.id.as_deref(), Some("c1"));
        assert_eq!(doc.options.benefits.len(), 1);
        assert!(doc.course_data.is_empty());
    }
}
