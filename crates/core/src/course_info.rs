//! Course information step: name, pricing, categories, tags and media.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::content::has_http_scheme;
use crate::error::CoreError;

/// Maximum number of tags on a course.
pub const MAX_TAGS: usize = 5;

/// Minimum length of a single tag.
pub const MIN_TAG_CHARS: usize = 2;

/// Maximum length of a single tag.
pub const MAX_TAG_CHARS: usize = 30;

/// Hosted media reference as exchanged with the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    #[serde(default)]
    pub public_id: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseInformation {
    #[validate(length(
        min = 5,
        max = 100,
        message = "Course name must be between 5 and 100 characters"
    ))]
    pub name: String,

    #[validate(length(
        min = 150,
        max = 1000,
        message = "Description must be between 150 and 1000 characters"
    ))]
    pub description: String,

    #[validate(length(min = 1, max = 5, message = "Select between 1 and 5 categories"))]
    #[serde(deserialize_with = "category_ids")]
    pub categories: Vec<String>,

    #[validate(range(min = 0.0, message = "Price must be a non-negative number"))]
    pub price: f64,

    #[validate(range(min = 0.0, message = "Estimated price must be a non-negative number"))]
    pub estimated_price: f64,

    /// Comma-separated tag list.
    pub tags: String,

    #[validate(length(min = 1, message = "Please specify course level"))]
    pub level: String,

    #[serde(rename = "videoDemo", default)]
    pub demo_video: MediaRef,

    #[serde(default)]
    pub thumbnail: MediaRef,
}

/// A category as sent by the backend: a bare id, or the populated document.
#[derive(Deserialize)]
#[serde(untagged)]
enum CategoryRef {
    Id(String),
    Populated {
        #[serde(rename = "_id")]
        id: String,
    },
}

fn category_ids<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let refs = Vec::<CategoryRef>::deserialize(deserializer)?;
    Ok(refs
        .into_iter()
        .map(|r| match r {
            CategoryRef::Id(id) | CategoryRef::Populated { id } => id,
        })
        .collect())
}

/// Letters, digits, spaces, `-` and `&`.
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{N} &\-]+$").expect("valid regex"));

/// Split a comma-separated tag string into trimmed tags.
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',').map(|t| t.trim().to_string()).collect()
}

/// Validate a comma-separated tag string.
pub fn validate_tags(tags: &str) -> Result<(), CoreError> {
    let fail = |msg: &str| -> Result<(), CoreError> { Err(CoreError::Validation(msg.to_string())) };

    if tags.trim().is_empty() {
        return fail("Tags field cannot be empty");
    }
    let tags = split_tags(tags);
    if tags.iter().any(|t| t.is_empty()) {
        return fail("Remove empty tags and stray commas");
    }
    if tags.len() > MAX_TAGS {
        return fail("You can add up to 5 tags only");
    }
    let mut seen = HashSet::new();
    if !tags.iter().all(|t| seen.insert(t.to_lowercase())) {
        return fail("Duplicate tags are not allowed");
    }
    if !tags
        .iter()
        .all(|t| (MIN_TAG_CHARS..=MAX_TAG_CHARS).contains(&t.chars().count()))
    {
        return fail("Each tag must be 2-30 characters");
    }
    if !tags.iter().all(|t| TAG_PATTERN.is_match(t)) {
        return fail("Tags may only contain letters, numbers, spaces, '-' and '&'");
    }
    Ok(())
}

/// Validate every rule of the course information step.
pub fn validate_course_information(info: &CourseInformation) -> Result<(), CoreError> {
    info.validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    if info.estimated_price < info.price {
        return Err(CoreError::Validation(
            "Estimated price must be greater than or equal to actual price".to_string(),
        ));
    }
    validate_tags(&info.tags)?;
    if info.demo_video.public_id.trim().is_empty() || !has_http_scheme(&info.demo_video.url) {
        return Err(CoreError::Validation(
            "Please upload a demo video".to_string(),
        ));
    }
    if info.thumbnail.url.trim().is_empty() {
        return Err(CoreError::Validation(
            "Please upload a course thumbnail".to_string(),
        ));
    }
    Ok(())
}
