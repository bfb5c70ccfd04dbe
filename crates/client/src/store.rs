//! Persistence collaborator contract.

use async_trait::async_trait;
use courseware_core::persistence::{ContentPayload, CourseDocument, IdMapping};

/// Errors from the course backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The HTTP request itself failed (network, DNS, TLS, body decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Course not found: {0}")]
    NotFound(String),

    /// The backend returned a non-2xx status code.
    #[error("Course API error ({status}): {message}")]
    ApiError { status: u16, message: String },
}

/// Loads and saves course documents.
#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Fetch the editable course document.
    async fn load(&self, course_id: &str) -> Result<CourseDocument, StoreError>;

    /// Save the content tree. Returns the ids the backend assigned to nodes
    /// that were sent with temporary ids.
    async fn save_content(
        &self,
        course_id: &str,
        payload: &ContentPayload,
    ) -> Result<IdMapping, StoreError>;

    /// Create a new course from a complete draft. Returns the stored document.
    async fn create_course(&self, course: &CourseDocument) -> Result<CourseDocument, StoreError>;
}
