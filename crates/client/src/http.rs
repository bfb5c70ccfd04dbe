//! [`CourseStore`] over the course backend's REST endpoints.
//!
//! | Operation        | Request                                   |
//! |------------------|-------------------------------------------|
//! | `load`           | `GET  {base}/api/course/data/{id}`        |
//! | `save_content`   | `PUT  {base}/api/course/update_course/{id}` |
//! | `create_course`  | `POST {base}/api/course/create_course`    |
//!
//! Responses wrap the document as `{ "success": true, "course": { ... } }`.
//! A save response may carry an explicit `idMap`; otherwise the mapping is
//! derived by pairing the sent sections with the returned ones.

use async_trait::async_trait;
use courseware_core::persistence::{ContentPayload, CourseDocument, IdMapping};
use serde::Deserialize;

use crate::store::{CourseStore, StoreError};

#[derive(Debug, Deserialize)]
struct CourseEnvelope {
    course: CourseDocument,
    #[serde(flatten)]
    id_map: IdMapping,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// HTTP client for the course backend.
#[derive(Debug, Clone)]
pub struct HttpCourseStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCourseStore {
    /// * `base_url` - Backend origin, e.g. `http://localhost:8000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    // ---- private helpers ----

    /// Map non-2xx responses to [`StoreError`], preferring the backend's
    /// `message` field over the raw body.
    async fn ensure_success(
        response: reqwest::Response,
        course_id: &str,
    ) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(course_id.to_string()));
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or(body);
        Err(StoreError::ApiError {
            status: status.as_u16(),
            message,
        })
    }

    async fn parse_envelope(
        response: reqwest::Response,
        course_id: &str,
    ) -> Result<CourseEnvelope, StoreError> {
        let response = Self::ensure_success(response, course_id).await?;
        Ok(response.json::<CourseEnvelope>().await?)
    }
}

#[async_trait]
impl CourseStore for HttpCourseStore {
    async fn load(&self, course_id: &str) -> Result<CourseDocument, StoreError> {
        let response = self
            .client
            .get(format!("{}/api/course/data/{course_id}", self.base_url))
            .send()
            .await?;
        let envelope = Self::parse_envelope(response, course_id).await?;
        tracing::debug!(
            course_id,
            sections = envelope.course.course_data.len(),
            "Loaded course",
        );
        Ok(envelope.course)
    }

    async fn save_content(
        &self,
        course_id: &str,
        payload: &ContentPayload,
    ) -> Result<IdMapping, StoreError> {
        let response = self
            .client
            .put(format!("{}/api/course/update_course/{course_id}", self.base_url))
            .json(payload)
            .send()
            .await?;
        let envelope = Self::parse_envelope(response, course_id).await?;

        let mapping = if envelope.id_map.is_empty() {
            IdMapping::derive(&payload.course_data, &envelope.course.course_data)
        } else {
            envelope.id_map
        };
        tracing::info!(course_id, mapped_ids = mapping.len(), "Saved course content");
        Ok(mapping)
    }

    async fn create_course(&self, course: &CourseDocument) -> Result<CourseDocument, StoreError> {
        let response = self
            .client
            .post(format!("{}/api/course/create_course", self.base_url))
            .json(course)
            .send()
            .await?;
        let envelope = Self::parse_envelope(response, "<new>").await?;
        tracing::info!(course_id = ?envelope.course.id, "Created course");
        Ok(envelope.course)
    }
}
