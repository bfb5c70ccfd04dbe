//! HTTP [`VideoUploader`] for a Cloudinary-style video host.
//!
//! Each upload first asks the backend for a signed upload grant
//! (`GET {backend}/api/course/generate-upload-signature`), then posts the
//! file to `{host}/v1_1/{cloud_name}/video/upload`. Files below the chunk
//! threshold go up in one multipart request; larger files are split into
//! fixed-size chunks sent in order with `Content-Range` and
//! `X-Unique-Upload-Id` headers.

use std::io::SeekFrom;

use courseware_core::VideoRef;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tokio_util::io::ReaderStream;

use crate::config::EditorConfig;
use crate::upload::{percent, UploadError, UploadEvent, UploadHandle, VideoFile, VideoUploader};

/// Signed upload grant issued by the backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSignature {
    pub cloud_name: String,
    pub api_key: String,
    pub timestamp: i64,
    pub folder: String,
    pub signature: String,
}

/// Upload response fields we need from the host.
#[derive(Debug, Deserialize)]
struct HostedVideo {
    public_id: Option<String>,
    secure_url: Option<String>,
}

impl HostedVideo {
    fn into_video_ref(self) -> Result<VideoRef, UploadError> {
        let public_id = self
            .public_id
            .filter(|v| !v.is_empty())
            .ok_or(UploadError::MissingResponseField("public_id"))?;
        let url = self
            .secure_url
            .filter(|v| !v.is_empty())
            .ok_or(UploadError::MissingResponseField("secure_url"))?;
        Ok(VideoRef::new(url, public_id))
    }
}

/// Uploads lecture videos over HTTP.
#[derive(Debug, Clone)]
pub struct HttpVideoUploader {
    client: reqwest::Client,
    backend_base_url: String,
    video_host_base_url: String,
    chunk_threshold_bytes: u64,
    chunk_size_bytes: u64,
}

impl HttpVideoUploader {
    pub fn new(config: &EditorConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Reuse an existing [`reqwest::Client`] for connection pooling.
    pub fn with_client(client: reqwest::Client, config: &EditorConfig) -> Self {
        Self {
            client,
            backend_base_url: config.backend_base_url.clone(),
            video_host_base_url: config.video_host_base_url.clone(),
            chunk_threshold_bytes: config.upload_chunk_threshold_bytes,
            chunk_size_bytes: config.upload_chunk_size_bytes.max(1),
        }
    }

    /// Fetch a signed upload grant from the backend.
    pub async fn fetch_signature(&self) -> Result<UploadSignature, UploadError> {
        let response = self
            .client
            .get(format!(
                "{}/api/course/generate-upload-signature",
                self.backend_base_url
            ))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Upload `file`, reporting progress on `progress`.
    pub async fn upload(
        &self,
        file: &VideoFile,
        progress: &mpsc::Sender<UploadEvent>,
    ) -> Result<VideoRef, UploadError> {
        let signature = self.fetch_signature().await?;
        let hosted = if file.size >= self.chunk_threshold_bytes {
            self.upload_chunked(file, &signature, progress).await?
        } else {
            self.upload_single(file, &signature, progress).await?
        };
        hosted.into_video_ref()
    }

    fn upload_url(&self, signature: &UploadSignature) -> String {
        format!(
            "{}/v1_1/{}/video/upload",
            self.video_host_base_url, signature.cloud_name
        )
    }

    fn signed_form(signature: &UploadSignature, file_part: Part) -> Form {
        Form::new()
            .part("file", file_part)
            .text("api_key", signature.api_key.clone())
            .text("timestamp", signature.timestamp.to_string())
            .text("signature", signature.signature.clone())
            .text("folder", signature.folder.clone())
            .text("resource_type", "video")
    }

    async fn upload_single(
        &self,
        file: &VideoFile,
        signature: &UploadSignature,
        progress: &mpsc::Sender<UploadEvent>,
    ) -> Result<HostedVideo, UploadError> {
        let reader = tokio::fs::File::open(&file.path).await?;
        let total = file.size;
        // Weak so a body still held by the connection does not keep the
        // event stream open.
        let progress = progress.downgrade();
        let mut sent = 0u64;
        let mut last = 0u8;
        let body = ReaderStream::new(reader).map(move |chunk| {
            if let Ok(bytes) = &chunk {
                sent += bytes.len() as u64;
                let pct = percent(sent, total);
                if pct > last {
                    last = pct;
                    // Progress is advisory; a full channel just skips a tick.
                    if let Some(progress) = progress.upgrade() {
                        let _ = progress.try_send(UploadEvent::Progress(pct));
                    }
                }
            }
            chunk
        });

        let part = Part::stream_with_length(reqwest::Body::wrap_stream(body), total)
            .file_name(file.file_name.clone())
            .mime_str(file.mime_type)?;

        tracing::debug!(file = %file.file_name, size = total, "Uploading video in one request");
        let response = self
            .client
            .post(self.upload_url(signature))
            .multipart(Self::signed_form(signature, part))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn upload_chunked(
        &self,
        file: &VideoFile,
        signature: &UploadSignature,
        progress: &mpsc::Sender<UploadEvent>,
    ) -> Result<HostedVideo, UploadError> {
        let unique_upload_id = uuid::Uuid::new_v4().to_string();
        let total = file.size;
        let mut reader = tokio::fs::File::open(&file.path).await?;
        let mut offset = 0u64;
        let mut last_response = None;

        tracing::info!(
            file = %file.file_name,
            size = total,
            chunk_size = self.chunk_size_bytes,
            upload_id = %unique_upload_id,
            "Uploading video in chunks",
        );

        while offset < total {
            let end = (offset + self.chunk_size_bytes).min(total);
            let mut buffer = vec![0u8; (end - offset) as usize];
            reader.seek(SeekFrom::Start(offset)).await?;
            reader.read_exact(&mut buffer).await?;

            let part = Part::bytes(buffer)
                .file_name(file.file_name.clone())
                .mime_str(file.mime_type)?;
            let response = self
                .client
                .post(self.upload_url(signature))
                .header("X-Unique-Upload-Id", &unique_upload_id)
                .header("Content-Range", format!("bytes {}-{}/{}", offset, end - 1, total))
                .multipart(Self::signed_form(signature, part))
                .send()
                .await?;
            last_response = Some(Self::parse_response::<HostedVideo>(response).await?);

            let _ = progress.send(UploadEvent::Progress(percent(end, total))).await;
            offset = end;
        }

        last_response.ok_or(UploadError::MissingResponseField("public_id"))
    }

    // ---- private helpers ----

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, UploadError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(UploadError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, UploadError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

impl VideoUploader for HttpVideoUploader {
    fn start(&self, file: VideoFile) -> UploadHandle {
        let (tx, handle) = UploadHandle::channel();
        let cancel = handle.cancel.clone();
        let uploader = self.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(file = %file.file_name, "Upload cancelled");
                }
                result = uploader.upload(&file, &tx) => {
                    let event = match result {
                        Ok(video) => {
                            tracing::info!(file = %file.file_name, url = %video.url, "Upload complete");
                            UploadEvent::Completed(video)
                        }
                        Err(e) => {
                            tracing::error!(file = %file.file_name, error = %e, "Upload failed");
                            UploadEvent::Failed(e.to_string())
                        }
                    };
                    let _ = tx.send(event).await;
                }
            }
        });

        handle
    }
}
