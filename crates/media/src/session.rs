//! The editing session: sole owner of the content tree.
//!
//! Probes and uploads run in spawned tasks that never touch the tree. They
//! report back over an mpsc channel as [`SessionEvent`]s, and the session
//! applies each one by swapping in a new tree snapshot. Readers holding an
//! older [`Arc<CourseContent>`] are unaffected.
//!
//! Every upload gets a session-wide attempt number. Events carry the
//! attempt they belong to; events from a cancelled or superseded attempt
//! find no live upload and are dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use courseware_core::collapse::CollapseState;
use courseware_core::persistence::{self, IdMapping};
use courseware_core::upload::{
    begin_upload, cancel_upload, complete_upload, fail_upload, record_probed_duration,
    update_upload_progress,
};
use courseware_core::{CourseContent, NodeId, Rejection};
use courseware_events::{Notice, NoticeBus};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::probe::{probe_with_timeout, DurationProbe, ProbeOutcome};
use crate::upload::{UploadEvent, UploadHandle, VideoFile, VideoUploader};

/// Buffer size of the session event channel.
const SESSION_EVENT_CAPACITY: usize = 256;

/// Notice shown when the duration could not be read from the file.
pub const SET_DURATION_MANUALLY: &str = "Could not detect video duration. Please set it manually.";

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEventKind {
    Probed(ProbeOutcome),
    Upload(UploadEvent),
}

/// A collaborator callback addressed to one upload attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    pub attempt: u64,
    pub kind: SessionEventKind,
}

/// What happened to an event handed to [`EditorSession::handle_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Applied,
    /// The attempt is no longer live.
    Stale,
    /// The tree refused the transition.
    Rejected(Rejection),
}

#[derive(Debug)]
struct ActiveUpload {
    attempt: u64,
    cancel: CancellationToken,
}

// ---------------------------------------------------------------------------
// EditorSession
// ---------------------------------------------------------------------------

pub struct EditorSession {
    tree: Arc<CourseContent>,
    collapse: CollapseState,
    uploads: HashMap<NodeId, ActiveUpload>,
    next_attempt: u64,
    events_tx: mpsc::Sender<SessionEvent>,
    events_rx: mpsc::Receiver<SessionEvent>,
    uploader: Arc<dyn VideoUploader>,
    probe: Arc<dyn DurationProbe>,
    probe_timeout: Duration,
    notices: Arc<NoticeBus>,
}

impl EditorSession {
    pub fn new(
        tree: CourseContent,
        uploader: Arc<dyn VideoUploader>,
        probe: Arc<dyn DurationProbe>,
        probe_timeout: Duration,
        notices: Arc<NoticeBus>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(SESSION_EVENT_CAPACITY);
        Self {
            tree: Arc::new(tree),
            collapse: CollapseState::new(),
            uploads: HashMap::new(),
            next_attempt: 1,
            events_tx,
            events_rx,
            uploader,
            probe,
            probe_timeout,
            notices,
        }
    }

    /// Current tree snapshot.
    pub fn snapshot(&self) -> Arc<CourseContent> {
        Arc::clone(&self.tree)
    }

    pub fn collapse(&self) -> &CollapseState {
        &self.collapse
    }

    pub fn collapse_mut(&mut self) -> &mut CollapseState {
        &mut self.collapse
    }

    pub fn active_upload_count(&self) -> usize {
        self.uploads.len()
    }

    /// Apply a structural edit.
    ///
    /// A running transfer is cancelled when the edit removes its lecture or
    /// leaves it outside `Uploading`. Collapse entries for removed nodes are
    /// dropped.
    pub fn edit(
        &mut self,
        op: impl FnOnce(&CourseContent) -> Result<CourseContent, Rejection>,
    ) -> Result<(), Rejection> {
        let next = op(&self.tree)?;
        self.tree = Arc::new(next);
        self.collapse.retain_existing(&self.tree);

        let stopped: Vec<NodeId> = self
            .uploads
            .keys()
            .filter(|lecture| !self.is_uploading(lecture))
            .cloned()
            .collect();
        for lecture in stopped {
            if let Some(active) = self.uploads.remove(&lecture) {
                tracing::info!(lecture = %lecture, attempt = active.attempt, "Upload no longer wanted, cancelling transfer");
                active.cancel.cancel();
            }
        }
        Ok(())
    }

    /// Start uploading `file` to a lecture. An upload already running on the
    /// lecture is cancelled first. Returns the new attempt number.
    pub fn start_upload(
        &mut self,
        section_id: &NodeId,
        lecture_id: &NodeId,
        file: VideoFile,
    ) -> Result<u64, Rejection> {
        let next = begin_upload(&self.tree, section_id, lecture_id, None)?;

        if let Some(previous) = self.uploads.remove(lecture_id) {
            tracing::info!(lecture = %lecture_id, attempt = previous.attempt, "Superseding running upload");
            previous.cancel.cancel();
        }
        self.tree = Arc::new(next);

        let attempt = self.next_attempt;
        self.next_attempt += 1;

        let handle = self.uploader.start(file.clone());
        self.uploads.insert(
            lecture_id.clone(),
            ActiveUpload {
                attempt,
                cancel: handle.cancel.clone(),
            },
        );
        tracing::info!(lecture = %lecture_id, attempt, file = %file.file_name, size = file.size, "Upload started");

        tokio::spawn(run_attempt(
            attempt,
            file,
            handle,
            Arc::clone(&self.probe),
            self.probe_timeout,
            self.events_tx.clone(),
        ));

        Ok(attempt)
    }

    /// Abort the lecture's running upload and return it to `Idle`.
    /// A lecture with no running upload is left as it is.
    pub fn cancel_upload(&mut self, section_id: &NodeId, lecture_id: &NodeId) -> Result<(), Rejection> {
        let next = cancel_upload(&self.tree, section_id, lecture_id)?;
        if let Some(active) = self.uploads.remove(lecture_id) {
            tracing::info!(lecture = %lecture_id, attempt = active.attempt, "Upload cancelled by user");
            active.cancel.cancel();
        }
        self.tree = Arc::new(next);
        Ok(())
    }

    /// Wait for the next collaborator event and apply it.
    pub async fn process_next(&mut self) -> Option<EventOutcome> {
        let event = self.events_rx.recv().await?;
        Some(self.handle_event(event))
    }

    /// Process events until no upload is running.
    pub async fn wait_for_uploads(&mut self) {
        while !self.uploads.is_empty() {
            if self.process_next().await.is_none() {
                break;
            }
        }
    }

    /// Apply one collaborator event to the tree.
    pub fn handle_event(&mut self, event: SessionEvent) -> EventOutcome {
        let Some(lecture_id) = self
            .uploads
            .iter()
            .find(|(_, active)| active.attempt == event.attempt)
            .map(|(lecture, _)| lecture.clone())
        else {
            tracing::debug!(attempt = event.attempt, "Discarding event from stale upload attempt");
            return EventOutcome::Stale;
        };
        let Some(section_id) = self.section_of(&lecture_id) else {
            self.uploads.remove(&lecture_id);
            return EventOutcome::Stale;
        };

        let result = match event.kind {
            SessionEventKind::Probed(ProbeOutcome::Detected(seconds)) => {
                record_probed_duration(&self.tree, &section_id, &lecture_id, seconds)
            }
            SessionEventKind::Probed(ProbeOutcome::Unavailable) => {
                self.notices
                    .publish(Notice::warning(SET_DURATION_MANUALLY).about(lecture_id.key()));
                return EventOutcome::Applied;
            }
            SessionEventKind::Upload(UploadEvent::Progress(percent)) => {
                update_upload_progress(&self.tree, &section_id, &lecture_id, percent)
            }
            SessionEventKind::Upload(UploadEvent::Completed(video)) => {
                self.uploads.remove(&lecture_id);
                let result = complete_upload(&self.tree, &section_id, &lecture_id, video, None);
                if result.is_ok() {
                    self.notices
                        .publish(Notice::success("Video uploaded successfully").about(lecture_id.key()));
                }
                result
            }
            SessionEventKind::Upload(UploadEvent::Failed(reason)) => {
                self.uploads.remove(&lecture_id);
                self.notices.publish(
                    Notice::error(format!("Video upload failed: {reason}")).about(lecture_id.key()),
                );
                fail_upload(&self.tree, &section_id, &lecture_id, reason)
            }
        };

        match result {
            Ok(next) => {
                self.tree = Arc::new(next);
                EventOutcome::Applied
            }
            Err(rejection) => {
                tracing::warn!(lecture = %lecture_id, error = %rejection, "Upload event rejected");
                EventOutcome::Rejected(rejection)
            }
        }
    }

    /// Swap temporary ids for persisted ones after a save, carrying collapse
    /// state and running uploads over to the new ids.
    pub fn apply_id_mapping(&mut self, mapping: &IdMapping) {
        self.tree = Arc::new(persistence::apply_id_mapping(&self.tree, mapping));
        self.collapse.rekey(|id| mapping.resolve(id));
        self.uploads = std::mem::take(&mut self.uploads)
            .into_iter()
            .map(|(id, active)| (mapping.resolve(&id).unwrap_or(id), active))
            .collect();
    }

    fn is_uploading(&self, lecture_id: &NodeId) -> bool {
        self.tree
            .lectures()
            .any(|(_, lecture)| lecture.id() == lecture_id && lecture.upload_state().is_uploading())
    }

    fn section_of(&self, lecture_id: &NodeId) -> Option<NodeId> {
        self.tree
            .lectures()
            .find(|(_, lecture)| lecture.id() == lecture_id)
            .map(|(section, _)| section.id().clone())
    }
}

/// Drive one attempt: probe the file while forwarding transfer events.
///
/// The probe result is always delivered before the terminal upload event so
/// a fast transfer cannot overtake duration detection.
async fn run_attempt(
    attempt: u64,
    file: VideoFile,
    mut handle: UploadHandle,
    probe: Arc<dyn DurationProbe>,
    probe_timeout: Duration,
    tx: mpsc::Sender<SessionEvent>,
) {
    let cancel = handle.cancel.clone();
    let send = |kind| {
        let tx = tx.clone();
        async move { tx.send(SessionEvent { attempt, kind }).await.is_ok() }
    };

    let probing = probe_with_timeout(probe.as_ref(), &file.path, probe_timeout);
    tokio::pin!(probing);
    let mut probed = false;
    let mut terminal: Option<UploadEvent> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            outcome = &mut probing, if !probed => {
                probed = true;
                if !send(SessionEventKind::Probed(outcome)).await {
                    break;
                }
                if let Some(event) = terminal.take() {
                    send(SessionEventKind::Upload(event)).await;
                    break;
                }
            }
            event = handle.events.recv(), if terminal.is_none() => {
                let event = event.unwrap_or_else(|| {
                    UploadEvent::Failed("Upload ended unexpectedly".to_string())
                });
                match event {
                    UploadEvent::Progress(_) => {
                        if !send(SessionEventKind::Upload(event)).await {
                            break;
                        }
                    }
                    _ if probed => {
                        send(SessionEventKind::Upload(event)).await;
                        break;
                    }
                    _ => terminal = Some(event),
                }
            }
        }
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        for active in self.uploads.values() {
            active.cancel.cancel();
        }
    }
}
