use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use courseware_client::{CourseStore, HttpCourseStore};
use courseware_core::duration::format_duration;
use courseware_core::persistence::{hydrate, to_payload};
use courseware_core::{CourseContent, NodeId, UploadState};
use courseware_events::NoticeBus;
use courseware_media::{
    EditorConfig, EditorSession, FfprobeDurationProbe, HttpVideoUploader, VideoFile,
};

use super::print_notices;

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Course id on the backend
    #[arg(long)]
    pub course: String,

    /// Section position, starting at 1
    #[arg(long, default_value_t = 1)]
    pub section: usize,

    /// Lecture position within the section, starting at 1
    #[arg(long, default_value_t = 1)]
    pub lecture: usize,

    /// Upload only; do not save the course afterwards
    #[arg(long)]
    pub no_save: bool,

    /// Local video file
    pub video: PathBuf,
}

/// Resolve 1-based positions to node ids.
fn locate(tree: &CourseContent, section: usize, lecture: usize) -> Result<(NodeId, NodeId)> {
    let s = section
        .checked_sub(1)
        .and_then(|i| tree.section_at(i))
        .ok_or_else(|| anyhow!("Section {section} does not exist ({} sections)", tree.section_count()))?;
    let l = lecture
        .checked_sub(1)
        .and_then(|i| s.lecture_at(i))
        .ok_or_else(|| {
            anyhow!("Lecture {lecture} does not exist in section {section} ({} lectures)", s.lecture_count())
        })?;
    Ok((s.id().clone(), l.id().clone()))
}

pub async fn upload(args: UploadArgs, config: &EditorConfig) -> Result<()> {
    let file = VideoFile::open(&args.video).await?;
    let store = HttpCourseStore::new(config.backend_base_url.clone());
    let document = store.load(&args.course).await?;
    let tree = hydrate(&document.course_data)?;
    let (section_id, lecture_id) = locate(&tree, args.section, args.lecture)?;

    let notices = Arc::new(NoticeBus::default());
    let printer = print_notices(&notices);
    let mut session = EditorSession::new(
        tree,
        Arc::new(HttpVideoUploader::new(config)),
        Arc::new(FfprobeDurationProbe::new(config.ffprobe_path.clone())),
        config.probe_timeout,
        Arc::clone(&notices),
    );

    println!("Uploading {} ({} bytes)", file.file_name, file.size);
    session.start_upload(&section_id, &lecture_id, file)?;

    let interrupted = tokio::select! {
        _ = session.wait_for_uploads() => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        session.cancel_upload(&section_id, &lecture_id)?;
        bail!("Upload cancelled");
    }

    let snapshot = session.snapshot();
    let lecture = snapshot
        .lecture(&section_id, &lecture_id)
        .context("Lecture disappeared during upload")?;
    match lecture.upload_state() {
        UploadState::Complete => {}
        UploadState::Failed { reason } => bail!("Upload failed: {reason}"),
        other => bail!("Upload ended in unexpected state {other:?}"),
    }
    println!(
        "Video: {} (duration {})",
        lecture.video().url,
        format_duration(u64::from(lecture.duration_seconds()))
    );

    if args.no_save {
        tracing::info!(course_id = %args.course, "Skipping save");
    } else {
        let mapping = store.save_content(&args.course, &to_payload(&snapshot)).await?;
        session.apply_id_mapping(&mapping);
        println!("Saved course {} ({} new ids)", args.course, mapping.len());
    }

    drop(session);
    drop(notices);
    printer.await?;
    Ok(())
}
