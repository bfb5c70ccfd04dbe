use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use courseware_client::{CourseStore, HttpCourseStore};
use courseware_core::course_wizard::{can_submit, WizardStep};
use courseware_core::persistence::{to_payload, CourseDocument};
use courseware_media::EditorConfig;

use super::{draft_from_document, read_document};

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Draft course document (JSON)
    pub file: PathBuf,
}

/// Submit a draft the way the wizard's preview step does: every step is
/// re-validated and nothing is sent while uploads are pending.
pub async fn create(args: CreateArgs, config: &EditorConfig) -> Result<()> {
    let document = read_document(&args.file)?;
    let draft = draft_from_document(&document)?;
    can_submit(WizardStep::CoursePreview, &draft)?;

    let outgoing = CourseDocument {
        id: None,
        information: draft.information,
        options: draft.options,
        course_data: to_payload(&draft.content).course_data,
    };
    let store = HttpCourseStore::new(config.backend_base_url.clone());
    let created = store.create_course(&outgoing).await?;
    println!(
        "Created course {}",
        created.id.as_deref().unwrap_or("<unknown id>")
    );
    Ok(())
}
