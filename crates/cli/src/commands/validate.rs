use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use courseware_core::course_wizard::{validate_step, WizardStep};
use courseware_core::duration::{format_duration, total_duration_seconds};
use courseware_core::validation::completion_stats;

use super::{draft_from_document, read_document};

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Course document (JSON)
    pub file: PathBuf,

    /// Only check the content tree, not course information and options
    #[arg(long)]
    pub content_only: bool,
}

pub fn validate(args: ValidateArgs) -> Result<()> {
    let document = read_document(&args.file)?;
    let draft = draft_from_document(&document)?;

    let stats = completion_stats(&draft.content);
    let total_seconds = total_duration_seconds(&draft.content);
    println!(
        "Sections complete: {}/{} ({} lectures, {})",
        stats.completed_sections,
        stats.total_sections,
        draft.content.lectures().count(),
        format_duration(total_seconds),
    );

    let steps: &[WizardStep] = if args.content_only {
        &[WizardStep::CourseContent]
    } else {
        &[
            WizardStep::CourseInformation,
            WizardStep::CourseOptions,
            WizardStep::CourseContent,
        ]
    };

    let mut failures = 0;
    for step in steps {
        match validate_step(*step, &draft) {
            Ok(()) => println!("{}: ok", step.label()),
            Err(e) => {
                failures += 1;
                println!("{}: {e}", step.label());
            }
        }
    }

    if failures > 0 {
        bail!("{failures} step(s) failed validation");
    }
    println!("Ready to submit");
    Ok(())
}
