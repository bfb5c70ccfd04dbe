//! Course authoring wizard: step definitions, transition rules and the
//! per-step validation that gates advancing.

use serde::{Deserialize, Serialize};

use crate::content::CourseContent;
use crate::course_info::{validate_course_information, CourseInformation};
use crate::course_options::{validate_course_options, CourseOptions};
use crate::error::CoreError;
use crate::validation::{validate_for_submit, SubmitBlocked};

// ---------------------------------------------------------------------------
// Wizard steps
// ---------------------------------------------------------------------------

/// The four steps of the course wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    CourseInformation,
    CourseOptions,
    CourseContent,
    CoursePreview,
}

/// Minimum step number (1-based).
pub const MIN_STEP: u8 = 1;

/// Maximum step number (1-based).
pub const MAX_STEP: u8 = 4;

impl WizardStep {
    /// Convert a 1-based step number to a `WizardStep`.
    pub fn from_number(n: u8) -> Result<Self, CoreError> {
        match n {
            1 => Ok(Self::CourseInformation),
            2 => Ok(Self::CourseOptions),
            3 => Ok(Self::CourseContent),
            4 => Ok(Self::CoursePreview),
            _ => Err(CoreError::Validation(format!(
                "Invalid step number {n}. Must be between {MIN_STEP} and {MAX_STEP}"
            ))),
        }
    }

    /// 1-based step number as shown in the wizard header.
    pub fn to_number(self) -> u8 {
        match self {
            Self::CourseInformation => 1,
            Self::CourseOptions => 2,
            Self::CourseContent => 3,
            Self::CoursePreview => 4,
        }
    }

    /// Human-readable step title.
    pub fn label(self) -> &'static str {
        match self {
            Self::CourseInformation => "Course Information",
            Self::CourseOptions => "Course Options",
            Self::CourseContent => "Course Content",
            Self::CoursePreview => "Course Preview",
        }
    }
}

/// A transition is valid if it moves exactly one step forward or back.
pub fn validate_step_transition(current: u8, next: u8) -> Result<(), CoreError> {
    if !(MIN_STEP..=MAX_STEP).contains(&current) {
        return Err(CoreError::Validation(format!(
            "Current step {current} is out of range ({MIN_STEP}..{MAX_STEP})"
        )));
    }
    if !(MIN_STEP..=MAX_STEP).contains(&next) {
        return Err(CoreError::Validation(format!(
            "Next step {next} is out of range ({MIN_STEP}..{MAX_STEP})"
        )));
    }

    let diff = (next as i16) - (current as i16);
    if diff != 1 && diff != -1 {
        return Err(CoreError::Validation(format!(
            "Cannot transition from step {current} to step {next}. \
             Must advance or go back exactly one step."
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// Everything the wizard collects before submission.
#[derive(Debug, Clone, Default)]
pub struct CourseDraft {
    pub information: CourseInformation,
    pub options: CourseOptions,
    pub content: CourseContent,
}

/// Validate the data owned by `step`. The preview step re-checks everything.
pub fn validate_step(step: WizardStep, draft: &CourseDraft) -> Result<(), CoreError> {
    match step {
        WizardStep::CourseInformation => validate_course_information(&draft.information),
        WizardStep::CourseOptions => validate_course_options(&draft.options),
        WizardStep::CourseContent => validate_for_submit(&draft.content).map_err(content_error),
        WizardStep::CoursePreview => {
            validate_course_information(&draft.information)?;
            validate_course_options(&draft.options)?;
            validate_for_submit(&draft.content).map_err(content_error)
        }
    }
}

fn content_error(blocked: SubmitBlocked) -> CoreError {
    match blocked {
        SubmitBlocked::UploadsInProgress => CoreError::Conflict(blocked.to_string()),
        SubmitBlocked::Invalid(failure) => CoreError::Validation(failure.to_string()),
    }
}

pub fn can_advance(step: WizardStep, draft: &CourseDraft) -> bool {
    step != WizardStep::CoursePreview && validate_step(step, draft).is_ok()
}

/// Move one step. Going back is always allowed; going forward requires the
/// current step to validate.
pub fn advance(current: WizardStep, next: WizardStep, draft: &CourseDraft) -> Result<WizardStep, CoreError> {
    validate_step_transition(current.to_number(), next.to_number())?;
    if next.to_number() > current.to_number() {
        validate_step(current, draft)?;
    }
    Ok(next)
}

/// Submission is only possible from the preview step.
pub fn can_submit(current: WizardStep, draft: &CourseDraft) -> Result<(), CoreError> {
    if current != WizardStep::CoursePreview {
        return Err(CoreError::Validation(format!(
            "Cannot submit course: must be on step {MAX_STEP} ({}), currently on step {}",
            WizardStep::CoursePreview.label(),
            current.to_number()
        )));
    }
    validate_step(WizardStep::CoursePreview, draft)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
