//! Typed error hierarchy for the planner.
//!
//! Every variant except `Resource` is a configuration error: the caller
//! handed the sequencer a position it cannot route. Configuration errors are
//! reported before any routing happens and never produce partial output.

use thiserror::Error;

use crate::step::StepId;

/// Errors raised while validating a request or routing a step.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Invalid step '{raw}': expected a step number or 'review'")]
    InvalidStep { raw: String },

    #[error("Step {step} is outside the workflow range 1..={total_steps}")]
    StepOutOfRange { step: u32, total_steps: u32 },

    #[error("Step {step} is not part of this workflow")]
    UnknownStep { step: StepId },

    #[error("Workflow requires at least {minimum} steps, got {total_steps}")]
    TotalStepsTooSmall { total_steps: u32, minimum: u32 },

    #[error("--qr-status required for gate step {step}")]
    MissingQrStatus { step: u32 },

    #[error("Gate step {step} received --qr-status pass together with --qr-fail")]
    ConflictingQrOutcome { step: u32 },

    #[error("QR iteration must be >= 1, got {iteration}")]
    InvalidIteration { iteration: u32 },

    #[error("Confidence threshold must be within 0-100, got {value}")]
    InvalidConfidenceThreshold { value: f64 },

    #[error("Invalid QR status '{raw}': expected pass or fail")]
    InvalidQrStatus { raw: String },

    #[error("Failed to load resource {name}: {source}")]
    Resource {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl PlannerError {
    /// Whether this error stems from caller misuse rather than the environment.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::Resource { .. })
    }
}
