//! Workflow steps and the static step registry.
//!
//! Steps 1-5 plan, the checkpoint pauses for review, and steps 6-13 run three
//! QR phases, each closed by a gate:
//!
//! ```text
//! 1 Context Discovery ─ 2 Testing Strategy ─ 3 Approaches ─ 4 Assumptions ─ 5 Milestones
//!   ─ [review] ─ 6 QR-Completeness ─ 7 Gate ─ 8 Developer Diffs ─ 9 QR-Code ─ 10 Gate
//!   ─ 11 TW Scrub ─ 12 QR-Docs ─ 13 Gate ─ approved
//! ```

pub mod id;
pub mod registry;

use crate::agents::Dispatch;
use crate::gates::GateConfig;

pub use id::{CHECKPOINT_TOKEN, StepId};
pub use registry::{StepRegistry, registry};

/// Number of positions the workflow itself uses.
pub const WORKFLOW_STEPS: u32 = 13;

/// Step that restarts approach design when the user asks to regenerate.
pub const APPROACH_GENERATION_STEP: u32 = 3;

/// First QR step; the checkpoint and the plan fix loop both resume here.
pub const FIRST_QR_STEP: u32 = 6;

/// Long-form material appended to a planning step's actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appendix {
    VerificationChecklist,
    PlanFormat,
}

impl Appendix {
    /// Resource file backing this appendix.
    pub fn resource_name(&self) -> &'static str {
        match self {
            Self::VerificationChecklist => "planning-verification.md",
            Self::PlanFormat => "plan-format.md",
        }
    }

    /// Instruction placed before the appendix text.
    pub fn lead_in(&self) -> Option<&'static str> {
        match self {
            Self::VerificationChecklist => None,
            Self::PlanFormat => Some("Write plan using this format:"),
        }
    }
}

/// Alternate guidance used when a planning step is revisited after a QR failure.
#[derive(Debug, Clone, PartialEq)]
pub struct FixMode {
    /// Label for the state banner.
    pub banner: &'static str,
    pub actions: &'static [&'static str],
    /// Step that re-verifies the fix.
    pub verify_step: u32,
}

/// Role of a step, with exactly the data that role needs.
#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    /// Performed by the orchestrator itself.
    Planning {
        appendices: &'static [Appendix],
        fix_mode: Option<FixMode>,
    },
    /// Delegated to a collaborator that explores or researches.
    Dispatch(Dispatch),
    /// Delegated to a collaborator that edits the reviewed artifact.
    Work(Dispatch),
    /// Delegated to the quality reviewer; exposes pass/fail branches.
    Qr {
        name: &'static str,
        dispatch: Dispatch,
        gate_step: u32,
    },
    /// Consumes a QR outcome.
    Gate(GateConfig),
    /// Human review pause.
    Checkpoint,
}

impl StepKind {
    /// Short role tag used in listings.
    pub fn role(&self) -> &'static str {
        match self {
            Self::Planning { .. } => "planning",
            Self::Dispatch(_) => "dispatch",
            Self::Work(_) => "work",
            Self::Qr { .. } => "qr",
            Self::Gate(_) => "gate",
            Self::Checkpoint => "checkpoint",
        }
    }

    /// Dispatch details for steps that delegate.
    pub fn dispatch(&self) -> Option<&Dispatch> {
        match self {
            Self::Dispatch(d) | Self::Work(d) => Some(d),
            Self::Qr { dispatch, .. } => Some(dispatch),
            _ => None,
        }
    }
}

/// Static metadata for one workflow position.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub id: StepId,
    pub title: &'static str,
    pub actions: &'static [&'static str],
    pub kind: StepKind,
    /// Successor when it is not simply the next number.
    pub next_override: Option<StepId>,
}

impl Step {
    /// The step that follows on the unconditional path.
    pub fn successor(&self) -> Option<StepId> {
        if self.next_override.is_some() {
            return self.next_override;
        }
        self.id.number().map(|n| StepId::Numbered(n + 1))
    }

    pub fn gate(&self) -> Option<&GateConfig> {
        match &self.kind {
            StepKind::Gate(gate) => Some(gate),
            _ => None,
        }
    }
}
