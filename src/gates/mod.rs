//! Quality gates.
//!
//! A gate closes each QR phase. It consumes the reviewer's outcome and
//! decides whether the workflow advances, loops back for a fix, or stops for
//! a user decision once the iteration budget is spent.
//!
//! | Gate | QR name          | Work step | Pass step | Fixer             | Max iterations |
//! |------|------------------|-----------|-----------|-------------------|----------------|
//! | 7    | QR-COMPLETENESS  | 5         | 8         | self              | 3              |
//! | 10   | QR-CODE          | 8         | 11        | developer         | 3              |
//! | 13   | QR-DOCS          | 11        | -         | technical-writer  | 2              |

pub mod evaluator;

use serde::Serialize;
use std::fmt;

use crate::agents::Collaborator;

pub use evaluator::{
    ConfidenceCheck, Escalation, EscalationOption, GateDecision, GateEvaluator, GateVerdict,
};

/// Who applies fixes after a failed QR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "agent")]
pub enum Fixer {
    /// The orchestrator that produced the artifact fixes it directly.
    SelfFix,
    /// A designated collaborator applies the fixes.
    Delegated(Collaborator),
}

impl Fixer {
    pub fn is_self_fix(&self) -> bool {
        matches!(self, Self::SelfFix)
    }

    /// Collaborator that receives the fix, if any.
    pub fn target(&self) -> Option<Collaborator> {
        match self {
            Self::SelfFix => None,
            Self::Delegated(agent) => Some(*agent),
        }
    }
}

impl fmt::Display for Fixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfFix => write!(f, "self"),
            Self::Delegated(agent) => write!(f, "{}", agent),
        }
    }
}

/// Static configuration of one gate position.
#[derive(Debug, Clone, PartialEq)]
pub struct GateConfig {
    /// Name of the QR phase this gate closes.
    pub qr_name: &'static str,
    /// Step that produces the reviewed artifact; retries route here.
    pub work_step: u32,
    /// Step to advance to on pass. `None` for the final gate.
    pub pass_step: Option<u32>,
    /// Message shown when the gate passes.
    pub pass_message: &'static str,
    pub fixer: Fixer,
    /// Failed iterations allowed before the user must decide.
    pub max_iterations: Option<u32>,
}

impl GateConfig {
    /// Whether passing this gate completes the workflow.
    pub fn is_terminal(&self) -> bool {
        self.pass_step.is_none()
    }
}

pub const COMPLETENESS_GATE: GateConfig = GateConfig {
    qr_name: "QR-COMPLETENESS",
    work_step: 5,
    pass_step: Some(8),
    pass_message: "Proceed to step 8 (Developer Fills Diffs).",
    fixer: Fixer::SelfFix,
    max_iterations: Some(3),
};

pub const CODE_GATE: GateConfig = GateConfig {
    qr_name: "QR-CODE",
    work_step: 8,
    pass_step: Some(11),
    pass_message: "Proceed to step 11 (TW Documentation Scrub).",
    fixer: Fixer::Delegated(Collaborator::Developer),
    max_iterations: Some(3),
};

// Documentation usually converges faster, so the budget is smaller.
pub const DOCS_GATE: GateConfig = GateConfig {
    qr_name: "QR-DOCS",
    work_step: 11,
    pass_step: None,
    pass_message: "PLAN APPROVED. Ready for plan execution.",
    fixer: Fixer::Delegated(Collaborator::TechnicalWriter),
    max_iterations: Some(2),
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_docs_gate_is_terminal() {
        assert!(!COMPLETENESS_GATE.is_terminal());
        assert!(!CODE_GATE.is_terminal());
        assert!(DOCS_GATE.is_terminal());
    }

    #[test]
    fn test_fixer_target() {
        assert!(COMPLETENESS_GATE.fixer.is_self_fix());
        assert_eq!(CODE_GATE.fixer.target(), Some(Collaborator::Developer));
        assert_eq!(DOCS_GATE.fixer.to_string(), "technical-writer");
    }

    #[test]
    fn test_gates_loop_back_before_themselves() {
        for gate in [&COMPLETENESS_GATE, &CODE_GATE, &DOCS_GATE] {
            assert!(gate.max_iterations.unwrap_or(1) >= 1);
            if let Some(pass) = gate.pass_step {
                assert!(pass > gate.work_step);
            }
        }
    }
}
