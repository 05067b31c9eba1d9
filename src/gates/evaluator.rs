//! Gate evaluation.
//!
//! Checks run in a fixed order:
//!
//! 1. **Confidence**: when the reviewer reported a findings count, score it
//!    against the threshold. The result is reported alongside the decision
//!    but does not change routing.
//! 2. **Iterations**: a failed QR at or past the gate's iteration budget
//!    escalates to the user instead of retrying.
//! 3. **Route**: failed QRs retry at the work step in fix mode; passed QRs
//!    advance to the pass step, or finish the workflow at the final gate.

use serde::Serialize;
use std::fmt;

use super::{Fixer, GateConfig};
use crate::qr::QrOutcome;
use crate::qr::confidence::{self, DEFAULT_CONFIDENCE_THRESHOLD};
use crate::step::APPROACH_GENERATION_STEP;

/// Choice offered to the user once a gate exhausts its iterations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "option")]
pub enum EscalationOption {
    /// Try once more at the work step.
    Fix { work_step: u32, iteration: u32 },
    /// Accept the current state. `None` when the gate is terminal.
    Skip { target: Option<u32> },
    /// Restart from approach generation with user feedback.
    Regenerate { step: u32 },
    /// Stop the workflow, keeping the plan file for manual resumption.
    Abort,
}

impl EscalationOption {
    /// Short label used in the decision menu.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fix { .. } => "Fix",
            Self::Skip { .. } => "Skip",
            Self::Regenerate { .. } => "Regenerate",
            Self::Abort => "Abort",
        }
    }
}

impl fmt::Display for EscalationOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fix { work_step, .. } => {
                write!(f, "[Fix] Continue to step {} for another attempt", work_step)
            }
            Self::Skip { target: Some(step) } => write!(f, "[Skip] Jump to step {}", step),
            Self::Skip { target: None } => write!(f, "[Skip] Jump to next"),
            Self::Regenerate { step } => write!(
                f,
                "[Regenerate] Route back to approach generation (Step {})",
                step
            ),
            Self::Abort => write!(f, "[Abort] Exit and save plan file for manual editing/resumption"),
        }
    }
}

/// Iteration-limit decision point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Escalation {
    pub qr_name: &'static str,
    pub iteration: u32,
    pub max_iterations: u32,
    pub fixer: Fixer,
    pub options: Vec<EscalationOption>,
}

impl Escalation {
    fn for_gate(gate: &GateConfig, iteration: u32, max_iterations: u32) -> Self {
        Self {
            qr_name: gate.qr_name,
            iteration,
            max_iterations,
            fixer: gate.fixer,
            options: vec![
                EscalationOption::Fix {
                    work_step: gate.work_step,
                    iteration: max_iterations + 1,
                },
                EscalationOption::Skip {
                    target: gate.pass_step,
                },
                EscalationOption::Regenerate {
                    step: APPROACH_GENERATION_STEP,
                },
                EscalationOption::Abort,
            ],
        }
    }

    /// Iteration the Fix option resumes at.
    pub fn suggested_iteration(&self) -> Option<u32> {
        self.options.iter().find_map(|option| match option {
            EscalationOption::Fix { iteration, .. } => Some(*iteration),
            _ => None,
        })
    }
}

/// What the gate decided.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum GateDecision {
    /// QR passed. `pass_step` is `None` when the workflow is complete.
    Advance { pass_step: Option<u32> },
    /// QR failed within budget; route to the work step in fix mode.
    Retry { work_step: u32, iteration: u32 },
    /// QR failed with the budget spent; the user must choose.
    Escalate(Escalation),
}

impl GateDecision {
    pub fn is_retry(&self) -> bool {
        matches!(self, Self::Retry { .. })
    }
}

/// Result of the confidence hook.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceCheck {
    pub score: f64,
    pub threshold: f64,
    pub below_threshold: bool,
}

/// Gate decision plus the diagnostics gathered on the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateVerdict {
    pub decision: GateDecision,
    pub confidence: Option<ConfidenceCheck>,
}

/// Decides advance / retry / escalate for a gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateEvaluator {
    confidence_threshold: f64,
}

impl Default for GateEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

impl GateEvaluator {
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            confidence_threshold,
        }
    }

    /// Evaluate one QR outcome against a gate.
    pub fn evaluate(&self, gate: &GateConfig, outcome: &QrOutcome) -> GateVerdict {
        let confidence = self.check_confidence(gate, outcome);
        let decision = Self::route(gate, outcome);

        tracing::debug!(
            gate = gate.qr_name,
            iteration = outcome.iteration,
            passed = outcome.passed,
            ?decision,
            "gate evaluated"
        );

        GateVerdict {
            decision,
            confidence,
        }
    }

    fn check_confidence(&self, gate: &GateConfig, outcome: &QrOutcome) -> Option<ConfidenceCheck> {
        let score = outcome.confidence()?;
        let below_threshold = confidence::below_threshold(score, self.confidence_threshold);
        if below_threshold {
            tracing::info!(
                gate = gate.qr_name,
                score,
                threshold = self.confidence_threshold,
                "QR confidence below threshold"
            );
        }
        Some(ConfidenceCheck {
            score,
            threshold: self.confidence_threshold,
            below_threshold,
        })
    }

    fn route(gate: &GateConfig, outcome: &QrOutcome) -> GateDecision {
        if outcome.is_failed() {
            if let Some(max) = gate.max_iterations
                && outcome.iteration >= max
            {
                return GateDecision::Escalate(Escalation::for_gate(gate, outcome.iteration, max));
            }
            return GateDecision::Retry {
                work_step: gate.work_step,
                iteration: outcome.iteration + 1,
            };
        }
        GateDecision::Advance {
            pass_step: gate.pass_step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::{CODE_GATE, COMPLETENESS_GATE, DOCS_GATE};
    use proptest::prelude::*;

    fn gates() -> [&'static GateConfig; 3] {
        [&COMPLETENESS_GATE, &CODE_GATE, &DOCS_GATE]
    }

    #[test]
    fn test_first_failure_retries_at_work_step() {
        let verdict = GateEvaluator::default().evaluate(&COMPLETENESS_GATE, &QrOutcome::failed(1));
        assert_eq!(
            verdict.decision,
            GateDecision::Retry {
                work_step: 5,
                iteration: 2
            }
        );
        assert!(verdict.confidence.is_none());
    }

    #[test]
    fn test_failure_at_limit_escalates_with_four_options() {
        let verdict = GateEvaluator::default().evaluate(&COMPLETENESS_GATE, &QrOutcome::failed(3));
        let GateDecision::Escalate(escalation) = verdict.decision else {
            panic!("Expected Escalate");
        };
        assert_eq!(escalation.max_iterations, 3);
        assert_eq!(escalation.suggested_iteration(), Some(4));
        let labels: Vec<_> = escalation.options.iter().map(|o| o.label()).collect();
        assert_eq!(labels, vec!["Fix", "Skip", "Regenerate", "Abort"]);
        assert!(escalation.options.contains(&EscalationOption::Skip { target: Some(8) }));
        assert!(
            escalation
                .options
                .contains(&EscalationOption::Regenerate { step: 3 })
        );
    }

    #[test]
    fn test_terminal_gate_skip_has_no_target() {
        let verdict = GateEvaluator::default().evaluate(&DOCS_GATE, &QrOutcome::failed(2));
        let GateDecision::Escalate(escalation) = verdict.decision else {
            panic!("Expected Escalate");
        };
        assert!(escalation.options.contains(&EscalationOption::Skip { target: None }));
        assert_eq!(
            EscalationOption::Skip { target: None }.to_string(),
            "[Skip] Jump to next"
        );
    }

    #[test]
    fn test_final_gate_pass_completes_workflow() {
        let verdict = GateEvaluator::default().evaluate(&DOCS_GATE, &QrOutcome::passed(1));
        assert_eq!(verdict.decision, GateDecision::Advance { pass_step: None });
    }

    #[test]
    fn test_gate_without_limit_never_escalates() {
        let gate = GateConfig {
            max_iterations: None,
            ..CODE_GATE
        };
        let verdict = GateEvaluator::default().evaluate(&gate, &QrOutcome::failed(50));
        assert!(verdict.decision.is_retry());
    }

    #[test]
    fn test_low_confidence_pass_still_advances() {
        let evaluator = GateEvaluator::new(95.0);
        let verdict = evaluator.evaluate(&CODE_GATE, &QrOutcome::passed(1).with_findings(6));
        assert_eq!(verdict.decision, GateDecision::Advance { pass_step: Some(11) });
        let check = verdict.confidence.unwrap();
        assert_eq!(check.score, 100.0);
        assert!(!check.below_threshold);
    }

    #[test]
    fn test_low_confidence_failure_is_reported_but_inert() {
        let verdict =
            GateEvaluator::default().evaluate(&CODE_GATE, &QrOutcome::failed(1).with_findings(8));
        let check = verdict.confidence.unwrap();
        assert_eq!(check.score, 60.0);
        assert!(check.below_threshold);
        assert!(verdict.decision.is_retry());
    }

    proptest! {
        #[test]
        fn failures_below_limit_retry(gate_idx in 0usize..3, seed in 0u32..100) {
            let gate = gates()[gate_idx];
            let max = gate.max_iterations.unwrap();
            let iteration = 1 + seed % (max - 1).max(1);
            prop_assume!(iteration < max);
            let verdict = GateEvaluator::default().evaluate(gate, &QrOutcome::failed(iteration));
            prop_assert_eq!(
                verdict.decision,
                GateDecision::Retry { work_step: gate.work_step, iteration: iteration + 1 }
            );
        }

        #[test]
        fn failures_at_or_past_limit_escalate(gate_idx in 0usize..3, extra in 0u32..50) {
            let gate = gates()[gate_idx];
            let max = gate.max_iterations.unwrap();
            let verdict = GateEvaluator::default().evaluate(gate, &QrOutcome::failed(max + extra));
            match verdict.decision {
                GateDecision::Escalate(escalation) => {
                    prop_assert_eq!(escalation.options.len(), 4);
                    prop_assert_eq!(escalation.suggested_iteration(), Some(max + 1));
                }
                other => prop_assert!(false, "expected escalate, got {:?}", other),
            }
        }

        #[test]
        fn passes_advance_to_pass_step(gate_idx in 0usize..3, iteration in 1u32..20) {
            let gate = gates()[gate_idx];
            let verdict = GateEvaluator::default().evaluate(gate, &QrOutcome::passed(iteration));
            prop_assert_eq!(verdict.decision, GateDecision::Advance { pass_step: gate.pass_step });
        }
    }
}
