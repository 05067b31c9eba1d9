//! The step table.
//!
//! Built once on first use and read-only afterwards, so concurrent workflow
//! instances can share it without synchronisation.

use std::sync::LazyLock;

use super::{Appendix, FIRST_QR_STEP, FixMode, Step, StepId, StepKind, WORKFLOW_STEPS};
use crate::agents::{Collaborator, Dispatch};
use crate::gates::{CODE_GATE, COMPLETENESS_GATE, DOCS_GATE};

const PLAN_FILE_VARS: &[(&str, &str)] = &[("PLAN_FILE", "path to the plan being reviewed")];

const QR_POST_DISPATCH: &[&str] = &[
    "The sub-agent MUST invoke its mode script and follow its guidance.",
    "",
    "Expected output: PASS or ISSUES",
];

static REGISTRY: LazyLock<StepRegistry> = LazyLock::new(StepRegistry::build);

/// Shared read-only registry.
pub fn registry() -> &'static StepRegistry {
    &REGISTRY
}

/// Lookup table from step id to step metadata, in workflow order.
#[derive(Debug)]
pub struct StepRegistry {
    steps: Vec<Step>,
}

impl StepRegistry {
    pub fn get(&self, id: StepId) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Steps in traversal order (the checkpoint sits between 5 and 6).
    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn build() -> Self {
        let steps = vec![
            Step {
                id: StepId::Numbered(1),
                title: "Context Discovery",
                actions: &[
                    "READ .claude/conventions: structural.md, diff-format.md, temporal.md",
                    "",
                    "DELEGATE exploration to the Explore sub-agent with decision context.",
                    "",
                    "The sub-agent follows a 5-step workflow:",
                    "  1. Exploration Planning - parse task into investigation targets",
                    "  2. Execute Exploration - gather findings with decision-relevant depth",
                    "  3. Gap Analysis - check coverage against decision criteria",
                    "  4. Fill Gaps - additional exploration for uncovered criteria",
                    "  5. Format Output - compress into structured XML",
                ],
                kind: StepKind::Dispatch(Dispatch {
                    agent: Collaborator::Explore,
                    mode_module: "explore",
                    mode_total_steps: 5,
                    context_vars: &[
                        ("TASK", "the user's task/request being planned"),
                        (
                            "DECISION_CRITERIA",
                            "what planning decisions will consume this output",
                        ),
                    ],
                    post_dispatch: &[
                        "The sub-agent MUST invoke its mode script and follow its guidance.",
                        "",
                        "Expected output: structured XML with sections:",
                        "  <approach_inputs> - for Step 3 (Approach Generation)",
                        "  <assumption_inputs> - for Step 4 (Assumption Surfacing)",
                        "  <milestone_inputs> - for Step 5 (Milestone Planning)",
                    ],
                }),
                next_override: None,
            },
            Step {
                id: StepId::Numbered(2),
                title: "Testing Strategy Discovery",
                actions: &[
                    "DISCOVER the existing testing strategy from:",
                    "  - User conversation hints",
                    "  - Project CLAUDE.md / README.md",
                    "  - conventions/structural.md domain='testing-strategy'",
                    "",
                    "PROPOSE a test approach for EACH type, confirming with AskUserQuestion:",
                    "  UNIT: property-based vs example-based vs skip",
                    "  INTEGRATION: real dependencies vs mocks vs skip",
                    "  E2E: generated datasets vs fixtures vs skip",
                    "",
                    "Record the confirmed strategy in the Decision Log with 'user-specified' backing.",
                ],
                kind: StepKind::Planning {
                    appendices: &[],
                    fix_mode: None,
                },
                next_override: None,
            },
            Step {
                id: StepId::Numbered(3),
                title: "Approach Generation",
                actions: &[
                    "GENERATE 2-3 approach options:",
                    "  - Include a 'minimal change' option",
                    "  - Include an 'idiomatic/modern' option",
                    "  - Document advantages and disadvantages of each",
                    "",
                    "TARGET TECH RESEARCH (new tech or migration only):",
                    "  - What is the canonical usage of the target tech?",
                    "  - Does it bring different abstractions?",
                    "",
                    "TEST REQUIREMENTS:",
                    "  - Check project docs for test requirements",
                    "  - If silent, default-conventions domain='testing' applies",
                ],
                kind: StepKind::Planning {
                    appendices: &[],
                    fix_mode: None,
                },
                next_override: None,
            },
            Step {
                id: StepId::Numbered(4),
                title: "Assumption Surfacing",
                actions: &[
                    "FAST PATH: skip if the task involves NONE of:",
                    "  - Migration to new tech",
                    "  - Policy defaults (lifecycle, capacity, failure handling)",
                    "  - Architectural decisions with multiple valid approaches",
                    "",
                    "FULL CHECK (if any apply):",
                    "  Audit pattern preservation, migration strategy, idiomatic usage,",
                    "  abstraction boundary and policy defaults with OPEN questions.",
                    "",
                    "  For each assumption needing confirmation:",
                    "    Use AskUserQuestion BEFORE proceeding",
                    "    Record the choice in the Decision Log with 'user-specified' backing",
                ],
                kind: StepKind::Planning {
                    appendices: &[],
                    fix_mode: None,
                },
                next_override: None,
            },
            Step {
                id: StepId::Numbered(5),
                title: "Approach Selection & Milestones",
                actions: &[
                    "EVALUATE approaches: P(success), failure mode, backtrack cost",
                    "",
                    "SELECT and record in the Decision Log with a MULTI-STEP chain:",
                    "  BAD:  'Polling | Webhooks unreliable'",
                    "  GOOD: 'Polling | 30% webhook failure -> need fallback anyway'",
                    "",
                    "MILESTONES (each a deployable increment):",
                    "  - Files: exact paths (each file in ONE milestone only)",
                    "  - Requirements: specific behaviors",
                    "  - Acceptance: testable pass/fail criteria",
                    "  - Code Intent: WHAT to change (Developer converts to diffs in step 8)",
                    "  - Tests: type, backing, scenarios",
                    "",
                    "PARALLELIZATION:",
                    "  Vertical slices (parallel) > horizontal layers (sequential)",
                    "  If milestones overlap on files: extract to M0 (foundation) or consolidate",
                    "",
                    "RISKS: | Risk | Mitigation | Anchor (file:line if behavioral claim) |",
                    "",
                    "Write the plan with Code Intent (no diffs yet).",
                ],
                kind: StepKind::Planning {
                    appendices: &[Appendix::VerificationChecklist, Appendix::PlanFormat],
                    fix_mode: Some(FixMode {
                        banner: "PLAN-FIX",
                        actions: &[
                            "FIX MODE: QR-COMPLETENESS found plan structure issues.",
                            "",
                            "Review the QR findings in your context.",
                            "Fix the identified issues in the plan file directly.",
                            "",
                            "Common issues:",
                            "  - Missing Decision Log entries",
                            "  - Incomplete Code Intent sections",
                            "  - Missing Invisible Knowledge",
                            "  - Incomplete milestone specifications",
                            "",
                            "Use the Edit tool to fix the plan file.",
                            "After fixing, proceed to QR-Completeness for fresh verification.",
                        ],
                        verify_step: FIRST_QR_STEP,
                    }),
                },
                next_override: Some(StepId::Checkpoint),
            },
            Step {
                id: StepId::Checkpoint,
                title: "Plan Review Checkpoint",
                actions: &[
                    "PLAN WRITTEN. Review checkpoint before expensive QR and code generation.",
                    "",
                    "The workflow now proceeds to Step 6 (QR-Completeness), which leads to:",
                    "  - Step 8: Developer generates code diffs",
                    "  - Step 9: Code quality review",
                    "  - Steps 11-12: Documentation scrub and review",
                    "",
                    "BEFORE PROCEEDING, review the generated plan:",
                    "  1. Read the plan file saved in your context",
                    "  2. Check that the approach aligns with the user's intent",
                    "  3. Verify milestones are correctly specified",
                    "",
                    "USER DECISION REQUIRED:",
                    "  [Approve] - Proceed to Step 6 (QR gates + code generation)",
                    "  [Review & Edit] - Read/edit the plan, then resume at Step 6",
                    "  [Regenerate] - Provide feedback to restart approach generation (Step 3)",
                    "  [Save & Exit] - Save the plan and resume later in a new session",
                ],
                kind: StepKind::Checkpoint,
                next_override: Some(StepId::Numbered(FIRST_QR_STEP)),
            },
            Step {
                id: StepId::Numbered(6),
                title: "QR-Completeness",
                actions: &[],
                kind: StepKind::Qr {
                    name: COMPLETENESS_GATE.qr_name,
                    dispatch: Dispatch {
                        agent: Collaborator::QualityReviewer,
                        mode_module: "qr.plan_completeness",
                        mode_total_steps: 6,
                        context_vars: PLAN_FILE_VARS,
                        post_dispatch: QR_POST_DISPATCH,
                    },
                    gate_step: 7,
                },
                next_override: None,
            },
            Step {
                id: StepId::Numbered(7),
                title: "QR-Completeness Gate",
                actions: &[],
                kind: StepKind::Gate(COMPLETENESS_GATE),
                next_override: None,
            },
            Step {
                id: StepId::Numbered(8),
                title: "Developer Fills Diffs",
                actions: &[],
                kind: StepKind::Work(Dispatch {
                    agent: Collaborator::Developer,
                    mode_module: "dev.fill_diffs",
                    mode_total_steps: 4,
                    context_vars: PLAN_FILE_VARS,
                    post_dispatch: &[
                        "The sub-agent MUST invoke its mode script and follow its guidance.",
                        "Developer edits the plan file IN-PLACE.",
                    ],
                }),
                next_override: None,
            },
            Step {
                id: StepId::Numbered(9),
                title: "QR-Code",
                actions: &[],
                kind: StepKind::Qr {
                    name: CODE_GATE.qr_name,
                    dispatch: Dispatch {
                        agent: Collaborator::QualityReviewer,
                        mode_module: "qr.plan_code",
                        mode_total_steps: 7,
                        context_vars: PLAN_FILE_VARS,
                        post_dispatch: QR_POST_DISPATCH,
                    },
                    gate_step: 10,
                },
                next_override: None,
            },
            Step {
                id: StepId::Numbered(10),
                title: "QR-Code Gate",
                actions: &[],
                kind: StepKind::Gate(CODE_GATE),
                next_override: None,
            },
            Step {
                id: StepId::Numbered(11),
                title: "TW Documentation Scrub",
                actions: &[],
                kind: StepKind::Work(Dispatch {
                    agent: Collaborator::TechnicalWriter,
                    mode_module: "tw.plan_scrub",
                    mode_total_steps: 6,
                    context_vars: PLAN_FILE_VARS,
                    post_dispatch: &[
                        "The sub-agent MUST invoke its mode script and follow its guidance.",
                        "TW edits the plan file IN-PLACE.",
                        "",
                        "Expected output: COMPLETE or BLOCKED",
                    ],
                }),
                next_override: None,
            },
            Step {
                id: StepId::Numbered(12),
                title: "QR-Docs",
                actions: &[],
                kind: StepKind::Qr {
                    name: DOCS_GATE.qr_name,
                    dispatch: Dispatch {
                        agent: Collaborator::QualityReviewer,
                        mode_module: "qr.plan_docs",
                        mode_total_steps: 5,
                        context_vars: PLAN_FILE_VARS,
                        post_dispatch: QR_POST_DISPATCH,
                    },
                    gate_step: 13,
                },
                next_override: None,
            },
            Step {
                id: StepId::Numbered(WORKFLOW_STEPS),
                title: "QR-Docs Gate",
                actions: &[],
                kind: StepKind::Gate(DOCS_GATE),
                next_override: None,
            },
        ];

        Self { steps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::APPROACH_GENERATION_STEP;

    #[test]
    fn test_registry_covers_thirteen_steps_and_checkpoint() {
        let reg = registry();
        assert_eq!(reg.len(), 14);
        for n in 1..=WORKFLOW_STEPS {
            assert!(reg.get(StepId::Numbered(n)).is_some(), "missing step {}", n);
        }
        assert!(reg.get(StepId::Checkpoint).is_some());
        assert!(reg.get(StepId::Numbered(14)).is_none());
    }

    #[test]
    fn test_checkpoint_sits_between_planning_and_review() {
        let order: Vec<StepId> = registry().iter().map(|s| s.id).collect();
        assert_eq!(order[4], StepId::Numbered(5));
        assert_eq!(order[5], StepId::Checkpoint);
        assert_eq!(order[6], StepId::Numbered(6));
    }

    #[test]
    fn test_gate_positions() {
        let gates: Vec<u32> = registry()
            .iter()
            .filter(|s| s.gate().is_some())
            .filter_map(|s| s.id.number())
            .collect();
        assert_eq!(gates, vec![7, 10, 13]);
    }

    #[test]
    fn test_qr_steps_feed_the_following_gate() {
        for step in registry().iter() {
            if let StepKind::Qr { gate_step, name, .. } = &step.kind {
                let gate_id = StepId::Numbered(*gate_step);
                assert_eq!(Some(gate_id), step.successor());
                let gate = registry().get(gate_id).and_then(|s| s.gate()).unwrap();
                assert_eq!(gate.qr_name, *name);
            }
        }
    }

    #[test]
    fn test_successors() {
        let reg = registry();
        assert_eq!(
            reg.get(StepId::Numbered(5)).unwrap().successor(),
            Some(StepId::Checkpoint)
        );
        assert_eq!(
            reg.get(StepId::Checkpoint).unwrap().successor(),
            Some(StepId::Numbered(FIRST_QR_STEP))
        );
        assert_eq!(
            reg.get(StepId::Numbered(2)).unwrap().successor(),
            Some(StepId::Numbered(3))
        );
    }

    #[test]
    fn test_regenerate_target_is_a_planning_step() {
        let step = registry()
            .get(StepId::Numbered(APPROACH_GENERATION_STEP))
            .unwrap();
        assert_eq!(step.kind.role(), "planning");
        assert_eq!(step.title, "Approach Generation");
    }

    #[test]
    fn test_only_step_five_has_fix_mode() {
        for step in registry().iter() {
            let has_fix = matches!(
                &step.kind,
                StepKind::Planning {
                    fix_mode: Some(_),
                    ..
                }
            );
            assert_eq!(has_fix, step.id == StepId::Numbered(5));
        }
    }
}
