//! Step sequencing.
//!
//! [`Sequencer::route`] is a pure function of the request: it validates the
//! caller's cursor, looks the step up in the registry, and produces a
//! [`Routing`] with the step's actions and what comes next. Gate steps
//! delegate the advance/retry/escalate decision to [`GateEvaluator`].

pub mod command;
pub mod routing;

use crate::errors::PlannerError;
use crate::gates::{ConfidenceCheck, EscalationOption, GateConfig, GateDecision, GateEvaluator};
use crate::guidance::{self, ResourceLoader};
use crate::qr::confidence::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::qr::{QrOutcome, QrState, QrStatus};
use crate::step::{
    Appendix, FIRST_QR_STEP, FixMode, Step, StepId, StepKind, WORKFLOW_STEPS, registry,
};

pub use command::{StepCommand, mode_invocation};
pub use routing::{DecisionOption, Next, Routing};

/// Default program prefix for emitted commands.
pub const DEFAULT_INVOKE_CMD: &str = "planner";

/// Default prefix for sub-agent mode invocations.
pub const DEFAULT_MODE_PREFIX: &str = "python3 -m skills.planner.";

/// The caller-held cursor for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRequest {
    pub step: StepId,
    pub total_steps: u32,
    pub qr: QrState,
    pub confidence_threshold: f64,
}

impl StepRequest {
    pub fn new(step: impl Into<StepId>, total_steps: u32) -> Self {
        Self {
            step: step.into(),
            total_steps,
            qr: QrState::default(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    pub fn with_qr(mut self, qr: QrState) -> Self {
        self.qr = qr;
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }
}

/// Routes workflow steps.
#[derive(Debug, Clone)]
pub struct Sequencer {
    invoke_cmd: String,
    mode_prefix: String,
    resources: ResourceLoader,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self {
            invoke_cmd: DEFAULT_INVOKE_CMD.to_string(),
            mode_prefix: DEFAULT_MODE_PREFIX.to_string(),
            resources: ResourceLoader::embedded(),
        }
    }
}

impl Sequencer {
    pub fn new(invoke_cmd: impl Into<String>, mode_prefix: impl Into<String>) -> Self {
        Self {
            invoke_cmd: invoke_cmd.into(),
            mode_prefix: mode_prefix.into(),
            ..Default::default()
        }
    }

    pub fn with_resources(mut self, resources: ResourceLoader) -> Self {
        self.resources = resources;
        self
    }

    /// Compute the routing for one step.
    pub fn route(&self, request: &StepRequest) -> Result<Routing, PlannerError> {
        let step = Self::validate(request)?;

        let routing = match &step.kind {
            StepKind::Gate(gate) => self.route_gate(step, gate, request)?,
            StepKind::Checkpoint => self.route_checkpoint(step, request),
            StepKind::Planning {
                fix_mode: Some(fix),
                ..
            } if request.qr.failed => self.route_fix_mode(step, fix, request),
            StepKind::Planning { appendices, .. } => {
                self.route_planning(step, appendices, request)?
            }
            StepKind::Dispatch(_) | StepKind::Work(_) | StepKind::Qr { .. } => {
                self.route_delegated(step, request)
            }
        };

        tracing::debug!(
            step = %request.step,
            iteration = request.qr.iteration,
            next = ?routing.next,
            "step routed"
        );
        Ok(routing)
    }

    fn validate(request: &StepRequest) -> Result<&'static Step, PlannerError> {
        if request.total_steps < WORKFLOW_STEPS {
            return Err(PlannerError::TotalStepsTooSmall {
                total_steps: request.total_steps,
                minimum: WORKFLOW_STEPS,
            });
        }
        let threshold = request.confidence_threshold;
        if !(0.0..=100.0).contains(&threshold) {
            return Err(PlannerError::InvalidConfidenceThreshold { value: threshold });
        }
        if request.qr.iteration < 1 {
            return Err(PlannerError::InvalidIteration {
                iteration: request.qr.iteration,
            });
        }
        if let Some(n) = request.step.number()
            && (n < 1 || n > request.total_steps)
        {
            return Err(PlannerError::StepOutOfRange {
                step: n,
                total_steps: request.total_steps,
            });
        }
        registry()
            .get(request.step)
            .ok_or(PlannerError::UnknownStep { step: request.step })
    }

    fn command(&self, cmd: StepCommand) -> String {
        cmd.render(&self.invoke_cmd)
    }

    /// Command for the unconditional successor, carrying the iteration
    /// while inside a fix loop.
    fn successor_command(&self, step: &Step, request: &StepRequest, fixing: bool) -> Next {
        match step.successor() {
            Some(next) => {
                let mut cmd = StepCommand::new(next, request.total_steps);
                if fixing {
                    cmd = cmd.iteration(request.qr.iteration);
                }
                Next::Command {
                    command: self.command(cmd),
                }
            }
            None => Next::Complete {
                message: "Workflow complete.".to_string(),
            },
        }
    }

    fn route_planning(
        &self,
        step: &Step,
        appendices: &[Appendix],
        request: &StepRequest,
    ) -> Result<Routing, PlannerError> {
        let mut actions = static_actions(step);
        for appendix in appendices {
            actions.push(String::new());
            if let Some(lead_in) = appendix.lead_in() {
                actions.push(lead_in.to_string());
            }
            actions.push(self.resources.load(appendix.resource_name())?);
        }
        Ok(Routing {
            step: step.id,
            total_steps: request.total_steps,
            title: step.title.to_string(),
            actions,
            next: self.successor_command(step, request, false),
        })
    }

    fn route_fix_mode(&self, step: &Step, fix: &FixMode, request: &StepRequest) -> Routing {
        let mut actions = vec![
            guidance::state_banner(fix.banner, request.qr.iteration, "fix"),
            String::new(),
        ];
        actions.extend(fix.actions.iter().map(|a| a.to_string()));

        let verify = StepCommand::new(fix.verify_step, request.total_steps)
            .iteration(request.qr.iteration);
        Routing {
            step: step.id,
            total_steps: request.total_steps,
            title: format!("{} - Fix Mode", step.title),
            actions,
            next: Next::Command {
                command: self.command(verify),
            },
        }
    }

    fn route_checkpoint(&self, step: &Step, request: &StepRequest) -> Routing {
        Routing {
            step: step.id,
            total_steps: request.total_steps,
            title: step.title.to_string(),
            actions: static_actions(step),
            next: Next::Command {
                command: self.command(StepCommand::new(FIRST_QR_STEP, request.total_steps)),
            },
        }
    }

    /// Dispatch, work and QR steps all hand the step to a collaborator.
    fn route_delegated(&self, step: &Step, request: &StepRequest) -> Routing {
        let qr = &request.qr;
        // Only work steps are revisited by a gate's fix loop
        let fixing = qr.failed && matches!(step.kind, StepKind::Work(_));
        let mut actions = Vec::new();
        let mut title = step.title.to_string();

        if let StepKind::Qr { name, .. } = &step.kind {
            actions.push(guidance::qr_banner(name, qr));
            actions.push(String::new());
        } else if fixing {
            title = format!("{} - Fix Mode", step.title);
            actions.push(guidance::state_banner(
                &step.title.to_uppercase(),
                qr.iteration,
                "fix",
            ));
            actions.push(String::new());
        }

        if !step.actions.is_empty() {
            actions.extend(static_actions(step));
            actions.push(String::new());
        }

        if let Some(dispatch) = step.kind.dispatch() {
            let fix_iteration = fixing.then_some(qr.iteration);
            let invoke = mode_invocation(
                &self.mode_prefix,
                dispatch.mode_module,
                dispatch.mode_total_steps,
                fix_iteration,
            );
            actions.push(guidance::orchestrator_constraint());
            actions.push(String::new());
            actions.push(guidance::subagent_dispatch(dispatch, &invoke, qr));
            if !dispatch.post_dispatch.is_empty() {
                actions.push(String::new());
                actions.extend(dispatch.post_dispatch.iter().map(|l| l.to_string()));
            }
        }

        let next = match &step.kind {
            StepKind::Qr { gate_step, .. } => {
                if let Some(gate) = registry()
                    .get(StepId::Numbered(*gate_step))
                    .and_then(|s| s.gate())
                {
                    actions.push(String::new());
                    actions.push(guidance::post_qr_routing(gate.fixer));
                }
                let branch = |status: QrStatus| {
                    self.command(
                        StepCommand::new(*gate_step, request.total_steps)
                            .iteration(qr.iteration)
                            .status(status),
                    )
                };
                Next::Branch {
                    if_pass: branch(QrStatus::Pass),
                    if_fail: branch(QrStatus::Fail),
                }
            }
            _ => self.successor_command(step, request, fixing),
        };

        Routing {
            step: step.id,
            total_steps: request.total_steps,
            title,
            actions,
            next,
        }
    }

    fn route_gate(
        &self,
        step: &Step,
        gate: &GateConfig,
        request: &StepRequest,
    ) -> Result<Routing, PlannerError> {
        let number = step.id.number().unwrap_or_default();
        let qr = &request.qr;
        let status = qr
            .status
            .ok_or(PlannerError::MissingQrStatus { step: number })?;
        if status == QrStatus::Pass && qr.failed {
            return Err(PlannerError::ConflictingQrOutcome { step: number });
        }

        let outcome = QrOutcome {
            iteration: qr.iteration,
            passed: !status.is_fail(),
            status: Some(status.to_string()),
            findings: qr.findings,
        };
        let verdict = GateEvaluator::new(request.confidence_threshold).evaluate(gate, &outcome);

        let mut actions = Vec::new();
        let mut title = step.title.to_string();
        let next = match verdict.decision {
            GateDecision::Advance { pass_step } => {
                actions.push(format!("{}: PASS", gate.qr_name));
                actions.push(String::new());
                actions.push(gate.pass_message.to_string());
                match pass_step {
                    Some(pass) => Next::Command {
                        command: self.command(StepCommand::new(pass, request.total_steps)),
                    },
                    None => Next::Complete {
                        message: gate.pass_message.to_string(),
                    },
                }
            }
            GateDecision::Retry {
                work_step,
                iteration,
            } => {
                actions.push(format!(
                    "{}: ISSUES (iteration {})",
                    gate.qr_name, qr.iteration
                ));
                actions.push(String::new());
                match gate.fixer.target() {
                    None => actions.push(format!(
                        "Fix the QR findings yourself by returning to step {} in fix mode.",
                        work_step
                    )),
                    Some(agent) => actions.push(format!(
                        "Return to step {} in fix mode; the {} sub-agent fixes the QR findings.",
                        work_step, agent
                    )),
                }
                actions.push(
                    "Keep the QR findings in context; the fix step needs them.".to_string(),
                );
                Next::Command {
                    command: self.command(
                        StepCommand::new(work_step, request.total_steps).fix(iteration),
                    ),
                }
            }
            GateDecision::Escalate(escalation) => {
                title = "Iteration Limit Reached".to_string();
                actions.push(format!(
                    "{} has failed {} times (limit {}).",
                    escalation.qr_name, escalation.iteration, escalation.max_iterations
                ));
                if let Some(attempt) = escalation.suggested_iteration() {
                    actions.push(match escalation.fixer.target() {
                        None => format!("On [Fix], you will attempt fix #{} yourself.", attempt),
                        Some(agent) => format!(
                            "On [Fix], the {} sub-agent will attempt fix #{}.",
                            agent, attempt
                        ),
                    });
                }
                actions.push(String::new());
                actions.push("USER DECISION REQUIRED:".to_string());
                for option in &escalation.options {
                    actions.push(format!("  {}", option));
                }
                let options = escalation
                    .options
                    .iter()
                    .map(|option| self.decision_option(option, request.total_steps))
                    .collect();
                Next::Decision { options }
            }
        };

        if let Some(check) = verdict.confidence {
            actions.push(String::new());
            actions.push(confidence_line(&check));
        }

        Ok(Routing {
            step: step.id,
            total_steps: request.total_steps,
            title,
            actions,
            next,
        })
    }

    fn decision_option(&self, option: &EscalationOption, total_steps: u32) -> DecisionOption {
        let command = match option {
            EscalationOption::Fix {
                work_step,
                iteration,
            } => Some(StepCommand::new(*work_step, total_steps).fix(*iteration)),
            EscalationOption::Skip { target } => {
                target.map(|step| StepCommand::new(step, total_steps))
            }
            EscalationOption::Regenerate { step } => Some(StepCommand::new(*step, total_steps)),
            EscalationOption::Abort => None,
        };
        DecisionOption {
            name: option.label(),
            description: option.to_string(),
            command: command.map(|c| self.command(c)),
        }
    }
}

fn static_actions(step: &Step) -> Vec<String> {
    step.actions.iter().map(|a| a.to_string()).collect()
}

fn confidence_line(check: &ConfidenceCheck) -> String {
    if check.below_threshold {
        format!(
            "QR confidence {:.0}% is below the {:.0}% threshold.",
            check.score, check.threshold
        )
    } else {
        format!(
            "QR confidence {:.0}% (threshold {:.0}%).",
            check.score, check.threshold
        )
    }
}
