//! Routing results produced by the sequencer.

use serde::Serialize;

use crate::step::StepId;

/// One choice in a user decision menu.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionOption {
    pub name: &'static str,
    pub description: String,
    /// Command to run for this choice; `None` when the host acts on its own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

/// What the host does after performing the step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Next {
    /// Run this command unconditionally.
    Command { command: String },
    /// Run one of two commands depending on the QR verdict.
    Branch { if_pass: String, if_fail: String },
    /// Ask the user to choose.
    Decision { options: Vec<DecisionOption> },
    /// Workflow finished.
    Complete { message: String },
}

/// Everything the host needs to perform one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Routing {
    pub step: StepId,
    pub total_steps: u32,
    pub title: String,
    pub actions: Vec<String>,
    pub next: Next,
}

impl Routing {
    /// The very first step renders a workflow notice.
    pub fn is_step_one(&self) -> bool {
        self.step == StepId::Numbered(1)
    }

    /// The unconditional next command, if there is one.
    pub fn next_command(&self) -> Option<&str> {
        match &self.next {
            Next::Command { command } => Some(command),
            _ => None,
        }
    }

    /// The `(if_pass, if_fail)` pair of a QR step.
    pub fn branches(&self) -> Option<(&str, &str)> {
        match &self.next {
            Next::Branch { if_pass, if_fail } => Some((if_pass, if_fail)),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.next, Next::Complete { .. })
    }
}
