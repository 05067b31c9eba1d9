//! Next-step command lines handed back to the host.

use crate::qr::QrStatus;
use crate::step::StepId;

/// A planner invocation for a specific step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepCommand {
    pub step: StepId,
    pub total_steps: u32,
    pub qr_fail: bool,
    pub qr_iteration: u32,
    pub qr_status: Option<QrStatus>,
}

impl StepCommand {
    /// Fresh invocation: first iteration, no QR flags.
    pub fn new(step: impl Into<StepId>, total_steps: u32) -> Self {
        Self {
            step: step.into(),
            total_steps,
            qr_fail: false,
            qr_iteration: 1,
            qr_status: None,
        }
    }

    /// Mark the target as a fix-mode revisit.
    pub fn fix(mut self, iteration: u32) -> Self {
        self.qr_fail = true;
        self.qr_iteration = iteration;
        self
    }

    pub fn iteration(mut self, iteration: u32) -> Self {
        self.qr_iteration = iteration;
        self
    }

    pub fn status(mut self, status: QrStatus) -> Self {
        self.qr_status = Some(status);
        self
    }

    /// Render with `invoke_cmd` as the program prefix.
    ///
    /// `--qr-iteration` is only emitted past the first iteration.
    pub fn render(&self, invoke_cmd: &str) -> String {
        let mut cmd = format!(
            "{} --step {} --total-steps {}",
            invoke_cmd, self.step, self.total_steps
        );
        if self.qr_fail {
            cmd.push_str(" --qr-fail");
        }
        if self.qr_iteration > 1 {
            cmd.push_str(&format!(" --qr-iteration {}", self.qr_iteration));
        }
        if let Some(status) = self.qr_status {
            cmd.push_str(&format!(" --qr-status {}", status));
        }
        cmd
    }
}

/// Mode invocation for a sub-agent, always starting at its step 1.
pub fn mode_invocation(
    mode_prefix: &str,
    module: &str,
    mode_total_steps: u32,
    fix_iteration: Option<u32>,
) -> String {
    let mut cmd = format!(
        "{}{} --step 1 --total-steps {}",
        mode_prefix, module, mode_total_steps
    );
    if let Some(iteration) = fix_iteration {
        cmd.push_str(&format!(" --qr-fail --qr-iteration {}", iteration));
    }
    cmd
}
