//! Quality review (QR) state and outcomes.
//!
//! The caller reports what the quality reviewer said; the planner turns that
//! into a [`QrOutcome`] for the gate it is evaluating. Nothing here is
//! remembered between invocations: the iteration count travels with the
//! caller's cursor.

pub mod confidence;
pub mod report;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::errors::PlannerError;

pub use report::{QrReport, parse_report};

/// Status token passed to gate steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QrStatus {
    Pass,
    Fail,
}

impl QrStatus {
    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for QrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QrStatus {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pass" => Ok(Self::Pass),
            "fail" | "issues" => Ok(Self::Fail),
            _ => Err(PlannerError::InvalidQrStatus { raw: s.to_string() }),
        }
    }
}

/// QR fields of the caller-held cursor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QrState {
    /// 1-based iteration of the current QR loop.
    pub iteration: u32,
    /// Set when the step is being revisited to fix QR findings.
    pub failed: bool,
    /// Outcome token, required on gate steps.
    pub status: Option<QrStatus>,
    /// Number of findings, when the caller knows it.
    pub findings: Option<u32>,
}

impl Default for QrState {
    fn default() -> Self {
        Self {
            iteration: 1,
            failed: false,
            status: None,
            findings: None,
        }
    }
}

impl QrState {
    pub fn new(iteration: u32) -> Self {
        Self {
            iteration,
            ..Default::default()
        }
    }

    pub fn with_failed(mut self, failed: bool) -> Self {
        self.failed = failed;
        self
    }

    pub fn with_status(mut self, status: QrStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_findings(mut self, findings: u32) -> Self {
        self.findings = Some(findings);
        self
    }

    /// Whether this is a re-run inside a QR loop.
    pub fn is_reverification(&self) -> bool {
        self.iteration > 1
    }
}

/// Result of one quality-check invocation, as seen by a gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QrOutcome {
    pub iteration: u32,
    pub passed: bool,
    /// Raw token the caller supplied, kept for status messages.
    pub status: Option<String>,
    pub findings: Option<u32>,
}

impl QrOutcome {
    pub fn passed(iteration: u32) -> Self {
        Self {
            iteration,
            passed: true,
            status: Some(QrStatus::Pass.to_string()),
            findings: None,
        }
    }

    pub fn failed(iteration: u32) -> Self {
        Self {
            iteration,
            passed: false,
            status: Some(QrStatus::Fail.to_string()),
            findings: None,
        }
    }

    pub fn with_findings(mut self, findings: u32) -> Self {
        self.findings = Some(findings);
        self
    }

    pub fn is_failed(&self) -> bool {
        !self.passed
    }

    /// Confidence derived from the findings count, if one was reported.
    pub fn confidence(&self) -> Option<f64> {
        self.findings
            .map(|count| confidence::score(self.passed, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("pass".parse::<QrStatus>().unwrap(), QrStatus::Pass);
        assert_eq!("FAIL".parse::<QrStatus>().unwrap(), QrStatus::Fail);
        assert_eq!("issues".parse::<QrStatus>().unwrap(), QrStatus::Fail);
        assert!(matches!(
            "maybe".parse::<QrStatus>(),
            Err(PlannerError::InvalidQrStatus { .. })
        ));
    }

    #[test]
    fn test_state_defaults_to_first_iteration() {
        let state = QrState::default();
        assert_eq!(state.iteration, 1);
        assert!(!state.failed);
        assert!(state.status.is_none());
        assert!(!state.is_reverification());
    }

    #[test]
    fn test_outcome_confidence_requires_findings() {
        assert_eq!(QrOutcome::failed(1).confidence(), None);
        assert_eq!(QrOutcome::failed(1).with_findings(4).confidence(), Some(80.0));
        assert_eq!(QrOutcome::passed(2).with_findings(4).confidence(), Some(100.0));
    }
}
