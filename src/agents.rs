//! Dispatch targets.
//!
//! Sub-agents are opaque: the planner tells them where to start and which
//! context to carry, and later reads back a single outcome token. It never
//! looks inside their own workflows.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A downstream performer that a step delegates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Collaborator {
    Explore,
    Developer,
    TechnicalWriter,
    QualityReviewer,
}

impl Collaborator {
    /// Agent name as the host knows it.
    pub fn agent_name(&self) -> &'static str {
        match self {
            Self::Explore => "Explore",
            Self::Developer => "developer",
            Self::TechnicalWriter => "technical-writer",
            Self::QualityReviewer => "quality-reviewer",
        }
    }
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.agent_name())
    }
}

/// Static description of how a step hands work to a collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub agent: Collaborator,
    /// Module path of the collaborator's own workflow, relative to the mode prefix.
    pub mode_module: &'static str,
    /// Number of steps in the collaborator's own workflow.
    pub mode_total_steps: u32,
    /// Named variables the collaborator expects, with a description of each.
    pub context_vars: &'static [(&'static str, &'static str)],
    /// Lines appended after the dispatch block.
    pub post_dispatch: &'static [&'static str],
}

/// Outcome tokens reported back by collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AgentOutcome {
    Pass,
    Issues,
    Complete,
    Blocked,
}

impl AgentOutcome {
    /// Whether the outcome lets the workflow move forward without a fix.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Pass | Self::Complete)
    }
}

impl fmt::Display for AgentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pass => "PASS",
            Self::Issues => "ISSUES",
            Self::Complete => "COMPLETE",
            Self::Blocked => "BLOCKED",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for AgentOutcome {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PASS" => Ok(Self::Pass),
            "ISSUES" | "FAIL" => Ok(Self::Issues),
            "COMPLETE" => Ok(Self::Complete),
            "BLOCKED" => Ok(Self::Blocked),
            _ => anyhow::bail!(
                "Invalid outcome '{}'. Valid values: PASS, ISSUES, COMPLETE, BLOCKED",
                s
            ),
        }
    }
}
