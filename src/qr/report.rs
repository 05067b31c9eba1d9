//! Parsing of raw quality-reviewer output.
//!
//! The reviewer ends its run with a verdict token on its own line
//! (`PASS`, `ISSUES`, and for writers `COMPLETE` or `BLOCKED`), optionally
//! labelled (`Verdict: ISSUES`) or bolded (`**PASS**`). Findings are counted
//! from `<finding>` tags when present, otherwise from list lines that start
//! with `FINDING` or `ISSUE`.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};

use super::QrStatus;
use crate::agents::AgentOutcome;

static VERDICT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?mi)^[ \t]*(?:(?:verdict|result|status)[ \t]*[:=][ \t]*)?\**(PASS|ISSUES|FAIL|COMPLETE|BLOCKED)\**[ \t]*$",
    )
    .unwrap()
});

static FINDING_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<finding\b").unwrap());

static FINDING_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^[ \t]*(?:[-*]|\d+[.)])?[ \t]*\[?(?:finding|issue)\b").unwrap()
});

/// What could be recovered from a reviewer's output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QrReport {
    /// Last verdict token found, if any.
    pub outcome: Option<AgentOutcome>,
    /// Number of findings listed.
    pub findings: u32,
}

impl QrReport {
    /// Gate status implied by the verdict.
    pub fn status(&self) -> Option<QrStatus> {
        self.outcome.map(|outcome| {
            if outcome.is_success() {
                QrStatus::Pass
            } else {
                QrStatus::Fail
            }
        })
    }

    /// Read and parse a report file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read QR report: {}", path.display()))?;
        Ok(parse_report(&content))
    }
}

/// Extract the verdict and findings count from reviewer output.
pub fn parse_report(text: &str) -> QrReport {
    let outcome = VERDICT_REGEX
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .filter_map(|m| m.as_str().parse::<AgentOutcome>().ok())
        .last();

    let tagged = FINDING_TAG_REGEX.find_iter(text).count();
    let findings = if tagged > 0 {
        tagged
    } else {
        FINDING_LINE_REGEX.find_iter(text).count()
    };

    tracing::debug!(?outcome, findings, "parsed QR report");

    QrReport {
        outcome,
        findings: u32::try_from(findings).unwrap_or(u32::MAX),
    }
}
