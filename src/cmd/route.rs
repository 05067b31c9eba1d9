//! Step routing: the default `planner --step N --total-steps T` invocation.

use anyhow::{Context, Result};
use std::path::PathBuf;

use planner::config::{CliOverrides, Config};
use planner::output::{self, OutputFormat};
use planner::qr::{QrReport, QrState, QrStatus};
use planner::sequencer::StepRequest;
use planner::step::StepId;

use super::super::Cli;

pub fn cmd_route(cli: &Cli, project_dir: PathBuf) -> Result<()> {
    let format = cli
        .format
        .as_deref()
        .map(str::parse::<OutputFormat>)
        .transpose()?;
    let config = Config::new(
        project_dir,
        CliOverrides {
            format,
            confidence_threshold: cli.qr_confidence_threshold,
            config_file: cli.config.clone(),
        },
    )?;

    let request = build_request(cli, &config)?;
    let routing = config.sequencer().route(&request)?;

    // Render fully before printing so failures leave stdout empty
    let rendered = output::render(&routing, config.format)?;
    println!("{}", rendered);
    Ok(())
}

/// Merge explicit flags with the QR report, if one was given.
///
/// Explicit `--qr-status` and `--qr-findings` take precedence over the report.
fn build_request(cli: &Cli, config: &Config) -> Result<StepRequest> {
    let step: StepId = cli
        .step
        .as_deref()
        .context("--step is required")?
        .parse()?;
    let total_steps = cli.total_steps.context("--total-steps is required")?;

    let report = cli.qr_report.as_deref().map(QrReport::load).transpose()?;

    let status = match cli.qr_status.as_deref() {
        Some(raw) => Some(raw.parse::<QrStatus>()?),
        None => report.as_ref().and_then(QrReport::status),
    };
    let findings = cli
        .qr_findings
        .or_else(|| report.as_ref().map(|r| r.findings));

    let mut qr = QrState::new(cli.qr_iteration).with_failed(cli.qr_fail);
    if let Some(status) = status {
        qr = qr.with_status(status);
    }
    if let Some(findings) = findings {
        qr = qr.with_findings(findings);
    }

    Ok(StepRequest::new(step, total_steps)
        .with_qr(qr)
        .with_confidence_threshold(config.confidence_threshold))
}
