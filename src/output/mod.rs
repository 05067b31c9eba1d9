//! Rendering of routing results for the invoking host.
//!
//! Two projections exist: the XML-style text the host reads by default, and
//! JSON for tooling. Both are deterministic. Neither makes routing decisions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::sequencer::{Next, Routing};

/// Notice printed above the first step of a workflow.
const WORKFLOW_NOTICE: &str = "\
This is a 13-step planning workflow with QR gates.
Invoke each next command EXACTLY as given; gate steps need --qr-status.
Do not skip steps. Iteration counters travel in the commands.";

/// Payload format written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Xml,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Xml => write!(f, "xml"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xml" => Ok(OutputFormat::Xml),
            "json" => Ok(OutputFormat::Json),
            _ => anyhow::bail!("Invalid output format '{}'. Valid values: xml, json", s),
        }
    }
}

/// Render `routing` in the requested format.
pub fn render(routing: &Routing, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Xml => Ok(render_xml(routing)),
        OutputFormat::Json => render_json(routing),
    }
}

pub fn render_json(routing: &Routing) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(routing)?)
}

/// XML-style text. Action payloads are emitted verbatim; they carry their
/// own markup.
pub fn render_xml(routing: &Routing) -> String {
    let mut out = format!(
        "<planner_step script=\"planner\" step=\"{}\" total=\"{}\">\n",
        routing.step, routing.total_steps
    );
    out.push_str(&format!("<title>{}</title>\n", routing.title));

    if routing.is_step_one() {
        out.push_str("<workflow_notice>\n");
        out.push_str(WORKFLOW_NOTICE);
        out.push_str("\n</workflow_notice>\n");
    }

    out.push_str("<actions>\n");
    for action in &routing.actions {
        out.push_str(action);
        out.push('\n');
    }
    out.push_str("</actions>\n");

    out.push_str("<invoke_after>\n");
    match &routing.next {
        Next::Command { command } => {
            out.push_str(&format!("<next>{}</next>\n", command));
        }
        Next::Branch { if_pass, if_fail } => {
            out.push_str(&format!("<if_pass>{}</if_pass>\n", if_pass));
            out.push_str(&format!("<if_fail>{}</if_fail>\n", if_fail));
        }
        Next::Decision { options } => {
            out.push_str("<decision_required>\n");
            for option in options {
                match &option.command {
                    Some(command) => out.push_str(&format!(
                        "<option name=\"{}\" command=\"{}\">{}</option>\n",
                        option.name, command, option.description
                    )),
                    None => out.push_str(&format!(
                        "<option name=\"{}\">{}</option>\n",
                        option.name, option.description
                    )),
                }
            }
            out.push_str("</decision_required>\n");
        }
        Next::Complete { message } => {
            out.push_str(&format!("<workflow_complete>{}</workflow_complete>\n", message));
        }
    }
    out.push_str("</invoke_after>\n");
    out.push_str("</planner_step>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::{DecisionOption, Routing};
    use crate::step::StepId;

    fn routing(step: StepId, next: Next) -> Routing {
        Routing {
            step,
            total_steps: 13,
            title: "Title".to_string(),
            actions: vec!["DO THIS".to_string(), "<block>kept</block>".to_string()],
            next,
        }
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("xml".parse::<OutputFormat>().unwrap(), OutputFormat::Xml);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::default(), OutputFormat::Xml);
    }

    #[test]
    fn test_xml_single_command() {
        let out = render_xml(&routing(
            StepId::Numbered(2),
            Next::Command {
                command: "planner --step 3 --total-steps 13".to_string(),
            },
        ));
        assert!(out.starts_with("<planner_step script=\"planner\" step=\"2\" total=\"13\">"));
        assert!(out.contains("<title>Title</title>"));
        assert!(out.contains("<block>kept</block>"));
        assert!(out.contains("<next>planner --step 3 --total-steps 13</next>"));
        assert!(!out.contains("<workflow_notice>"));
        assert!(out.ends_with("</planner_step>"));
    }

    #[test]
    fn test_xml_first_step_has_notice() {
        let out = render_xml(&routing(
            StepId::Numbered(1),
            Next::Command {
                command: "x".to_string(),
            },
        ));
        assert!(out.contains("<workflow_notice>"));
    }

    #[test]
    fn test_xml_branch_and_checkpoint_id() {
        let out = render_xml(&routing(
            StepId::Checkpoint,
            Next::Branch {
                if_pass: "p".to_string(),
                if_fail: "f".to_string(),
            },
        ));
        assert!(out.contains("step=\"review\""));
        assert!(out.contains("<if_pass>p</if_pass>"));
        assert!(out.contains("<if_fail>f</if_fail>"));
    }

    #[test]
    fn test_xml_decision_options() {
        let out = render_xml(&routing(
            StepId::Numbered(7),
            Next::Decision {
                options: vec![
                    DecisionOption {
                        name: "Fix",
                        description: "[Fix] again".to_string(),
                        command: Some("planner --step 5".to_string()),
                    },
                    DecisionOption {
                        name: "Abort",
                        description: "[Abort] stop".to_string(),
                        command: None,
                    },
                ],
            },
        ));
        assert!(out.contains("<option name=\"Fix\" command=\"planner --step 5\">[Fix] again</option>"));
        assert!(out.contains("<option name=\"Abort\">[Abort] stop</option>"));
    }

    #[test]
    fn test_json_projection() {
        let out = render_json(&routing(
            StepId::Numbered(13),
            Next::Complete {
                message: "PLAN APPROVED.".to_string(),
            },
        ))
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["step"], 13);
        assert_eq!(value["next"]["kind"], "complete");
        assert_eq!(value["next"]["message"], "PLAN APPROVED.");
    }

    #[test]
    fn test_render_is_deterministic() {
        let r = routing(
            StepId::Numbered(6),
            Next::Branch {
                if_pass: "p".to_string(),
                if_fail: "f".to_string(),
            },
        );
        assert_eq!(
            render(&r, OutputFormat::Xml).unwrap(),
            render(&r, OutputFormat::Xml).unwrap()
        );
    }
}
