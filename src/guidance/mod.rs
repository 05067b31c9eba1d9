//! Reusable instruction blocks inserted into step actions.
//!
//! These are opaque text payloads for the host; their wording is not part of
//! the routing contract, but their presence and order are.

pub mod resources;

use crate::agents::Dispatch;
use crate::gates::Fixer;
use crate::qr::QrState;

pub use resources::ResourceLoader;

/// Reminder that the orchestrator coordinates and does not do delegated work.
pub fn orchestrator_constraint() -> String {
    [
        "<orchestrator_constraint>",
        "You are the ORCHESTRATOR. Delegate this step; do not perform the sub-agent's work yourself.",
        "Pass context variables verbatim. Do not pre-digest, summarize or filter them.",
        "</orchestrator_constraint>",
    ]
    .join("\n")
}

/// Dispatch block for a collaborator.
///
/// `invoke_cmd` is the command the sub-agent must run first. In fix mode the
/// block also tells the sub-agent that QR findings in context drive its work.
pub fn subagent_dispatch(dispatch: &Dispatch, invoke_cmd: &str, qr: &QrState) -> String {
    let mut block = format!("<subagent_dispatch agent=\"{}\">\n", dispatch.agent);

    if !dispatch.context_vars.is_empty() {
        block.push_str("<context>\n");
        for (name, description) in dispatch.context_vars {
            block.push_str(&format!("  {}: {}\n", name, description));
        }
        block.push_str("</context>\n");
    }

    block.push_str(&format!("<invoke>{}</invoke>\n", invoke_cmd));

    if qr.failed {
        block.push_str(&format!(
            "<fix_mode iteration=\"{}\">\n\
             Include the QR findings from your context in the prompt.\n\
             The sub-agent addresses those findings instead of starting from scratch.\n\
             </fix_mode>\n",
            qr.iteration
        ));
    }

    block.push_str(&format!(
        "Launch the {} sub-agent with the context above. Its first action is the invoke command.\n",
        dispatch.agent
    ));
    block.push_str("</subagent_dispatch>");
    block
}

/// Banner at the top of QR steps.
pub fn qr_banner(qr_name: &str, qr: &QrState) -> String {
    if qr.is_reverification() {
        format!(
            "=== {} | iteration {} | RE-VERIFICATION ===\n\
             Verify the fixes from the previous iteration; report remaining issues only.",
            qr_name, qr.iteration
        )
    } else {
        format!("=== {} | iteration {} ===", qr_name, qr.iteration)
    }
}

/// Banner for steps running in a special mode (e.g. fix).
pub fn state_banner(label: &str, iteration: u32, mode: &str) -> String {
    format!("=== {} | iteration {} | mode: {} ===", label, iteration, mode)
}

/// Routing instructions appended to QR steps.
pub fn post_qr_routing(fixer: Fixer) -> String {
    let fix_line = match fixer.target() {
        None => "Findings are fixed by YOU (the orchestrator) directly in the plan file.".to_string(),
        Some(agent) => format!(
            "Findings are fixed by the {} sub-agent. Do NOT fix them yourself.",
            agent
        ),
    };
    [
        "<post_qr_routing>".to_string(),
        "Read the sub-agent's final verdict:".to_string(),
        "  PASS   -> run the if_pass command".to_string(),
        "  ISSUES -> run the if_fail command; keep the findings in context".to_string(),
        fix_line,
        "</post_qr_routing>".to_string(),
    ]
    .join("\n")
}
