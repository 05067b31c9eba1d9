//! Step table listing for `planner steps`.

use anyhow::Result;

use planner::step::{StepKind, registry};

pub fn cmd_steps() -> Result<()> {
    println!();
    println!(
        "{:<8} {:<34} {:<11} Performed by",
        "Step", "Title", "Role"
    );
    println!(
        "{:<8} {:<34} {:<11} ------------",
        "--------", "----------------------------------", "-----------"
    );

    for step in registry().iter() {
        let performer = match &step.kind {
            StepKind::Gate(gate) => format!("gate for {} (fix: {})", gate.qr_name, gate.fixer),
            StepKind::Checkpoint => "user decision".to_string(),
            kind => kind
                .dispatch()
                .map(|d| d.agent.to_string())
                .unwrap_or_else(|| "orchestrator".to_string()),
        };
        let role = match &step.kind {
            StepKind::Gate(_) => console::style(format!("{:<11}", step.kind.role())).yellow(),
            StepKind::Qr { .. } => console::style(format!("{:<11}", step.kind.role())).cyan(),
            StepKind::Checkpoint => console::style(format!("{:<11}", step.kind.role())).magenta(),
            _ => console::style(format!("{:<11}", step.kind.role())),
        };
        println!(
            "{:<8} {:<34} {} {}",
            step.id.to_string(),
            step.title,
            role,
            console::style(performer).dim()
        );
    }
    println!();

    Ok(())
}
