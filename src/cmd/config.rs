//! Configuration view and validation commands for `planner config`.

use anyhow::Result;
use std::path::Path;

use super::super::ConfigCommands;

pub fn cmd_config(
    project_dir: &Path,
    config_file: Option<&Path>,
    command: Option<ConfigCommands>,
) -> Result<()> {
    use planner::config::{CliOverrides, Config};
    use planner::planner_config::{PlannerToml, get_planner_dir};

    let planner_dir = get_planner_dir(project_dir);
    let config_path = match config_file {
        Some(path) => path.to_path_buf(),
        None => Config::default_config_path(project_dir),
    };

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Planner Configuration");
            println!("=====================");
            println!();

            let toml = if config_path.exists() {
                println!("Config file: {}", config_path.display());
                PlannerToml::load(&config_path)?
            } else {
                println!("No planner.toml found at {}", config_path.display());
                println!("Using default configuration.");
                PlannerToml::default()
            };
            println!();

            println!("[project]");
            println!("  invoke_cmd = \"{}\"", toml.project.invoke_cmd);
            println!("  mode_prefix = \"{}\"", toml.project.mode_prefix);
            println!();
            println!("[defaults]");
            println!(
                "  confidence_threshold = {}",
                toml.defaults.confidence_threshold
            );
            println!("  format = \"{}\"", toml.defaults.format);
            println!();
            if let Some(dir) = &toml.resources.dir {
                println!("[resources]");
                println!("  dir = \"{}\"", dir.display());
                println!();
            }

            // Show effective values (including env overrides)
            println!("Effective values (with env overrides):");
            let config = Config::new(
                project_dir.to_path_buf(),
                CliOverrides {
                    config_file: config_file.map(Path::to_path_buf),
                    ..Default::default()
                },
            )?;
            println!("  invoke_cmd = \"{}\"", config.invoke_cmd);
            println!("  confidence_threshold = {}", config.confidence_threshold);
            println!("  format = \"{}\"", config.format);
            if let Some(dir) = &config.resources_dir {
                println!("  resources_dir = \"{}\"", dir.display());
            }
            println!();

            if !config_path.exists() {
                println!("Run 'planner config init' to create a planner.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No planner.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = PlannerToml::load(&config_path)?;
            let warnings = toml.validate(project_dir)?;

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("planner.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if config_file.is_none() && !planner_dir.exists() {
                std::fs::create_dir_all(&planner_dir)?;
            }

            PlannerToml::default().save(&config_path)?;

            println!("Created planner.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [project] invoke_cmd, mode_prefix");
            println!("  - [defaults] confidence_threshold, format");
            println!("  - [resources] dir to override embedded guidance files");
            println!();
        }
    }

    Ok(())
}
