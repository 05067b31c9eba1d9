use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::guidance::ResourceLoader;
use crate::output::OutputFormat;
use crate::planner_config::{CONFIG_FILE, PlannerToml, get_planner_dir};
use crate::sequencer::Sequencer;

/// Values given on the command line; `None` leaves the lower layers in charge.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub format: Option<OutputFormat>,
    pub confidence_threshold: Option<f64>,
    pub config_file: Option<PathBuf>,
}

/// Runtime configuration for one planner invocation.
///
/// Bridges `planner.toml` with the sequencer: resolves the config file,
/// applies environment and CLI overrides, and resolves the resources
/// directory against the project.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    /// Config file that was loaded, if any
    pub config_file: Option<PathBuf>,
    pub invoke_cmd: String,
    pub mode_prefix: String,
    pub confidence_threshold: f64,
    pub format: OutputFormat,
    pub resources_dir: Option<PathBuf>,
    toml: PlannerToml,
}

impl Config {
    /// Load configuration for `project_dir`.
    ///
    /// An explicit `--config` file must exist; the default
    /// `.planner/planner.toml` is optional.
    pub fn new(project_dir: PathBuf, cli: CliOverrides) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;

        let (toml, config_file) = match cli.config_file {
            Some(path) => (PlannerToml::load(&path)?, Some(path)),
            None => {
                let default_path = Self::default_config_path(&project_dir);
                let toml = PlannerToml::load_or_default(&get_planner_dir(&project_dir))?;
                (toml, default_path.exists().then_some(default_path))
            }
        };

        let format = match cli.format {
            Some(format) => format,
            None => toml.format()?,
        };
        // A bad file or env threshold is rejected even when the CLI overrides it
        let layered_threshold = toml.confidence_threshold()?;
        let confidence_threshold = cli.confidence_threshold.unwrap_or(layered_threshold);
        let resources_dir = toml
            .resources
            .dir
            .as_ref()
            .map(|dir| project_dir.join(dir));

        tracing::debug!(
            config = ?config_file,
            %format,
            confidence_threshold,
            "configuration loaded"
        );

        Ok(Self {
            invoke_cmd: toml.invoke_cmd(),
            mode_prefix: toml.project.mode_prefix.clone(),
            project_dir,
            config_file,
            confidence_threshold,
            format,
            resources_dir,
            toml,
        })
    }

    /// `.planner/planner.toml` under `project_dir`.
    pub fn default_config_path(project_dir: &Path) -> PathBuf {
        get_planner_dir(project_dir).join(CONFIG_FILE)
    }

    pub fn resources(&self) -> ResourceLoader {
        match &self.resources_dir {
            Some(dir) => ResourceLoader::with_override_dir(dir),
            None => ResourceLoader::embedded(),
        }
    }

    /// Sequencer configured with this invocation's command spelling and resources.
    pub fn sequencer(&self) -> Sequencer {
        Sequencer::new(&self.invoke_cmd, &self.mode_prefix).with_resources(self.resources())
    }

    pub fn validate(&self) -> Result<Vec<String>> {
        self.toml.validate(&self.project_dir)
    }
}
