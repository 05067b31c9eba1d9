//! Configuration file support for the planner.
//!
//! Settings are read from `.planner/planner.toml` (or a file given with
//! `--config`) and layered file → environment → CLI.
//!
//! # Configuration File Format
//!
//! ```toml
//! [project]
//! invoke_cmd = "planner"
//! mode_prefix = "python3 -m skills.planner."
//!
//! [defaults]
//! confidence_threshold = 80.0
//! format = "xml"
//!
//! [resources]
//! dir = "planner-resources"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;
use crate::qr::confidence::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::sequencer::{DEFAULT_INVOKE_CMD, DEFAULT_MODE_PREFIX};

/// Directory holding planner state inside a project.
pub const PLANNER_DIR: &str = ".planner";

/// Config file name inside [`PLANNER_DIR`].
pub const CONFIG_FILE: &str = "planner.toml";

pub const ENV_INVOKE_CMD: &str = "PLANNER_INVOKE_CMD";
pub const ENV_FORMAT: &str = "PLANNER_FORMAT";
pub const ENV_CONFIDENCE_THRESHOLD: &str = "PLANNER_CONFIDENCE_THRESHOLD";

const FILE_THRESHOLD_KEY: &str = "confidence_threshold in planner.toml";

/// Path of the `.planner` directory for a project.
pub fn get_planner_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(PLANNER_DIR)
}

/// How emitted commands are spelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSection {
    /// Program prefix of every next-step command
    #[serde(default = "default_invoke_cmd")]
    pub invoke_cmd: String,
    /// Prefix of sub-agent mode invocations
    #[serde(default = "default_mode_prefix")]
    pub mode_prefix: String,
}

fn default_invoke_cmd() -> String {
    DEFAULT_INVOKE_CMD.to_string()
}

fn default_mode_prefix() -> String {
    DEFAULT_MODE_PREFIX.to_string()
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            invoke_cmd: default_invoke_cmd(),
            mode_prefix: default_mode_prefix(),
        }
    }
}

/// Defaults for per-invocation flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsSection {
    /// Percentage below which QR confidence is flagged
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_confidence_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            format: OutputFormat::default(),
        }
    }
}

/// Where resource overrides live.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourcesSection {
    /// Directory whose files replace embedded resources of the same name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// The complete planner.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerToml {
    #[serde(default)]
    pub project: ProjectSection,
    #[serde(default)]
    pub defaults: DefaultsSection,
    #[serde(default)]
    pub resources: ResourcesSection,
}

impl PlannerToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse planner.toml")
    }

    /// Load `planner.toml` from `planner_dir`, or defaults if it is missing.
    pub fn load_or_default(planner_dir: &Path) -> Result<Self> {
        let config_path = planner_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize planner.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Invoke command, with the environment taking precedence over the file.
    pub fn invoke_cmd(&self) -> String {
        std::env::var(ENV_INVOKE_CMD).unwrap_or_else(|_| self.project.invoke_cmd.clone())
    }

    /// Output format (env → file).
    pub fn format(&self) -> Result<OutputFormat> {
        match std::env::var(ENV_FORMAT) {
            Ok(value) => value
                .parse()
                .with_context(|| format!("Invalid {}", ENV_FORMAT)),
            Err(_) => Ok(self.defaults.format),
        }
    }

    /// Confidence threshold (env → file), checked against 0-100.
    pub fn confidence_threshold(&self) -> Result<f64> {
        match std::env::var(ENV_CONFIDENCE_THRESHOLD) {
            Ok(value) => {
                let threshold = value.trim().parse::<f64>().with_context(|| {
                    format!("Invalid {} '{}'", ENV_CONFIDENCE_THRESHOLD, value)
                })?;
                check_threshold(threshold, ENV_CONFIDENCE_THRESHOLD)
            }
            Err(_) => check_threshold(self.defaults.confidence_threshold, FILE_THRESHOLD_KEY),
        }
    }

    /// Validate the configuration.
    ///
    /// Values that would fail every invocation are errors; anything else
    /// questionable is returned as a warning. Relative resource directories
    /// are resolved against `base_dir`.
    pub fn validate(&self, base_dir: &Path) -> Result<Vec<String>> {
        check_threshold(self.defaults.confidence_threshold, FILE_THRESHOLD_KEY)?;

        let mut warnings = Vec::new();

        if self.project.invoke_cmd.trim().is_empty() {
            warnings.push("invoke_cmd is empty: emitted commands would not run".to_string());
        }

        if let Some(dir) = &self.resources.dir {
            let resolved = base_dir.join(dir);
            if !resolved.is_dir() {
                warnings.push(format!(
                    "Resources directory '{}' does not exist",
                    resolved.display()
                ));
            }
        }

        Ok(warnings)
    }
}

fn check_threshold(value: f64, source: &str) -> Result<f64> {
    if !(0.0..=100.0).contains(&value) {
        anyhow::bail!("{} must be within 0-100, got {}", source, value);
    }
    Ok(value)
}

/// Serialises tests that touch `PLANNER_*` environment variables.
#[cfg(test)]
pub(crate) static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_empty_uses_defaults() {
        let toml = PlannerToml::parse("").unwrap();
        assert_eq!(toml.project.invoke_cmd, "planner");
        assert_eq!(toml.project.mode_prefix, "python3 -m skills.planner.");
        assert_eq!(toml.defaults.confidence_threshold, 80.0);
        assert_eq!(toml.defaults.format, OutputFormat::Xml);
        assert!(toml.resources.dir.is_none());
    }

    #[test]
    fn test_parse_all_sections() {
        let content = r#"
[project]
invoke_cmd = "uv run planner"
mode_prefix = "planner-mode "

[defaults]
confidence_threshold = 65.5
format = "json"

[resources]
dir = "overrides"
"#;
        let toml = PlannerToml::parse(content).unwrap();
        assert_eq!(toml.project.invoke_cmd, "uv run planner");
        assert_eq!(toml.project.mode_prefix, "planner-mode ");
        assert_eq!(toml.defaults.confidence_threshold, 65.5);
        assert_eq!(toml.defaults.format, OutputFormat::Json);
        assert_eq!(toml.resources.dir, Some(PathBuf::from("overrides")));
    }

    #[test]
    fn test_parse_invalid_format_fails() {
        let result = PlannerToml::parse("[defaults]\nformat = \"yaml\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = std::env::var(ENV_INVOKE_CMD).ok();

        unsafe { std::env::remove_var(ENV_INVOKE_CMD) };
        let toml = PlannerToml::parse("[project]\ninvoke_cmd = \"from-file\"\n").unwrap();
        assert_eq!(toml.invoke_cmd(), "from-file");

        unsafe { std::env::set_var(ENV_INVOKE_CMD, "from-env") };
        assert_eq!(toml.invoke_cmd(), "from-env");

        match saved {
            Some(val) => unsafe { std::env::set_var(ENV_INVOKE_CMD, val) },
            None => unsafe { std::env::remove_var(ENV_INVOKE_CMD) },
        }
    }

    #[test]
    fn test_env_threshold_must_parse() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = std::env::var(ENV_CONFIDENCE_THRESHOLD).ok();

        unsafe { std::env::set_var(ENV_CONFIDENCE_THRESHOLD, "high") };
        assert!(PlannerToml::default().confidence_threshold().is_err());

        unsafe { std::env::set_var(ENV_CONFIDENCE_THRESHOLD, "150") };
        let err = PlannerToml::default().confidence_threshold().unwrap_err();
        assert!(err.to_string().contains(ENV_CONFIDENCE_THRESHOLD));

        unsafe { std::env::set_var(ENV_CONFIDENCE_THRESHOLD, "70") };
        assert_eq!(PlannerToml::default().confidence_threshold().unwrap(), 70.0);

        match saved {
            Some(val) => unsafe { std::env::set_var(ENV_CONFIDENCE_THRESHOLD, val) },
            None => unsafe { std::env::remove_var(ENV_CONFIDENCE_THRESHOLD) },
        }
    }

    #[test]
    fn test_validate() {
        let dir = tempdir().unwrap();
        assert!(PlannerToml::default().validate(dir.path()).unwrap().is_empty());

        let mut toml = PlannerToml::default();
        toml.project.invoke_cmd = "  ".to_string();
        toml.resources.dir = Some(PathBuf::from("missing"));
        let warnings = toml.validate(dir.path()).unwrap();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("invoke_cmd"));
        assert!(warnings[1].contains("does not exist"));
    }

    #[test]
    fn test_out_of_range_file_threshold_is_an_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = std::env::var(ENV_CONFIDENCE_THRESHOLD).ok();
        unsafe { std::env::remove_var(ENV_CONFIDENCE_THRESHOLD) };

        let dir = tempdir().unwrap();
        let toml = PlannerToml::parse("[defaults]\nconfidence_threshold = 120.0\n").unwrap();
        let err = toml.validate(dir.path()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "confidence_threshold in planner.toml must be within 0-100, got 120"
        );
        assert!(toml.confidence_threshold().is_err());

        if let Some(val) = saved {
            unsafe { std::env::set_var(ENV_CONFIDENCE_THRESHOLD, val) };
        }
    }

    #[test]
    fn test_load_and_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let mut toml = PlannerToml::default();
        toml.project.invoke_cmd = "custom".to_string();
        toml.defaults.format = OutputFormat::Json;
        toml.save(&path).unwrap();

        let loaded = PlannerToml::load(&path).unwrap();
        assert_eq!(loaded.project.invoke_cmd, "custom");
        assert_eq!(loaded.defaults.format, OutputFormat::Json);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempdir().unwrap();
        let toml = PlannerToml::load_or_default(dir.path()).unwrap();
        assert_eq!(toml.project.invoke_cmd, "planner");
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let dir = tempdir().unwrap();
        let err = PlannerToml::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
