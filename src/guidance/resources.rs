//! Long-form guidance text shipped with the binary.
//!
//! Files under `resources/` are embedded at build time. A resources
//! directory configured in `planner.toml` can replace any of them by name.

use rust_embed::RustEmbed;
use std::path::PathBuf;

use crate::errors::PlannerError;

#[derive(RustEmbed)]
#[folder = "resources/"]
struct Embedded;

/// Resolves resource names to their text.
#[derive(Debug, Clone, Default)]
pub struct ResourceLoader {
    override_dir: Option<PathBuf>,
}

impl ResourceLoader {
    /// Loader that only serves embedded resources.
    pub fn embedded() -> Self {
        Self::default()
    }

    /// Loader that prefers files in `dir` over embedded ones.
    pub fn with_override_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            override_dir: Some(dir.into()),
        }
    }

    /// Load a resource by file name.
    pub fn load(&self, name: &str) -> Result<String, PlannerError> {
        if let Some(dir) = &self.override_dir {
            let path = dir.join(name);
            if path.is_file() {
                tracing::debug!(path = %path.display(), "using resource override");
                return std::fs::read_to_string(&path).map_err(|source| PlannerError::Resource {
                    name: name.to_string(),
                    source,
                });
            }
        }

        let file = Embedded::get(name).ok_or_else(|| PlannerError::Resource {
            name: name.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no embedded resource"),
        })?;

        String::from_utf8(file.data.into_owned()).map_err(|e| PlannerError::Resource {
            name: name.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })
    }

    /// Names of all embedded resources.
    pub fn embedded_names() -> Vec<String> {
        let mut names: Vec<String> = Embedded::iter().map(|n| n.into_owned()).collect();
        names.sort();
        names
    }
}
