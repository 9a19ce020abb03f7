use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::context::{DEFAULT_RUNTIME, FIELD_NAMESPACE};

/// Configuration stored in `schemast.toml` at the project root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemastConfig {
    #[serde(default)]
    pub schema: SchemaSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSettings {
    /// Directory holding the schema package, relative to the project root.
    #[serde(default = "default_schema_dir")]
    pub dir: String,
    /// Crate path of the schema runtime, used in scaffolded imports.
    #[serde(default = "default_runtime")]
    pub runtime: String,
    /// Module under which field constructors live.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            dir: default_schema_dir(),
            runtime: default_runtime(),
            namespace: default_namespace(),
        }
    }
}

fn default_schema_dir() -> String {
    "src/schema".to_string()
}

fn default_runtime() -> String {
    DEFAULT_RUNTIME.to_string()
}

fn default_namespace() -> String {
    FIELD_NAMESPACE.to_string()
}

impl SchemastConfig {
    pub const FILE_NAME: &'static str = "schemast.toml";

    /// Load configuration from an explicit file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load `schemast.toml` from `root`, falling back to defaults when absent.
    pub fn from_root(root: &Path) -> Result<Self> {
        let path = root.join(Self::FILE_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}
