//! Configuration management for typegen
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (typegen.toml)
//! - Environment variables (TYPEGEN_*)
//!
//! ## Example config file (typegen.toml):
//! ```toml
//! [codegen]
//! backend = "typescript"
//! file_header = "// Generated by typegen - DO NOT EDIT"
//!
//! [loader]
//! schema_dir = "./typeschema/hl7.fhir.r4.core"
//! skip_prefixes = ["target/", ".git/"]
//!
//! [output]
//! dir = "./generated"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::codegen::Backend;
use crate::loader::LoadConfig;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypegenConfig {
    /// Code generation settings
    #[serde(default)]
    pub codegen: CodegenSettings,

    /// Schema loading settings
    #[serde(default)]
    pub loader: LoaderSettings,

    /// Output settings
    #[serde(default)]
    pub output: OutputSettings,
}

/// Code generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodegenSettings {
    /// Target language backend
    #[serde(default)]
    pub backend: Backend,

    /// Line written at the top of every generated file
    #[serde(default = "default_file_header")]
    pub file_header: String,
}

/// Schema loading configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderSettings {
    /// Directory of TypeSchema JSON documents
    #[serde(default)]
    pub schema_dir: Option<PathBuf>,

    /// Skip files whose relative path starts with one of these
    #[serde(default = "default_skip_prefixes")]
    pub skip_prefixes: Vec<String>,

    /// Only load files whose relative path starts with one of these
    #[serde(default)]
    pub include_prefixes: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Directory generated files are written to
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

// Default value functions
fn default_file_header() -> String {
    "// Generated by typegen - DO NOT EDIT".to_string()
}

fn default_skip_prefixes() -> Vec<String> {
    LoadConfig::default().skip_prefixes
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated")
}

impl Default for CodegenSettings {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            file_header: default_file_header(),
        }
    }
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            schema_dir: None,
            skip_prefixes: default_skip_prefixes(),
            include_prefixes: Vec::new(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

impl LoaderSettings {
    /// Directory-loader filters for these settings
    pub fn load_config(&self) -> LoadConfig {
        LoadConfig {
            skip_prefixes: self.skip_prefixes.clone(),
            include_prefixes: self.include_prefixes.clone(),
        }
    }
}

impl TypegenConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the default locations
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["typegen.toml", ".typegen.toml", "config/typegen.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "typeschema", "typegen") {
            let xdg_config = config_dir.config_dir().join("typegen.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Environment variables (TYPEGEN_CODEGEN__BACKEND=rust)
        builder = builder.add_source(
            Environment::with_prefix("TYPEGEN")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
