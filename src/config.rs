//! Configuration Management
//!
//! Handles persistent configuration storage for dataproj.

use anyhow::Result;
use clap::ValueEnum;
use dataproj::resource::Import;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Deployment document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Project used when neither the CLI nor the spec names one
    #[serde(default)]
    pub project_id: Option<String>,
    /// Default output format
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
    /// Template imports added to every deployment
    #[serde(default)]
    pub imports: Vec<Import>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("dataproj").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                tracing::warn!("Failed to read {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Parse config JSON, falling back to defaults when malformed
    fn parse(content: &str) -> Self {
        serde_json::from_str(content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed config: {}", e);
            Self::default()
        })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Project to compile for (CLI > spec file > config).
    ///
    /// Returns `None` when the spec's own project id should be used or no
    /// project is known at all.
    pub fn effective_project(&self, cli: Option<&str>, spec: Option<&str>) -> Option<String> {
        match (cli, spec) {
            (Some(project), _) => Some(project.to_string()),
            (None, Some(_)) => None,
            (None, None) => self.project_id.clone(),
        }
    }

    /// Get effective output format (CLI > config > yaml)
    pub fn effective_format(&self, cli: Option<OutputFormat>) -> OutputFormat {
        cli.or(self.output_format).unwrap_or_default()
    }

    /// Set project and save
    pub fn set_project(&mut self, project_id: &str) -> Result<()> {
        self.project_id = Some(project_id.to_string());
        self.save()
    }
}
