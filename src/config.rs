use crate::annotate::{MatchStrategy, OffsetUnit, UnlocatedPolicy};
use crate::text::DEFAULT_MARKER;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const LOCAL_CONFIG_FILE: &str = ".annotext.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_context_radius")]
    pub context_radius: usize,

    #[serde(default)]
    pub match_strategy: MatchStrategy,

    #[serde(default)]
    pub unlocated_policy: UnlocatedPolicy,

    #[serde(default)]
    pub offset_unit: OffsetUnit,

    #[serde(default = "default_max_text_len")]
    pub max_text_len: usize,

    #[serde(default = "default_redaction_marker")]
    pub redaction_marker: String,
}

fn default_model() -> String {
    "local".to_string()
}

fn default_language() -> String {
    "en_US".to_string()
}

fn default_context_radius() -> usize {
    10
}

fn default_max_text_len() -> usize {
    100_000
}

fn default_redaction_marker() -> String {
    DEFAULT_MARKER.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            language: default_language(),
            context_radius: default_context_radius(),
            match_strategy: MatchStrategy::default(),
            unlocated_policy: UnlocatedPolicy::default(),
            offset_unit: OffsetUnit::default(),
            max_text_len: default_max_text_len(),
            redaction_marker: default_redaction_marker(),
        }
    }
}

/// Values given on the command line; `None` leaves the file/default value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model: Option<String>,
    pub language: Option<String>,
    pub context_radius: Option<usize>,
    pub match_strategy: Option<MatchStrategy>,
    pub unlocated_policy: Option<UnlocatedPolicy>,
    pub offset_unit: Option<OffsetUnit>,
}

/// One config file. Only the keys present in the file are `Some`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigLayer {
    pub model: Option<String>,
    pub language: Option<String>,
    pub context_radius: Option<usize>,
    pub match_strategy: Option<MatchStrategy>,
    pub unlocated_policy: Option<UnlocatedPolicy>,
    pub offset_unit: Option<OffsetUnit>,
    pub max_text_len: Option<usize>,
    pub redaction_marker: Option<String>,
}

impl ConfigLayer {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

impl Config {
    /// Load configuration with priority: CLI args > local config > global config > defaults
    pub fn load(overrides: Overrides) -> Result<Self> {
        let global_path = Self::global_config_path();
        Self::load_from(
            global_path.as_deref(),
            Path::new(LOCAL_CONFIG_FILE),
            overrides,
        )
    }

    /// Layer the given global and local files over the defaults, then apply `overrides`.
    pub fn load_from(global_path: Option<&Path>, local_path: &Path, overrides: Overrides) -> Result<Self> {
        let mut config = Self::default();

        // Load global config
        if let Some(global_path) = global_path {
            if global_path.exists() {
                config = config.merge(ConfigLayer::from_file(global_path)?);
            }
        }

        // Load local config (overrides global)
        if local_path.exists() {
            config = config.merge(ConfigLayer::from_file(local_path)?);
        }

        Ok(config.apply(overrides))
    }

    /// A single config file layered over the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::default().merge(ConfigLayer::from_file(path)?))
    }

    fn merge(mut self, layer: ConfigLayer) -> Self {
        if let Some(model) = layer.model {
            self.model = model;
        }
        if let Some(language) = layer.language {
            self.language = language;
        }
        if let Some(radius) = layer.context_radius {
            self.context_radius = radius;
        }
        if let Some(strategy) = layer.match_strategy {
            self.match_strategy = strategy;
        }
        if let Some(policy) = layer.unlocated_policy {
            self.unlocated_policy = policy;
        }
        if let Some(unit) = layer.offset_unit {
            self.offset_unit = unit;
        }
        if let Some(limit) = layer.max_text_len {
            self.max_text_len = limit;
        }
        if let Some(marker) = layer.redaction_marker {
            self.redaction_marker = marker;
        }
        self
    }

    fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(model) = overrides.model {
            self.model = model;
        }
        if let Some(language) = overrides.language {
            self.language = language;
        }
        if let Some(radius) = overrides.context_radius {
            self.context_radius = radius;
        }
        if let Some(strategy) = overrides.match_strategy {
            self.match_strategy = strategy;
        }
        if let Some(policy) = overrides.unlocated_policy {
            self.unlocated_policy = policy;
        }
        if let Some(unit) = overrides.offset_unit {
            self.offset_unit = unit;
        }
        self
    }

    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "annotext").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
