//! Engine configuration and its layered resolution.
//!
//! Precedence, highest first: explicit overrides (CLI flags), environment,
//! `--config` file, `./chronicle.toml`, the user file under
//! `<config_dir>/chronicle/config.toml`, built-in defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{EngineError, EngineResult};

pub const MAX_EVENTS_LIMIT: usize = 5000;
pub const MAX_WORKERS: usize = 64;

pub const ENV_THRESHOLD: &str = "CHRONICLE_RELATION_THRESHOLD";
pub const ENV_MAX_EVENTS: &str = "CHRONICLE_MAX_EVENTS";
pub const ENV_WINDOW: &str = "CHRONICLE_WINDOW";
pub const ENV_WORKERS: &str = "CHRONICLE_WORKERS";

const PROJECT_FILE: &str = "chronicle.toml";

/// Construction and query tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_relation_threshold")]
    pub relation_threshold: f64,
    #[serde(default = "default_max_events")]
    pub max_events: usize,
    /// Look-ahead window of the candidate generator.
    #[serde(default = "default_window")]
    pub window: usize,
    /// Scoring threads; 1 scores on the calling thread.
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_max_path_depth")]
    pub max_path_depth: usize,
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            relation_threshold: default_relation_threshold(),
            max_events: default_max_events(),
            window: default_window(),
            workers: default_workers(),
            max_path_depth: default_max_path_depth(),
            max_text_chars: default_max_text_chars(),
        }
    }
}

impl EngineConfig {
    /// Reject out-of-range values before any construction starts.
    ///
    /// # Errors
    ///
    /// Returns the matching input error for the first offending field.
    pub fn validate(&self) -> EngineResult<()> {
        if !(0.0..=1.0).contains(&self.relation_threshold) {
            return Err(EngineError::ThresholdOutOfRange {
                value: self.relation_threshold,
            });
        }
        if !(1..=MAX_EVENTS_LIMIT).contains(&self.max_events) {
            return Err(EngineError::MaxEventsOutOfRange {
                value: self.max_events,
            });
        }
        if self.window == 0 {
            return Err(EngineError::WindowOutOfRange { value: self.window });
        }
        if !(1..=MAX_WORKERS).contains(&self.workers) {
            return Err(EngineError::WorkersOutOfRange {
                value: self.workers,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.relation_threshold = threshold;
        self
    }

    #[must_use]
    pub const fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub const fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }
}

const fn default_relation_threshold() -> f64 {
    0.5
}

const fn default_max_events() -> usize {
    500
}

const fn default_window() -> usize {
    3
}

const fn default_workers() -> usize {
    1
}

const fn default_max_path_depth() -> usize {
    10
}

const fn default_max_text_chars() -> usize {
    200_000
}

// ---------------------------------------------------------------------------
// Heuristic table overrides
// ---------------------------------------------------------------------------

/// One extra connective phrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerConfig {
    pub phrase: String,
    pub relation: String,
    pub score: f64,
}

/// One symmetric category-affinity entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffinityConfig {
    pub a: String,
    pub b: String,
    pub score: f64,
}

/// `[heuristics]` table: adjustments to the built-in lexicon and matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeuristicsConfig {
    #[serde(default)]
    pub markers: Vec<MarkerConfig>,
    #[serde(default)]
    pub replace_default_markers: bool,
    #[serde(default)]
    pub same_category_affinity: Option<f64>,
    #[serde(default)]
    pub default_affinity: Option<f64>,
    #[serde(default)]
    pub affinity: Vec<AffinityConfig>,
}

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

/// A partial [`EngineConfig`]; unset fields fall through to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineOverrides {
    #[serde(default)]
    pub relation_threshold: Option<f64>,
    #[serde(default)]
    pub max_events: Option<usize>,
    #[serde(default)]
    pub window: Option<usize>,
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub max_path_depth: Option<usize>,
    #[serde(default)]
    pub max_text_chars: Option<usize>,
}

impl EngineOverrides {
    pub fn apply(&self, config: &mut EngineConfig) {
        if let Some(v) = self.relation_threshold {
            config.relation_threshold = v;
        }
        if let Some(v) = self.max_events {
            config.max_events = v;
        }
        if let Some(v) = self.window {
            config.window = v;
        }
        if let Some(v) = self.workers {
            config.workers = v;
        }
        if let Some(v) = self.max_path_depth {
            config.max_path_depth = v;
        }
        if let Some(v) = self.max_text_chars {
            config.max_text_chars = v;
        }
    }

    /// Read the `CHRONICLE_*` variables through `lookup`.
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            relation_threshold: parse_env(&lookup, ENV_THRESHOLD),
            max_events: parse_env(&lookup, ENV_MAX_EVENTS),
            window: parse_env(&lookup, ENV_WINDOW),
            workers: parse_env(&lookup, ENV_WORKERS),
            max_path_depth: None,
            max_text_chars: None,
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }
}

fn parse_env<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable environment value");
            None
        }
    }
}

/// On-disk layout of a config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub engine: EngineOverrides,
    #[serde(default)]
    pub heuristics: Option<HeuristicsConfig>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConfig {
    pub engine: EngineConfig,
    pub heuristics: HeuristicsConfig,
    /// Files that contributed, lowest precedence first.
    pub sources: Vec<PathBuf>,
}

/// Parse one config file.
///
/// # Errors
///
/// Fails when the file cannot be read or is not valid TOML.
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ConfigFile>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("chronicle/config.toml"))
}

/// Resolve the effective configuration from every layer.
///
/// # Errors
///
/// Fails when an explicit config file is missing or any present file is
/// malformed.
pub fn resolve_config(explicit: Option<&Path>, cli: &EngineOverrides) -> Result<ResolvedConfig> {
    let mut files = Vec::new();
    if let Some(user) = user_config_path() {
        files.push(user);
    }
    files.push(PathBuf::from(PROJECT_FILE));

    resolve_layers(&files, explicit, &EngineOverrides::from_env(), cli)
}

/// Layer resolution with every input supplied by the caller.
///
/// `implicit` files are optional and listed lowest precedence first;
/// `explicit` must exist.
///
/// # Errors
///
/// See [`resolve_config`].
pub fn resolve_layers(
    implicit: &[PathBuf],
    explicit: Option<&Path>,
    env: &EngineOverrides,
    cli: &EngineOverrides,
) -> Result<ResolvedConfig> {
    let mut resolved = ResolvedConfig::default();

    let mut layer = |path: &Path, file: ConfigFile| {
        file.engine.apply(&mut resolved.engine);
        if let Some(heuristics) = file.heuristics {
            resolved.heuristics = heuristics;
        }
        resolved.sources.push(path.to_path_buf());
    };

    for path in implicit {
        if path.is_file() {
            layer(path, load_config_file(path)?);
        }
    }
    if let Some(path) = explicit {
        if !path.is_file() {
            anyhow::bail!("config file {} does not exist", path.display());
        }
        layer(path, load_config_file(path)?);
    }

    env.apply(&mut resolved.engine);
    cli.apply(&mut resolved.engine);
    Ok(resolved)
}
