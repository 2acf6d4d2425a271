//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::de::DeserializeOwned;
use turbo_orders::EngineConfig;

use crate::output::Output;

/// Config file names searched for, nearest directory first.
pub const CONFIG_NAMES: [&str; 3] = ["storefront.toml", ".storefront.toml", "storefront.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// Engine configuration.
    pub config: EngineConfig,
    /// Where the configuration came from, if a file.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = match config_path {
            Some(path) => {
                let path = resolve(&cwd, path);
                let config = EngineConfig::load(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?;
                (config, Some(path))
            }
            None => match find_config(&cwd)? {
                Some((config, path)) => (config, Some(path)),
                None => (EngineConfig::default(), None),
            },
        };

        match &config_path {
            Some(path) => output.debug(&format!("Using config {}", path.display())),
            None => output.debug("No config file found; using defaults"),
        }

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        resolve(&self.cwd, path)
    }

    /// Read and parse a JSON input file.
    pub fn read_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let path = self.resolve_path(path);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

fn resolve(cwd: &Path, path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

/// Find a config file in the directory tree.
///
/// A file that exists but does not parse is an error, not a miss.
fn find_config(start: &Path) -> Result<Option<(EngineConfig, PathBuf)>> {
    let mut current = start.to_path_buf();
    loop {
        for name in CONFIG_NAMES {
            let candidate = current.join(name);
            if candidate.is_file() {
                let config = EngineConfig::load(&candidate)
                    .with_context(|| format!("Failed to load config {}", candidate.display()))?;
                return Ok(Some((config, candidate)));
            }
        }

        if !current.pop() {
            return Ok(None);
        }
    }
}
