//! Extension-keyed table of optimizers, built once before any file is visited.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::info;

use crate::commit::{self, Outcome};
use crate::error::{IoStage, OptimizeError};
use crate::{OptimizeConfig, optimize_bytes};

/// Something that can shrink one kind of file in place.
pub trait AssetOptimizer: Send + Sync {
    /// Optimize the file at `path`, replacing it only when the result is smaller.
    fn optimize(&self, path: &Path) -> Result<Outcome, OptimizeError>;
}

/// PNG optimizer: read, pick the smallest variant, commit atomically.
#[derive(Debug, Clone, Default)]
pub struct PngOptimizer {
    config: OptimizeConfig,
}

impl PngOptimizer {
    pub fn new(config: OptimizeConfig) -> Self {
        Self { config }
    }

    fn optimize_file(&self, path: &Path) -> Result<Outcome, OptimizeError> {
        let data = fs::read(path).map_err(OptimizeError::io(IoStage::Read))?;
        let optimized = optimize_bytes(&data, &self.config)?;
        let outcome = optimized.outcome;

        match optimized.replacement {
            Some(bytes) => {
                commit::replace_atomically(path, &bytes)?;
                info!(
                    "{}: SAVE AS {}: {} --> {} == {} bytes ({:.2}%)",
                    path.display(),
                    outcome.label,
                    outcome.original_len,
                    outcome.new_len,
                    outcome.saved(),
                    outcome.saved_percent()
                );
            }
            None => info!("{}: NOOP", path.display()),
        }
        Ok(outcome)
    }
}

impl AssetOptimizer for PngOptimizer {
    fn optimize(&self, path: &Path) -> Result<Outcome, OptimizeError> {
        self.optimize_file(path).map_err(|e| e.in_asset(path))
    }
}

/// Immutable map from lowercase file extension to optimizer.
#[derive(Default)]
pub struct Registry {
    by_ext: BTreeMap<String, Box<dyn AssetOptimizer>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in optimizers (`png`).
    pub fn with_defaults(config: OptimizeConfig) -> Self {
        Self::new().register("png", PngOptimizer::new(config))
    }

    /// Add an optimizer for `ext` (without the dot, any case).
    pub fn register(mut self, ext: &str, optimizer: impl AssetOptimizer + 'static) -> Self {
        self.by_ext.insert(ext.to_ascii_lowercase(), Box::new(optimizer));
        self
    }

    pub fn lookup(&self, ext: &str) -> Option<&dyn AssetOptimizer> {
        self.by_ext
            .get(&ext.to_ascii_lowercase())
            .map(|o| o.as_ref())
    }

    /// Optimizer for `path`'s extension, if one is registered.
    pub fn for_path(&self, path: &Path) -> Option<&dyn AssetOptimizer> {
        self.lookup(path.extension()?.to_str()?)
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.by_ext.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.extensions()).finish()
    }
}
