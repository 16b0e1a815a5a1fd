use std::path::PathBuf;

use anyhow::Context;

use crate::print::Layout;
use crate::reduce::DEFAULT_MAX_DEPTH;

pub const SOURCE_DIR_VAR: &str = "LBD_SRC";
pub const FUEL_VAR: &str = "LBD_FUEL";
pub const MAX_DEPTH_VAR: &str = "LBD_MAX_DEPTH";

const DEFAULT_SOURCE_DIR: &str = "example_src";
const SOURCE_EXTENSION: &str = "lbd";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// where `:load NAME` looks for `NAME.lbd`
    pub source_dir: PathBuf,
    /// maximum number of beta steps per chunk, unbounded if `None`
    pub fuel: Option<usize>,
    pub max_depth: usize,
    pub layout: Layout,
    /// declare unknown free names while parsing instead of rejecting them
    pub auto_declare: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            fuel: None,
            max_depth: DEFAULT_MAX_DEPTH,
            layout: Layout::Flat,
            auto_declare: true,
        }
    }
}

impl Config {
    /// Defaults overridden by `LBD_SRC`, `LBD_FUEL` and `LBD_MAX_DEPTH`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Config::default();
        if let Some(dir) = lookup(SOURCE_DIR_VAR) {
            config.source_dir = PathBuf::from(dir);
        }
        if let Some(fuel) = lookup(FUEL_VAR) {
            let fuel = fuel
                .parse()
                .with_context(|| format!("invalid {FUEL_VAR}: `{fuel}`"))?;
            config.fuel = Some(fuel);
        }
        if let Some(depth) = lookup(MAX_DEPTH_VAR) {
            config.max_depth = depth
                .parse()
                .with_context(|| format!("invalid {MAX_DEPTH_VAR}: `{depth}`"))?;
        }
        Ok(config)
    }

    pub fn lambda_filename(&self, name: &str) -> PathBuf {
        self.source_dir.join(format!("{name}.{SOURCE_EXTENSION}"))
    }
}
