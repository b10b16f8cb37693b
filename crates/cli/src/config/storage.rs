//! Storage Config

use std::path::PathBuf;

use clap::Args;

/// Cart storage settings.
#[derive(Debug, Args)]
pub struct StorageConfig {
    /// Directory holding the saved cart
    #[arg(long, env = "STOREFRONT_DATA_DIR", default_value = ".storefront")]
    pub data_dir: PathBuf,

    /// Keep the cart in memory only; nothing survives the command
    #[arg(long, env = "STOREFRONT_IN_MEMORY", default_value_t = false)]
    pub in_memory: bool,
}

impl StorageConfig {
    /// Data directory, unless running in memory.
    #[must_use]
    pub fn data_dir(&self) -> Option<PathBuf> {
        (!self.in_memory).then(|| self.data_dir.clone())
    }
}
