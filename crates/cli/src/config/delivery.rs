//! Delivery Config

use std::path::PathBuf;

use clap::Args;

/// Delivery fee settings.
#[derive(Debug, Args)]
pub struct DeliveryConfig {
    /// YAML delivery fee table; the built-in table when unset
    #[arg(long, env = "DELIVERY_TABLE_FILE")]
    pub delivery_table_file: Option<PathBuf>,
}
