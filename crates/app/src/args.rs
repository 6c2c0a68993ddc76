pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "data-usage-report")]
#[command(about = "Report public and private data volume per shared project")]
#[command(version)]
pub struct Args {
    /// Path to the config file (defaults to <config dir>/data-usage-report/config.toml)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, global = true)]
    pub debug: bool,

    /// Also write logs to a daily rotated file in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
