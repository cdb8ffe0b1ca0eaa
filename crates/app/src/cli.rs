use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, PartialEq)]
#[command(name = "tagwatch", version)]
#[command(about = "Terminal dashboard of commits waiting on a release")]
pub struct CliArgs {
    /// Path to the repository list (defaults to the platform config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Write a sample repository list to the config path
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
