use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dbcore",
    about = "Inspect and maintain a dbcore file-per-record store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Record directory; overrides `base_dir` from the config file
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// TOML store configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List record keys, optionally for one type
    Ls(LsArgs),
    /// Show a record's envelope and entity metadata
    Show(KeyArgs),
    /// Physically delete a record
    Rm(KeyArgs),
    /// Check every record file and report the ones that fail to load
    Fsck(FsckArgs),
    /// Print the effective store configuration
    Config,
}

#[derive(Args)]
pub struct LsArgs {
    pub type_tag: Option<String>,
}

#[derive(Args)]
pub struct KeyArgs {
    pub type_tag: String,
    pub id: String,
}

#[derive(Args)]
pub struct FsckArgs {
    /// Only check records of this type
    #[arg(long = "type")]
    pub type_tag: Option<String>,
}
