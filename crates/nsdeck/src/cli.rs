use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::constants::CONFIG_PATH_ENV;

#[derive(Debug, Parser)]
#[command(name = "nsdeck", version, about = "Namespace dashboard backed by a TTL cache")]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, global = true, env = CONFIG_PATH_ENV)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Selected namespaces with their public ingress URLs.
    List {
        /// Print whole namespace objects instead of names.
        #[arg(long)]
        full: bool,
    },
    /// Everything known about one namespace.
    Show { namespace: String },
    /// Print the effective configuration: site name, sidebar links and the
    /// namespace query settings.
    Config,
}
