use clap::{Parser, Subcommand};
use std::path::PathBuf;

use vidbox::config::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(name = "vidbox")]
#[command(about = "Queue and serve video downloads", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server and the download worker
    Server(ServerArgs),
    /// Print the resolved configuration as TOML
    Config(ServerArgs),
}

/// Overrides for values from the configuration file and environment
#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to, e.g. `localhost:8080` or `:8080`
    #[arg(long)]
    pub address: Option<String>,

    /// Directory finished downloads are published to
    #[arg(long)]
    pub results: Option<PathBuf>,

    /// Scratch directory for in-progress downloads; must be on the same
    /// filesystem as the results directory
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// CSV file with user,password pairs (unset disables authentication)
    #[arg(long)]
    pub users: Option<PathBuf>,
}

impl From<ServerArgs> for ConfigOverrides {
    fn from(args: ServerArgs) -> Self {
        Self {
            bind_addr: args.address,
            results_dir: args.results,
            work_dir: args.workdir,
            users_file: args.users,
        }
    }
}
