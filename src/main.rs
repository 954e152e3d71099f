mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use vidbox::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    vidbox::observability::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Server(args) => {
            let config = Config::load_with_overrides(args.into())?;
            vidbox::api::run(config).await?
        }
        Commands::Config(args) => {
            let config = Config::load_with_overrides(args.into())?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
