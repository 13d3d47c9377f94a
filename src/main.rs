use clap::Parser;
use tracing_subscriber::EnvFilter;

use thredds_crawler::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("thredds_crawler=debug,info")
    } else {
        EnvFilter::new("thredds_crawler=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Crawl(args) => {
            cli::crawl::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Resolve(args) => {
            cli::resolve::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
