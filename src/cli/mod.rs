//! Command-line interface for thredds-crawler.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **crawl**: Walk a catalog tree and list the datasets it publishes
//! - **resolve**: Resolve a single `catalog.xml?dataset=<ID>` URL into its services
//!
//! ## Usage
//!
//! ```text
//! # Every aggregation under a catalog
//! thredds-crawler crawl http://tds.maracoos.org/thredds/MODIS.xml --select '.*-Agg'
//!
//! # Datasets modified in January 2016, as JSON
//! thredds-crawler crawl https://host/thredds/catalog.xml \
//!     --after 2016-01-01 --before 2016-02-01 --format json
//!
//! # One dataset, with a size estimate from its OPeNDAP endpoint
//! thredds-crawler resolve 'http://host/thredds/MODIS.xml?dataset=MODIS-Agg' --dap-size
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use clap::{Parser, Subcommand};

use crate::transport::Credential;

pub mod crawl;
pub mod report;
pub mod resolve;

#[derive(Parser)]
#[command(name = "thredds-crawler")]
#[command(version)]
#[command(about = "Discover datasets published through THREDDS catalogs")]
#[command(
    long_about = "thredds-crawler walks a THREDDS catalog tree, filters its datasets by name, ID and modification date, and resolves each dataset's access services (OPeNDAP, ISO, WMS, ...) into endpoint URLs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crawl a catalog tree and list its datasets
    Crawl(crawl::CrawlArgs),

    /// Resolve a single dataset URL
    Resolve(resolve::ResolveArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Options shared by every command that talks to a server
#[derive(clap::Args, Clone, Debug, Default)]
pub struct ConnectionArgs {
    /// Username for HTTP basic authentication
    #[arg(long)]
    pub user: Option<String>,

    /// Password for HTTP basic authentication
    #[arg(long, requires = "user")]
    pub password: Option<String>,

    /// Do not verify TLS certificates
    #[arg(long)]
    pub insecure: bool,

    /// Estimate sizes of datasets without a declared size from their OPeNDAP DDS
    #[arg(long)]
    pub dap_size: bool,
}

impl ConnectionArgs {
    pub fn credential(&self) -> Option<Credential> {
        self.user
            .as_ref()
            .map(|user| Credential::new(user.clone(), self.password.clone()))
    }
}

/// Writer for command output: the given file, or stdout
///
/// # Errors
///
/// Returns an error if the output file cannot be created.
pub fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout())),
    })
}
