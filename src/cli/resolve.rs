use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use url::Url;

use crate::cli::report::write_datasets;
use crate::cli::{open_output, ConnectionArgs, OutputFormat};
use crate::crawl::resolver::resolve_leaf;
use crate::crawl::size::estimate_size;
use crate::transport::dap::{DdsInspector, NoInspector};
use crate::transport::HttpFetcher;

#[derive(Args)]
pub struct ResolveArgs {
    /// Dataset URL, e.g. `http://host/thredds/catalog.xml?dataset=ID`
    #[arg(required = true)]
    pub url: String,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Write results to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute resolve subcommand
///
/// # Errors
///
/// Returns an error if the URL is invalid or the dataset cannot be fetched or resolved.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ResolveArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let url = Url::parse(&args.url)
        .map_err(|e| anyhow::anyhow!("Invalid dataset URL '{}': {e}", args.url))?;

    let rt = tokio::runtime::Runtime::new()?;
    let dataset = rt.block_on(async {
        let fetcher = HttpFetcher::new(args.connection.credential(), args.connection.insecure)?;
        let mut dataset = resolve_leaf(&fetcher, &url).await?;
        dataset.size_mb = if args.connection.dap_size {
            estimate_size(&dataset, &DdsInspector::new(Arc::new(fetcher))).await
        } else {
            estimate_size(&dataset, &NoInspector).await
        };
        anyhow::Ok(dataset)
    })?;

    let mut out = open_output(args.output.as_deref())?;
    write_datasets(out.as_mut(), std::slice::from_ref(&dataset), format, verbose)
}
