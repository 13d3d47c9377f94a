use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::cli::report::write_datasets;
use crate::cli::{open_output, ConnectionArgs, OutputFormat};
use crate::core::config::{CrawlConfig, DEFAULT_WORKERS};
use crate::crawl::engine::{Crawl, Crawler};
use crate::transport::dap::{ArrayInspector, DdsInspector};
use crate::transport::HttpFetcher;

#[derive(Args)]
pub struct CrawlArgs {
    /// Root catalog URL (.xml, or the browsable .html page)
    #[arg(required = true)]
    pub url: String,

    /// Only keep datasets whose ID matches one of these regexes.
    /// Given with no values, nothing is selected
    #[arg(long, num_args = 0..)]
    pub select: Option<Vec<String>>,

    /// Skip dataset names and catalogRef titles matching these regexes
    /// (replaces the default skip list)
    #[arg(long, num_args = 1..)]
    pub skip: Option<Vec<String>>,

    /// Additional skip regexes, appended to the skip list
    #[arg(long, num_args = 1..)]
    pub extra_skip: Vec<String>,

    /// Exclude datasets modified after this time (ISO-8601, UTC if no offset)
    #[arg(long)]
    pub before: Option<String>,

    /// Exclude datasets modified before this time (ISO-8601, UTC if no offset)
    #[arg(long)]
    pub after: Option<String>,

    /// Number of concurrent requests
    #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Write results to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CrawlArgs {
    /// Validate the arguments into a crawl configuration
    ///
    /// # Errors
    ///
    /// Returns an error for invalid patterns, timestamps or a zero worker count.
    pub fn to_config(&self, verbose: bool) -> anyhow::Result<CrawlConfig> {
        let mut builder = CrawlConfig::builder()
            .with_extra_skip(self.extra_skip.iter().cloned())
            .with_workers(self.workers)
            .with_verbose(verbose)
            .with_accept_invalid_certs(self.connection.insecure);
        if let Some(select) = &self.select {
            builder = builder.with_select(select.iter().cloned());
        }
        if let Some(skip) = &self.skip {
            builder = builder.with_skip(skip.iter().cloned());
        }
        if let Some(before) = &self.before {
            builder = builder.with_before(before.clone());
        }
        if let Some(after) = &self.after {
            builder = builder.with_after(after.clone());
        }
        if let Some(credential) = self.connection.credential() {
            builder = builder.with_credential(credential);
        }
        Ok(builder.build()?)
    }
}

/// Execute crawl subcommand
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the root URL is malformed, or the
/// output cannot be written. Unreachable catalogs are logged, not returned.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: CrawlArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    // Configuration errors are fatal before any request is made
    let config = args.to_config(verbose)?;

    let rt = tokio::runtime::Runtime::new()?;
    let crawl = rt.block_on(async {
        let crawler = Crawler::http(config)?;
        if args.connection.dap_size {
            // DDS requests share the crawler's client and credentials
            let inspector = DdsInspector::new(Arc::clone(crawler.fetcher()));
            execute(crawler.with_inspector(inspector), &args.url).await
        } else {
            execute(crawler, &args.url).await
        }
    })?;

    if verbose {
        eprintln!(
            "Visited {} catalog(s), resolved {} of {} dataset(s)",
            crawl.visited().len(),
            crawl.len(),
            crawl.leaf_urls().len()
        );
    }

    let datasets = crawl.into_datasets();
    let mut out = open_output(args.output.as_deref())?;
    write_datasets(out.as_mut(), &datasets, format, verbose)
}

async fn execute<I: ArrayInspector>(
    crawler: Crawler<HttpFetcher, I>,
    url: &str,
) -> anyhow::Result<Crawl> {
    Ok(crawler.crawl(url).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn parse(args: &[&str]) -> CrawlArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            crate::cli::Commands::Crawl(args) => args,
            crate::cli::Commands::Resolve(_) => panic!("expected crawl"),
        }
    }

    #[test]
    fn test_select_flag_without_values_selects_nothing() {
        let args = parse(&["thredds-crawler", "crawl", "http://h/c.xml", "--select"]);
        let config = args.to_config(false).unwrap();
        assert_eq!(config.select.map(|s| s.len()), Some(0));
    }

    #[test]
    fn test_no_select_flag_selects_everything() {
        let args = parse(&["thredds-crawler", "crawl", "http://h/c.xml"]);
        assert!(args.to_config(false).unwrap().select.is_none());
    }

    #[test]
    fn test_credentials_and_workers() {
        let args = parse(&[
            "thredds-crawler",
            "crawl",
            "http://h/c.xml",
            "--user",
            "reader",
            "--password",
            "secret",
            "-w",
            "8",
            "--extra-skip",
            ".*grib2",
        ]);
        let config = args.to_config(true).unwrap();
        assert_eq!(config.workers, 8);
        assert!(config.verbose);
        assert_eq!(config.credential.unwrap().username, "reader");
        assert_eq!(
            config.skip.len(),
            crate::core::config::DEFAULT_SKIPS.len() + 1
        );
    }

    #[test]
    fn test_bad_after_is_rejected() {
        let args = parse(&["thredds-crawler", "crawl", "http://h/c.xml", "--after", "someday"]);
        assert!(args.to_config(false).is_err());
    }
}
