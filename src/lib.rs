//! # thredds-crawler
//!
//! A library for discovering the datasets published by a THREDDS Data Server.
//!
//! THREDDS servers describe their holdings with a tree of XML catalogs: catalogs
//! reference sub-catalogs (`catalogRef`) and list datasets, and each dataset is reachable
//! through one or more access services (OPeNDAP, ISO metadata, WMS, HTTP download, ...).
//! `thredds-crawler` walks that tree and hands back every dataset with its endpoint URLs.
//!
//! ## Features
//!
//! - **Cycle-safe walk**: each catalog is fetched at most once per crawl
//! - **Concurrent fetching**: a bounded worker pool fetches sibling catalogs in parallel
//! - **Filtering**: regex select (dataset IDs) and skip (names, catalogRef titles)
//!   patterns, plus `before`/`after` bounds on the modified date
//! - **Service resolution**: compound services are expanded, and ISO/NcML/UDDC endpoints
//!   get the `dataset` and `catalog` parameters they need
//! - **Sizes**: declared `dataSize` in MB, with an optional OPeNDAP DDS fallback
//!
//! ## Example
//!
//! ```rust,no_run
//! use thredds_crawler::{CrawlConfig, Crawler};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = CrawlConfig::builder()
//!     .with_select(["MODIS-Agg"])
//!     .with_after("2015-12-30T00:00:00Z")
//!     .build()?;
//!
//! let crawl = Crawler::http(config)?
//!     .crawl("http://tds.maracoos.org/thredds/MODIS.xml")
//!     .await?;
//!
//! for dataset in crawl.datasets() {
//!     for url in dataset.urls_of_type("OPENDAP") {
//!         println!("{}: {url}", dataset.id);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Dataset/service records and crawl configuration
//! - [`catalog`]: Catalog XML parsing and URL helpers
//! - [`filter`]: Select/skip patterns and date bounds
//! - [`crawl`]: Traversal engine, worker pool, service resolver and size estimator
//! - [`transport`]: HTTP fetching and OPeNDAP inspection
//! - [`cli`]: Command-line interface implementation

pub mod catalog;
pub mod cli;
pub mod core;
pub mod crawl;
pub mod filter;
pub mod transport;

// Re-export commonly used types for convenience
pub use crate::core::config::{ConfigError, CrawlConfig, CrawlConfigBuilder, DEFAULT_SKIPS};
pub use crate::core::dataset::{Dataset, Service};
pub use crawl::engine::{Crawl, CrawlError, Crawler};
pub use transport::{Credential, FetchError, Fetcher, HttpFetcher};
