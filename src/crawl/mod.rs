//! Catalog traversal and dataset resolution.
//!
//! A crawl has two phases, both run on a bounded [`pool::WorkerPool`]:
//!
//! 1. **Walk** ([`engine`]): starting at the root catalog, fetch every catalog of the
//!    current level concurrently, wait for the level, then descend into the catalogRefs
//!    that survive the skip patterns. Each catalog URL is fetched at most once. Leaf
//!    datasets are filtered by name, modified date and ID.
//! 2. **Resolve** ([`resolver`], [`size`]): fetch each selected leaf's single-dataset
//!    catalog, expand its services into endpoint URLs and estimate its size.
//!
//! ## Example
//!
//! ```rust,no_run
//! use thredds_crawler::{CrawlConfig, Crawler};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = CrawlConfig::builder().with_select([".*-Agg"]).build()?;
//! let crawler = Crawler::http(config)?;
//! let crawl = crawler.crawl("http://tds.maracoos.org/thredds/MODIS.xml").await?;
//! for dataset in crawl.datasets() {
//!     println!("{dataset}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod pool;
pub mod resolver;
pub mod size;
