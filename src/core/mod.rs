//! Core data types for catalog crawling.
//!
//! - [`Dataset`](dataset::Dataset): A resolved leaf dataset with its access services
//! - [`Service`](dataset::Service): One access endpoint (OPeNDAP, ISO, WMS, ...)
//! - [`CatalogRef`](dataset::CatalogRef), [`LeafEntry`](dataset::LeafEntry): What a catalog
//!   document yields while it is being walked
//! - [`CrawlConfig`](config::CrawlConfig): Select/skip patterns, date bounds, credentials
//!   and worker count for one crawl

pub mod config;
pub mod dataset;
