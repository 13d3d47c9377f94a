use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::catalog::document::CatalogDocument;
use crate::catalog::links::{leaf_url, normalize_catalog_url};
use crate::catalog::xml::XmlError;
use crate::core::config::CrawlConfig;
use crate::core::dataset::{CatalogRef, Dataset, LeafEntry};
use crate::crawl::pool::{join_all, PoolError, WorkerPool};
use crate::crawl::resolver::{resolve_leaf, ResolveError};
use crate::crawl::size::estimate_size;
use crate::filter::dates::passes_date_filter;
use crate::filter::patterns::{should_select, should_skip};
use crate::transport::dap::{ArrayInspector, NoInspector};
use crate::transport::{FetchError, Fetcher, HttpFetcher};

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Invalid catalog URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Why a catalog branch was abandoned
#[derive(Error, Debug)]
enum BranchError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] XmlError),
}

/// The finished, immutable result of one crawl
#[derive(Debug, Clone, Default)]
pub struct Crawl {
    datasets: Vec<Dataset>,
    visited: Vec<Url>,
    leaf_urls: Vec<Url>,
}

impl Crawl {
    /// Resolved datasets; every one carries an ID
    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn into_datasets(self) -> Vec<Dataset> {
        self.datasets
    }

    /// Normalized catalog URLs fetched during the walk, in visit order
    pub fn visited(&self) -> &[Url] {
        &self.visited
    }

    /// Leaf URLs (`<catalog>?dataset=<ID>`) that survived filtering
    pub fn leaf_urls(&self) -> &[Url] {
        &self.leaf_urls
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

/// Catalog URLs already dispatched during one crawl
#[derive(Debug, Default)]
struct VisitedSet {
    seen: HashSet<Url>,
    order: Vec<Url>,
}

impl VisitedSet {
    /// Record a URL; false if it was already present
    fn insert(&mut self, url: &Url) -> bool {
        if !self.seen.insert(url.clone()) {
            return false;
        }
        self.order.push(url.clone());
        true
    }

    fn into_order(self) -> Vec<Url> {
        self.order
    }
}

/// Crawls THREDDS catalogs with a fixed configuration.
///
/// Each call to [`Crawler::crawl`] starts a fresh session with its own visited set and
/// worker pool, so repeated crawls are independent.
pub struct Crawler<F, I = NoInspector> {
    config: Arc<CrawlConfig>,
    fetcher: Arc<F>,
    inspector: Arc<I>,
}

impl<F: Fetcher> Crawler<F> {
    pub fn new(config: CrawlConfig, fetcher: F) -> Self {
        Self {
            config: Arc::new(config),
            fetcher: Arc::new(fetcher),
            inspector: Arc::new(NoInspector),
        }
    }
}

impl Crawler<HttpFetcher> {
    /// A crawler over HTTP using the configuration's credential and TLS policy
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Client` if the HTTP client cannot be built.
    pub fn http(config: CrawlConfig) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(config.credential.clone(), config.accept_invalid_certs)?;
        Ok(Self::new(config, fetcher))
    }
}

impl<F: Fetcher, I: ArrayInspector> Crawler<F, I> {
    /// Use `inspector` to estimate sizes of datasets that do not declare one
    #[must_use]
    pub fn with_inspector<J: ArrayInspector>(self, inspector: J) -> Crawler<F, J> {
        Crawler {
            config: self.config,
            fetcher: self.fetcher,
            inspector: Arc::new(inspector),
        }
    }

    pub fn fetcher(&self) -> &Arc<F> {
        &self.fetcher
    }

    /// Walk the catalog tree under `root` and resolve every selected leaf dataset.
    ///
    /// `root` may be a catalog `.xml` document or its browsable `.html` page. Failed
    /// branches and unresolvable datasets are logged and omitted.
    ///
    /// # Errors
    ///
    /// Returns `CrawlError::InvalidUrl` if `root` is not an absolute URL.
    pub async fn crawl(&self, root: &str) -> Result<Crawl, CrawlError> {
        let root_url = Url::parse(root).map_err(|source| CrawlError::InvalidUrl {
            url: root.to_string(),
            source,
        })?;

        let pool = WorkerPool::new(self.config.workers);
        let mut traversal = Traversal {
            config: &self.config,
            fetcher: &self.fetcher,
            pool: &pool,
            visited: VisitedSet::default(),
        };
        let walked = traversal.walk(root_url).await;
        let visited = traversal.visited.into_order();
        let leaf_urls = match walked {
            Ok(leaf_urls) => leaf_urls,
            Err(e) => {
                pool.shutdown();
                return Err(e);
            }
        };
        info!(
            catalogs = visited.len(),
            leaves = leaf_urls.len(),
            "Catalog walk complete"
        );

        let resolved = self.resolve_all(&pool, &leaf_urls).await;
        pool.shutdown();
        let datasets = resolved?;
        info!(datasets = datasets.len(), "Crawl complete");

        Ok(Crawl {
            datasets,
            visited,
            leaf_urls,
        })
    }

    /// Resolve every leaf URL on the pool, then wait for all of them
    async fn resolve_all(
        &self,
        pool: &WorkerPool,
        leaf_urls: &[Url],
    ) -> Result<Vec<Dataset>, CrawlError> {
        let mut handles = Vec::with_capacity(leaf_urls.len());
        for url in leaf_urls {
            let fetcher = Arc::clone(&self.fetcher);
            let inspector = Arc::clone(&self.inspector);
            let job_url = url.clone();
            handles.push(pool.submit(async move {
                resolve_with_size(fetcher.as_ref(), inspector.as_ref(), &job_url).await
            })?);
        }

        let mut datasets = Vec::with_capacity(handles.len());
        for (url, result) in leaf_urls.iter().zip(join_all(handles).await) {
            match result {
                Ok(Ok(dataset)) => datasets.push(dataset),
                Ok(Err(e)) => warn!(url = %url, error = %e, "Dropping dataset"),
                Err(e) => warn!(url = %url, error = %e, "Dataset job failed"),
            }
        }
        Ok(datasets)
    }
}

async fn resolve_with_size<F: Fetcher, I: ArrayInspector>(
    fetcher: &F,
    inspector: &I,
    url: &Url,
) -> Result<Dataset, ResolveError> {
    let mut dataset = resolve_leaf(fetcher, url).await?;
    dataset.size_mb = estimate_size(&dataset, inspector).await;
    Ok(dataset)
}

async fn fetch_catalog<F: Fetcher>(fetcher: &F, url: &Url) -> Result<CatalogDocument, BranchError> {
    let body = fetcher.fetch(url).await?;
    Ok(CatalogDocument::parse(url, &body)?)
}

/// State of one crawl's walk over the catalog graph. The visited set is only touched
/// here, on the orchestrating task; pool jobs never see it.
struct Traversal<'a, F> {
    config: &'a CrawlConfig,
    fetcher: &'a Arc<F>,
    pool: &'a WorkerPool,
    visited: VisitedSet,
}

impl<F: Fetcher> Traversal<'_, F> {
    /// Breadth-first walk: every catalog of a level is fetched concurrently and the
    /// level is fully joined before the next one is dispatched.
    async fn walk(&mut self, root: Url) -> Result<Vec<Url>, CrawlError> {
        let mut leaves = Vec::new();
        let mut level = vec![root];

        while !level.is_empty() {
            let mut pending = Vec::with_capacity(level.len());
            for url in level {
                let url = normalize_catalog_url(&url);
                if !self.visited.insert(&url) {
                    debug!(url = %url, "Skipping (already crawled)");
                    continue;
                }
                debug!(url = %url, "Crawling");

                let fetcher = Arc::clone(self.fetcher);
                let job_url = url.clone();
                let handle = self
                    .pool
                    .submit(async move { fetch_catalog(fetcher.as_ref(), &job_url).await })?;
                pending.push((url, handle));
            }

            let mut next = Vec::new();
            for (url, handle) in pending {
                match handle.join().await {
                    Ok(Ok(document)) => {
                        next.extend(self.select_refs(document.refs));
                        leaves.extend(self.select_leaves(&url, document.leaves));
                    }
                    Ok(Err(e)) => warn!(url = %url, error = %e, "Skipping catalog"),
                    Err(e) => warn!(url = %url, error = %e, "Catalog job failed"),
                }
            }
            level = next;
        }

        Ok(leaves)
    }

    fn select_refs(&self, refs: Vec<CatalogRef>) -> Vec<Url> {
        refs.into_iter()
            .filter_map(|reference| {
                if should_skip(&reference.title, &self.config.skip) {
                    if self.config.verbose {
                        debug!(title = %reference.title, "Skipping catalogRef based on skips");
                    }
                    return None;
                }
                Some(reference.url)
            })
            .collect()
    }

    /// Skip by name, then by modified date, then select by ID
    fn select_leaves(&self, catalog: &Url, leaves: Vec<LeafEntry>) -> Vec<Url> {
        let verbose = self.config.verbose;
        let mut selected = Vec::new();

        for leaf in leaves {
            if should_skip(&leaf.name, &self.config.skip) {
                if verbose {
                    debug!(name = %leaf.name, "Skipping dataset based on skips");
                }
                continue;
            }

            match passes_date_filter(leaf.modified.as_deref(), self.config.before, self.config.after)
            {
                Ok(true) => {}
                Ok(false) => {
                    if verbose {
                        debug!(name = %leaf.name, modified = ?leaf.modified, "Skipping dataset based on modified date");
                    }
                    continue;
                }
                Err(e) => {
                    warn!(catalog = %catalog, name = %leaf.name, error = %e, "Excluding dataset with unparseable modified date");
                    continue;
                }
            }

            if !should_select(leaf.id.as_deref(), self.config.select.as_deref()) {
                if verbose {
                    debug!(id = ?leaf.id, "Ignoring dataset based on selects");
                }
                continue;
            }

            let Some(id) = leaf.id else {
                debug!(catalog = %catalog, name = %leaf.name, "Dropping dataset without ID");
                continue;
            };
            if verbose {
                debug!(id = %id, "Processing");
            }
            selected.push(leaf_url(catalog, &id));
        }

        selected
    }
}
