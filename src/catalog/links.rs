//! URL helpers shared by the traversal engine and the service resolver.

use url::Url;

/// Query parameter THREDDS uses to address one dataset inside a catalog
pub const DATASET_PARAM: &str = "dataset";

/// Path extensions of browsable catalog pages and their machine-readable twin
const PAGE_EXTENSION: &str = ".html";
const CATALOG_EXTENSION: &str = ".xml";

/// Rewrite a browsable `.html` catalog page to its `.xml` document and drop any fragment.
///
/// Query strings are kept so `catalog.xml?dataset=...` URLs pass through unchanged.
#[must_use]
pub fn normalize_catalog_url(url: &Url) -> Url {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    if let Some(stem) = normalized.path().strip_suffix(PAGE_EXTENSION) {
        let path = format!("{stem}{CATALOG_EXTENSION}");
        normalized.set_path(&path);
    }
    normalized
}

/// Resolve a possibly relative reference against a base URL
///
/// # Errors
///
/// Returns the parse error if the joined URL is not valid.
pub fn construct_url(base: &Url, reference: &str) -> Result<Url, url::ParseError> {
    base.join(reference)
}

/// `<catalog>?dataset=<id>`: the URL of a single-dataset view of a catalog
#[must_use]
pub fn leaf_url(catalog: &Url, dataset_id: &str) -> Url {
    let mut url = catalog.clone();
    url.set_query(None);
    url.query_pairs_mut().append_pair(DATASET_PARAM, dataset_id);
    url
}

/// The catalog part of a leaf URL (query and fragment removed)
#[must_use]
pub fn strip_query(url: &Url) -> Url {
    let mut stripped = url.clone();
    stripped.set_query(None);
    stripped.set_fragment(None);
    stripped
}

/// The dataset ID addressed by a leaf URL, if any
#[must_use]
pub fn dataset_param(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == DATASET_PARAM)
        .map(|(_, value)| value.into_owned())
}
