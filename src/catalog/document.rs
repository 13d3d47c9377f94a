use tracing::warn;
use url::Url;

use crate::catalog::links::construct_url;
use crate::catalog::xml::{self, Element, XmlError};
use crate::core::dataset::{CatalogRef, LeafEntry};

/// What the traversal needs from one catalog document
#[derive(Debug, Clone, Default)]
pub struct CatalogDocument {
    /// Child catalogs, in document order
    pub refs: Vec<CatalogRef>,
    /// Datasets with a direct `urlPath`, in document order
    pub leaves: Vec<LeafEntry>,
}

impl CatalogDocument {
    /// Parse raw catalog bytes fetched from `url`
    ///
    /// # Errors
    ///
    /// Returns `XmlError` if the bytes are not a well-formed XML document.
    pub fn parse(url: &Url, bytes: &[u8]) -> Result<Self, XmlError> {
        let root = xml::parse(bytes)?;
        Ok(Self::from_element(url, &root))
    }

    /// Extract catalogRefs and leaf datasets from an already parsed catalog
    pub fn from_element(url: &Url, root: &Element) -> Self {
        let mut document = Self::default();

        for reference in root.find_all("catalogRef") {
            let Some(href) = reference.attr("href") else {
                warn!(catalog = %url, "catalogRef without href, ignoring");
                continue;
            };
            match construct_url(url, href) {
                Ok(child) => document.refs.push(CatalogRef {
                    url: child,
                    title: reference.attr("title").unwrap_or_default().to_string(),
                }),
                Err(e) => warn!(catalog = %url, href, error = %e, "Unresolvable catalogRef"),
            }
        }

        for dataset in root.find_all("dataset") {
            if dataset.attr("urlPath").is_none() {
                continue;
            }
            let mut leaf = LeafEntry::new(dataset.attr("name").unwrap_or_default());
            leaf.id = dataset.attr("ID").map(str::to_string);
            leaf.modified = modified_date(dataset).map(str::to_string);
            document.leaves.push(leaf);
        }

        document
    }
}

/// Text of the dataset's `date type="modified"`, looking on the dataset first and then
/// in its `metadata` blocks
pub fn modified_date(dataset: &Element) -> Option<&str> {
    let is_modified = |e: &&Element| e.attr("type") == Some("modified") && !e.text().is_empty();

    dataset
        .children_named("date")
        .find(is_modified)
        .or_else(|| {
            dataset
                .children_named("metadata")
                .flat_map(|m| m.children_named("date"))
                .find(is_modified)
        })
        .map(Element::text)
}
