use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use crate::catalog::xml::Element;

/// A link from one catalog document to a child catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRef {
    /// Absolute URL of the child catalog, resolved against the parent
    pub url: Url,
    /// Display title (`xlink:title`), empty when the catalog omits it
    pub title: String,
}

/// A catalog entry carrying a direct `urlPath`, as seen while walking catalogs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafEntry {
    pub name: String,
    pub id: Option<String>,
    /// Raw text of the `date[type=modified]` element, if present
    pub modified: Option<String>,
}

impl LeafEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            modified: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_modified(mut self, modified: impl Into<String>) -> Self {
        self.modified = Some(modified.into());
        self
    }
}

/// One access endpoint of a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Service {
    /// Short identifier, e.g. "odap" or "iso"
    pub name: String,
    /// Protocol category, e.g. "OPENDAP", "ISO", "WMS"
    pub service_type: String,
    /// Absolute endpoint URL
    pub url: Url,
}

impl Service {
    pub fn new(name: impl Into<String>, service_type: impl Into<String>, url: Url) -> Self {
        Self {
            name: name.into(),
            service_type: service_type.into(),
            url,
        }
    }

    /// Case-insensitive match on the service type
    #[must_use]
    pub fn is_type(&self, service_type: &str) -> bool {
        self.service_type.eq_ignore_ascii_case(service_type)
    }
}

/// A fully resolved leaf dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    /// URL of the owning catalog, without the `?dataset=` query
    pub catalog_url: Url,
    /// The dataset's `metadata` block, passed through untouched
    pub metadata: Option<Element>,
    /// Size declared by the catalog's `dataSize` element, in megabytes
    pub declared_size_mb: Option<f64>,
    /// Best-effort size: the declared size, or a DAP estimate when enabled
    pub size_mb: Option<f64>,
    pub modified: Option<DateTime<Utc>>,
    pub services: Vec<Service>,
}

impl Dataset {
    /// First service whose type matches, case-insensitively
    #[must_use]
    pub fn service_of_type(&self, service_type: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.is_type(service_type))
    }

    /// Endpoint URLs of every service of the given type
    pub fn urls_of_type<'a>(&'a self, service_type: &'a str) -> impl Iterator<Item = &'a Url> {
        self.services
            .iter()
            .filter(move |s| s.is_type(service_type))
            .map(|s| &s.url)
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let types: Vec<&str> = self
            .services
            .iter()
            .map(|s| s.service_type.as_str())
            .collect();
        write!(
            f,
            "{} ({}) services: [{}]",
            self.id,
            self.name,
            types.join(", ")
        )
    }
}
