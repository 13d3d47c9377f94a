use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::catalog::document::modified_date;
use crate::catalog::links::{construct_url, dataset_param, strip_query};
use crate::catalog::xml::{self, Element, XmlError};
use crate::core::dataset::{Dataset, Service};
use crate::filter::dates::parse_timestamp;
use crate::transport::{FetchError, Fetcher};

/// `serviceType` of a service that only groups other services
pub const COMPOUND_SERVICE_TYPE: &str = "Compound";

/// Services that need the dataset and catalog passed along to produce metadata
pub const SESSION_SERVICES: &[&str] = &["iso", "ncml", "uddc"];

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] XmlError),

    #[error("No dataset element in document")]
    MissingDataset,

    #[error("Dataset has no ID")]
    MissingId,

    #[error("Dataset {0} has no serviceName on itself or in its metadata")]
    MissingServiceName(String),

    #[error("Dataset {0} has no urlPath")]
    MissingUrlPath(String),
}

/// Where a dataset's `serviceName` was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceNameSource<'a> {
    Dataset(&'a str),
    Metadata(&'a str),
}

impl<'a> ServiceNameSource<'a> {
    /// Look on the dataset element, then in its metadata blocks
    pub fn locate(dataset: &'a Element) -> Option<Self> {
        let named = |e: &'a Element| e.child("serviceName").map(Element::text).filter(|s| !s.is_empty());

        named(dataset).map(Self::Dataset).or_else(|| {
            dataset
                .children_named("metadata")
                .find_map(named)
                .map(Self::Metadata)
        })
    }

    pub fn name(self) -> &'a str {
        match self {
            Self::Dataset(name) | Self::Metadata(name) => name,
        }
    }
}

/// Shape of a top-level `service` entry
#[derive(Debug)]
enum ServiceEntry<'a> {
    Compound(Vec<&'a Element>),
    Simple(&'a Element),
}

impl<'a> ServiceEntry<'a> {
    fn classify(service: &'a Element) -> Self {
        let is_compound = service
            .attr("serviceType")
            .is_some_and(|t| t.eq_ignore_ascii_case(COMPOUND_SERVICE_TYPE));
        if is_compound {
            Self::Compound(service.children_named("service").collect())
        } else {
            Self::Simple(service)
        }
    }

    fn concrete(self) -> Vec<&'a Element> {
        match self {
            Self::Compound(children) => children,
            Self::Simple(service) => vec![service],
        }
    }
}

/// Megabytes per unit of a `dataSize` element
#[must_use]
pub fn unit_factor(units: &str) -> Option<f64> {
    const FACTORS: &[(&str, f64)] = &[
        ("bytes", 1e-6),
        ("Kbytes", 1e-3),
        ("Mbytes", 1.0),
        ("Gbytes", 1e3),
        ("Tbytes", 1e6),
    ];
    FACTORS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(units.trim()))
        .map(|&(_, factor)| factor)
}

/// Declared size in megabytes from the dataset's (or its metadata's) `dataSize`
fn declared_size_mb(dataset: &Element, dataset_url: &Url) -> Option<f64> {
    let element = dataset.child("dataSize").or_else(|| {
        dataset
            .children_named("metadata")
            .find_map(|m| m.child("dataSize"))
    })?;

    let units = element.attr("units").unwrap_or("bytes");
    let Some(factor) = unit_factor(units) else {
        warn!(url = %dataset_url, units, "Unknown dataSize units, ignoring size");
        return None;
    };
    match element.text().parse::<f64>() {
        Ok(value) => Some(value * factor),
        Err(_) => {
            warn!(url = %dataset_url, value = element.text(), "Unparseable dataSize, ignoring size");
            None
        }
    }
}

/// Find the dataset element a leaf URL points at: the one whose ID matches the
/// `dataset` query parameter, else the first dataset in the document
fn locate_dataset<'a>(root: &'a Element, dataset_url: &Url) -> Option<&'a Element> {
    let datasets = if root.name == "dataset" {
        vec![root]
    } else {
        root.find_all("dataset")
    };
    let wanted = dataset_param(dataset_url);
    wanted
        .and_then(|id| datasets.iter().copied().find(|d| d.attr("ID") == Some(id.as_str())))
        .or_else(|| datasets.first().copied())
}

/// `base + urlPath + suffix`, with `base` resolved against the catalog (no query)
fn service_url(catalog_url: &Url, service: &Element, url_path: &str) -> Result<Url, url::ParseError> {
    let base = construct_url(catalog_url, service.attr("base").unwrap_or_default())?;
    Url::parse(&format!(
        "{base}{url_path}{}",
        service.attr("suffix").unwrap_or_default()
    ))
}

/// Build a dataset record from a parsed single-dataset catalog.
///
/// Services listed under the dataset's `serviceName` are expanded (compound entries
/// yield one record per nested service) and joined with the dataset's `urlPath`.
/// `size_mb` is left equal to the declared size; see [`crate::crawl::size`].
///
/// # Errors
///
/// Returns `ResolveError` when the dataset, its ID, its `serviceName` or its `urlPath`
/// are missing. A service whose base does not form a valid URL is logged and left out.
pub fn resolve_dataset(dataset_url: &Url, root: &Element) -> Result<Dataset, ResolveError> {
    let dataset = locate_dataset(root, dataset_url).ok_or(ResolveError::MissingDataset)?;
    let id = dataset.attr("ID").ok_or(ResolveError::MissingId)?.to_string();
    let name = dataset.attr("name").unwrap_or_default().to_string();
    let catalog_url = strip_query(dataset_url);
    let declared_size_mb = declared_size_mb(dataset, dataset_url);

    let modified = modified_date(dataset).and_then(|raw| {
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            warn!(url = %dataset_url, date = raw, "Unparseable modified date");
        }
        parsed
    });

    let source =
        ServiceNameSource::locate(dataset).ok_or_else(|| ResolveError::MissingServiceName(id.clone()))?;
    debug!(dataset = %id, source = ?source, "Resolved serviceName");
    let service_name = source.name();

    let url_path = dataset
        .attr("urlPath")
        .ok_or_else(|| ResolveError::MissingUrlPath(id.clone()))?;

    let mut services = Vec::new();
    let entries: Vec<&Element> = root
        .find_all("service")
        .into_iter()
        .filter(|s| s.attr("name") == Some(service_name))
        .collect();
    if entries.is_empty() {
        warn!(url = %dataset_url, service = service_name, "No service entry named by dataset");
    }

    for entry in entries {
        for service in ServiceEntry::classify(entry).concrete() {
            let service_id = service.attr("name").unwrap_or_default();
            let mut url = match service_url(&catalog_url, service, url_path) {
                Ok(url) => url,
                Err(e) => {
                    warn!(url = %dataset_url, service = service_id, error = %e, "Skipping service with invalid URL");
                    continue;
                }
            };

            if SESSION_SERVICES.contains(&service_id) {
                url.query_pairs_mut()
                    .append_pair("dataset", &id)
                    .append_pair("catalog", catalog_url.as_str());
            }

            services.push(Service::new(
                service_id,
                service.attr("serviceType").unwrap_or_default(),
                url,
            ));
        }
    }

    Ok(Dataset {
        id,
        name,
        catalog_url,
        metadata: dataset.child("metadata").cloned(),
        declared_size_mb,
        size_mb: declared_size_mb,
        modified,
        services,
    })
}

/// Fetch a leaf URL (`<catalog>?dataset=<ID>`) and resolve it
///
/// # Errors
///
/// Returns `ResolveError::Fetch` or `ResolveError::Parse` if the document cannot be
/// retrieved, otherwise the errors of [`resolve_dataset`].
pub async fn resolve_leaf<F: Fetcher>(fetcher: &F, dataset_url: &Url) -> Result<Dataset, ResolveError> {
    let body = fetcher.fetch(dataset_url).await?;
    let root = xml::parse(&body)?;
    resolve_dataset(dataset_url, &root)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEAF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog xmlns="http://www.unidata.ucar.edu/namespaces/thredds/InvCatalog/v1.0" version="1.0.1">
  <service name="agg" serviceType="Compound" base="">
    <service name="odap" serviceType="OPENDAP" base="/thredds/dodsC/"/>
    <service name="wms" serviceType="WMS" base="/thredds/wms/"/>
    <service name="iso" serviceType="ISO" base="/thredds/iso/"/>
  </service>
  <service name="http" serviceType="HTTPServer" base="/thredds/fileServer/" suffix=".nc"/>
  <dataset name="MODIS Aggregation" ID="MODIS-Agg" urlPath="MODIS-Agg">
    <metadata inherited="true">
      <serviceName>agg</serviceName>
      <dataSize units="Kbytes">1000</dataSize>
    </metadata>
    <date type="modified">2015-12-30T12:00:00Z</date>
  </dataset>
</catalog>"#;

    fn leaf_url() -> Url {
        Url::parse("http://host/thredds/MODIS.xml?dataset=MODIS-Agg").unwrap()
    }

    fn resolve(xml_text: &str) -> Result<Dataset, ResolveError> {
        let root = xml::parse(xml_text.as_bytes()).unwrap();
        resolve_dataset(&leaf_url(), &root)
    }

    #[test]
    fn test_compound_service_expands_children() {
        let dataset = resolve(LEAF).unwrap();
        assert_eq!(dataset.id, "MODIS-Agg");
        assert_eq!(dataset.name, "MODIS Aggregation");
        assert_eq!(dataset.catalog_url.as_str(), "http://host/thredds/MODIS.xml");
        assert_eq!(dataset.services.len(), 3);

        let odap = dataset.service_of_type("opendap").unwrap();
        assert_eq!(odap.name, "odap");
        assert_eq!(odap.url.as_str(), "http://host/thredds/dodsC/MODIS-Agg");
        assert!(odap.url.query().is_none());
    }

    #[test]
    fn test_session_services_get_dataset_and_catalog() {
        let dataset = resolve(LEAF).unwrap();
        for service in &dataset.services {
            let url = service.url.as_str();
            let injected = url.contains("dataset=") && url.contains("catalog=");
            assert_eq!(injected, SESSION_SERVICES.contains(&service.name.as_str()), "{url}");
        }
        let iso = dataset.service_of_type("ISO").unwrap();
        assert_eq!(
            iso.url.as_str(),
            "http://host/thredds/iso/MODIS-Agg?dataset=MODIS-Agg&catalog=http%3A%2F%2Fhost%2Fthredds%2FMODIS.xml"
        );
    }

    #[test]
    fn test_declared_size_and_modified() {
        let dataset = resolve(LEAF).unwrap();
        assert_eq!(dataset.declared_size_mb, Some(1.0));
        assert_eq!(dataset.size_mb, Some(1.0));
        assert_eq!(
            dataset.modified.map(|m| m.to_rfc3339()),
            Some("2015-12-30T12:00:00+00:00".to_string())
        );
        assert!(dataset.metadata.is_some());
    }

    #[test]
    fn test_unit_factors() {
        assert_eq!(unit_factor("bytes"), Some(1e-6));
        assert_eq!(unit_factor("Kbytes"), Some(1e-3));
        assert_eq!(unit_factor("Mbytes"), Some(1.0));
        assert_eq!(unit_factor("Gbytes"), Some(1e3));
        assert_eq!(unit_factor("Tbytes"), Some(1e6));
        assert_eq!(unit_factor("furlongs"), None);
    }

    #[test]
    fn test_gbytes_on_dataset_element() {
        let xml_text = LEAF.replace(
            r#"<dataSize units="Kbytes">1000</dataSize>"#,
            "",
        )
        .replace(
            r#"<date type="modified">"#,
            r#"<dataSize units="Gbytes">1</dataSize><date type="modified">"#,
        );
        let dataset = resolve(&xml_text).unwrap();
        assert_eq!(dataset.declared_size_mb, Some(1000.0));
    }

    #[test]
    fn test_simple_service_with_suffix() {
        let xml_text = LEAF.replace("<serviceName>agg</serviceName>", "<serviceName>http</serviceName>");
        let dataset = resolve(&xml_text).unwrap();
        assert_eq!(dataset.services.len(), 1);
        assert_eq!(
            dataset.services[0],
            Service::new(
                "http",
                "HTTPServer",
                Url::parse("http://host/thredds/fileServer/MODIS-Agg.nc").unwrap()
            )
        );
    }

    #[test]
    fn test_service_name_on_dataset_wins() {
        let xml_text = LEAF.replace(
            r#"<date type="modified">"#,
            r#"<serviceName>http</serviceName><date type="modified">"#,
        );
        let root = xml::parse(xml_text.as_bytes()).unwrap();
        let dataset = root.child("dataset").unwrap();
        assert_eq!(
            ServiceNameSource::locate(dataset),
            Some(ServiceNameSource::Dataset("http"))
        );
    }

    #[test]
    fn test_missing_service_name_is_an_error() {
        let xml_text = LEAF.replace("<serviceName>agg</serviceName>", "");
        assert!(matches!(
            resolve(&xml_text),
            Err(ResolveError::MissingServiceName(ref id)) if id == "MODIS-Agg"
        ));
    }

    #[test]
    fn test_missing_id_is_an_error() {
        let xml_text = LEAF.replace(r#"ID="MODIS-Agg" "#, "");
        assert!(matches!(resolve(&xml_text), Err(ResolveError::MissingId)));
    }

    #[test]
    fn test_unknown_service_name_gives_no_services() {
        let xml_text = LEAF.replace("<serviceName>agg</serviceName>", "<serviceName>gone</serviceName>");
        let dataset = resolve(&xml_text).unwrap();
        assert!(dataset.services.is_empty());
    }

    #[test]
    fn test_invalid_service_base_keeps_other_services() {
        let xml_text = LEAF.replace(
            r#"base="/thredds/wms/""#,
            r#"base="http://[::1/wms/""#,
        );
        let dataset = resolve(&xml_text).unwrap();
        let names: Vec<&str> = dataset.services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["odap", "iso"]);
    }

    #[test]
    fn test_empty_base_does_not_inherit_leaf_query() {
        let xml_text = LEAF
            .replace("<serviceName>agg</serviceName>", "<serviceName>http</serviceName>")
            .replace(r#"base="/thredds/fileServer/""#, r#"base="""#);
        let dataset = resolve(&xml_text).unwrap();
        let url = &dataset.services[0].url;
        assert!(url.query().is_none(), "{url}");
        assert!(!url.as_str().contains("dataset="));
        assert_eq!(url.as_str(), "http://host/thredds/MODIS.xmlMODIS-Agg.nc");
    }

    #[test]
    fn test_locates_dataset_by_id() {
        let xml_text = LEAF.replace(
            "<dataset name=\"MODIS Aggregation\"",
            "<dataset name=\"other\" ID=\"other\" urlPath=\"other\"><serviceName>agg</serviceName></dataset>\n  <dataset name=\"MODIS Aggregation\"",
        );
        let dataset = resolve(&xml_text).unwrap();
        assert_eq!(dataset.id, "MODIS-Agg");
    }
}
