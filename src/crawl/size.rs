use tracing::{debug, warn};

use crate::core::dataset::Dataset;
use crate::transport::dap::{ArrayInspector, InspectError};

/// Service type whose endpoint can describe the dataset's arrays
pub const ARRAY_SERVICE_TYPE: &str = "OPENDAP";

const BYTES_PER_MB: f64 = 1e6;

/// Best-effort dataset size in megabytes.
///
/// The catalog's declared size wins. Otherwise the dataset's OPeNDAP endpoint is
/// inspected and its variables' byte footprints summed. Returns `None` when neither is
/// possible; inspection failures are logged, never returned.
pub async fn estimate_size<I: ArrayInspector>(dataset: &Dataset, inspector: &I) -> Option<f64> {
    if let Some(size) = dataset.declared_size_mb {
        return Some(size);
    }

    let service = dataset.service_of_type(ARRAY_SERVICE_TYPE)?;
    match inspector.describe(&service.url).await {
        Ok(variables) => {
            let bytes: u64 = variables.values().fold(0, |acc, b| acc.saturating_add(*b));
            #[allow(clippy::cast_precision_loss)]
            let size = bytes as f64 / BYTES_PER_MB;
            debug!(dataset = %dataset.id, variables = variables.len(), size_mb = size, "Estimated size from DDS");
            Some(size)
        }
        Err(InspectError::Unavailable) => {
            debug!(dataset = %dataset.id, "Remote array inspection unavailable, size unknown");
            None
        }
        Err(e) => {
            warn!(dataset = %dataset.id, url = %service.url, error = %e, "Could not estimate size");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dataset::Service;
    use crate::transport::dap::NoInspector;
    use std::collections::BTreeMap;
    use url::Url;

    struct FixedInspector(BTreeMap<String, u64>);

    impl ArrayInspector for FixedInspector {
        async fn describe(&self, _url: &Url) -> Result<BTreeMap<String, u64>, InspectError> {
            Ok(self.0.clone())
        }
    }

    struct FailingInspector;

    impl ArrayInspector for FailingInspector {
        async fn describe(&self, _url: &Url) -> Result<BTreeMap<String, u64>, InspectError> {
            Err(InspectError::Malformed("boom".to_string()))
        }
    }

    fn dataset(declared: Option<f64>, service_type: &str) -> Dataset {
        let url = Url::parse("http://host/thredds/dodsC/x").unwrap();
        Dataset {
            id: "x".to_string(),
            name: "x".to_string(),
            catalog_url: Url::parse("http://host/thredds/catalog.xml").unwrap(),
            metadata: None,
            declared_size_mb: declared,
            size_mb: declared,
            modified: None,
            services: vec![Service::new("s", service_type, url)],
        }
    }

    fn two_megabytes() -> FixedInspector {
        FixedInspector(BTreeMap::from([
            ("a".to_string(), 1_500_000),
            ("b".to_string(), 500_000),
        ]))
    }

    #[tokio::test]
    async fn test_declared_size_wins() {
        let size = estimate_size(&dataset(Some(12.5), "OPENDAP"), &two_megabytes()).await;
        assert_eq!(size, Some(12.5));
    }

    #[tokio::test]
    async fn test_falls_back_to_inspection() {
        let size = estimate_size(&dataset(None, "OpenDAP"), &two_megabytes()).await;
        assert_eq!(size, Some(2.0));
    }

    #[tokio::test]
    async fn test_no_array_service_means_unknown() {
        assert_eq!(estimate_size(&dataset(None, "WMS"), &two_megabytes()).await, None);
    }

    #[tokio::test]
    async fn test_inspection_failures_degrade_to_none() {
        assert_eq!(estimate_size(&dataset(None, "OPENDAP"), &NoInspector).await, None);
        assert_eq!(estimate_size(&dataset(None, "OPENDAP"), &FailingInspector).await, None);
    }
}
