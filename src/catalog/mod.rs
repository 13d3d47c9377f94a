//! THREDDS catalog documents.
//!
//! A catalog is an XML document in the InvCatalog namespace that either references
//! further catalogs (`catalogRef`) or describes datasets (`dataset`) together with the
//! `service` entries used to reach them.
//!
//! ## Example
//!
//! ```rust
//! use thredds_crawler::catalog::document::CatalogDocument;
//! use url::Url;
//!
//! let url = Url::parse("http://example.org/thredds/catalog.xml").unwrap();
//! let xml = br#"<catalog xmlns:xlink="http://www.w3.org/1999/xlink">
//!   <catalogRef xlink:href="sub/catalog.xml" xlink:title="Sub"/>
//! </catalog>"#;
//! let doc = CatalogDocument::parse(&url, xml).unwrap();
//! assert_eq!(doc.refs[0].url.as_str(), "http://example.org/thredds/sub/catalog.xml");
//! ```

pub mod document;
pub mod links;
pub mod xml;
