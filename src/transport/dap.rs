//! OPeNDAP (DAP2) dataset inspection.
//!
//! Used only as a fallback when a catalog does not declare a dataset's size: the
//! Dataset Descriptor Structure (`<endpoint>.dds`) lists every variable with its type and
//! shape, which is enough to compute how many bytes the dataset holds.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use url::Url;

use crate::transport::{FetchError, Fetcher};

#[derive(Error, Debug)]
pub enum InspectError {
    #[error("Remote array inspection is not available")]
    Unavailable,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Invalid DDS: {0}")]
    Malformed(String),
}

/// Describe a remote array dataset as `variable name -> bytes`
pub trait ArrayInspector: Send + Sync + 'static {
    fn describe(
        &self,
        url: &Url,
    ) -> impl Future<Output = Result<BTreeMap<String, u64>, InspectError>> + Send;
}

/// Inspector used when DAP inspection is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInspector;

impl ArrayInspector for NoInspector {
    async fn describe(&self, _url: &Url) -> Result<BTreeMap<String, u64>, InspectError> {
        Err(InspectError::Unavailable)
    }
}

/// Inspector that reads the DAP2 DDS of an OPeNDAP endpoint
#[derive(Debug)]
pub struct DdsInspector<F> {
    fetcher: Arc<F>,
}

impl<F: Fetcher> DdsInspector<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self { fetcher }
    }
}

impl<F: Fetcher> ArrayInspector for DdsInspector<F> {
    async fn describe(&self, url: &Url) -> Result<BTreeMap<String, u64>, InspectError> {
        let mut dds_url = url.clone();
        dds_url.set_query(None);
        dds_url.set_path(&format!("{}.dds", url.path()));

        let body = self.fetcher.fetch(&dds_url).await?;
        parse_dds(&String::from_utf8_lossy(&body))
    }
}

/// Bytes per element of a DAP2 base type; `None` for unknown types
fn type_width(type_name: &str) -> Option<u64> {
    match type_name {
        "Byte" | "UInt8" | "Int8" | "Char" => Some(1),
        "Int16" | "UInt16" => Some(2),
        "Int32" | "UInt32" | "Float32" => Some(4),
        "Int64" | "UInt64" | "Float64" => Some(8),
        // variable-length, not counted
        "String" | "Url" => Some(0),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Dataset,
    Structure,
    Sequence,
    Grid { in_maps: bool },
}

/// Parse a DDS into `variable name -> bytes`.
///
/// Grid map vectors are skipped since they duplicate coordinate variables; Sequence
/// members have no static size and are skipped too.
///
/// # Errors
///
/// Returns `InspectError::Malformed` if the text is not a `Dataset { ... } name;` block
/// or contains an unparseable declaration.
pub fn parse_dds(text: &str) -> Result<BTreeMap<String, u64>, InspectError> {
    let mut sizes = BTreeMap::new();
    let mut stack: Vec<Container> = Vec::new();
    let mut closed = false;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if closed {
            return Err(InspectError::Malformed(format!("content after dataset: {line}")));
        }

        if let Some(opener) = line.strip_suffix('{').map(str::trim) {
            let container = match opener {
                "Dataset" if stack.is_empty() => Container::Dataset,
                "Structure" => Container::Structure,
                "Sequence" => Container::Sequence,
                "Grid" => Container::Grid { in_maps: false },
                other => return Err(InspectError::Malformed(format!("unexpected block '{other}'"))),
            };
            if stack.is_empty() && container != Container::Dataset {
                return Err(InspectError::Malformed("missing Dataset block".to_string()));
            }
            stack.push(container);
            continue;
        }

        if line.starts_with('}') {
            if stack.pop().is_none() {
                return Err(InspectError::Malformed("unbalanced '}'".to_string()));
            }
            closed = stack.is_empty();
            continue;
        }

        let skip = stack
            .iter()
            .any(|c| matches!(c, Container::Sequence | Container::Grid { in_maps: true }));
        match (line, stack.last_mut()) {
            ("ARRAY:", Some(Container::Grid { in_maps })) => *in_maps = false,
            ("MAPS:", Some(Container::Grid { in_maps })) => *in_maps = true,
            (_, None) => return Err(InspectError::Malformed("missing Dataset block".to_string())),
            _ => {
                let (name, bytes) = parse_declaration(line)?;
                if !skip {
                    *sizes.entry(name).or_insert(0) += bytes;
                }
            }
        }
    }

    if !closed {
        return Err(InspectError::Malformed("unterminated Dataset block".to_string()));
    }
    Ok(sizes)
}

/// `Float32 sst[time = 1][lat = 180][lon = 360];` -> ("sst", 4 * 1 * 180 * 360)
fn parse_declaration(line: &str) -> Result<(String, u64), InspectError> {
    let malformed = || InspectError::Malformed(format!("bad declaration: {line}"));

    let decl = line.strip_suffix(';').ok_or_else(malformed)?.trim();
    let (type_name, rest) = decl.split_once(char::is_whitespace).ok_or_else(malformed)?;
    let width = type_width(type_name).ok_or_else(malformed)?;

    let rest = rest.trim();
    let (name, dims) = match rest.find('[') {
        Some(idx) => (rest[..idx].trim(), &rest[idx..]),
        None => (rest, ""),
    };
    if name.is_empty() {
        return Err(malformed());
    }

    let mut count: u64 = 1;
    for dim in dims.split('[').skip(1) {
        let inner = dim.trim().strip_suffix(']').ok_or_else(malformed)?;
        let size = inner
            .rsplit('=')
            .next()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .ok_or_else(malformed)?;
        count = count.saturating_mul(size);
    }

    Ok((name.to_string(), width.saturating_mul(count)))
}
