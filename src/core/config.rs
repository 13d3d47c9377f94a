use chrono::{DateTime, Utc};
use regex::Regex;
use thiserror::Error;

use crate::filter::dates::parse_timestamp;
use crate::transport::Credential;

/// Catalog names and catalogRef titles skipped unless the caller overrides them:
/// raw file listings, individual-file mounts and forecast-run groupings.
pub const DEFAULT_SKIPS: &[&str] = &[
    ".*files.*",
    ".*Individual Files.*",
    ".*File_Access.*",
    ".*Forecast Model Run.*",
    ".*Constant Forecast Offset.*",
    ".*Constant Forecast Date.*",
];

/// Default number of concurrent fetch/resolve jobs
pub const DEFAULT_WORKERS: usize = 4;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid '{field}' timestamp: {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("Worker count must be at least 1")]
    NoWorkers,
}

/// Immutable settings for one crawl
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Dataset ID patterns; `None` selects everything
    pub select: Option<Vec<Regex>>,
    /// Dataset name and catalogRef title patterns to skip
    pub skip: Vec<Regex>,
    pub before: Option<DateTime<Utc>>,
    pub after: Option<DateTime<Utc>>,
    pub credential: Option<Credential>,
    pub workers: usize,
    /// Log every skip/select decision
    pub verbose: bool,
    /// Skip TLS certificate validation when fetching
    pub accept_invalid_certs: bool,
}

impl CrawlConfig {
    pub fn builder() -> CrawlConfigBuilder {
        CrawlConfigBuilder::default()
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            select: None,
            skip: compile_patterns(DEFAULT_SKIPS.iter().copied())
                .unwrap_or_default(),
            before: None,
            after: None,
            credential: None,
            workers: DEFAULT_WORKERS,
            verbose: false,
            accept_invalid_certs: false,
        }
    }
}

/// Raw, unvalidated crawl settings. `build` compiles patterns and parses bounds.
#[derive(Debug, Clone, Default)]
pub struct CrawlConfigBuilder {
    select: Option<Vec<String>>,
    skip: Option<Vec<String>>,
    extra_skip: Vec<String>,
    before: Option<String>,
    after: Option<String>,
    credential: Option<Credential>,
    workers: Option<usize>,
    verbose: bool,
    accept_invalid_certs: bool,
}

impl CrawlConfigBuilder {
    #[must_use]
    pub fn with_select<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the default skip list
    #[must_use]
    pub fn with_skip<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    /// Append to the skip list (default or replaced)
    #[must_use]
    pub fn with_extra_skip<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_skip.extend(patterns.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_before(mut self, timestamp: impl Into<String>) -> Self {
        self.before = Some(timestamp.into());
        self
    }

    #[must_use]
    pub fn with_after(mut self, timestamp: impl Into<String>) -> Self {
        self.after = Some(timestamp.into());
        self
    }

    #[must_use]
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Validate and freeze the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` if any select or skip pattern is not a valid
    /// regex, `ConfigError::InvalidTimestamp` if `before`/`after` cannot be parsed, or
    /// `ConfigError::NoWorkers` if the worker count is zero.
    pub fn build(self) -> Result<CrawlConfig, ConfigError> {
        let select = self
            .select
            .map(|patterns| compile_patterns(patterns.iter().map(String::as_str)))
            .transpose()?;

        let mut skip = match &self.skip {
            Some(patterns) => compile_patterns(patterns.iter().map(String::as_str))?,
            None => compile_patterns(DEFAULT_SKIPS.iter().copied())?,
        };
        skip.extend(compile_patterns(self.extra_skip.iter().map(String::as_str))?);

        let before = parse_bound("before", self.before.as_deref())?;
        let after = parse_bound("after", self.after.as_deref())?;

        let workers = self.workers.unwrap_or(DEFAULT_WORKERS);
        if workers == 0 {
            return Err(ConfigError::NoWorkers);
        }

        Ok(CrawlConfig {
            select,
            skip,
            before,
            after,
            credential: self.credential,
            workers,
            verbose: self.verbose,
            accept_invalid_certs: self.accept_invalid_certs,
        })
    }
}

fn compile_patterns<'a>(patterns: impl Iterator<Item = &'a str>) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .map(|p| {
            Regex::new(p).map_err(|source| ConfigError::InvalidPattern {
                pattern: p.to_string(),
                source,
            })
        })
        .collect()
}

fn parse_bound(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, ConfigError> {
    value
        .map(|v| {
            parse_timestamp(v).ok_or_else(|| ConfigError::InvalidTimestamp {
                field,
                value: v.to_string(),
            })
        })
        .transpose()
}
