//! Compiled-stylesheet filter.
//!
//! Owns one LESS source file. [`AssetFilter::initialize`] compiles it
//! once and caches the CSS; after that every request whose effective
//! path matches the configured pattern is answered straight from the
//! cache and never reaches the rest of the chain. Non-matching requests
//! pass through untouched.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};
use regex::Regex;
use thiserror::Error;

use crate::http::{build_500_response, build_css_response};
use crate::less;
use crate::logger;

use super::chain::{effective_path, Filter, Next};

/// Errors from constructing or initializing an [`AssetFilter`].
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid served-path pattern `{pattern}`")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("couldn't compile the CSS from LESS sources at `{}`", path.display())]
    Compile {
        path: PathBuf,
        #[source]
        source: less::CompileError,
    },
}

/// Serves one compiled stylesheet at every path matching a pattern.
#[derive(Debug)]
pub struct AssetFilter {
    source: PathBuf,
    pattern: Regex,
    css: Option<Bytes>,
}

impl AssetFilter {
    /// Builds the filter without touching the filesystem. The pattern
    /// must match the whole effective path, so it is anchored here.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Pattern`] if the pattern is not a valid
    /// regular expression.
    pub fn new(pattern: &str, source: impl Into<PathBuf>) -> Result<Self, FilterError> {
        let anchored = format!("^(?:{pattern})$");
        let compiled = Regex::new(&anchored).map_err(|source| FilterError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            source: source.into(),
            pattern: compiled,
            css: None,
        })
    }

    /// Compiles the source file and caches the result, replacing any
    /// previously cached CSS. Call this before mounting the filter;
    /// requests that match before initialization are answered 500.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Compile`] if the file cannot be read or
    /// does not compile.
    pub fn initialize(&mut self) -> Result<(), FilterError> {
        let options = less::Options {
            style: less::OutputStyle::Expanded,
            source_map_url: None,
        };
        let css = less::from_path(&self.source, &options).map_err(|source| {
            FilterError::Compile {
                path: self.source.clone(),
                source,
            }
        })?;
        self.css = Some(Bytes::from(css));
        Ok(())
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The cached CSS, if [`initialize`](Self::initialize) has run.
    pub fn css(&self) -> Option<&Bytes> {
        self.css.as_ref()
    }

    fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }
}

#[async_trait]
impl<B: Send + 'static> Filter<B> for AssetFilter {
    async fn handle(&self, request: Request<B>, next: Next<'_, B>) -> Response<Full<Bytes>> {
        if self.matches(effective_path(&request)) {
            return self.css.as_ref().map_or_else(
                || {
                    logger::log_error(&format!(
                        "Stylesheet `{}` requested before initialization",
                        self.source.display()
                    ));
                    build_500_response()
                },
                |css| build_css_response(css.clone()),
            );
        }
        next.run(request).await
    }
}
