//! Request filter chain.
//!
//! Requests travel through an ordered list of filters toward a terminal
//! handler. Each filter either produces a response itself or hands the
//! request to [`Next`], which runs the remaining filters and finally the
//! terminal. [`Next`] is consumed by `run`, so a filter cannot invoke
//! the rest of the chain twice.

use std::sync::Arc;

use async_trait::async_trait;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};

use crate::http::build_404_response;

/// Path below the mount prefix, stamped into request extensions by the
/// connection layer when a prefix is configured.
#[derive(Debug, Clone)]
pub struct PathInfo(pub String);

/// The path a filter should match against: the stamped [`PathInfo`] if
/// present, otherwise the full request path.
pub fn effective_path<B>(request: &Request<B>) -> &str {
    request
        .extensions()
        .get::<PathInfo>()
        .map_or_else(|| request.uri().path(), |info| info.0.as_str())
}

/// Terminal request handler at the end of a chain.
#[async_trait]
pub trait Handler<B>: Send + Sync {
    async fn handle(&self, request: Request<B>) -> Response<Full<Bytes>>;
}

/// A pipeline stage. Implementations either answer the request or pass
/// it on via `next.run(request)`, exactly once.
#[async_trait]
pub trait Filter<B>: Send + Sync {
    async fn handle(&self, request: Request<B>, next: Next<'_, B>) -> Response<Full<Bytes>>;
}

/// The remainder of a chain from one filter's point of view.
pub struct Next<'a, B> {
    filters: &'a [Arc<dyn Filter<B>>],
    terminal: &'a dyn Handler<B>,
}

impl<B: Send + 'static> Next<'_, B> {
    /// Runs the rest of the chain to completion.
    pub async fn run(self, request: Request<B>) -> Response<Full<Bytes>> {
        match self.filters.split_first() {
            Some((filter, rest)) => {
                let next = Next {
                    filters: rest,
                    terminal: self.terminal,
                };
                filter.handle(request, next).await
            }
            None => self.terminal.handle(request).await,
        }
    }
}

/// An ordered set of filters in front of a terminal handler.
pub struct FilterChain<B> {
    filters: Vec<Arc<dyn Filter<B>>>,
    terminal: Arc<dyn Handler<B>>,
}

impl<B: Send + 'static> FilterChain<B> {
    pub fn new(terminal: Arc<dyn Handler<B>>) -> Self {
        Self {
            filters: Vec::new(),
            terminal,
        }
    }

    /// Appends a filter. Filters run in mount order.
    #[must_use]
    pub fn mount(mut self, filter: Arc<dyn Filter<B>>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Sends one request through the chain.
    pub async fn dispatch(&self, request: Request<B>) -> Response<Full<Bytes>> {
        let next = Next {
            filters: &self.filters,
            terminal: self.terminal.as_ref(),
        };
        next.run(request).await
    }
}

/// Terminal that answers 404 for everything no filter claimed.
pub struct NotFound;

#[async_trait]
impl<B: Send + 'static> Handler<B> for NotFound {
    async fn handle(&self, _request: Request<B>) -> Response<Full<Bytes>> {
        build_404_response()
    }
}
