//! Serves one LESS stylesheet as compiled CSS from an HTTP filter chain.
//!
//! The stylesheet is compiled once at startup and cached; every request
//! whose path matches the configured pattern is answered from the cache
//! and everything else falls through the chain to its terminal handler.

pub mod config;
pub mod filter;
pub mod http;
pub mod less;
pub mod logger;
pub mod server;

pub use filter::{AssetFilter, Filter, FilterChain, FilterError, Handler, Next, NotFound, PathInfo};
