//! Filter pipeline module.
//!
//! Provides the generic request chain and the stylesheet filter that
//! serves compiled CSS from it.

pub mod asset;
pub mod chain;

pub use asset::{AssetFilter, FilterError};
pub use chain::{effective_path, Filter, FilterChain, Handler, Next, NotFound, PathInfo};
