//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from
//! specific business logic.

pub mod response;

// Re-export commonly used types
pub use response::{build_404_response, build_500_response, build_css_response};
