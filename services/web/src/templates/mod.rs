//! services/web/src/templates/mod.rs
//!
//! Page fragments loaded from the template root and merged with per-request
//! context at render time.

pub mod cache;
pub mod render;

pub use cache::TemplateCache;
pub use render::render;

/// Template loading and rendering failures. Both are faults of the
/// deployment, never of the request.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("failed to load template '{0}': {1}")]
    Load(String, String),
    #[error("malformed template: {0}")]
    Parse(String),
}
