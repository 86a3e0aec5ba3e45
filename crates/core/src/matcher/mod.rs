//! Matching search results against local releases.

mod size;
mod title;

pub use size::SizeMatcher;
pub use title::canonicalize_title;
