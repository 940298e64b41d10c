// src/crawl/mod.rs
// =============================================================================
// Breadth-first page discovery over a site's internal link graph.
// =============================================================================

mod discover;

pub use discover::{discover_batched, discover_sequential};
