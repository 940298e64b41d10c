// src/checker/mod.rs
// =============================================================================
// Link extraction and verification.
//
// Submodules:
// - extract: fetch a page and pull out its normalized links
// - verify: probe each unique link once and classify the outcome
// =============================================================================

mod extract;
mod verify;

pub use extract::{extract_links, LinkExtractor};
pub use verify::{
    check_link, verify_concurrent, verify_sequential, Classification, LinkRecord, VerifyState,
};
