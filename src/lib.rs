// src/lib.rs
// =============================================================================
// link-verifier: crawl a website and verify that every link it contains
// still resolves.
//
// Pipeline: discover internal pages breadth-first, extract every anchor
// link from every page, check each unique link exactly once, and report
// the ones that answered with HTTP 404 or 500.
// =============================================================================

pub mod checker;
pub mod cli;
pub mod crawl;
pub mod link;
pub mod report;
pub mod verifier;

pub use report::VerificationReport;
pub use verifier::{Settings, Verifier};
