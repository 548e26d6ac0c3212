// src/mirror/mod.rs
// =============================================================================
// This module contains the scoped site mirroring logic.
//
// Submodules:
// - crawler: the worklist loop that drives a whole run
// - scope: decides which links are in bounds and where they land on disk
// - links: pulls raw hrefs out of directory listings
// - fetch: the shared HTTP client and listing fetches
// - download: saves one file atomically
// - report: counts and failures for the end-of-run summary
// - error: per-URL error types
// =============================================================================

mod crawler;
mod download;
mod error;
mod fetch;
mod links;
mod report;
mod scope;

#[cfg(test)]
mod test_server;

pub use crawler::mirror;
pub use error::FailureKind;
pub use report::MirrorReport;
