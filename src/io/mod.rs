//! Artifact output.
//!
//! The browser flow ends in a download; here the merged artifact is written
//! into the output directory instead, subject to the overwrite policy.

pub mod writer;

pub use writer::{ArtifactWriter, FileDelivery, WriteOptions, WriteStatistics, resolve_overwrite};
