//! revet shared types
//!
//! Unified data model for the analysis pipeline, so the engine, the built-in
//! analyzers and the CLI all agree on what a target, a finding and a report
//! look like.

#![warn(missing_docs)]

pub mod error;
pub mod finding;
pub mod report;
pub mod target;

pub use error::*;
pub use finding::*;
pub use report::*;
pub use target::*;
