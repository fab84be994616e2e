//! Core traits, data structures, and abstractions for lazy data-flow pipelines
//!
//! This crate provides the domain-agnostic execution engine: typed
//! observations with lazily loaded content, filter/map stages, fan-in
//! merge strategies, pipeline composition, and branch fan-out.
//! Everything is single-threaded and pull-based: composing a pipeline
//! builds a chain of lazy streams, and no stage executes until the
//! final consumer pulls an element.

#![warn(missing_docs)]

pub mod branch;
pub mod element;
pub mod error;
pub mod merge;
pub mod metadata;
pub mod observation;
pub mod pipeline;
pub mod stage;

// Re-export key types for convenience
pub use branch::Branch;
pub use element::Element;
pub use error::{Error, Result};
pub use merge::{BatchMerge, Concat, Interleave, MergeStage};
pub use metadata::{MetaValue, Metadata};
pub use observation::{Loader, Observation};
pub use pipeline::{Pipeline, PipelineStage};
pub use stage::{ObsStream, Stage, StreamStage};
