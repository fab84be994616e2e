//! Photo-domain stages for photoflow pipelines
//!
//! This crate supplies the concrete collaborators the generic engine
//! leaves abstract: a directory-scanning source, a header-parsing photo
//! content type, EXIF date extraction, orientation and date filters, a
//! size annotator, and an export sink.

#![warn(missing_docs)]

mod error;

pub mod annotate;
pub mod exif;
pub mod export;
pub mod filters;
pub mod photo;
pub mod scan;

pub use annotate::AnnotateSize;
pub use error::{Error, Result};
pub use export::Export;
pub use filters::{DateRange, LandscapeOnly};
pub use photo::{load_photo, photo_loader, Photo, PhotoFormat, PhotoObservation, PHOTO_EXTENSIONS};
pub use scan::DirectoryScan;

// Re-export core types for convenience
pub use photoflow_core::{
    Branch, Element, Loader, MetaValue, Metadata, ObsStream, Observation, Pipeline, Stage,
    StreamStage,
};
