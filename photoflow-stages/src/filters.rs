//! Selective filter stages
//!
//! Filters reject based on derived properties of the photo content.
//! Loader and content failures are caught here and translated into
//! rejection plus a diagnostic; they never abort the run.

use chrono::NaiveDateTime;
use photoflow_core::{Result, Stage};
use tracing::warn;

use crate::exif;
use crate::photo::{Photo, PhotoObservation};

/// Contrast: landscape vs portrait. Passes width > height.
pub struct LandscapeOnly;

impl Stage<Photo> for LandscapeOnly {
    fn filter(&self, obs: &mut PhotoObservation) -> Result<bool> {
        match obs.content() {
            Ok(photo) => Ok(photo.is_landscape()),
            Err(err) => {
                warn!(
                    identifier = %obs.identifier().display(),
                    "failed to check orientation: {err}"
                );
                Ok(false)
            }
        }
    }
}

/// Contrast: in-range vs out-of-range by EXIF capture date.
///
/// Records the extracted date under `date_taken`; photos without a
/// readable EXIF date are rejected with a diagnostic.
pub struct DateRange {
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
}

impl DateRange {
    /// Keep photos taken within the given (inclusive) bounds; `None`
    /// leaves that side unbounded.
    pub fn new(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self { start, end }
    }
}

impl Stage<Photo> for DateRange {
    fn filter(&self, obs: &mut PhotoObservation) -> Result<bool> {
        let date_taken = match obs.content() {
            Ok(photo) => exif::datetime_original(photo.bytes()),
            Err(err) => {
                warn!(
                    identifier = %obs.identifier().display(),
                    "failed to read content for date filter: {err}"
                );
                return Ok(false);
            }
        };

        let Some(date_taken) = date_taken else {
            warn!(
                identifier = %obs.identifier().display(),
                "no EXIF date, skipping"
            );
            return Ok(false);
        };

        obs.metadata.insert("date_taken".to_string(), date_taken.into());

        if self.start.is_some_and(|start| date_taken < start) {
            return Ok(false);
        }
        if self.end.is_some_and(|end| date_taken > end) {
            return Ok(false);
        }
        Ok(true)
    }
}
