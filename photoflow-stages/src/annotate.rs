//! Annotation stages

use photoflow_core::{Result, Stage};

use crate::photo::{Photo, PhotoObservation};

/// Transform: record pixel dimensions and aspect class in metadata.
///
/// Writes `width`, `height`, and `aspect` ("landscape", "portrait" or
/// "square"). Content must be loadable; an unreadable photo here is an
/// unhandled failure and terminates the run.
pub struct AnnotateSize;

impl Stage<Photo> for AnnotateSize {
    fn map(&self, mut obs: PhotoObservation) -> Result<PhotoObservation> {
        let (width, height) = {
            let photo = obs.content()?;
            (photo.width(), photo.height())
        };

        let aspect = match width.cmp(&height) {
            std::cmp::Ordering::Greater => "landscape",
            std::cmp::Ordering::Less => "portrait",
            std::cmp::Ordering::Equal => "square",
        };

        obs.metadata.insert("width".to_string(), width.into());
        obs.metadata.insert("height".to_string(), height.into());
        obs.metadata.insert("aspect".to_string(), aspect.into());
        Ok(obs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::photo_loader;
    use crate::photo::testdata::png_bytes;
    use photoflow_core::{MetaValue, Observation};
    use test_case::test_case;

    fn obs_with_size(width: u32, height: u32) -> PhotoObservation {
        let mut obs = Observation::new("/photo.png", photo_loader());
        obs.set_content(Photo::from_bytes(png_bytes(width, height), None).unwrap());
        obs
    }

    #[test_case(200, 100, "landscape")]
    #[test_case(100, 200, "portrait")]
    #[test_case(150, 150, "square")]
    fn test_annotates_dimensions_and_aspect(width: u32, height: u32, aspect: &str) {
        let out = AnnotateSize.map(obs_with_size(width, height)).unwrap();

        assert_eq!(
            out.metadata.get("width").and_then(MetaValue::as_int),
            Some(i64::from(width))
        );
        assert_eq!(
            out.metadata.get("height").and_then(MetaValue::as_int),
            Some(i64::from(height))
        );
        assert_eq!(
            out.metadata.get("aspect").and_then(MetaValue::as_text),
            Some(aspect)
        );
    }

    #[test]
    fn test_unreadable_content_is_fatal() {
        let obs = Observation::new("/missing.png", photo_loader());
        assert!(AnnotateSize.map(obs).is_err());
    }
}
