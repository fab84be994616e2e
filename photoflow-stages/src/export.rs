//! Export sink stage

use std::path::PathBuf;

use photoflow_core::{MetaValue, Stage};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::photo::{Photo, PhotoObservation};

/// Sink: write each photo under the output root, preserving the
/// directory structure relative to the input root.
///
/// On success the destination is recorded under `output_path`; on
/// failure the observation is logged, flagged with `export_failed`, and
/// passed through unmodified otherwise. A sink never rejects.
pub struct Export {
    output_root: PathBuf,
    input_root: PathBuf,
}

impl Export {
    /// Export photos from `input_root` into `output_root`
    pub fn new(output_root: impl Into<PathBuf>, input_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            input_root: input_root.into(),
        }
    }

    fn write(&self, obs: &mut PhotoObservation) -> Result<PathBuf> {
        let relative = obs
            .identifier()
            .strip_prefix(&self.input_root)
            .map_err(|_| {
                Error::Format(format!(
                    "{} is not under input root {}",
                    obs.identifier().display(),
                    self.input_root.display()
                ))
            })?
            .to_path_buf();

        let destination = self.output_root.join(relative);
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let photo = obs.content()?;
        std::fs::write(&destination, photo.bytes())?;
        Ok(destination)
    }
}

impl Stage<Photo> for Export {
    fn map(&self, mut obs: PhotoObservation) -> photoflow_core::Result<PhotoObservation> {
        match self.write(&mut obs) {
            Ok(destination) => {
                info!(destination = %destination.display(), "wrote photo");
                obs.metadata.insert(
                    "output_path".to_string(),
                    MetaValue::Text(destination.display().to_string()),
                );
            }
            Err(err) => {
                warn!(
                    identifier = %obs.identifier().display(),
                    "export failed: {err}"
                );
                obs.metadata
                    .insert("export_failed".to_string(), MetaValue::Bool(true));
            }
        }
        Ok(obs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::photo_loader;
    use crate::photo::testdata::png_bytes;
    use photoflow_core::Observation;

    fn fixture(bytes: &[u8], name: &str) -> (tempfile::TempDir, PhotoObservation) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, bytes).unwrap();
        let obs = Observation::new(path, photo_loader());
        (dir, obs)
    }

    #[test]
    fn test_writes_and_records_destination() {
        let (dir, obs) = fixture(&png_bytes(200, 100), "photo.png");
        let output_root = dir.path().join("out");
        let stage = Export::new(&output_root, dir.path());

        let result = stage.map(obs).unwrap();

        let destination = output_root.join("photo.png");
        assert!(destination.exists());
        assert_eq!(
            result.metadata.get("output_path").and_then(MetaValue::as_text),
            Some(destination.display().to_string().as_str())
        );
        assert!(result.metadata.get("export_failed").is_none());
    }

    #[test]
    fn test_preserves_directory_structure() {
        let (dir, obs) = fixture(&png_bytes(100, 100), "trip/day1/photo.png");
        let output_root = dir.path().join("out");
        let stage = Export::new(&output_root, dir.path());

        stage.map(obs).unwrap();

        assert!(output_root.join("trip/day1/photo.png").exists());
    }

    #[test]
    fn test_failure_flags_and_passes_through() {
        let (dir, obs) = fixture(&png_bytes(100, 100), "photo.png");
        // Input root deliberately wrong: strip_prefix fails
        let stage = Export::new(dir.path().join("out"), "/nonexistent/root");

        let result = stage.map(obs).unwrap();

        assert_eq!(
            result.metadata.get("export_failed").and_then(MetaValue::as_bool),
            Some(true)
        );
        assert!(result.metadata.get("output_path").is_none());
    }
}
