//! Directory-scan source stage

use std::path::{Path, PathBuf};
use std::sync::Arc;

use photoflow_core::{Element, ObsStream, Observation, StreamStage};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::photo::{photo_loader, Photo, PhotoObservation, PHOTO_EXTENSIONS};

/// Source: recursively walks a directory tree and yields an observation
/// per recognized photo file.
///
/// Registered as a full-control stream stage: it drains whatever input
/// arrives (typically nothing) and generates afresh from the
/// filesystem. Enumeration is deterministic — depth-first with entries
/// sorted by file name — so pipeline output is reproducible.
pub struct DirectoryScan {
    root: PathBuf,
}

impl DirectoryScan {
    /// Scan the given root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Lazily enumerate photo observations under the root.
    ///
    /// Unreadable directory entries are logged and skipped; a broken
    /// subtree must not abort the scan.
    pub fn scan(&self) -> impl Iterator<Item = PhotoObservation> {
        let loader = photo_loader();
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!("skipping unreadable entry: {err}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && is_photo_path(entry.path()))
            .map(move |entry| {
                debug!(path = %entry.path().display(), "scan hit");
                Observation::new(entry.path(), Arc::clone(&loader))
            })
    }
}

impl StreamStage<Photo> for DirectoryScan {
    fn process(&self, input: ObsStream<Photo>) -> ObsStream<Photo> {
        let name = StreamStage::<Photo>::name(self);
        let generated = self.scan().map(move |mut obs| {
            obs.sigils.push(name.to_string());
            Ok(Element::Single(obs))
        });
        // Consume the incoming stream first to respect the general
        // stage contract, then generate from the filesystem.
        Box::new(input.filter(|_| false).chain(generated))
    }
}

fn is_photo_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let lowered = ext.to_lowercase();
            PHOTO_EXTENSIONS.contains(&lowered.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::testdata::png_bytes;
    use photoflow_core::Result;

    fn fixture_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("landscape.jpg"), png_bytes(200, 100)).unwrap();
        std::fs::write(dir.path().join("portrait.png"), png_bytes(100, 200)).unwrap();
        let sub = dir.path().join("subdir");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("square.tiff"), png_bytes(100, 100)).unwrap();
        dir
    }

    #[test]
    fn test_scan_finds_photos_recursively() {
        let dir = fixture_dir();
        let scan = DirectoryScan::new(dir.path());

        let observations: Vec<_> = scan.scan().collect();
        assert_eq!(observations.len(), 3);
    }

    #[test]
    fn test_scan_ignores_non_photos() {
        let dir = fixture_dir();
        std::fs::write(dir.path().join("readme.txt"), "not a photo").unwrap();

        let scan = DirectoryScan::new(dir.path());
        assert_eq!(scan.scan().count(), 3);
    }

    #[test]
    fn test_scan_order_is_deterministic() {
        let dir = fixture_dir();
        let scan = DirectoryScan::new(dir.path());

        let first: Vec<_> = scan.scan().map(|o| o.identifier().to_path_buf()).collect();
        let second: Vec<_> = scan.scan().map(|o| o.identifier().to_path_buf()).collect();
        assert_eq!(first, second);

        let names: Vec<_> = first
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["landscape.jpg", "portrait.png", "square.tiff"]);
    }

    #[test]
    fn test_process_ignores_input_and_tags_own_name() {
        let dir = fixture_dir();
        let scan = DirectoryScan::new(dir.path());

        // A stray upstream observation must not leak through
        let upstream: ObsStream<Photo> = Box::new(std::iter::once(Ok(Element::Single(
            Observation::new("/upstream.jpg", photo_loader()),
        ))));

        let out: Vec<_> = scan.process(upstream).collect::<Result<_>>().unwrap();
        assert_eq!(out.len(), 3);
        for el in &out {
            for obs in el.observations() {
                assert_eq!(obs.sigils, vec!["DirectoryScan"]);
                assert!(obs.identifier().starts_with(dir.path()));
            }
        }
    }
}
