//! Observation - the unit of data flowing through a pipeline
//!
//! An observation couples an immutable source identifier with a lazily
//! loaded content value, an open metadata bag, and the provenance trail
//! of stages it has passed through.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::metadata::Metadata;

/// Capability that produces content for an identifier.
///
/// Invoked lazily by [`Observation::content`], at most once per
/// load/unload cycle. Loaders are shared, stateless and cheap to clone.
pub type Loader<T> = Arc<dyn Fn(&Path) -> anyhow::Result<T> + Send + Sync>;

/// A unit of data under attention.
///
/// Content is computed from the identifier via the loader on first
/// access and cached; [`Observation::unload`] releases the cache to
/// bound memory, forcing recomputation on the next access.
pub struct Observation<T> {
    /// Opaque source locator, immutable after creation
    identifier: PathBuf,

    /// Content loading capability
    loader: Loader<T>,

    /// Cached content, populated on first access
    content: Option<T>,

    /// Accumulated annotations from stages
    pub metadata: Metadata,

    /// Names of stages this observation passed through, in order
    pub sigils: Vec<String>,
}

impl<T> Observation<T> {
    /// Create an observation for the given identifier and loader
    pub fn new(identifier: impl Into<PathBuf>, loader: Loader<T>) -> Self {
        Self {
            identifier: identifier.into(),
            loader,
            content: None,
            metadata: Metadata::new(),
            sigils: Vec::new(),
        }
    }

    /// The source identifier
    pub fn identifier(&self) -> &Path {
        &self.identifier
    }

    /// Lazily load the content, caching it for subsequent accesses.
    ///
    /// Loader failures surface here as [`Error::Loader`]; they are
    /// never swallowed by the core.
    pub fn content(&mut self) -> Result<&T> {
        if self.content.is_none() {
            let loaded = (self.loader)(&self.identifier).map_err(|source| Error::Loader {
                identifier: self.identifier.clone(),
                source,
            })?;
            self.content = Some(loaded);
        }
        // Populated above; re-borrow to satisfy the borrow checker.
        self.content
            .as_ref()
            .ok_or_else(|| Error::InvalidArgument("content cache empty after load".to_string()))
    }

    /// Mutable access to the lazily loaded content
    pub fn content_mut(&mut self) -> Result<&mut T> {
        self.content()?;
        self.content
            .as_mut()
            .ok_or_else(|| Error::InvalidArgument("content cache empty after load".to_string()))
    }

    /// Override the cached content without invoking the loader
    pub fn set_content(&mut self, value: T) {
        self.content = Some(value);
    }

    /// Release the cached content; the next access reloads it
    pub fn unload(&mut self) {
        self.content = None;
    }

    /// Whether content is currently cached
    pub fn is_loaded(&self) -> bool {
        self.content.is_some()
    }

    /// Whether this observation passed through a stage of the given name
    pub fn passed(&self, stage: &str) -> bool {
        self.sigils.iter().any(|s| s == stage)
    }
}

impl<T: Clone> Clone for Observation<T> {
    fn clone(&self) -> Self {
        Self {
            identifier: self.identifier.clone(),
            loader: Arc::clone(&self.loader),
            content: self.content.clone(),
            metadata: self.metadata.clone(),
            sigils: self.sigils.clone(),
        }
    }
}

impl<T> fmt::Debug for Observation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observation")
            .field("identifier", &self.identifier)
            .field("loaded", &self.content.is_some())
            .field("metadata", &self.metadata)
            .field("sigils", &self.sigils)
            .finish()
    }
}
