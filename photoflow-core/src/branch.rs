//! Branch - fan-out into independent downstream pipelines
//!
//! Replays one stream into several sub-pipelines. This is the engine's
//! one deliberate eager point: the same data must be traversed once per
//! branch, so the input is materialized in full before any branch runs.

use tracing::debug;

use crate::element::Element;
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::stage::ObsStream;

/// Fan-out operator over a set of sub-pipelines.
///
/// Each branch receives an independent deep copy of the materialized
/// snapshot: an in-place mutation inside one branch is never observable
/// from a sibling. Loaders stay shared (they are stateless
/// capabilities), so cloning costs metadata and cached content only.
pub struct Branch<T> {
    branches: Vec<Pipeline<T>>,
}

impl<T: Clone + 'static> Branch<T> {
    /// Create a fan-out over the given sub-pipelines
    pub fn new(branches: Vec<Pipeline<T>>) -> Self {
        Self { branches }
    }

    /// Number of configured branches
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// Whether no branches are configured
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Materialize the input stream and run every branch over it.
    ///
    /// Returns one lazily-evaluated output stream per branch; the
    /// branches themselves execute sequentially as the caller consumes
    /// them. An error while materializing aborts the whole fan-out.
    pub fn process(&self, stream: ObsStream<T>) -> Result<Vec<ObsStream<T>>> {
        let snapshot: Vec<Element<T>> = stream.collect::<Result<_>>()?;
        debug!(
            elements = snapshot.len(),
            branches = self.branches.len(),
            "materialized fan-out snapshot"
        );

        Ok(self
            .branches
            .iter()
            .map(|branch| {
                let replay: ObsStream<T> =
                    Box::new(snapshot.clone().into_iter().map(Ok));
                branch.run_from(replay)
            })
            .collect())
    }
}
