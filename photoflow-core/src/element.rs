//! Stream element - the single-vs-batch duality
//!
//! Pipelines carry either lone observations or finite ordered batches
//! of them. A batch has no identity of its own: stages apply to its
//! members individually, may shrink it, and an emptied batch is
//! suppressed from the stream rather than yielded empty.

use crate::observation::Observation;

/// An element of a pipeline stream
#[derive(Debug)]
pub enum Element<T> {
    /// A single observation
    Single(Observation<T>),
    /// An ordered batch of observations
    Batch(Vec<Observation<T>>),
}

impl<T> Element<T> {
    /// Number of observations carried by this element
    pub fn len(&self) -> usize {
        match self {
            Element::Single(_) => 1,
            Element::Batch(batch) => batch.len(),
        }
    }

    /// Whether this element carries no observations
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the carried observations
    pub fn observations(&self) -> impl Iterator<Item = &Observation<T>> {
        match self {
            Element::Single(obs) => std::slice::from_ref(obs).iter(),
            Element::Batch(batch) => batch.iter(),
        }
    }

    /// Consume the element, yielding its observations in order
    pub fn into_observations(self) -> Vec<Observation<T>> {
        match self {
            Element::Single(obs) => vec![obs],
            Element::Batch(batch) => batch,
        }
    }
}

impl<T: Clone> Clone for Element<T> {
    fn clone(&self) -> Self {
        match self {
            Element::Single(obs) => Element::Single(obs.clone()),
            Element::Batch(batch) => Element::Batch(batch.clone()),
        }
    }
}

impl<T> From<Observation<T>> for Element<T> {
    fn from(obs: Observation<T>) -> Self {
        Element::Single(obs)
    }
}

impl<T> From<Vec<Observation<T>>> for Element<T> {
    fn from(batch: Vec<Observation<T>>) -> Self {
        Element::Batch(batch)
    }
}
