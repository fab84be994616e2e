//! Fan-in stages: windowed batching, concatenation, interleaving
//!
//! A [`MergeStage`] combines a collection of streams into one. A linear
//! pipeline hands it a single upstream stream; the multi-stream
//! signature exists so fan-out (see [`crate::branch`]) can be merged
//! back together.

use std::collections::VecDeque;

use crate::element::Element;
use crate::error::{Error, Result};
use crate::observation::Observation;
use crate::stage::{short_type_name, ObsStream};

/// A stage-like unit that combines multiple streams into one
pub trait MergeStage<T>: Send + Sync {
    /// Stage name, defaults to the concrete type's name
    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }

    /// Combine the given streams into a single output stream
    fn merge(&self, streams: Vec<ObsStream<T>>) -> ObsStream<T>;
}

/// Windows observations into batches of a fixed size.
///
/// Incoming batches are flattened first, so the window counts
/// observations regardless of how they arrive. Every observation in an
/// emitted window is tagged with this stage's name. A non-empty partial
/// window left at exhaustion is emitted as a final, smaller batch.
pub struct BatchMerge {
    n: usize,
}

impl BatchMerge {
    /// Create a windowing merge with the given window size
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(Error::InvalidArgument(
                "batch window size must be at least 1".to_string(),
            ));
        }
        Ok(Self { n })
    }

    /// The configured window size
    pub fn window_size(&self) -> usize {
        self.n
    }
}

impl<T: 'static> MergeStage<T> for BatchMerge {
    fn merge(&self, streams: Vec<ObsStream<T>>) -> ObsStream<T> {
        Box::new(WindowIter {
            inner: Box::new(streams.into_iter().flatten()),
            pending: VecDeque::new(),
            window: Vec::with_capacity(self.n),
            n: self.n,
            name: MergeStage::<T>::name(self),
            exhausted: false,
        })
    }
}

/// Iterator driving the batch window. Holds at most `n` observations
/// plus whatever a single upstream element carried.
struct WindowIter<T> {
    inner: Box<dyn Iterator<Item = Result<Element<T>>>>,
    pending: VecDeque<Observation<T>>,
    window: Vec<Observation<T>>,
    n: usize,
    name: &'static str,
    exhausted: bool,
}

impl<T> WindowIter<T> {
    fn emit(&mut self) -> Element<T> {
        let mut window = std::mem::replace(&mut self.window, Vec::with_capacity(self.n));
        for obs in &mut window {
            obs.sigils.push(self.name.to_string());
        }
        Element::Batch(window)
    }
}

impl<T> Iterator for WindowIter<T> {
    type Item = Result<Element<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while self.window.len() < self.n {
                if let Some(obs) = self.pending.pop_front() {
                    self.window.push(obs);
                    continue;
                }
                if self.exhausted {
                    break;
                }
                match self.inner.next() {
                    Some(Ok(element)) => self.pending.extend(element.into_observations()),
                    Some(Err(e)) => return Some(Err(e)),
                    None => self.exhausted = true,
                }
            }

            if self.window.len() == self.n {
                return Some(Ok(self.emit()));
            }
            if self.exhausted {
                if self.window.is_empty() {
                    return None;
                }
                // Final partial window
                return Some(Ok(self.emit()));
            }
        }
    }
}

/// Concatenates streams in order: each stream is fully drained before
/// the next one starts. No tagging.
pub struct Concat;

impl<T: 'static> MergeStage<T> for Concat {
    fn merge(&self, streams: Vec<ObsStream<T>>) -> ObsStream<T> {
        Box::new(streams.into_iter().flatten())
    }
}

/// Round-robin interleaving across all currently active streams.
///
/// Each round pulls at most one element from each stream still active;
/// exhausted streams drop out of the rotation. No tagging.
pub struct Interleave;

impl<T: 'static> MergeStage<T> for Interleave {
    fn merge(&self, streams: Vec<ObsStream<T>>) -> ObsStream<T> {
        Box::new(InterleaveIter {
            active: streams,
            cursor: 0,
        })
    }
}

struct InterleaveIter<T> {
    active: Vec<ObsStream<T>>,
    cursor: usize,
}

impl<T> Iterator for InterleaveIter<T> {
    type Item = Result<Element<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.active.is_empty() {
            if self.cursor >= self.active.len() {
                self.cursor = 0;
            }
            match self.active[self.cursor].next() {
                Some(item) => {
                    self.cursor += 1;
                    return Some(item);
                }
                None => {
                    // Stream exhausted: drop it from the rotation and
                    // keep the cursor on the stream that slid into its
                    // slot.
                    self.active.remove(self.cursor);
                }
            }
        }
        None
    }
}
