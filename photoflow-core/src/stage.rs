//! Stage contracts and the default element executor
//!
//! A [`Stage`] names a concern and embodies two operations: `filter`
//! (does this observation pass?) and `map` (transform it). The default
//! executor handles the stream mechanics, including the single-vs-batch
//! duality. A [`StreamStage`] instead takes full control of the stream,
//! which is how sources and other one-to-many stages break the
//! one-in-one-out contract.

use crate::element::Element;
use crate::error::Result;
use crate::observation::Observation;

use std::sync::Arc;

/// A lazy pull-based stream of pipeline elements.
///
/// Every `next()` call is a suspension point; nothing upstream computes
/// until a downstream consumer pulls. Ceasing to pull cancels the whole
/// chain.
pub type ObsStream<T> = Box<dyn Iterator<Item = Result<Element<T>>>>;

/// Short form of a concrete type's name, used as the default stage name
pub(crate) fn short_type_name<S: ?Sized>() -> &'static str {
    let full = std::any::type_name::<S>();
    full.rsplit("::").next().unwrap_or(full)
}

/// An elementary filter+map unit of work.
///
/// Implementations override `filter`, `map`, or both; the pipeline's
/// default executor drives them and records provenance. Stages that
/// need full control over the stream implement [`StreamStage`] instead.
pub trait Stage<T>: Send + Sync {
    /// Stage name recorded in each passing observation's sigils.
    ///
    /// Defaults to the concrete type's name.
    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }

    /// Does this observation pass? Default: accept all.
    ///
    /// Domain-local failures (unreadable content, missing annotations)
    /// should be caught here and translated into `Ok(false)`; a
    /// returned error is treated as unhandled and terminates the run.
    fn filter(&self, _obs: &mut Observation<T>) -> Result<bool> {
        Ok(true)
    }

    /// Transform or annotate the observation. Default: passthrough.
    fn map(&self, obs: Observation<T>) -> Result<Observation<T>> {
        Ok(obs)
    }
}

/// A stage with full control over its input stream.
///
/// Registering a stage through this trait declares the capability
/// explicitly: the pipeline delegates wholesale to `process` and the
/// default filter/map loop never runs. Sources (which ignore their
/// input after draining it) and other shape-changing stages live here.
pub trait StreamStage<T>: Send + Sync {
    /// Stage name, defaults to the concrete type's name
    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }

    /// Produce the output stream for the given input stream.
    ///
    /// The returned stream must own everything it needs; it outlives
    /// the borrow of `self`.
    fn process(&self, input: ObsStream<T>) -> ObsStream<T>;
}

/// Apply a stage's filter+map to one observation.
///
/// `Ok(None)` means rejected: the observation is dropped without
/// receiving the stage's sigil. Errors are wrapped with the stage name
/// and in-flight identifier for fail-fast reporting.
fn apply_one<T>(stage: &dyn Stage<T>, mut obs: Observation<T>) -> Result<Option<Observation<T>>> {
    let accepted = stage
        .filter(&mut obs)
        .map_err(|e| e.in_stage(stage.name(), obs.identifier()))?;
    if !accepted {
        return Ok(None);
    }

    let identifier = obs.identifier().to_path_buf();
    let mut mapped = stage
        .map(obs)
        .map_err(|e| e.in_stage(stage.name(), identifier))?;
    mapped.sigils.push(stage.name().to_string());
    Ok(Some(mapped))
}

/// Default executor: drive a filter/map stage over a stream.
///
/// Single observations are filtered, mapped and tagged individually.
/// Batches are processed per member, preserving the relative order of
/// survivors; a batch emptied by the filter is suppressed entirely.
/// Upstream errors pass through untouched.
pub fn run_element_stage<T: 'static>(stage: Arc<dyn Stage<T>>, input: ObsStream<T>) -> ObsStream<T> {
    Box::new(input.filter_map(move |item| match item {
        Ok(Element::Single(obs)) => match apply_one(stage.as_ref(), obs) {
            Ok(Some(mapped)) => Some(Ok(Element::Single(mapped))),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        },
        Ok(Element::Batch(members)) => {
            let mut kept = Vec::with_capacity(members.len());
            for obs in members {
                match apply_one(stage.as_ref(), obs) {
                    Ok(Some(mapped)) => kept.push(mapped),
                    Ok(None) => {}
                    Err(e) => return Some(Err(e)),
                }
            }
            if kept.is_empty() {
                None
            } else {
                Some(Ok(Element::Batch(kept)))
            }
        }
        Err(e) => Some(Err(e)),
    }))
}
