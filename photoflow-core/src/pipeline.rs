//! Pipeline - ordered composition of stages over a lazy stream
//!
//! A pipeline folds its stage list into a single lazy sequence. Nothing
//! executes until the caller pulls from the returned stream; pulls
//! cascade upstream on demand.

use std::sync::Arc;

use tracing::debug;

use crate::merge::MergeStage;
use crate::stage::{run_element_stage, ObsStream, Stage, StreamStage};

/// A registered pipeline entry.
///
/// The execution capability is fixed here, at registration time: a
/// filter/map stage runs under the default executor, a stream stage is
/// delegated to wholesale, and a merge stage consumes a collection of
/// streams.
pub enum PipelineStage<T> {
    /// Filter/map stage driven by the default executor
    Element(Arc<dyn Stage<T>>),
    /// Full-control stage; the default loop never runs
    Stream(Arc<dyn StreamStage<T>>),
    /// Fan-in stage
    Merge(Arc<dyn MergeStage<T>>),
}

impl<T> PipelineStage<T> {
    /// Name of the underlying stage
    pub fn name(&self) -> &'static str {
        match self {
            PipelineStage::Element(s) => s.name(),
            PipelineStage::Stream(s) => s.name(),
            PipelineStage::Merge(s) => s.name(),
        }
    }
}

/// An ordered, composable chain of stages
pub struct Pipeline<T> {
    stages: Vec<PipelineStage<T>>,
}

impl<T: 'static> Pipeline<T> {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a filter/map stage. Returns the pipeline for chaining.
    pub fn add(mut self, stage: impl Stage<T> + 'static) -> Self {
        self.stages.push(PipelineStage::Element(Arc::new(stage)));
        self
    }

    /// Append a full-control stream stage. Returns the pipeline for chaining.
    pub fn add_stream(mut self, stage: impl StreamStage<T> + 'static) -> Self {
        self.stages.push(PipelineStage::Stream(Arc::new(stage)));
        self
    }

    /// Append a merge stage. Returns the pipeline for chaining.
    pub fn add_merge(mut self, stage: impl MergeStage<T> + 'static) -> Self {
        self.stages.push(PipelineStage::Merge(Arc::new(stage)));
        self
    }

    /// Number of registered stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether no stages are registered
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Execute over an empty initial stream
    pub fn run(&self) -> ObsStream<T> {
        self.run_from(Box::new(std::iter::empty()))
    }

    /// Execute over a caller-supplied initial stream.
    ///
    /// Folds the stage list left to right into one lazy stream and
    /// returns it; no stage executes until the result is consumed. An
    /// empty pipeline is the identity.
    pub fn run_from(&self, initial: ObsStream<T>) -> ObsStream<T> {
        let mut stream = initial;
        for stage in &self.stages {
            debug!(stage = stage.name(), "composing stage into stream");
            stream = match stage {
                PipelineStage::Element(s) => run_element_stage(Arc::clone(s), stream),
                PipelineStage::Stream(s) => s.process(stream),
                // A merge mid-pipeline operates over the single
                // upstream stream wrapped as a one-element collection.
                PipelineStage::Merge(s) => s.merge(vec![stream]),
            };
        }
        stream
    }
}

impl<T: 'static> Default for Pipeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::error::{Error, Result};
    use crate::merge::BatchMerge;
    use crate::metadata::MetaValue;
    use crate::observation::{Loader, Observation};
    use std::path::Path;

    fn obs(name: &str) -> Observation<String> {
        let loader: Loader<String> = Arc::new(|p: &Path| Ok(p.display().to_string()));
        Observation::new(name, loader)
    }

    fn stream(elements: Vec<Element<String>>) -> ObsStream<String> {
        Box::new(elements.into_iter().map(Ok))
    }

    /// Appends a tag to the observation's metadata tag list
    struct AddTag(&'static str);
    impl Stage<String> for AddTag {
        fn name(&self) -> &'static str {
            self.0
        }

        fn map(&self, mut obs: Observation<String>) -> Result<Observation<String>> {
            let tags = obs
                .metadata
                .entry("tags".to_string())
                .or_insert_with(|| MetaValue::List(Vec::new()));
            if let MetaValue::List(items) = tags {
                items.push(MetaValue::Text(self.0.to_string()));
            }
            Ok(obs)
        }
    }

    struct RejectAll;
    impl Stage<String> for RejectAll {
        fn filter(&self, _obs: &mut Observation<String>) -> Result<bool> {
            Ok(false)
        }
    }

    /// Source that ignores its input stream entirely
    struct FixedSource(usize);
    impl StreamStage<String> for FixedSource {
        fn process(&self, input: ObsStream<String>) -> ObsStream<String> {
            // Drain whatever arrived, then generate afresh
            let count = self.0;
            let name = StreamStage::<String>::name(self);
            Box::new(input.filter(|_| false).chain((0..count).map(move |i| {
                let mut o = obs(&format!("/gen/{i}.jpg"));
                o.sigils.push(name.to_string());
                Ok(Element::Single(o))
            })))
        }
    }

    fn tags(el: &Element<String>) -> Vec<String> {
        el.observations()
            .flat_map(|o| {
                o.metadata
                    .get("tags")
                    .and_then(MetaValue::as_list)
                    .unwrap_or(&[])
                    .iter()
                    .filter_map(|v| v.as_text().map(str::to_string))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let pipeline = Pipeline::<String>::new();
        assert!(pipeline.is_empty());

        let out: Vec<_> = pipeline.run().collect::<Result<_>>().unwrap();
        assert!(out.is_empty());

        let out: Vec<_> = pipeline
            .run_from(stream(vec![obs("/1.jpg").into()]))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_fluent_composition_applies_in_order() {
        let pipeline = Pipeline::new()
            .add(AddTag("a"))
            .add(AddTag("b"))
            .add(AddTag("c"));
        assert_eq!(pipeline.len(), 3);

        let out: Vec<_> = pipeline
            .run_from(stream(vec![obs("/1.jpg").into()]))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(tags(&out[0]), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sigils_accumulate_left_to_right() {
        let pipeline = Pipeline::new().add(AddTag("first")).add(AddTag("second"));

        let out: Vec<_> = pipeline
            .run_from(stream(vec![obs("/1.jpg").into()]))
            .collect::<Result<_>>()
            .unwrap();

        match &out[0] {
            Element::Single(o) => assert_eq!(o.sigils, vec!["first", "second"]),
            other => panic!("expected single, got {other:?}"),
        }
    }

    #[test]
    fn test_rejection_mid_chain_drops_observation() {
        let pipeline = Pipeline::new()
            .add(AddTag("before"))
            .add(RejectAll)
            .add(AddTag("after"));

        let out: Vec<_> = pipeline
            .run_from(stream(vec![obs("/1.jpg").into()]))
            .collect::<Result<_>>()
            .unwrap();

        assert!(out.is_empty());
    }

    #[test]
    fn test_stream_stage_bypasses_default_loop() {
        // FixedSource ignores both the input stream and filter/map;
        // whatever arrives upstream must not leak through.
        let pipeline = Pipeline::new().add_stream(FixedSource(2));

        let out: Vec<_> = pipeline
            .run_from(stream(vec![obs("/upstream.jpg").into()]))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(out.len(), 2);
        for el in &out {
            for o in el.observations() {
                assert!(o.identifier().starts_with("/gen"));
                assert_eq!(o.sigils, vec!["FixedSource"]);
            }
        }
    }

    #[test]
    fn test_merge_mid_pipeline_batches_single_upstream() {
        let pipeline = Pipeline::new()
            .add(AddTag("pre"))
            .add_merge(BatchMerge::new(2).unwrap())
            .add(AddTag("post"));

        let input: Vec<Element<String>> =
            (0..5).map(|i| obs(&format!("/{i}.jpg")).into()).collect();
        let out: Vec<_> = pipeline
            .run_from(stream(input))
            .collect::<Result<_>>()
            .unwrap();

        // Batches of 2, 2, 1; the post stage applies per member and
        // the observations keep flowing as batches.
        assert_eq!(out.iter().map(Element::len).collect::<Vec<_>>(), vec![2, 2, 1]);
        for el in &out {
            assert!(matches!(el, Element::Batch(_)));
            for o in el.observations() {
                assert_eq!(o.sigils, vec!["pre", "BatchMerge", "post"]);
            }
        }
    }

    #[test]
    fn test_laziness_and_early_termination() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        static SEEN: AtomicUsize = AtomicUsize::new(0);

        struct CountPulls;
        impl Stage<String> for CountPulls {
            fn map(&self, obs: Observation<String>) -> Result<Observation<String>> {
                SEEN.fetch_add(1, Ordering::SeqCst);
                Ok(obs)
            }
        }

        let pipeline = Pipeline::new().add(CountPulls);
        let input: Vec<Element<String>> =
            (0..100).map(|i| obs(&format!("/{i}.jpg")).into()).collect();

        let mut out = pipeline.run_from(stream(input));
        // Nothing ran yet
        assert_eq!(SEEN.load(Ordering::SeqCst), 0);

        // Pull three elements, then stop: upstream work stops with us
        for _ in 0..3 {
            out.next().unwrap().unwrap();
        }
        drop(out);
        assert_eq!(SEEN.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_fail_fast_terminates_run() {
        struct ExplodeOn(&'static str);
        impl Stage<String> for ExplodeOn {
            fn name(&self) -> &'static str {
                "ExplodeOn"
            }
            fn map(&self, obs: Observation<String>) -> Result<Observation<String>> {
                if obs.identifier().ends_with(self.0) {
                    return Err(Error::InvalidArgument("unhandled".into()));
                }
                Ok(obs)
            }
        }

        let pipeline = Pipeline::new().add(ExplodeOn("2.jpg"));
        let input: Vec<Element<String>> =
            (0..4).map(|i| obs(&format!("/{i}.jpg")).into()).collect();

        let mut out = pipeline.run_from(stream(input));
        assert!(out.next().unwrap().is_ok());
        assert!(out.next().unwrap().is_ok());

        match out.next() {
            Some(Err(Error::Stage { stage, identifier, .. })) => {
                assert_eq!(stage, "ExplodeOn");
                assert_eq!(identifier, std::path::PathBuf::from("/2.jpg"));
            }
            other => panic!("expected stage error, got {other:?}"),
        }
    }
}
