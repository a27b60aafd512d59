//! Pipeline runner: executes the extraction stages for source records.
//!
//! The [`Pipeline`] struct owns one instance of every stage. Calling
//! [`Pipeline::run`] pushes a single [`SourceRecord`] through them in order,
//! notifying a [`PipelineObserver`] at each boundary;
//! [`Pipeline::run_batch`] fans records out over the rayon pool.
//!
//! # Failure policy
//!
//! Only tagging can fail. A failed sentence is logged and skipped; the rest
//! of the record (and the batch) carries on. Everything else that does not
//! produce an entity is a silent drop, visible at `debug` level.
//!
//! # Factory methods
//!
//! Use [`Pipeline::external()`] and [`Pipeline::local()`] for the two
//! built-in tagging strategies without spelling out the generics.

use rayon::prelude::*;

use crate::chunk::chunker::Chunker;
use crate::chunk::grammar::Grammar;
use crate::chunk::tree::ParseNode;
use crate::extract::{EntityAssembler, NameNormalizer, TitleNormalizer, TitleValidator, TreeWalker};
use crate::keywords::TitleKeywordSet;
use crate::nlp::ner::NerTagger;
use crate::nlp::tokenizer::Tokenizer;
use crate::pipeline::observer::{
    NoopObserver, PipelineObserver, StageClock, StageReportBuilder, STAGE_ASSEMBLE, STAGE_CHUNK,
    STAGE_NORMALIZE, STAGE_SEGMENT, STAGE_TAG, STAGE_VALIDATE, STAGE_WALK,
};
use crate::pipeline::traits::{ExternalTagging, LocalTagging, SentenceTagger};
use crate::types::{Candidate, Entity, SourceRecord};

/// Enter a tracing span for a pipeline stage; it closes at the end of the
/// enclosing block.
macro_rules! trace_stage {
    ($name:expr) => {
        let _span = tracing::info_span!("pipeline_stage", stage = $name).entered();
    };
}

// ============================================================================
// Pipeline: stage container
// ============================================================================

/// A pipeline composed of concrete stage implementations.
///
/// Only the tagger is generic; the other stages have a single
/// implementation and are configured through their own builders.
#[derive(Debug, Clone)]
pub struct Pipeline<T> {
    pub tokenizer: Tokenizer,
    pub tagger: T,
    pub chunker: Chunker,
    pub walker: TreeWalker,
    pub keywords: TitleKeywordSet,
    pub name_normalizer: NameNormalizer,
    pub title_normalizer: TitleNormalizer,
    pub assembler: EntityAssembler,
}

/// NER service tagging with the rule-based POS tagger
pub type ExternalPipeline<N> = Pipeline<ExternalTagging<N>>;

/// POS-only tagging
pub type LocalPipeline = Pipeline<LocalTagging>;

/// Tagger picked at runtime (e.g. from configuration)
pub type DynPipeline = Pipeline<Box<dyn SentenceTagger>>;

impl<N: NerTagger> ExternalPipeline<N> {
    /// Build a pipeline around an external NER tagger.
    pub fn external(ner: N, keywords: TitleKeywordSet) -> Self {
        Pipeline::new(ExternalTagging::new(ner), keywords)
    }
}

impl LocalPipeline {
    /// Build a pipeline that needs no external service.
    pub fn local(keywords: TitleKeywordSet) -> Self {
        Pipeline::new(LocalTagging::new(), keywords)
    }
}

impl<T: SentenceTagger> Pipeline<T> {
    /// Default stages around `tagger`, with the grammar matching its output.
    pub fn new(tagger: T, keywords: TitleKeywordSet) -> Self {
        let chunker = Chunker::new(tagger.grammar_kind());
        Self {
            tokenizer: Tokenizer::new(),
            tagger,
            chunker,
            walker: TreeWalker,
            keywords,
            name_normalizer: NameNormalizer::new(),
            title_normalizer: TitleNormalizer::new(),
            assembler: EntityAssembler,
        }
    }

    /// Replace the tagger's built-in grammar
    pub fn with_grammar(mut self, grammar: Grammar) -> Self {
        self.chunker = Chunker::with_grammar(grammar);
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn with_name_normalizer(mut self, normalizer: NameNormalizer) -> Self {
        self.name_normalizer = normalizer;
        self
    }

    pub fn with_title_normalizer(mut self, normalizer: TitleNormalizer) -> Self {
        self.title_normalizer = normalizer;
        self
    }
}

// ============================================================================
// Pipeline::run: execute stages in order
// ============================================================================

impl<T: SentenceTagger> Pipeline<T> {
    /// Extract entities from one record.
    ///
    /// Stages run in order:
    /// 1. Segment text into sentences
    /// 2. Tag each sentence (failures skip the sentence)
    /// 3. Chunk each sentence
    /// 4. Walk trees for (title, name) candidates
    /// 5. Keep candidates whose title contains a keyword
    /// 6. Normalize name and title (empty results are dropped)
    /// 7. Assemble entities
    ///
    /// Entities come out in sentence order, then traversal order.
    pub fn run(&self, record: &SourceRecord, observer: &mut impl PipelineObserver) -> Vec<Entity> {
        let record_id = record.id.as_deref().unwrap_or("-");

        // Stage 1: Segment
        let sentences = {
            trace_stage!(STAGE_SEGMENT);
            observer.on_stage_start(STAGE_SEGMENT);
            let clock = StageClock::start();
            let sentences = self.tokenizer.sentences(&record.text);
            let report = StageReportBuilder::new(clock.elapsed())
                .items_out(sentences.len())
                .build();
            observer.on_stage_end(STAGE_SEGMENT, &report);
            sentences
        };

        // Stage 2: Tag
        let tagged = {
            trace_stage!(STAGE_TAG);
            observer.on_stage_start(STAGE_TAG);
            let clock = StageClock::start();
            let mut failures = 0;
            let tagged: Vec<Vec<ParseNode>> = sentences
                .iter()
                .enumerate()
                .filter_map(|(i, sentence)| match self.tagger.tag_sentence(sentence) {
                    Ok(nodes) => Some(nodes),
                    Err(err) => {
                        failures += 1;
                        tracing::warn!(
                            record = record_id,
                            sentence = i,
                            error = %err,
                            "tagging failed; sentence skipped"
                        );
                        None
                    }
                })
                .collect();
            let report = StageReportBuilder::new(clock.elapsed())
                .items_in(sentences.len())
                .items_out(tagged.len())
                .failures(failures)
                .build();
            observer.on_stage_end(STAGE_TAG, &report);
            tagged
        };

        // Stage 3: Chunk
        let trees = {
            trace_stage!(STAGE_CHUNK);
            observer.on_stage_start(STAGE_CHUNK);
            let clock = StageClock::start();
            let items_in = tagged.len();
            let trees = self.chunker.chunk_sentences(tagged);
            let report = StageReportBuilder::new(clock.elapsed())
                .items_in(items_in)
                .items_out(trees.len())
                .build();
            observer.on_stage_end(STAGE_CHUNK, &report);
            observer.on_trees(&trees);
            trees
        };

        // Stage 4: Walk
        let candidates = {
            trace_stage!(STAGE_WALK);
            observer.on_stage_start(STAGE_WALK);
            let clock = StageClock::start();
            let candidates = self.walker.candidates_all(&trees);
            let report = StageReportBuilder::new(clock.elapsed())
                .items_in(trees.len())
                .items_out(candidates.len())
                .build();
            observer.on_stage_end(STAGE_WALK, &report);
            observer.on_candidates(&candidates);
            candidates
        };

        // Stage 5: Validate titles
        let validated = {
            trace_stage!(STAGE_VALIDATE);
            observer.on_stage_start(STAGE_VALIDATE);
            let clock = StageClock::start();
            let items_in = candidates.len();
            let validated = self.validate(candidates);
            let report = StageReportBuilder::new(clock.elapsed())
                .items_in(items_in)
                .items_out(validated.len())
                .build();
            observer.on_stage_end(STAGE_VALIDATE, &report);
            validated
        };

        // Stage 6: Normalize
        let normalized = {
            trace_stage!(STAGE_NORMALIZE);
            observer.on_stage_start(STAGE_NORMALIZE);
            let clock = StageClock::start();
            let items_in = validated.len();
            let normalized = self.normalize(validated);
            let report = StageReportBuilder::new(clock.elapsed())
                .items_in(items_in)
                .items_out(normalized.len())
                .build();
            observer.on_stage_end(STAGE_NORMALIZE, &report);
            normalized
        };

        // Stage 7: Assemble
        trace_stage!(STAGE_ASSEMBLE);
        observer.on_stage_start(STAGE_ASSEMBLE);
        let clock = StageClock::start();
        let entities: Vec<Entity> = normalized
            .into_iter()
            .map(|n| self.assembler.assemble(n.first_name, n.last_name, n.job_title, record))
            .collect();
        let report = StageReportBuilder::new(clock.elapsed())
            .items_out(entities.len())
            .build();
        observer.on_stage_end(STAGE_ASSEMBLE, &report);
        observer.on_entities(&entities);

        entities
    }

    /// Run every record on the rayon pool. Output keeps input order.
    pub fn run_batch(&self, records: &[SourceRecord]) -> Vec<Entity> {
        self.run_batch_observed(records, || NoopObserver).0
    }

    /// Like [`run_batch`](Self::run_batch), with one fresh observer per
    /// record. Observers are returned in input order.
    pub fn run_batch_observed<O, F>(
        &self,
        records: &[SourceRecord],
        make_observer: F,
    ) -> (Vec<Entity>, Vec<O>)
    where
        O: PipelineObserver + Send,
        F: Fn() -> O + Sync,
    {
        let per_record: Vec<(Vec<Entity>, O)> = records
            .par_iter()
            .map(|record| {
                let mut observer = make_observer();
                let entities = self.run(record, &mut observer);
                (entities, observer)
            })
            .collect();

        let mut entities = Vec::new();
        let mut observers = Vec::with_capacity(per_record.len());
        for (batch, observer) in per_record {
            entities.extend(batch);
            observers.push(observer);
        }
        (entities, observers)
    }

    fn validate(&self, candidates: Vec<Candidate>) -> Vec<(Candidate, String)> {
        let validator = TitleValidator::new(&self.keywords);
        candidates
            .into_iter()
            .filter_map(|candidate| match validator.validate(&candidate.title_text) {
                Some(title) => Some((candidate, title)),
                None => {
                    tracing::debug!(
                        title = %candidate.title_text,
                        "no title keyword; candidate dropped"
                    );
                    None
                }
            })
            .collect()
    }

    fn normalize(&self, validated: Vec<(Candidate, String)>) -> Vec<NormalizedFields> {
        validated
            .into_iter()
            .filter_map(|(candidate, title)| {
                let Some((first_name, last_name)) =
                    self.name_normalizer.normalize(&candidate.name_text)
                else {
                    tracing::debug!(
                        name = %candidate.name_text,
                        "name incomplete after cleanup; candidate dropped"
                    );
                    return None;
                };
                let Some(job_title) = self.title_normalizer.normalize(&title) else {
                    tracing::debug!(title = %title, "title empty after cleanup; candidate dropped");
                    return None;
                };
                Some(NormalizedFields {
                    first_name,
                    last_name,
                    job_title,
                })
            })
            .collect()
    }
}

struct NormalizedFields {
    first_name: String,
    last_name: String,
    job_title: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::nlp::ner::GazetteerNerTagger;
    use crate::pipeline::observer::{StageTimingObserver, STAGES};
    use crate::types::{Token, MAX_TITLE_CHARS};

    fn keywords() -> TitleKeywordSet {
        TitleKeywordSet::new(["professor", "dean"]).unwrap()
    }

    fn gazetteer() -> GazetteerNerTagger {
        GazetteerNerTagger::new().with_persons(&["Jane", "A", "Smith", "Ann", "Lee", "Bob"])
    }

    fn record(text: &str) -> SourceRecord {
        SourceRecord::new(text, "info@example.edu", "https://example.edu/people")
    }

    #[test]
    fn test_external_end_to_end() {
        let pipeline = Pipeline::external(gazetteer(), keywords());
        let entities = pipeline.run(&record("Professor Jane A Smith"), &mut NoopObserver);

        assert_eq!(entities.len(), 1);
        let e = &entities[0];
        assert_eq!(e.first_name, "Jane");
        assert_eq!(e.last_name, "A Smith");
        assert_eq!(e.job_title, "Professor");
        assert_eq!(e.contact, "info@example.edu");
        assert_eq!(e.origin, "https://example.edu/people");
    }

    #[test]
    fn test_title_without_keyword_is_dropped() {
        let pipeline = Pipeline::external(gazetteer(), keywords());
        let entities = pipeline.run(&record("Senator Jane Smith"), &mut NoopObserver);
        assert!(entities.is_empty());
    }

    #[test]
    fn test_single_token_person_is_dropped() {
        let pipeline = Pipeline::external(gazetteer(), keywords());
        let entities = pipeline.run(&record("Professor Smith"), &mut NoopObserver);
        assert!(entities.is_empty());
    }

    #[test]
    fn test_entities_follow_sentence_order() {
        let pipeline = Pipeline::external(gazetteer(), keywords());
        let entities = pipeline.run(
            &record("Dean Ann Lee spoke first. Professor Jane Smith spoke next."),
            &mut NoopObserver,
        );
        let names: Vec<&str> = entities.iter().map(|e| e.first_name.as_str()).collect();
        assert_eq!(names, vec!["Ann", "Jane"]);
    }

    #[test]
    fn test_local_strategy() {
        let pipeline = Pipeline::local(keywords());
        let entities = pipeline.run(&record("Jane Smith Professor of history"), &mut NoopObserver);

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].first_name, "Jane");
        assert_eq!(entities[0].last_name, "Smith");
        assert_eq!(entities[0].job_title, "Professor of history");
    }

    #[test]
    fn test_empty_text() {
        let pipeline = Pipeline::local(keywords());
        assert!(pipeline.run(&record(""), &mut NoopObserver).is_empty());
    }

    /// Fails on any sentence mentioning "offline".
    struct FlakyNer(GazetteerNerTagger);

    impl NerTagger for FlakyNer {
        fn tag(&self, sentence: &str) -> Result<Vec<Token>> {
            if sentence.contains("offline") {
                return Err(Error::tagging("service unavailable"));
            }
            self.0.tag(sentence)
        }
    }

    #[test]
    fn test_tagging_failure_skips_only_that_sentence() {
        let pipeline = Pipeline::external(FlakyNer(gazetteer()), keywords());
        let mut obs = StageTimingObserver::new();
        let entities = pipeline.run(
            &record("The tagger is offline now. Professor Jane Smith teaches."),
            &mut obs,
        );

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].first_name, "Jane");

        let (_, tag_report) = obs
            .reports()
            .iter()
            .find(|(stage, _)| *stage == STAGE_TAG)
            .unwrap();
        assert_eq!(tag_report.failures(), Some(1));
        assert_eq!(tag_report.items_out(), Some(1));
    }

    #[test]
    fn test_timing_observer_sees_every_stage() {
        let pipeline = Pipeline::external(gazetteer(), keywords());
        let mut obs = StageTimingObserver::new();
        pipeline.run(&record("Professor Jane A Smith"), &mut obs);

        let stages: Vec<&str> = obs.reports().iter().map(|(name, _)| *name).collect();
        assert_eq!(stages, STAGES);
    }

    #[derive(Default)]
    struct ArtifactObserver {
        trees: usize,
        candidates: usize,
        entities: usize,
        starts: usize,
    }

    impl PipelineObserver for ArtifactObserver {
        fn on_stage_start(&mut self, _stage: &'static str) {
            self.starts += 1;
        }
        fn on_trees(&mut self, trees: &[ParseNode]) {
            self.trees = trees.len();
        }
        fn on_candidates(&mut self, candidates: &[Candidate]) {
            self.candidates = candidates.len();
        }
        fn on_entities(&mut self, entities: &[Entity]) {
            self.entities = entities.len();
        }
    }

    #[test]
    fn test_observer_sees_artifacts() {
        let pipeline = Pipeline::external(gazetteer(), keywords());
        let mut obs = ArtifactObserver::default();
        pipeline.run(&record("Senator Ann Lee. Professor Jane Smith."), &mut obs);

        assert_eq!(obs.starts, STAGES.len());
        assert_eq!(obs.trees, 2);
        assert_eq!(obs.candidates, 2);
        assert_eq!(obs.entities, 1);
    }

    #[test]
    fn test_batch_keeps_input_order() {
        let pipeline = Pipeline::external(gazetteer(), keywords());
        let records: Vec<SourceRecord> = (0..32)
            .map(|i| {
                let text = if i % 2 == 0 { "Professor Jane Smith" } else { "Dean Ann Lee" };
                record(text).with_id(i.to_string())
            })
            .collect();

        let entities = pipeline.run_batch(&records);
        assert_eq!(entities.len(), 32);
        for (i, entity) in entities.iter().enumerate() {
            let expected = if i % 2 == 0 { "Jane" } else { "Ann" };
            assert_eq!(entity.first_name, expected);
        }
    }

    #[test]
    fn test_batch_observers_in_input_order() {
        let pipeline = Pipeline::local(keywords());
        let records = vec![record("Jane Smith Professor"), record("nothing here")];
        let (entities, observers) = pipeline.run_batch_observed(&records, StageTimingObserver::new);
        assert_eq!(entities.len(), 1);
        assert_eq!(observers.len(), 2);
        assert!(observers.iter().all(|o| o.reports().len() == STAGES.len()));
    }

    #[test]
    fn test_custom_grammar_and_limits() {
        let grammar = Grammar::parse("NAMED_ENTITY: {<NNP><PERSON>}").unwrap();
        let pipeline = Pipeline::external(gazetteer(), keywords())
            .with_grammar(grammar)
            .with_title_normalizer(TitleNormalizer::new().with_max_chars(4));
        let entities = pipeline.run(&record("Professor Jane Smith"), &mut NoopObserver);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].job_title, "Prof");
    }

    #[test]
    fn test_oversized_title_limit_is_capped() {
        let text = format!("Professor{} Jane Smith", " of".repeat(300));
        let pipeline = Pipeline::external(gazetteer(), keywords())
            .with_title_normalizer(TitleNormalizer::new().with_max_chars(1000));
        let entities = pipeline.run(&record(&text), &mut NoopObserver);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].job_title.chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn test_dyn_pipeline() {
        let tagger: Box<dyn SentenceTagger> = Box::new(LocalTagging::new());
        let pipeline: DynPipeline = Pipeline::new(tagger, keywords());
        assert_eq!(pipeline.run(&record("Ann Lee Dean"), &mut NoopObserver).len(), 1);
    }
}
