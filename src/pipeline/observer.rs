//! Pipeline observer hooks for profiling and debugging.
//!
//! Observers receive notifications at stage boundaries without coupling to
//! stage logic. Use cases include timing stages, capturing intermediate trees
//! and candidates for debugging, and counting drops per stage.

use std::time::{Duration, Instant};

use crate::chunk::tree::ParseNode;
use crate::types::{Candidate, Entity};

// ============================================================================
// Stage names
// ============================================================================

pub const STAGE_SEGMENT: &str = "segment";
pub const STAGE_TAG: &str = "tag";
pub const STAGE_CHUNK: &str = "chunk";
pub const STAGE_WALK: &str = "walk";
pub const STAGE_VALIDATE: &str = "validate";
pub const STAGE_NORMALIZE: &str = "normalize";
pub const STAGE_ASSEMBLE: &str = "assemble";

/// Stages in execution order
pub const STAGES: &[&str] = &[
    STAGE_SEGMENT,
    STAGE_TAG,
    STAGE_CHUNK,
    STAGE_WALK,
    STAGE_VALIDATE,
    STAGE_NORMALIZE,
    STAGE_ASSEMBLE,
];

// ============================================================================
// StageClock / StageReport
// ============================================================================

/// Wall-clock timer for one stage
#[derive(Debug, Clone, Copy)]
pub struct StageClock(Instant);

impl StageClock {
    pub fn start() -> Self {
        Self(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }
}

/// What a stage did: how long it took and how many items went in and out.
///
/// Item counts are stage-specific (sentences, trees, candidates, entities)
/// and `None` when a stage has nothing meaningful to report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageReport {
    elapsed: Duration,
    items_in: Option<usize>,
    items_out: Option<usize>,
    failures: Option<usize>,
}

impl StageReport {
    pub fn new(elapsed: Duration) -> Self {
        Self {
            elapsed,
            ..Self::default()
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn items_in(&self) -> Option<usize> {
        self.items_in
    }

    pub fn items_out(&self) -> Option<usize> {
        self.items_out
    }

    /// Items that errored (as opposed to being filtered out)
    pub fn failures(&self) -> Option<usize> {
        self.failures
    }

    /// Items dropped by the stage, when both counts are known
    pub fn dropped(&self) -> Option<usize> {
        Some(self.items_in?.saturating_sub(self.items_out?))
    }
}

/// Builder for [`StageReport`]
#[derive(Debug, Clone)]
pub struct StageReportBuilder {
    report: StageReport,
}

impl StageReportBuilder {
    pub fn new(elapsed: Duration) -> Self {
        Self {
            report: StageReport::new(elapsed),
        }
    }

    pub fn items_in(mut self, n: usize) -> Self {
        self.report.items_in = Some(n);
        self
    }

    pub fn items_out(mut self, n: usize) -> Self {
        self.report.items_out = Some(n);
        self
    }

    pub fn failures(mut self, n: usize) -> Self {
        self.report.failures = Some(n);
        self
    }

    pub fn build(self) -> StageReport {
        self.report
    }
}

// ============================================================================
// PipelineObserver
// ============================================================================

/// Callbacks fired by [`Pipeline::run`](crate::pipeline::runner::Pipeline::run).
///
/// Every method has an empty default, so implementors only override what
/// they need.
pub trait PipelineObserver {
    fn on_stage_start(&mut self, _stage: &'static str) {}

    fn on_stage_end(&mut self, _stage: &'static str, _report: &StageReport) {}

    /// Chunked sentence trees, one per successfully tagged sentence
    fn on_trees(&mut self, _trees: &[ParseNode]) {}

    /// Raw candidates, before keyword validation
    fn on_candidates(&mut self, _candidates: &[Candidate]) {}

    fn on_entities(&mut self, _entities: &[Entity]) {}
}

/// Observer that ignores every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Collects the [`StageReport`] of every stage, in order.
#[derive(Debug, Clone, Default)]
pub struct StageTimingObserver {
    reports: Vec<(&'static str, StageReport)>,
}

impl StageTimingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[(&'static str, StageReport)] {
        &self.reports
    }

    /// Append another observer's reports (e.g. from a parallel batch).
    pub fn absorb(&mut self, other: StageTimingObserver) {
        self.reports.extend(other.reports);
    }

    /// Total time per stage, in execution order
    pub fn totals(&self) -> Vec<(&'static str, Duration)> {
        let mut totals: Vec<(&'static str, Duration)> = Vec::new();
        for (stage, report) in &self.reports {
            match totals.iter().position(|(s, _)| s == stage) {
                Some(i) => totals[i].1 += report.elapsed(),
                None => totals.push((*stage, report.elapsed())),
            }
        }
        totals
    }

    pub fn total_elapsed(&self) -> Duration {
        self.reports.iter().map(|(_, r)| r.elapsed()).sum()
    }
}

impl PipelineObserver for StageTimingObserver {
    fn on_stage_end(&mut self, stage: &'static str, report: &StageReport) {
        self.reports.push((stage, report.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_builder() {
        let report = StageReportBuilder::new(Duration::from_millis(3))
            .items_in(10)
            .items_out(4)
            .failures(1)
            .build();
        assert_eq!(report.elapsed(), Duration::from_millis(3));
        assert_eq!(report.items_in(), Some(10));
        assert_eq!(report.items_out(), Some(4));
        assert_eq!(report.failures(), Some(1));
        assert_eq!(report.dropped(), Some(6));
    }

    #[test]
    fn test_dropped_needs_both_counts() {
        let report = StageReportBuilder::new(Duration::ZERO).items_out(2).build();
        assert_eq!(report.dropped(), None);
    }

    #[test]
    fn test_timing_observer_totals() {
        let mut a = StageTimingObserver::new();
        a.on_stage_end(STAGE_TAG, &StageReport::new(Duration::from_millis(5)));
        a.on_stage_end(STAGE_CHUNK, &StageReport::new(Duration::from_millis(1)));

        let mut b = StageTimingObserver::new();
        b.on_stage_end(STAGE_TAG, &StageReport::new(Duration::from_millis(7)));

        a.absorb(b);
        assert_eq!(a.reports().len(), 3);
        assert_eq!(
            a.totals(),
            vec![
                (STAGE_TAG, Duration::from_millis(12)),
                (STAGE_CHUNK, Duration::from_millis(1)),
            ]
        );
        assert_eq!(a.total_elapsed(), Duration::from_millis(13));
    }

    #[test]
    fn test_clock_is_monotonic() {
        let clock = StageClock::start();
        let first = clock.elapsed();
        assert!(clock.elapsed() >= first);
    }
}
