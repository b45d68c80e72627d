//! Result aggregation and the selection policy.
//!
//! [`ResultAggregator`] is the single owner of the best result so far. It
//! keeps two slots:
//!
//! - **qualifying**: the largest result strictly below the target,
//! - **fallback**: the smallest result seen while nothing qualifies.
//!
//! Ties go to the lower generation. Selection depends only on sizes and
//! generations, so the resolved winner is the same for any arrival order.
//! Every artifact that loses a slot, or never enters one, is deleted
//! immediately; at most one live artifact is held at any time.

use super::strategy::Job;
use crate::Error;
use gifsqueeze_av::TempArtifact;
use std::cmp::Ordering;

/// How a strategy evaluation ended.
#[derive(Debug)]
pub enum Outcome {
    /// The encoder produced an artifact.
    Encoded {
        size_bytes: u64,
        artifact: TempArtifact,
    },
    /// The encoder failed; there is no artifact.
    EncodeFailed { reason: String },
}

/// The result of evaluating one job. Produced once, consumed once.
#[derive(Debug)]
pub struct EvaluationResult {
    pub job: Job,
    pub outcome: Outcome,
}

impl EvaluationResult {
    /// Size of the produced artifact, if any.
    pub fn size_bytes(&self) -> Option<u64> {
        match &self.outcome {
            Outcome::Encoded { size_bytes, .. } => Some(*size_bytes),
            Outcome::EncodeFailed { .. } => None,
        }
    }
}

/// What [`ResultAggregator::offer`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Took an empty slot.
    Kept,
    /// Displaced the previous holder, whose artifact was deleted.
    Replaced,
    /// Lost; its artifact (if any) was deleted.
    Discarded,
}

/// The artifact chosen by [`ResultAggregator::resolve`].
#[derive(Debug)]
pub struct Winner {
    pub job: Job,
    pub size_bytes: u64,
    pub artifact: TempArtifact,
    /// Whether the size is strictly below the target.
    pub met_target: bool,
}

#[derive(Debug)]
struct Holder {
    job: Job,
    size_bytes: u64,
    artifact: TempArtifact,
}

/// Owner of the best result so far.
#[derive(Debug)]
pub struct ResultAggregator {
    target_bytes: u64,
    qualifying: Option<Holder>,
    fallback: Option<Holder>,
    offered: usize,
    failed: usize,
    fault: Option<Error>,
}

impl ResultAggregator {
    /// Create an aggregator for a size budget of `target_bytes`.
    pub fn new(target_bytes: u64) -> Self {
        Self {
            target_bytes,
            qualifying: None,
            fallback: None,
            offered: 0,
            failed: 0,
            fault: None,
        }
    }

    /// Apply the selection policy to one result.
    pub fn offer(&mut self, result: EvaluationResult) -> Decision {
        self.offered += 1;

        let (size_bytes, artifact) = match result.outcome {
            Outcome::Encoded {
                size_bytes,
                artifact,
            } => (size_bytes, artifact),
            Outcome::EncodeFailed { .. } => {
                self.failed += 1;
                return Decision::Discarded;
            }
        };

        let candidate = Holder {
            job: result.job,
            size_bytes,
            artifact,
        };

        if size_bytes < self.target_bytes {
            let fallback = self.fallback.take();
            self.dispose(fallback);
            let (decision, loser) = place(&mut self.qualifying, candidate, prefer_larger);
            self.dispose(loser);
            decision
        } else if self.qualifying.is_some() {
            self.dispose(Some(candidate));
            Decision::Discarded
        } else {
            let (decision, loser) = place(&mut self.fallback, candidate, prefer_smaller);
            self.dispose(loser);
            decision
        }
    }

    /// Size of the current qualifying result, if one exists.
    pub fn qualifying_size(&self) -> Option<u64> {
        self.qualifying.as_ref().map(|h| h.size_bytes)
    }

    /// Size of whichever result currently holds the live artifact.
    pub fn best_size(&self) -> Option<u64> {
        self.qualifying
            .as_ref()
            .or(self.fallback.as_ref())
            .map(|h| h.size_bytes)
    }

    /// Number of results offered so far.
    pub fn offered(&self) -> usize {
        self.offered
    }

    /// Number of offered results that failed to encode.
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Whether deleting a losing artifact has failed.
    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    /// Hand over the winner once all offers are complete.
    ///
    /// Returns `Ok(None)` when no result produced an artifact, and the first
    /// deletion failure if one occurred.
    pub fn resolve(self) -> crate::Result<Option<Winner>> {
        if let Some(err) = self.fault {
            return Err(err);
        }

        let met_target = self.qualifying.is_some();
        Ok(self.qualifying.or(self.fallback).map(|h| Winner {
            job: h.job,
            size_bytes: h.size_bytes,
            artifact: h.artifact,
            met_target,
        }))
    }

    fn dispose(&mut self, holder: Option<Holder>) {
        let Some(holder) = holder else {
            return;
        };
        if let Err(e) = holder.artifact.discard() {
            tracing::error!("Failed to delete artifact for {}: {}", holder.job.strategy, e);
            if self.fault.is_none() {
                self.fault = Some(Error::resource(e));
            }
        }
    }
}

/// Put `candidate` into `slot` if it beats the holder.
///
/// Returns the decision and whichever holder lost.
fn place(
    slot: &mut Option<Holder>,
    candidate: Holder,
    better: fn(&Holder, &Holder) -> bool,
) -> (Decision, Option<Holder>) {
    match slot.as_ref().map(|current| better(&candidate, current)) {
        None => {
            *slot = Some(candidate);
            (Decision::Kept, None)
        }
        Some(true) => (Decision::Replaced, slot.replace(candidate)),
        Some(false) => (Decision::Discarded, Some(candidate)),
    }
}

fn prefer_larger(candidate: &Holder, current: &Holder) -> bool {
    match candidate.size_bytes.cmp(&current.size_bytes) {
        Ordering::Greater => true,
        Ordering::Equal => candidate.job.generation < current.job.generation,
        Ordering::Less => false,
    }
}

fn prefer_smaller(candidate: &Holder, current: &Holder) -> bool {
    match candidate.size_bytes.cmp(&current.size_bytes) {
        Ordering::Less => true,
        Ordering::Equal => candidate.job.generation < current.job.generation,
        Ordering::Greater => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::strategy::{Stage, Strategy};
    use gifsqueeze_av::Workspace;
    use std::path::PathBuf;

    const TARGET: u64 = 1000;

    fn job(generation: u64) -> Job {
        Job {
            generation,
            stage: Stage::LossySweep,
            strategy: Strategy::new(1 + generation as u32, 30),
        }
    }

    fn encoded(ws: &Workspace, generation: u64, size_bytes: u64) -> (EvaluationResult, PathBuf) {
        let artifact = ws.artifact().unwrap();
        let path = artifact.path().to_path_buf();
        let result = EvaluationResult {
            job: job(generation),
            outcome: Outcome::Encoded {
                size_bytes,
                artifact,
            },
        };
        (result, path)
    }

    fn failed(generation: u64) -> EvaluationResult {
        EvaluationResult {
            job: job(generation),
            outcome: Outcome::EncodeFailed {
                reason: "exit status 1".into(),
            },
        }
    }

    #[test]
    fn failures_are_discarded() {
        let mut agg = ResultAggregator::new(TARGET);
        assert_eq!(agg.offer(failed(1)), Decision::Discarded);
        assert_eq!(agg.failed(), 1);
        assert!(agg.resolve().unwrap().is_none());
    }

    #[test]
    fn prefers_largest_result_under_target() {
        let ws = Workspace::new().unwrap();
        let mut agg = ResultAggregator::new(TARGET);

        let (small, small_path) = encoded(&ws, 1, 400);
        let (large, large_path) = encoded(&ws, 2, 900);
        let (smaller, smaller_path) = encoded(&ws, 3, 300);

        assert_eq!(agg.offer(small), Decision::Kept);
        assert_eq!(agg.offer(large), Decision::Replaced);
        assert!(!small_path.exists());
        assert_eq!(agg.offer(smaller), Decision::Discarded);
        assert!(!smaller_path.exists());

        let winner = agg.resolve().unwrap().unwrap();
        assert!(winner.met_target);
        assert_eq!(winner.size_bytes, 900);
        assert_eq!(winner.artifact.path(), large_path);
    }

    #[test]
    fn target_is_exclusive() {
        let ws = Workspace::new().unwrap();
        let mut agg = ResultAggregator::new(TARGET);
        let (at_target, _) = encoded(&ws, 1, TARGET);
        agg.offer(at_target);
        assert_eq!(agg.qualifying_size(), None);
        assert!(!agg.resolve().unwrap().unwrap().met_target);
    }

    #[test]
    fn ties_go_to_lower_generation() {
        let ws = Workspace::new().unwrap();
        let mut agg = ResultAggregator::new(TARGET);

        let (first, first_path) = encoded(&ws, 2, 800);
        let (later, _) = encoded(&ws, 5, 800);
        let (earlier, earlier_path) = encoded(&ws, 1, 800);

        assert_eq!(agg.offer(first), Decision::Kept);
        assert_eq!(agg.offer(later), Decision::Discarded);
        assert_eq!(agg.offer(earlier), Decision::Replaced);
        assert!(!first_path.exists());

        let winner = agg.resolve().unwrap().unwrap();
        assert_eq!(winner.job.generation, 1);
        assert_eq!(winner.artifact.path(), earlier_path);
    }

    #[test]
    fn falls_back_to_smallest_when_nothing_qualifies() {
        let ws = Workspace::new().unwrap();
        let mut agg = ResultAggregator::new(TARGET);

        let (a, a_path) = encoded(&ws, 1, 5000);
        let (b, _) = encoded(&ws, 2, 3000);
        let (c, c_path) = encoded(&ws, 3, 4000);

        assert_eq!(agg.offer(a), Decision::Kept);
        assert_eq!(agg.offer(b), Decision::Replaced);
        assert_eq!(agg.offer(c), Decision::Discarded);
        assert!(!a_path.exists());
        assert!(!c_path.exists());

        let winner = agg.resolve().unwrap().unwrap();
        assert!(!winner.met_target);
        assert_eq!(winner.size_bytes, 3000);
    }

    #[test]
    fn qualifying_result_evicts_fallback() {
        let ws = Workspace::new().unwrap();
        let mut agg = ResultAggregator::new(TARGET);

        let (over, over_path) = encoded(&ws, 1, 2000);
        let (under, under_path) = encoded(&ws, 2, 100);
        let (over_again, over_again_path) = encoded(&ws, 3, 1500);

        agg.offer(over);
        assert_eq!(agg.offer(under), Decision::Kept);
        assert!(!over_path.exists());
        assert_eq!(agg.offer(over_again), Decision::Discarded);
        assert!(!over_again_path.exists());
        assert!(under_path.exists());
        assert_eq!(agg.best_size(), Some(100));
    }

    #[test]
    fn only_the_holder_keeps_a_live_artifact() {
        let ws = Workspace::new().unwrap();
        let mut agg = ResultAggregator::new(TARGET);
        for (generation, size) in [(1, 3000), (2, 700), (3, 2500), (4, 950), (5, 10)] {
            let (result, _) = encoded(&ws, generation, size);
            agg.offer(result);
            let live = std::fs::read_dir(ws.path()).unwrap().count();
            assert_eq!(live, 1);
        }
        assert_eq!(agg.offered(), 5);
    }

    #[test]
    fn failed_loser_deletion_faults_the_run() {
        let ws = Workspace::new().unwrap();
        let mut agg = ResultAggregator::new(TARGET);

        let (held, held_path) = encoded(&ws, 1, 400);
        let (better, _) = encoded(&ws, 2, 900);

        agg.offer(held);
        std::fs::remove_file(&held_path).unwrap();
        assert!(!agg.is_faulted());

        assert_eq!(agg.offer(better), Decision::Replaced);
        assert!(agg.is_faulted());
        assert!(matches!(agg.resolve(), Err(Error::Resource { .. })));
    }

    /// All orderings of `items`.
    fn permutations(items: &[(u64, u64)]) -> Vec<Vec<(u64, u64)>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.to_vec();
            let head = rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, head);
                out.push(tail);
            }
        }
        out
    }

    fn resolve_in_order(order: &[(u64, u64)], failures: &[u64]) -> Option<(u64, u64)> {
        let ws = Workspace::new().unwrap();
        let mut agg = ResultAggregator::new(TARGET);
        for &(generation, size) in order {
            if failures.contains(&generation) {
                agg.offer(failed(generation));
            } else {
                let (result, _) = encoded(&ws, generation, size);
                agg.offer(result);
            }
        }
        agg.resolve()
            .unwrap()
            .map(|w| (w.job.generation, w.size_bytes))
    }

    #[test]
    fn selection_is_independent_of_arrival_order() {
        let qualifying = [(1, 400), (2, 950), (3, 950), (4, 1200), (5, 999)];
        for order in permutations(&qualifying) {
            assert_eq!(resolve_in_order(&order, &[5]), Some((2, 950)));
        }

        let unreachable = [(1, 4000), (2, 1500), (3, 1500), (4, 2000), (5, 1400)];
        for order in permutations(&unreachable) {
            assert_eq!(resolve_in_order(&order, &[]), Some((5, 1400)));
            assert_eq!(resolve_in_order(&order, &[5]), Some((2, 1500)));
        }
    }
}
