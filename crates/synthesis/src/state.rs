//! Lifecycle of a synthesis run.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use argmin::core::observers::Observe;
use argmin::core::{Error, KV, State};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Status of a synthesis run.
///
/// ```text
/// Initialized -> Iterating -> Converged | BudgetExhausted | Diverged
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Initialized,
    Iterating,
    /// Loss change fell below the tolerance.
    Converged,
    /// Iteration budget reached first.
    BudgetExhausted,
    /// A loss, gradient or candidate became non-finite.
    Diverged,
}

impl GenerationStatus {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Iterating => "iterating",
            Self::Converged => "converged",
            Self::BudgetExhausted => "budget_exhausted",
            Self::Diverged => "diverged",
        }
    }

    /// Returns `true` for the three final states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Converged | Self::BudgetExhausted | Self::Diverged)
    }

    fn can_advance_to(self, next: Self) -> bool {
        match self {
            Self::Initialized => next == Self::Iterating,
            Self::Iterating => next.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mutable bookkeeping shared by the loss evaluations of one run.
#[derive(Debug)]
pub(crate) struct GenerationState {
    status: GenerationStatus,
    evaluations: usize,
    initial_loss: Option<f64>,
    best_loss: f64,
    best: Option<Vec<f64>>,
    losses: Vec<f64>,
}

impl GenerationState {
    pub(crate) fn new() -> Self {
        Self {
            status: GenerationStatus::Initialized,
            evaluations: 0,
            initial_loss: None,
            best_loss: f64::INFINITY,
            best: None,
            losses: Vec::new(),
        }
    }

    pub(crate) fn status(&self) -> GenerationStatus {
        self.status
    }

    /// Moves to `next`; illegal transitions are ignored.
    pub(crate) fn advance(&mut self, next: GenerationStatus) {
        if !self.status.can_advance_to(next) {
            debug!(from = %self.status, to = %next, "ignored status transition");
            return;
        }
        info!(from = %self.status, to = %next, evaluations = self.evaluations, "synthesis status");
        self.status = next;
    }

    /// Counts one evaluation and returns its one-based number.
    pub(crate) fn begin_evaluation(&mut self) -> usize {
        self.evaluations += 1;
        self.evaluations
    }

    /// Records a finite loss; keeps `candidate` if it is the best so far.
    pub(crate) fn record(&mut self, loss: f64, candidate: &[f64]) {
        self.initial_loss.get_or_insert(loss);
        self.losses.push(loss);
        if loss < self.best_loss {
            self.best_loss = loss;
            self.best = Some(candidate.to_vec());
        }
    }

    pub(crate) fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub(crate) fn take_best(&mut self) -> Option<(f64, Vec<f64>)> {
        self.best.take().map(|b| (self.best_loss, b))
    }

    pub(crate) fn report(&self, iterations: u64, best_loss: f64) -> GenerationReport {
        GenerationReport {
            status: self.status,
            iterations,
            evaluations: self.evaluations,
            initial_loss: self.initial_loss.unwrap_or(best_loss),
            best_loss,
            losses: self.losses.clone(),
            from_cache: false,
        }
    }
}

/// Optimizer iterations completed so far, readable after the run failed.
///
/// Attached to the executor as an observer; clones share the count.
#[derive(Clone, Debug, Default)]
pub(crate) struct IterationCounter(Arc<AtomicU64>);

impl IterationCounter {
    pub(crate) fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

impl<I: State> Observe<I> for IterationCounter {
    fn observe_iter(&mut self, state: &I, _kv: &KV) -> Result<(), Error> {
        // Called before the executor increments its own counter.
        self.0.store(state.get_iter() + 1, Ordering::Relaxed);
        Ok(())
    }
}

/// Summary of a finished synthesis run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub status: GenerationStatus,
    /// Completed optimizer iterations, also when the line search broke down.
    pub iterations: u64,
    /// Loss evaluations, line-search trial points included.
    pub evaluations: usize,
    pub initial_loss: f64,
    /// Loss of the returned candidate.
    pub best_loss: f64,
    /// Loss of every evaluation, in order.
    pub losses: Vec<f64>,
    /// `true` when the result was read from the generation cache.
    #[serde(default)]
    pub from_cache: bool,
}
