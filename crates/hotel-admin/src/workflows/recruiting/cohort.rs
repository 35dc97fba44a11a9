//! Cohort floor computation and the fairness barrier.
//!
//! A cohort is every application sharing a job. No member may move past the
//! cohort floor unless it sits at the floor itself, so the slowest active
//! applicants always catch up before anyone leapfrogs them.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::domain::{Application, ApplicationStatus, JobId};

/// Per-stage application counts for one cohort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageHistogram {
    counts: [usize; 6],
}

impl StageHistogram {
    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = ApplicationStatus>,
    {
        let mut histogram = Self::default();
        for status in statuses {
            histogram.increment(status);
        }
        histogram
    }

    pub fn from_applications<'a, I>(applications: I) -> Self
    where
        I: IntoIterator<Item = &'a Application>,
    {
        Self::from_statuses(applications.into_iter().map(|application| application.status))
    }

    pub fn increment(&mut self, status: ApplicationStatus) {
        self.counts[status.floor_rank()] += 1;
    }

    pub fn decrement(&mut self, status: ApplicationStatus) {
        let slot = &mut self.counts[status.floor_rank()];
        *slot = slot.saturating_sub(1);
    }

    /// Move one application from `from` to `to`.
    pub fn record_move(&mut self, from: ApplicationStatus, to: ApplicationStatus) {
        if from != to {
            self.decrement(from);
            self.increment(to);
        }
    }

    pub fn count(&self, status: ApplicationStatus) -> usize {
        self.counts[status.floor_rank()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Lowest occupied stage, with `Rejected` ranked last. An empty cohort
    /// reports `Pending`.
    pub fn earliest_stage(&self) -> ApplicationStatus {
        ApplicationStatus::ordered()
            .into_iter()
            .find(|status| self.count(*status) > 0)
            .unwrap_or(ApplicationStatus::Pending)
    }

    pub fn floor(&self) -> CohortFloor {
        match self.earliest_stage() {
            ApplicationStatus::Rejected => CohortFloor::Unconstrained,
            stage => CohortFloor::Stage(stage),
        }
    }

    pub fn as_map(&self) -> BTreeMap<ApplicationStatus, usize> {
        ApplicationStatus::ordered()
            .into_iter()
            .map(|status| (status, self.count(status)))
            .collect()
    }
}

impl Serialize for StageHistogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for status in ApplicationStatus::ordered() {
            map.serialize_entry(status.label(), &self.count(status))?;
        }
        map.end()
    }
}

/// Synchronization floor of a cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CohortFloor {
    /// Lowest forward stage still occupied by an active applicant.
    Stage(ApplicationStatus),
    /// Every member is rejected. Nothing holds forward moves back.
    Unconstrained,
}

/// Read-only snapshot used to explain why a transition is blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CohortStatus {
    pub job_id: JobId,
    pub earliest_stage: ApplicationStatus,
    pub counts_by_stage: StageHistogram,
    pub total: usize,
}

impl CohortStatus {
    pub fn new(job_id: JobId, histogram: StageHistogram) -> Self {
        Self {
            job_id,
            earliest_stage: histogram.earliest_stage(),
            counts_by_stage: histogram,
            total: histogram.total(),
        }
    }
}

/// Gate decision for a forward move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Permit,
    Wait { earliest_stage: ApplicationStatus },
}

/// Decide whether `current -> target` may proceed given the cohort counts.
///
/// The histogram must include the application being moved. Only forward
/// targets are gated; rejection and reopening never reach this check.
pub fn evaluate(
    histogram: &StageHistogram,
    current: ApplicationStatus,
    target: ApplicationStatus,
) -> GateDecision {
    let earliest = match histogram.floor() {
        CohortFloor::Unconstrained => return GateDecision::Permit,
        CohortFloor::Stage(stage) => stage,
    };

    let within_floor = match (target.forward_rank(), earliest.forward_rank()) {
        (Some(target_rank), Some(floor_rank)) => target_rank <= floor_rank,
        _ => false,
    };

    if within_floor || current == earliest {
        GateDecision::Permit
    } else {
        GateDecision::Wait {
            earliest_stage: earliest,
        }
    }
}
