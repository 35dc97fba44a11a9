//! Hiring pipeline for job applications.
//!
//! Applications for the same job form a cohort that advances in lockstep:
//! nobody moves past the cohort floor unless they sit on it. Rejection and
//! reopening sidestep the barrier. [`PipelineCoordinator`] is the only
//! writer and applies every change as a single locked step per job.

pub mod cohort;
pub mod coordinator;
pub mod domain;
pub mod notifier;
pub mod router;
pub mod store;
pub mod transitions;

#[cfg(test)]
mod tests;

pub use cohort::{CohortFloor, CohortStatus, GateDecision, StageHistogram};
pub use coordinator::{PipelineCoordinator, TransitionError, ValidationError};
pub use domain::{
    Application, ApplicationId, ApplicationStatus, CandidateId, JobId, TransitionPayload,
    UnknownStatus,
};
pub use notifier::{
    Clock, Notifier, NotifyError, Outcome, SilentNotifier, SystemClock, TransitionNotice,
};
pub use router::recruiting_router;
pub use store::{ApplicationStore, InMemoryApplicationStore, StoreError};
