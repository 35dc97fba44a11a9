use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::cohort::{self, CohortStatus, GateDecision, StageHistogram};
use super::domain::{
    Application, ApplicationId, ApplicationStatus, CandidateId, JobId, TransitionPayload,
};
use super::notifier::{Clock, Notifier, SystemClock, TransitionNotice};
use super::store::{ApplicationStore, StoreError};
use super::transitions::{self, TransitionKind};
use crate::config::RecruitingConfig;

/// Sole writer to the application store.
///
/// Every mutation runs validate, gate, apply and commit while holding the
/// lock for the application's job, so two siblings in one cohort can never
/// both read themselves as the floor and advance past each other. Jobs do
/// not contend with one another.
pub struct PipelineCoordinator<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    config: RecruitingConfig,
    job_locks: JobLocks,
    sequence: AtomicU64,
}

impl<S, N> PipelineCoordinator<S, N>
where
    S: ApplicationStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: RecruitingConfig) -> Self {
        Self {
            store,
            notifier,
            clock: Arc::new(SystemClock),
            config,
            job_locks: JobLocks::default(),
            sequence: AtomicU64::new(1),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &RecruitingConfig {
        &self.config
    }

    /// Register a new `Pending` application for a job.
    pub fn create_application(
        &self,
        job_id: JobId,
        candidate_id: CandidateId,
    ) -> Result<Application, TransitionError> {
        let lock_key = job_id.clone();
        let stored = self.job_locks.run(&lock_key, || {
            let id = self.next_application_id();
            let application = Application::new(id, job_id, candidate_id, self.clock.now());
            self.store.insert(application).map_err(|err| {
                warn!(error = %err, "failed to store new application");
                TransitionError::from(err)
            })
        })?;

        info!(
            application_id = %stored.id,
            job_id = %stored.job_id,
            "application created"
        );
        Ok(stored)
    }

    /// Move an application to `target`, enforcing the adjacency table and,
    /// for forward progress, the cohort fairness barrier.
    pub fn attempt_transition(
        &self,
        application_id: &ApplicationId,
        target: ApplicationStatus,
        payload: Option<TransitionPayload>,
    ) -> Result<Application, TransitionError> {
        let result = self.with_job_lock(application_id, |current| {
            self.apply(current, target, payload.unwrap_or_default())
        });
        self.report(application_id, Some(target), &result);
        result
    }

    /// Move an application to `Interviewed` with the given interview time.
    pub fn schedule_interview(
        &self,
        application_id: &ApplicationId,
        interview_at: DateTime<Utc>,
    ) -> Result<Application, TransitionError> {
        let target = ApplicationStatus::Interviewed;
        let result = self.with_job_lock(application_id, |current| {
            if !matches!(
                current.status,
                ApplicationStatus::Pending | ApplicationStatus::Reviewed
            ) {
                return Err(ValidationError::InterviewNotSchedulable {
                    status: current.status,
                }
                .into());
            }
            self.apply(current, target, TransitionPayload::at(interview_at))
        });
        self.report(application_id, Some(target), &result);
        result
    }

    /// Move an `Interviewed` application to `Offered` with the offer terms.
    pub fn send_offer(
        &self,
        application_id: &ApplicationId,
        offer_details: &str,
    ) -> Result<Application, TransitionError> {
        let target = ApplicationStatus::Offered;
        let result = self.with_job_lock(application_id, |current| {
            if current.status != ApplicationStatus::Interviewed {
                return Err(ValidationError::OfferRequiresInterview {
                    status: current.status,
                }
                .into());
            }
            let payload = TransitionPayload {
                offer_details: Some(offer_details.to_string()),
                ..TransitionPayload::default()
            };
            self.apply(current, target, payload)
        });
        self.report(application_id, Some(target), &result);
        result
    }

    /// Replace the free-form notes. Not a transition: neither the adjacency
    /// table nor the cohort gate is consulted.
    pub fn update_notes(
        &self,
        application_id: &ApplicationId,
        notes: Option<String>,
    ) -> Result<Application, TransitionError> {
        let result = self.with_job_lock(application_id, |mut current| {
            current.notes = notes.filter(|text| !text.trim().is_empty());
            self.store.update(current.clone())?;
            debug!(application_id = %current.id, "application notes updated");
            Ok(current)
        });
        self.report(application_id, None, &result);
        result
    }

    pub fn get(&self, application_id: &ApplicationId) -> Result<Application, TransitionError> {
        self.fetch_existing(application_id)
    }

    pub fn applications_for_job(&self, job_id: &JobId) -> Result<Vec<Application>, TransitionError> {
        Ok(self.store.find_by_job(job_id)?)
    }

    /// Floor and per-stage counts for a job, used to explain a blocked move.
    pub fn cohort_status(&self, job_id: &JobId) -> Result<CohortStatus, TransitionError> {
        let histogram = self.store.cohort_histogram(job_id)?;
        Ok(CohortStatus::new(job_id.clone(), histogram))
    }

    fn with_job_lock<F>(
        &self,
        application_id: &ApplicationId,
        operation: F,
    ) -> Result<Application, TransitionError>
    where
        F: FnOnce(Application) -> Result<Application, TransitionError>,
    {
        let job_id = self.fetch_existing(application_id)?.job_id;
        self.job_locks.run(&job_id, || {
            // Re-read under the lock; the unlocked read only located the job.
            let current = self.fetch_existing(application_id)?;
            operation(current)
        })
    }

    fn apply(
        &self,
        current: Application,
        target: ApplicationStatus,
        payload: TransitionPayload,
    ) -> Result<Application, TransitionError> {
        let from = current.status;
        let kind = transitions::classify(from, target)
            .ok_or(TransitionError::InvalidTransition { from, to: target })?;

        let mut next = current;
        match kind {
            TransitionKind::Unchanged => {
                let reason = payload.reason.filter(|text| !text.trim().is_empty());
                match (target, reason) {
                    (ApplicationStatus::Rejected, Some(reason)) => {
                        next.rejection_reason = Some(reason);
                    }
                    _ => {
                        debug!(application_id = %next.id, status = %from, "transition is a no-op");
                        return Ok(next);
                    }
                }
            }
            TransitionKind::Reject => {
                next.status = ApplicationStatus::Rejected;
                next.rejection_reason = Some(
                    payload
                        .reason
                        .filter(|text| !text.trim().is_empty())
                        .unwrap_or_else(|| self.config.default_rejection_reason.clone()),
                );
            }
            TransitionKind::Reopen => {
                next.status = ApplicationStatus::Pending;
            }
            TransitionKind::Advance => {
                let offer_details = if target == ApplicationStatus::Offered {
                    let details = payload
                        .offer_details
                        .as_deref()
                        .map(str::trim)
                        .filter(|text| !text.is_empty())
                        .ok_or(ValidationError::EmptyOfferDetails)?;
                    Some(details.to_string())
                } else {
                    None
                };

                let histogram = self.store.cohort_histogram(&next.job_id)?;
                if let GateDecision::Wait { earliest_stage } =
                    cohort::evaluate(&histogram, from, target)
                {
                    return Err(TransitionError::CohortNotReady {
                        earliest_stage,
                        counts: histogram,
                    });
                }

                next.status = target;
                if let Some(slot) = next.stage_timestamp_mut(target) {
                    // Only an interview may be rescheduled; offer and hire
                    // dates record the first entry.
                    let reschedule = target == ApplicationStatus::Interviewed;
                    match payload.effective_at {
                        Some(at) if slot.is_none() || reschedule => *slot = Some(at),
                        None if slot.is_none() => *slot = Some(self.clock.now()),
                        _ => {}
                    }
                }
                if offer_details.is_some() {
                    next.offer_details = offer_details;
                }
            }
        }

        self.store.update(next.clone())?;
        info!(
            application_id = %next.id,
            job_id = %next.job_id,
            from = %from,
            to = %next.status,
            "application transitioned"
        );
        Ok(next)
    }

    fn fetch_existing(&self, application_id: &ApplicationId) -> Result<Application, TransitionError> {
        self.store
            .fetch(application_id)?
            .ok_or_else(|| TransitionError::NotFound(application_id.clone()))
    }

    fn report(
        &self,
        application_id: &ApplicationId,
        target: Option<ApplicationStatus>,
        result: &Result<Application, TransitionError>,
    ) {
        let notice = match result {
            Ok(_) => TransitionNotice::success(application_id.clone(), target),
            Err(err) => {
                if err.is_expected() {
                    debug!(application_id = %application_id, error = %err, "transition refused");
                } else {
                    warn!(application_id = %application_id, error = %err, "transition failed");
                }
                if !self.config.notify_failures {
                    return;
                }
                TransitionNotice::failure(application_id.clone(), target, err.to_string())
            }
        };

        if let Err(err) = self.notifier.notify(notice) {
            warn!(application_id = %application_id, error = %err, "notifier dropped transition notice");
        }
    }

    fn next_application_id(&self) -> ApplicationId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        ApplicationId(format!("app-{id:06}"))
    }
}

/// One mutex per job, created on first use and dropped once no caller
/// holds or waits on it.
#[derive(Default)]
struct JobLocks {
    locks: Mutex<HashMap<JobId, Arc<Mutex<()>>>>,
}

impl JobLocks {
    fn run<T, F>(&self, job_id: &JobId, operation: F) -> Result<T, TransitionError>
    where
        F: FnOnce() -> Result<T, TransitionError>,
    {
        let lock = self.handle(job_id)?;
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            operation()
        };
        drop(lock);
        self.release(job_id);
        result
    }

    fn handle(&self, job_id: &JobId) -> Result<Arc<Mutex<()>>, TransitionError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| StoreError::Unavailable("job lock table poisoned".to_string()))?;
        Ok(locks.entry(job_id.clone()).or_default().clone())
    }

    // Handles are cloned under the table lock, so a count of one means
    // nobody else holds or is waiting on this job's mutex.
    fn release(&self, job_id: &JobId) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(job_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(job_id);
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or_default()
    }
}

/// Error raised by the pipeline coordinator.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error("cannot move application from {from} to {to}")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    #[error("cohort is still at {earliest_stage}; wait for the remaining applicants")]
    CohortNotReady {
        earliest_stage: ApplicationStatus,
        counts: StageHistogram,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TransitionError {
    pub const fn code(&self) -> &'static str {
        match self {
            TransitionError::NotFound(_) => "not_found",
            TransitionError::InvalidTransition { .. } => "invalid_transition",
            TransitionError::CohortNotReady { .. } => "cohort_not_ready",
            TransitionError::Validation(_) => "validation",
            TransitionError::Store(_) => "store_unavailable",
        }
    }

    /// Outcomes a caller is expected to handle; only store failures are faults.
    pub const fn is_expected(&self) -> bool {
        !matches!(self, TransitionError::Store(_))
    }
}

/// Missing or invalid input for a side-effecting operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("interviews can only be scheduled for pending or reviewed applications (currently {status})")]
    InterviewNotSchedulable { status: ApplicationStatus },
    #[error("offers can only be sent to interviewed applications (currently {status})")]
    OfferRequiresInterview { status: ApplicationStatus },
    #[error("offer details must not be empty")]
    EmptyOfferDetails,
}
