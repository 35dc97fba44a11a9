use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::config::RecruitingConfig;
use crate::workflows::recruiting::cohort::StageHistogram;
use crate::workflows::recruiting::domain::{
    Application, ApplicationId, ApplicationStatus, CandidateId, JobId,
};
use crate::workflows::recruiting::notifier::{Clock, Notifier, NotifyError, TransitionNotice};
use crate::workflows::recruiting::store::{
    ApplicationStore, InMemoryApplicationStore, StoreError,
};
use crate::workflows::recruiting::{recruiting_router, PipelineCoordinator};

pub(super) type TestCoordinator = PipelineCoordinator<InMemoryApplicationStore, MemoryNotifier>;

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 7, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Clock that advances one minute every time it is read.
#[derive(Debug)]
pub(super) struct SteppingClock {
    ticks: AtomicI64,
}

impl Default for SteppingClock {
    fn default() -> Self {
        Self {
            ticks: AtomicI64::new(0),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        base_time() + Duration::minutes(tick)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    notices: Arc<Mutex<Vec<TransitionNotice>>>,
}

impl MemoryNotifier {
    pub(super) fn notices(&self) -> Vec<TransitionNotice> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notice: TransitionNotice) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct BrokenNotifier;

impl Notifier for BrokenNotifier {
    fn notify(&self, _notice: TransitionNotice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("toast service offline".to_string()))
    }
}

pub(super) struct UnavailableStore;

impl ApplicationStore for UnavailableStore {
    fn insert(&self, _application: Application) -> Result<Application, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _application: Application) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn find_by_job(&self, _job_id: &JobId) -> Result<Vec<Application>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

/// Store whose writes fail after reads succeed, to observe rollbacks.
#[derive(Default)]
pub(super) struct ReadOnlyStore {
    pub(super) inner: InMemoryApplicationStore,
}

impl ApplicationStore for ReadOnlyStore {
    fn insert(&self, application: Application) -> Result<Application, StoreError> {
        self.inner.insert(application)
    }

    fn update(&self, _application: Application) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("read only replica".to_string()))
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        self.inner.fetch(id)
    }

    fn find_by_job(&self, job_id: &JobId) -> Result<Vec<Application>, StoreError> {
        self.inner.find_by_job(job_id)
    }
}

pub(super) fn recruiting_config() -> RecruitingConfig {
    RecruitingConfig {
        default_rejection_reason: "Not selected".to_string(),
        notify_failures: true,
    }
}

pub(super) fn build_coordinator() -> (
    TestCoordinator,
    Arc<InMemoryApplicationStore>,
    Arc<MemoryNotifier>,
) {
    let store = Arc::new(InMemoryApplicationStore::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let coordinator =
        PipelineCoordinator::new(store.clone(), notifier.clone(), recruiting_config())
            .with_clock(Arc::new(SteppingClock::default()));
    (coordinator, store, notifier)
}

pub(super) fn job(id: &str) -> JobId {
    JobId(id.to_string())
}

/// Create `count` pending applications for `job_id`.
pub(super) fn seed_cohort<S, N>(
    coordinator: &PipelineCoordinator<S, N>,
    job_id: &str,
    count: usize,
) -> Vec<ApplicationId>
where
    S: ApplicationStore + 'static,
    N: Notifier + 'static,
{
    (0..count)
        .map(|index| {
            coordinator
                .create_application(job(job_id), CandidateId(format!("{job_id}-cand-{index}")))
                .expect("application created")
                .id
        })
        .collect()
}

/// Walk every listed application one step forward, in order.
pub(super) fn advance_all(
    coordinator: &TestCoordinator,
    ids: &[ApplicationId],
    target: ApplicationStatus,
) {
    for id in ids {
        coordinator
            .attempt_transition(id, target, None)
            .unwrap_or_else(|err| panic!("{id} should reach {target}: {err}"));
    }
}

pub(super) fn status_of(store: &InMemoryApplicationStore, id: &ApplicationId) -> ApplicationStatus {
    store
        .fetch(id)
        .expect("fetch succeeds")
        .expect("record present")
        .status
}

/// Fairness barrier over a stored cohort.
pub(super) fn assert_cohort_is_fair(applications: &[Application]) {
    let histogram = StageHistogram::from_applications(applications);
    let earliest = histogram.earliest_stage();
    for application in applications {
        let fair = match (application.status.forward_rank(), earliest.forward_rank()) {
            _ if application.status == ApplicationStatus::Rejected => true,
            _ if application.status == earliest => true,
            (Some(rank), Some(floor)) => rank <= floor + 1,
            _ => true,
        };
        assert!(
            fair,
            "{} at {} overtook the cohort floor {}",
            application.id, application.status, earliest
        );
    }
}

pub(super) fn router_with(coordinator: TestCoordinator) -> axum::Router {
    recruiting_router(Arc::new(coordinator))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
