use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::cohort::StageHistogram;
use super::domain::{Application, ApplicationId, JobId};

/// Storage abstraction so the coordinator can be exercised in isolation.
///
/// Implementations only persist records; every mutation arrives through the
/// pipeline coordinator, which holds the job lock for the duration.
pub trait ApplicationStore: Send + Sync {
    fn insert(&self, application: Application) -> Result<Application, StoreError>;
    fn update(&self, application: Application) -> Result<(), StoreError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError>;
    fn find_by_job(&self, job_id: &JobId) -> Result<Vec<Application>, StoreError>;

    /// Stage counts for a cohort. The default rescans the cohort.
    fn cohort_histogram(&self, job_id: &JobId) -> Result<StageHistogram, StoreError> {
        let cohort = self.find_by_job(job_id)?;
        Ok(StageHistogram::from_applications(&cohort))
    }
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Process-local store keeping a stage histogram per job up to date on
/// every write, so cohort lookups do not scan the cohort.
#[derive(Debug, Default)]
pub struct InMemoryApplicationStore {
    state: Mutex<StoreState>,
}

#[derive(Debug, Default)]
struct StoreState {
    records: HashMap<ApplicationId, Application>,
    jobs: HashMap<JobId, JobIndex>,
}

#[derive(Debug, Default)]
struct JobIndex {
    members: BTreeSet<ApplicationId>,
    histogram: StageHistogram,
}

impl InMemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|state| state.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("application store lock poisoned".to_string()))
    }
}

impl ApplicationStore for InMemoryApplicationStore {
    fn insert(&self, application: Application) -> Result<Application, StoreError> {
        let mut state = self.lock()?;
        if state.records.contains_key(&application.id) {
            return Err(StoreError::Conflict);
        }

        let index = state.jobs.entry(application.job_id.clone()).or_default();
        index.members.insert(application.id.clone());
        index.histogram.increment(application.status);
        state
            .records
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn update(&self, application: Application) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let previous = match state.records.get(&application.id) {
            Some(existing) if existing.job_id != application.job_id => {
                return Err(StoreError::Conflict)
            }
            Some(existing) => existing.status,
            None => return Err(StoreError::NotFound),
        };

        if let Some(index) = state.jobs.get_mut(&application.job_id) {
            index.histogram.record_move(previous, application.status);
        }
        state.records.insert(application.id.clone(), application);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        let state = self.lock()?;
        Ok(state.records.get(id).cloned())
    }

    fn find_by_job(&self, job_id: &JobId) -> Result<Vec<Application>, StoreError> {
        let state = self.lock()?;
        let mut cohort: Vec<Application> = match state.jobs.get(job_id) {
            Some(index) => index
                .members
                .iter()
                .filter_map(|id| state.records.get(id).cloned())
                .collect(),
            None => Vec::new(),
        };
        cohort.sort_by(|left, right| {
            left.applied_date
                .cmp(&right.applied_date)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(cohort)
    }

    fn cohort_histogram(&self, job_id: &JobId) -> Result<StageHistogram, StoreError> {
        let state = self.lock()?;
        Ok(state
            .jobs
            .get(job_id)
            .map(|index| index.histogram)
            .unwrap_or_default())
    }
}
