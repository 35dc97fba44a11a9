use hotel_admin::config::RecruitingConfig;
use hotel_admin::workflows::recruiting::{
    InMemoryApplicationStore, Notifier, NotifyError, Outcome, PipelineCoordinator,
    TransitionNotice,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) type ServiceCoordinator = PipelineCoordinator<InMemoryApplicationStore, TracingNotifier>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Forwards transition notices to the log stream in place of a UI toast channel.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: TransitionNotice) -> Result<(), NotifyError> {
        let to = notice.target.map(|status| status.label());
        match notice.outcome {
            Outcome::Success => info!(
                application_id = %notice.application_id,
                to,
                "application moved"
            ),
            Outcome::Failure => warn!(
                application_id = %notice.application_id,
                to,
                reason = notice.reason.as_deref().unwrap_or_default(),
                "application move refused"
            ),
        }
        Ok(())
    }
}

pub(crate) fn in_memory_coordinator(config: RecruitingConfig) -> Arc<ServiceCoordinator> {
    Arc::new(PipelineCoordinator::new(
        Arc::new(InMemoryApplicationStore::new()),
        Arc::new(TracingNotifier),
        config,
    ))
}
