use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, ApplicationStatus};

/// Outbound hook receiving transition outcomes for display (toasts, e-mail).
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: TransitionNotice) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

/// Payload handed to the notifier after a transition attempt settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionNotice {
    pub outcome: Outcome,
    pub application_id: ApplicationId,
    pub target: Option<ApplicationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TransitionNotice {
    pub fn success(application_id: ApplicationId, target: Option<ApplicationStatus>) -> Self {
        Self {
            outcome: Outcome::Success,
            application_id,
            target,
            reason: None,
        }
    }

    pub fn failure(
        application_id: ApplicationId,
        target: Option<ApplicationStatus>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            outcome: Outcome::Failure,
            application_id,
            target,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Notifier that drops every notice.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _notice: TransitionNotice) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Time source for stage timestamps and application dates.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
