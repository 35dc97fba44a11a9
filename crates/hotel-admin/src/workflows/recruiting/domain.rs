use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for job applications.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Job posting reference. Applications sharing a job form one cohort.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Candidate reference. Never interpreted by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

/// Recruiting stage of an application.
///
/// Variants are declared in floor order: the forward stages by pipeline
/// progress, then `Rejected` last so that rejected applicants never become
/// the cohort floor while any active applicant remains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Interviewed,
    Offered,
    Hired,
    Rejected,
}

impl ApplicationStatus {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Pending,
            Self::Reviewed,
            Self::Interviewed,
            Self::Offered,
            Self::Hired,
            Self::Rejected,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Interviewed => "interviewed",
            Self::Offered => "offered",
            Self::Hired => "hired",
            Self::Rejected => "rejected",
        }
    }

    /// Position on the forward scale. `Rejected` is off the scale.
    pub const fn forward_rank(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Reviewed => Some(1),
            Self::Interviewed => Some(2),
            Self::Offered => Some(3),
            Self::Hired => Some(4),
            Self::Rejected => None,
        }
    }

    /// Six point rank used to locate the cohort floor.
    pub const fn floor_rank(self) -> usize {
        match self {
            Self::Pending => 0,
            Self::Reviewed => 1,
            Self::Interviewed => 2,
            Self::Offered => 3,
            Self::Hired => 4,
            Self::Rejected => 5,
        }
    }

    pub const fn is_forward(self) -> bool {
        self.forward_rank().is_some()
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown application status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|status| status.label() == normalized)
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}

/// A candidate's application to one job, tracked through the hiring pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub candidate_id: CandidateId,
    pub status: ApplicationStatus,
    pub applied_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interview_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_details: Option<String>,
}

impl Application {
    pub fn new(
        id: ApplicationId,
        job_id: JobId,
        candidate_id: CandidateId,
        applied_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            job_id,
            candidate_id,
            status: ApplicationStatus::Pending,
            applied_date,
            interview_date: None,
            offer_date: None,
            hire_date: None,
            notes: None,
            rejection_reason: None,
            offer_details: None,
        }
    }

    /// Timestamp slot recorded when the application first enters `stage`.
    pub fn stage_timestamp(&self, stage: ApplicationStatus) -> Option<DateTime<Utc>> {
        match stage {
            ApplicationStatus::Interviewed => self.interview_date,
            ApplicationStatus::Offered => self.offer_date,
            ApplicationStatus::Hired => self.hire_date,
            _ => None,
        }
    }

    pub(crate) fn stage_timestamp_mut(
        &mut self,
        stage: ApplicationStatus,
    ) -> Option<&mut Option<DateTime<Utc>>> {
        match stage {
            ApplicationStatus::Interviewed => Some(&mut self.interview_date),
            ApplicationStatus::Offered => Some(&mut self.offer_date),
            ApplicationStatus::Hired => Some(&mut self.hire_date),
            _ => None,
        }
    }
}

/// Optional data carried alongside a transition request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionPayload {
    /// Rejection reason. Only read when the target is `Rejected`.
    #[serde(default)]
    pub reason: Option<String>,
    /// Explicit stage timestamp, e.g. the scheduled interview time.
    #[serde(default)]
    pub effective_at: Option<DateTime<Utc>>,
    /// Offer terms. Only read when the target is `Offered`.
    #[serde(default)]
    pub offer_details: Option<String>,
}

impl TransitionPayload {
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn at(effective_at: DateTime<Utc>) -> Self {
        Self {
            effective_at: Some(effective_at),
            ..Self::default()
        }
    }
}
