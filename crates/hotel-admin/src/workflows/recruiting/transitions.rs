//! Local transition rules for a single application.
//!
//! The adjacency table below is the only source of truth for which stage
//! changes are legal. Cohort synchronization is layered on top by
//! [`super::cohort`].

use super::domain::ApplicationStatus;

/// Legal targets for each stage. `Hired` is terminal.
pub const fn allowed_targets(current: ApplicationStatus) -> &'static [ApplicationStatus] {
    use ApplicationStatus::*;
    match current {
        Pending => &[Reviewed, Rejected],
        Reviewed => &[Interviewed, Rejected],
        Interviewed => &[Offered, Rejected],
        Offered => &[Hired, Rejected],
        Rejected => &[Pending],
        Hired => &[],
    }
}

/// Whether `current -> target` is legal in isolation. Staying put is legal.
pub fn is_locally_valid(current: ApplicationStatus, target: ApplicationStatus) -> bool {
    current == target || allowed_targets(current).contains(&target)
}

pub fn is_terminal(status: ApplicationStatus) -> bool {
    allowed_targets(status).is_empty()
}

/// How a locally valid transition is processed by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// Source and target are the same stage.
    Unchanged,
    /// Any move into `Rejected`. Bypasses the cohort gate.
    Reject,
    /// `Rejected -> Pending`. Bypasses the cohort gate.
    Reopen,
    /// One step along the forward scale. Subject to the cohort gate.
    Advance,
}

/// Classify `current -> target`, or `None` when the table forbids it.
pub fn classify(current: ApplicationStatus, target: ApplicationStatus) -> Option<TransitionKind> {
    if current == target {
        return Some(TransitionKind::Unchanged);
    }
    if !is_locally_valid(current, target) {
        return None;
    }

    let kind = match (current, target) {
        (_, ApplicationStatus::Rejected) => TransitionKind::Reject,
        (ApplicationStatus::Rejected, ApplicationStatus::Pending) => TransitionKind::Reopen,
        _ => TransitionKind::Advance,
    };
    Some(kind)
}
