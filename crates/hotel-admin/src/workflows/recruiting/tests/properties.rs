//! Property tests over random operation sequences against one cohort.

use super::common::*;
use proptest::prelude::*;

use crate::workflows::recruiting::cohort::{CohortFloor, StageHistogram};
use crate::workflows::recruiting::domain::{
    Application, ApplicationStatus, CandidateId, TransitionPayload,
};
use crate::workflows::recruiting::store::ApplicationStore;
use crate::workflows::recruiting::transitions::is_locally_valid;

const JOB: &str = "job-property";

#[derive(Debug, Clone)]
enum Operation {
    Transition { slot: usize, target: ApplicationStatus },
    Join,
}

fn any_status() -> impl Strategy<Value = ApplicationStatus> {
    prop_oneof![
        Just(ApplicationStatus::Pending),
        Just(ApplicationStatus::Reviewed),
        Just(ApplicationStatus::Interviewed),
        Just(ApplicationStatus::Offered),
        Just(ApplicationStatus::Hired),
        Just(ApplicationStatus::Rejected),
    ]
}

fn any_operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        9 => (0usize..8, any_status())
            .prop_map(|(slot, target)| Operation::Transition { slot, target }),
        1 => Just(Operation::Join),
    ]
}

fn stamps(application: &Application) -> [bool; 3] {
    [
        application.interview_date.is_some(),
        application.offer_date.is_some(),
        application.hire_date.is_some(),
    ]
}

proptest! {
    #[test]
    fn random_sequences_preserve_pipeline_invariants(
        initial in 1usize..6,
        operations in prop::collection::vec(any_operation(), 1..60),
    ) {
        let (coordinator, store, _) = build_coordinator();
        let mut ids = seed_cohort(&coordinator, JOB, initial);

        for operation in operations {
            match operation {
                Operation::Join => {
                    let created = coordinator
                        .create_application(job(JOB), CandidateId("walk-in".to_string()))
                        .expect("join succeeds");
                    ids.push(created.id);
                }
                Operation::Transition { slot, target } => {
                    let id = &ids[slot % ids.len()];
                    let before = store.fetch(id).expect("fetch").expect("present");
                    let floor_before = store
                        .cohort_histogram(&job(JOB))
                        .expect("histogram")
                        .floor();

                    let payload = TransitionPayload {
                        offer_details: Some("Standard terms".to_string()),
                        ..TransitionPayload::default()
                    };
                    let result = coordinator.attempt_transition(id, target, Some(payload));
                    let after = store.fetch(id).expect("fetch").expect("present");

                    match &result {
                        Ok(updated) => {
                            prop_assert_eq!(updated, &after);
                            prop_assert!(is_locally_valid(before.status, after.status));
                            if before.status != after.status
                                && after.status.is_forward()
                                && before.status != ApplicationStatus::Rejected
                            {
                                let permitted = match floor_before {
                                    CohortFloor::Unconstrained => true,
                                    CohortFloor::Stage(floor) => {
                                        before.status == floor
                                            || after.status.forward_rank() <= floor.forward_rank()
                                    }
                                };
                                prop_assert!(
                                    permitted,
                                    "{} moved {} -> {} past floor {:?}",
                                    id, before.status, after.status, floor_before
                                );
                            }
                        }
                        Err(_) => prop_assert_eq!(&before, &after),
                    }

                    for (was, is) in stamps(&before).into_iter().zip(stamps(&after)) {
                        prop_assert!(!was || is, "timestamp cleared on {}", id);
                    }
                    if after.status == ApplicationStatus::Hired {
                        prop_assert!(after.hire_date.is_some());
                    }
                }
            }

            let cohort = store.find_by_job(&job(JOB)).expect("cohort");
            prop_assert_eq!(
                store.cohort_histogram(&job(JOB)).expect("histogram"),
                StageHistogram::from_applications(&cohort)
            );
        }
    }
}
