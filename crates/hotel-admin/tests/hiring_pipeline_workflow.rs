//! End-to-end hiring pipeline scenarios driven through the public facade.
//!
//! A cohort of applicants for one job is walked from intake to hire using
//! only exported types, covering the fairness barrier, the rejection and
//! reopening escape hatches, and the interview/offer wrappers.

mod common {
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use hotel_admin::config::RecruitingConfig;
    use hotel_admin::workflows::recruiting::{
        ApplicationId, CandidateId, Clock, InMemoryApplicationStore, JobId, Notifier,
        NotifyError, PipelineCoordinator, TransitionNotice,
    };

    pub(super) fn opening_day() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    pub(super) struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            opening_day() + Duration::hours(1)
        }
    }

    #[derive(Default, Clone)]
    pub(super) struct Toasts {
        notices: Arc<Mutex<Vec<TransitionNotice>>>,
    }

    impl Toasts {
        pub(super) fn notices(&self) -> Vec<TransitionNotice> {
            self.notices.lock().expect("lock").clone()
        }
    }

    impl Notifier for Toasts {
        fn notify(&self, notice: TransitionNotice) -> Result<(), NotifyError> {
            self.notices.lock().expect("lock").push(notice);
            Ok(())
        }
    }

    pub(super) type Pipeline = PipelineCoordinator<InMemoryApplicationStore, Toasts>;

    pub(super) fn build_pipeline() -> (Pipeline, Arc<Toasts>) {
        let toasts = Arc::new(Toasts::default());
        let pipeline = PipelineCoordinator::new(
            Arc::new(InMemoryApplicationStore::new()),
            toasts.clone(),
            RecruitingConfig::default(),
        )
        .with_clock(Arc::new(FixedClock));
        (pipeline, toasts)
    }

    pub(super) fn front_office() -> JobId {
        JobId("job-front-office-manager".to_string())
    }

    pub(super) fn apply(pipeline: &Pipeline, candidate: &str) -> ApplicationId {
        pipeline
            .create_application(front_office(), CandidateId(candidate.to_string()))
            .expect("application accepted")
            .id
    }
}

mod cohort_progress {
    use super::common::*;
    use chrono::Duration;
    use hotel_admin::workflows::recruiting::{ApplicationStatus, Outcome, TransitionError};

    #[test]
    fn cohort_advances_in_lockstep_to_hire() {
        let (pipeline, toasts) = build_pipeline();
        let ana = apply(&pipeline, "ana");
        let ben = apply(&pipeline, "ben");
        let chloe = apply(&pipeline, "chloe");

        pipeline
            .attempt_transition(&ana, ApplicationStatus::Reviewed, None)
            .expect("ana reviewed");
        let blocked = pipeline.attempt_transition(&ana, ApplicationStatus::Interviewed, None);
        assert!(matches!(
            blocked,
            Err(TransitionError::CohortNotReady {
                earliest_stage: ApplicationStatus::Pending,
                ..
            })
        ));

        for id in [&ben, &chloe] {
            pipeline
                .attempt_transition(id, ApplicationStatus::Reviewed, None)
                .expect("peer reviewed");
        }

        let interview_at = opening_day() + Duration::days(4);
        let interviewed = pipeline
            .schedule_interview(&ana, interview_at)
            .expect("ana interviewed");
        assert_eq!(interviewed.interview_date, Some(interview_at));

        let rejected = pipeline
            .attempt_transition(&chloe, ApplicationStatus::Rejected, None)
            .expect("chloe rejected");
        assert_eq!(rejected.rejection_reason.as_deref(), Some("No reason provided"));

        pipeline
            .schedule_interview(&ben, interview_at + Duration::hours(1))
            .expect("ben interviewed");

        let offered = pipeline
            .send_offer(&ana, "Front office manager, 52k, start July 1")
            .expect("offer sent");
        assert_eq!(offered.status, ApplicationStatus::Offered);
        assert_eq!(offered.offer_date, Some(opening_day() + Duration::hours(1)));

        let cohort = pipeline
            .cohort_status(&front_office())
            .expect("cohort status");
        assert_eq!(cohort.earliest_stage, ApplicationStatus::Interviewed);
        assert_eq!(cohort.counts_by_stage.count(ApplicationStatus::Rejected), 1);

        let outcomes: Vec<Outcome> = toasts.notices().iter().map(|n| n.outcome).collect();
        assert_eq!(
            outcomes.iter().filter(|o| **o == Outcome::Failure).count(),
            1,
            "only the blocked interview should surface as a failure"
        );
    }

    #[test]
    fn reopened_candidate_keeps_history() {
        let (pipeline, _) = build_pipeline();
        let dev = apply(&pipeline, "dev");

        pipeline
            .attempt_transition(&dev, ApplicationStatus::Reviewed, None)
            .expect("reviewed");
        let interviewed = pipeline
            .schedule_interview(&dev, opening_day() + Duration::days(1))
            .expect("interviewed");
        pipeline
            .attempt_transition(&dev, ApplicationStatus::Rejected, None)
            .expect("rejected");
        let reopened = pipeline
            .attempt_transition(&dev, ApplicationStatus::Pending, None)
            .expect("reopened");

        assert_eq!(reopened.status, ApplicationStatus::Pending);
        assert_eq!(reopened.interview_date, interviewed.interview_date);
        assert_eq!(reopened.rejection_reason.as_deref(), Some("No reason provided"));
    }
}
