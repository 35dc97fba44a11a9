use crate::infra::{in_memory_coordinator, ServiceCoordinator};
use chrono::{Duration, Utc};
use clap::Args;
use hotel_admin::config::RecruitingConfig;
use hotel_admin::error::AppError;
use hotel_admin::workflows::recruiting::{
    Application, ApplicationId, ApplicationStatus, CandidateId, JobId, TransitionError,
    TransitionPayload,
};

const DEMO_JOB: &str = "job-front-desk-agent";

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Number of applicants in the demo cohort
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u16).range(1..=50))]
    pub(crate) applicants: u16,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let coordinator = in_memory_coordinator(RecruitingConfig::default());
    let job_id = JobId(DEMO_JOB.to_string());

    println!("Hiring pipeline demo for {job_id}");
    let mut ids = Vec::with_capacity(usize::from(args.applicants));
    for index in 1..=args.applicants {
        let application = coordinator.create_application(
            job_id.clone(),
            CandidateId(format!("candidate-{index:02}")),
        )?;
        println!(
            "- {} applied as {} ({})",
            application.candidate_id.0, application.id, application.status
        );
        ids.push(application.id);
    }

    let leader = ids[0].clone();
    println!("\nLeader runs ahead of the cohort");
    step(&coordinator, &leader, ApplicationStatus::Reviewed);
    step(&coordinator, &leader, ApplicationStatus::Interviewed);

    println!("\nCohort catches up");
    for id in &ids[1..] {
        step(&coordinator, id, ApplicationStatus::Reviewed);
    }
    if ids.len() > 2 {
        let straggler = &ids[ids.len() - 1];
        report(
            straggler,
            ApplicationStatus::Rejected,
            coordinator.attempt_transition(
                straggler,
                ApplicationStatus::Rejected,
                Some(TransitionPayload::with_reason("Position requires weekend shifts")),
            ),
        );
    }

    println!("\nInterviews, offers and hires");
    let first_slot = Utc::now() + Duration::days(2);
    let active: Vec<ApplicationId> = coordinator
        .applications_for_job(&job_id)?
        .into_iter()
        .filter(|application| application.status != ApplicationStatus::Rejected)
        .map(|application| application.id)
        .collect();
    for (slot, id) in active.iter().enumerate() {
        let at = first_slot + Duration::hours(slot as i64);
        report(
            id,
            ApplicationStatus::Interviewed,
            coordinator.schedule_interview(id, at),
        );
    }
    for id in &active {
        report(
            id,
            ApplicationStatus::Offered,
            coordinator.send_offer(id, "Front desk agent, full time, 34k"),
        );
    }
    step(&coordinator, &leader, ApplicationStatus::Hired);

    let cohort = coordinator.cohort_status(&job_id)?;
    println!(
        "\nCohort {} ({} applicants), earliest stage {}",
        cohort.job_id, cohort.total, cohort.earliest_stage
    );
    for status in ApplicationStatus::ordered() {
        println!("- {}: {}", status, cohort.counts_by_stage.count(status));
    }

    Ok(())
}

fn step(coordinator: &ServiceCoordinator, id: &ApplicationId, target: ApplicationStatus) {
    report(id, target, coordinator.attempt_transition(id, target, None));
}

fn report(
    id: &ApplicationId,
    target: ApplicationStatus,
    result: Result<Application, TransitionError>,
) {
    match result {
        Ok(application) => println!("- {id} -> {}", application.status),
        Err(TransitionError::CohortNotReady {
            earliest_stage,
            counts,
        }) => println!(
            "- {id} -> {target} refused: cohort is still at {earliest_stage} ({} of {} waiting there)",
            counts.count(earliest_stage),
            counts.total()
        ),
        Err(err) => println!("- {id} -> {target} refused: {err}"),
    }
}
