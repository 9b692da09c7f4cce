use crate::infra::{build_engine, load_catalog};
use clap::Args;
use job_portal::config::StorageConfig;
use job_portal::error::AppError;
use job_portal::portal::{
    authorize, ApplicationStatus, Capability, Catalog, Decision, ErrorKind, Identity, JobId, Role,
    UserId,
};
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// JSON catalog to seed the stores with (defaults to the demo catalog)
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Skip the guard decision table at the end of the walkthrough
    #[arg(long)]
    pub(crate) skip_guard_table: bool,
}

struct Cast {
    job_id: JobId,
    owner: Identity,
    intruder: Identity,
    seeker: Identity,
}

impl Cast {
    fn from_catalog(catalog: &Catalog) -> Option<Self> {
        let job = catalog.jobs.first()?;
        let seeker = catalog.profiles.first()?;
        let intruder = catalog
            .jobs
            .iter()
            .map(|candidate| &candidate.owner_id)
            .find(|owner| **owner != job.owner_id)
            .cloned()
            .unwrap_or_else(|| UserId::from("recruiter-demo"));

        Some(Self {
            job_id: job.id.clone(),
            owner: Identity::authenticated(job.owner_id.0.clone(), Role::Recruiter),
            intruder: Identity::authenticated(intruder.0, Role::Recruiter),
            seeker: Identity::authenticated(seeker.user_id.0.clone(), Role::JobSeeker),
        })
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        catalog,
        skip_guard_table,
    } = args;

    let catalog = load_catalog(catalog.as_deref())?;
    let Some(cast) = Cast::from_catalog(&catalog) else {
        println!("Catalog needs at least one job and one applicant profile to run the demo.");
        return Ok(());
    };
    let engine = build_engine(catalog, StorageConfig::default());

    println!("Job portal lifecycle demo");
    println!(
        "- job {} owned by {} | applicant {} | second recruiter {}",
        cast.job_id, cast.owner.id, cast.seeker.id, cast.intruder.id
    );

    let application = engine
        .create(&cast.seeker, &cast.job_id, "Keen to join the team.")
        .await?;
    println!(
        "\n1. {} applies -> {} is {}",
        cast.seeker.id, application.id, application.status
    );

    let queue = engine.review_queue(&cast.owner, &cast.job_id).await?;
    for view in &queue {
        println!(
            "2. {} reviews {} | match {}%",
            cast.owner.id, view.application.id, view.match_percentage
        );
    }

    let accepted = engine
        .transition(&cast.owner, &application.id, ApplicationStatus::Accepted)
        .await?;
    println!("3. {} accepts -> {}", cast.owner.id, accepted.status);

    match engine
        .transition(&cast.intruder, &application.id, ApplicationStatus::Rejected)
        .await
    {
        Err(err) if err.kind() == ErrorKind::NotOwner => {
            println!("4. {} tries to reject -> refused ({err})", cast.intruder.id)
        }
        Err(err) => return Err(err.into()),
        Ok(unexpected) => println!(
            "4. {} unexpectedly moved the application to {}",
            cast.intruder.id, unexpected.status
        ),
    }

    match engine
        .transition(&cast.owner, &application.id, ApplicationStatus::Rejected)
        .await
    {
        Err(err) if err.kind() == ErrorKind::InvalidTransition => {
            println!("5. {} tries to reject after accepting -> {err}", cast.owner.id)
        }
        Err(err) => return Err(err.into()),
        Ok(unexpected) => println!("5. terminal status was overwritten with {}", unexpected.status),
    }

    match engine
        .create(&cast.seeker, &cast.job_id, "Applying again.")
        .await
    {
        Err(err) if err.kind() == ErrorKind::DuplicateApplication => {
            println!("6. {} applies again -> {err}", cast.seeker.id)
        }
        Err(err) => return Err(err.into()),
        Ok(duplicate) => println!("6. duplicate application {} was stored", duplicate.id),
    }

    let history = engine.applications_with_match(&cast.seeker, None).await?;
    println!("\nApplications for {}:", cast.seeker.id);
    for view in &history {
        println!(
            "  - {} on {} | {} | match {}%",
            view.application.id,
            view.application.job_id,
            view.application.status,
            view.match_percentage
        );
    }

    let matches = engine.matching_jobs(&cast.seeker).await?;
    println!("\nMatching jobs for {}:", cast.seeker.id);
    for entry in &matches {
        let applied = if entry.applied { " | applied" } else { "" };
        println!(
            "  - {} {} | match {}%{applied}",
            entry.job.id, entry.job.title, entry.match_percentage
        );
    }

    if !skip_guard_table {
        render_guard_table(&cast);
    }

    Ok(())
}

fn render_guard_table(cast: &Cast) {
    let identities = [
        Identity::anonymous(),
        cast.seeker.clone(),
        cast.owner.clone(),
        cast.intruder.clone(),
        Identity::authenticated("admin", Role::Admin),
    ];
    let capabilities = [
        Capability::ViewJobSeekerArea,
        Capability::ApplyToJob,
        Capability::ViewRecruiterArea,
        Capability::ManageJob {
            job_id: cast.job_id.clone(),
            owner: cast.owner.id.clone(),
        },
    ];

    println!("\nGuard decisions:");
    for identity in &identities {
        let label = if identity.authenticated {
            format!("{} ({})", identity.id, identity.role)
        } else {
            "anonymous".to_string()
        };
        println!("  {label}");
        for capability in &capabilities {
            match authorize(identity, capability) {
                Decision::Allow => println!("    - {}: allow", capability.name()),
                Decision::Deny(denial) => println!(
                    "    - {}: deny {} -> {}",
                    capability.name(),
                    denial.reason,
                    denial.redirect
                ),
            }
        }
    }
}
