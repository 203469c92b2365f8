use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use labelsync::cache::LocalCache;
use labelsync::cli::{Cli, Command, VerdictArg};
use labelsync::config::Settings;
use labelsync::gateway::PlatformClient;
use labelsync::orchestrator::{SessionEvent, SyncOrchestrator};
use labelsync::session::SessionContext;
use labelsync::state_machine::ItemStatus;
use labelsync::ui::{self, SyncProgress};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(Path::new(path))?,
        None => Settings::load()?,
    };
    settings.validate()?;

    let session = SessionContext::new(settings.user_id, settings.team_id, cli.role.into());
    let gateway = PlatformClient::new(settings.server.clone(), settings.token.clone());
    let cache = LocalCache::new(settings.working_directory.clone());
    let mut orchestrator = SyncOrchestrator::new(gateway, cache, settings, session);

    match cli.command {
        Command::Jobs => {
            let jobs = orchestrator.workable_jobs().await?;
            if jobs.is_empty() {
                println!("No jobs on your work list.");
            }
            for job in &jobs {
                ui::print_job_row(job);
            }
        }

        Command::Status { job_id } => {
            let job = orchestrator.inspect_job(job_id).await?;
            ui::print_job_summary(&job);
        }

        Command::Start { job_id } => {
            let progress = SyncProgress::start("Opening job and prefetching items...");
            match orchestrator.open_job(job_id).await {
                Ok(()) => {
                    let cached = orchestrator.job().map(|j| j.items.len()).unwrap_or(0);
                    progress.finish_ok(&format!("Job {job_id} ready, {cached} item(s) cached"));
                }
                Err(e) => {
                    progress.finish_err(&format!("Could not open job {job_id}"));
                    return Err(e.into());
                }
            }
        }

        Command::Save { job_id, item_id } => {
            orchestrator.open_job(job_id).await?;
            orchestrator
                .handle(SessionEvent::ItemSelected { item_id })
                .await?;
            orchestrator.handle(SessionEvent::Save).await?;
            println!("Item {item_id} saved.");
        }

        Command::Done { job_id, item_id } => {
            orchestrator.open_job(job_id).await?;
            orchestrator
                .handle(SessionEvent::ItemSelected { item_id })
                .await?;
            orchestrator.handle(SessionEvent::MarkDone).await?;
            orchestrator.handle(SessionEvent::Save).await?;
            println!("Item {item_id} marked done and saved.");
        }

        Command::Submit { job_id, force } => {
            orchestrator.open_job(job_id).await?;
            orchestrator
                .handle(SessionEvent::SubmitForReview { confirmed: force })
                .await?;
            println!("Job {job_id} submitted for review.");
        }

        Command::Review {
            job_id,
            item_id,
            verdict,
        } => {
            orchestrator.open_job(job_id).await?;
            let status = match verdict {
                VerdictArg::Accept => ItemStatus::Accepted,
                VerdictArg::Reject => ItemStatus::Rejected,
            };
            orchestrator
                .handle(SessionEvent::ReviewItem {
                    item_id,
                    verdict: status,
                })
                .await?;
            println!("Item {item_id}: {status}.");
        }

        Command::Accept { job_id } => {
            orchestrator.open_job(job_id).await?;
            orchestrator.handle(SessionEvent::Accept).await?;
            println!("Job {job_id} accepted.");
        }

        Command::Reject { job_id } => {
            orchestrator.open_job(job_id).await?;
            orchestrator.handle(SessionEvent::Reject).await?;
            println!("Job {job_id} rejected. Run `labelsync restart {job_id}` to reopen it.");
        }

        Command::Restart { job_id } => {
            orchestrator.open_job(job_id).await?;
            let reopened = orchestrator.on_restart().await?;
            println!("Job {job_id} restarted, {} item(s) reopened.", reopened.len());
        }

        Command::Complete { job_id } => {
            orchestrator.open_job(job_id).await?;
            orchestrator.handle(SessionEvent::Complete).await?;
            println!("Job {job_id} completed.");
        }
    }

    Ok(())
}
