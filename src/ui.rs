//! Terminal output: spinners for long-running sync steps and colored job
//! summaries, built on `indicatif` and `console`.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::state_machine::{ItemStatus, Job, JobStatus};

/// Spinner shown while a sync operation talks to the platform.
pub struct SyncProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
}

impl SyncProgress {
    pub fn start(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("invalid template"),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
        }
    }

    #[allow(dead_code)]
    pub fn update(&self, message: &str) {
        self.pb.set_message(message.to_string());
    }

    pub fn finish_ok(&self, message: &str) {
        self.pb.finish_and_clear();
        println!("  {} {message}", self.green.apply_to("✓"));
    }

    pub fn finish_err(&self, message: &str) {
        self.pb.finish_and_clear();
        eprintln!("  {} {message}", self.red.apply_to("✗"));
    }
}

/// One line per job for the work list.
pub fn print_job_row(job: &Job) {
    let status_style = match job.status {
        JobStatus::Accepted | JobStatus::Completed => Style::new().green(),
        JobStatus::Rejected => Style::new().red(),
        JobStatus::OnReview => Style::new().yellow(),
        _ => Style::new().cyan(),
    };
    let (done, accepted, rejected, total) = job.progress();
    println!(
        "  #{:<6} {:<30} {:<12} {done}/{total} done, {accepted} accepted, {rejected} rejected",
        job.id,
        job.name,
        status_style.apply_to(job.status.to_string()),
    );
}

/// Full per-item breakdown of one job.
pub fn print_job_summary(job: &Job) {
    println!("Job #{} — {} [{}]", job.id, job.name, job.status);
    for item in &job.items {
        let marker = match item.status {
            ItemStatus::Accepted => Style::new().green().apply_to("✓"),
            ItemStatus::Rejected => Style::new().red().apply_to("✗"),
            ItemStatus::Done => Style::new().yellow().apply_to("●"),
            _ => Style::new().dim().apply_to("○"),
        };
        println!("  {marker} {:<30} {}", item.name, item.status);
    }
    println!("  {} item(s) open for editing", job.editable_items().len());
}
