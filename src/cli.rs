//! Command-line interface, built on clap.
//!
//! Defines the [`Cli`] struct with one subcommand per session action and
//! global flags (--role, --config, --verbose).

use clap::{Parser, Subcommand, ValueEnum};

use crate::state_machine::Role;

/// labelsync — synchronize local volume annotations with a labeling platform.
#[derive(Debug, Parser)]
#[command(name = "labelsync", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Role to act as in this session.
    #[arg(long, global = true, value_enum, default_value_t = RoleArg::Annotator)]
    pub role: RoleArg,

    /// Path to the configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    /// Work jobs assigned to you for annotation.
    Annotator,
    /// Review jobs submitted by annotators.
    Reviewer,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Annotator => Role::Annotator,
            RoleArg::Reviewer => Role::Reviewer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VerdictArg {
    Accept,
    Reject,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List jobs on your work list.
    Jobs,

    /// Show the per-item status of a job.
    Status { job_id: u64 },

    /// Start (or resume) a job and prefetch its items into the local cache.
    Start { job_id: u64 },

    /// Save a locally edited item back to the platform.
    Save { job_id: u64, item_id: u64 },

    /// Mark an item done and save it.
    Done { job_id: u64, item_id: u64 },

    /// Submit a job for review.
    Submit {
        job_id: u64,

        /// Submit even if the active item has unsaved changes.
        #[arg(long)]
        force: bool,
    },

    /// Record a review verdict on one item.
    Review {
        job_id: u64,
        item_id: u64,
        verdict: VerdictArg,
    },

    /// Accept a job under review.
    Accept { job_id: u64 },

    /// Reject a job under review.
    Reject { job_id: u64 },

    /// Reopen a rejected job for another annotation cycle.
    Restart { job_id: u64 },

    /// Close out an accepted job.
    Complete { job_id: u64 },
}
