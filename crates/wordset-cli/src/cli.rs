use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wordset")]
#[command(about = "Wordset - study sets with generated definitions", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base URL of the Wordset API
    #[arg(long, env = "WORDSET_API_URL", default_value = "http://localhost:3000")]
    pub api_url: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fill a study set with generated definitions
    Fill {
        /// Study set ID
        #[arg(long)]
        study_set: i64,

        /// Caller identity sent as x-user-id
        #[arg(long, env = "WORDSET_USER")]
        user: String,

        /// Wait until the task finishes
        #[arg(long)]
        wait: bool,

        /// Give up waiting after this many seconds
        #[arg(long, default_value = "120")]
        timeout_secs: u64,
    },

    /// Show task status
    Status {
        /// Task ID
        task_id: i64,
    },

    /// Initialize database
    InitDb {
        /// Also mark every pending task as failed. Only safe while no server
        /// is running against the same database.
        #[arg(long)]
        reap: bool,
    },
}
