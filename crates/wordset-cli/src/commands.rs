use anyhow::{Context, Result};
use std::time::Duration;
use tokio::time::Instant;
use wordset_api::{handlers::task::TaskResponse, AppConfig};
use wordset_core::TaskState;
use wordset_db::{Database, DatabaseConfig};

use crate::{cli::Commands, client::ApiClient};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub async fn execute(command: Commands, client: ApiClient) -> Result<()> {
    match command {
        Commands::Fill {
            study_set,
            user,
            wait,
            timeout_secs,
        } => {
            let task_id = client.fill(study_set, &user).await?;
            println!("✓ Fill task created: {}", task_id);

            if wait {
                println!("Waiting for task {} ...", task_id);
                match wait_for_task(&client, task_id, Duration::from_secs(timeout_secs)).await? {
                    Some(task) => print_task(&task),
                    None => {
                        tracing::warn!(
                            task_id,
                            timeout_secs,
                            "task still pending; the server will finalize it"
                        );
                        println!("⏳ Task {} is still pending.", task_id);
                        println!("   Check later with: wordset status {}", task_id);
                    }
                }
            }
        }

        Commands::Status { task_id } => {
            let task = client.task(task_id).await?;
            print_task(&task);
        }

        Commands::InitDb { reap } => {
            let config = AppConfig::load().context("Failed to load configuration")?;

            println!("Initializing database schema...");
            let reaped = init_database(&config.database_config(), reap).await?;
            if reaped > 0 {
                println!("  Marked {} orphaned pending tasks as failed", reaped);
            }
            println!("✓ Database initialized successfully");
        }
    }

    Ok(())
}

/// Create the schema and, with `reap`, fail every pending task.
/// Returns the number of reaped tasks.
async fn init_database(config: &DatabaseConfig, reap: bool) -> Result<u64> {
    let db = Database::new(config).await?;
    db.init_schema().await?;

    let reaped = if reap {
        db.reap_pending_tasks().await?
    } else {
        0
    };

    db.close().await;
    Ok(reaped)
}

/// Poll until the task leaves `pending`. Returns `None` if `timeout` expires first.
async fn wait_for_task(
    client: &ApiClient,
    task_id: i64,
    timeout: Duration,
) -> Result<Option<TaskResponse>> {
    let deadline = Instant::now() + timeout;

    loop {
        let task = client.task(task_id).await?;
        if task.state != TaskState::Pending {
            return Ok(Some(task));
        }
        if Instant::now() + POLL_INTERVAL > deadline {
            return Ok(None);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn print_task(task: &TaskResponse) {
    println!("Task: {}", task.id);
    println!("  State: {}", task.state);
    if let Some(failure) = task.failure {
        println!("  Failure: {}", failure);
    }
}
