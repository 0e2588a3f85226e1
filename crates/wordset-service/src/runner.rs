//! Asynchronous fill pipeline.
//!
//! `fill` checks ownership and records a `pending` task in one transaction,
//! then hands the work to a detached worker and returns the task ID. The
//! worker generates definitions and writes them together with the `done`
//! transition in a second transaction. Anything else ends in `failed`.
//!
//! Workers are not tied to the request that created them: dropping the
//! `fill` caller after it returned has no effect on the task.

use std::{fmt, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures_util::FutureExt;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::task::TaskTracker;
use tracing::Instrument;
use wordset_ai::{DefinitionGenerator, SetGenerationRequest};
use wordset_core::{FailureReason, StudySet};
use wordset_db::Database;

use crate::{check_ownership, definitions::insert_all, Result, ServiceError};

#[derive(Debug, Clone)]
pub struct FillConfig {
    /// Upper bound on generation plus persistence for one task
    pub deadline: Duration,
    /// Time allowed for recording a failure once the work itself has stopped
    pub finalize_timeout: Duration,
    /// Workers allowed at once; 0 disables the limit
    pub max_in_flight: usize,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(60),
            finalize_timeout: Duration::from_secs(10),
            max_in_flight: 16,
        }
    }
}

/// Why a worker did not reach `done`.
struct FillFailure {
    reason: FailureReason,
    message: String,
}

impl FillFailure {
    fn new(reason: FailureReason, err: impl fmt::Display) -> Self {
        Self {
            reason,
            message: err.to_string(),
        }
    }
}

/// Starts fill tasks and owns their workers.
#[derive(Clone)]
pub struct FillRunner {
    inner: Arc<Inner>,
}

struct Inner {
    db: Database,
    generator: Arc<dyn DefinitionGenerator>,
    config: FillConfig,
    permits: Option<Arc<Semaphore>>,
    tracker: TaskTracker,
}

impl FillRunner {
    pub fn new(db: Database, generator: Arc<dyn DefinitionGenerator>, config: FillConfig) -> Self {
        let permits = match config.max_in_flight {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };

        Self {
            inner: Arc::new(Inner {
                db,
                generator,
                config,
                permits,
                tracker: TaskTracker::new(),
            }),
        }
    }

    /// Create a `pending` fill task for a study set owned by `user_id` and
    /// start its worker. Returns the task ID as soon as the task is recorded.
    ///
    /// Nothing is written when the set is missing or owned by someone else,
    /// or when too many workers are already running.
    ///
    /// Recording the task and spawning its worker happen on a tracked task of
    /// their own: dropping this future (request timeout, client disconnect)
    /// cannot leave a committed task without a worker.
    pub async fn fill(&self, user_id: &str, study_set_id: i64) -> Result<i64> {
        let permit = self.admit()?;
        let inner = self.inner.clone();
        let owner = user_id.to_string();

        let created = self
            .inner
            .tracker
            .spawn(async move { inner.start(owner, study_set_id, permit).await });

        match created.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => Err(ServiceError::Internal(err.to_string())),
        }
    }

    /// Number of fill tasks still being created or worked on
    pub fn in_flight(&self) -> usize {
        self.inner.tracker.len()
    }

    /// Wait for every running worker to reach a terminal state.
    ///
    /// Callers stop routing `fill` requests before calling this.
    pub async fn shutdown(&self) {
        self.inner.tracker.close();
        tracing::info!(in_flight = self.in_flight(), "waiting for fill workers");
        self.inner.tracker.wait().await;
    }

    fn admit(&self) -> Result<Option<OwnedSemaphorePermit>> {
        match &self.inner.permits {
            None => Ok(None),
            Some(permits) => match permits.clone().try_acquire_owned() {
                Ok(permit) => Ok(Some(permit)),
                Err(_) => {
                    tracing::warn!("rejecting fill request: too many tasks in flight");
                    Err(ServiceError::Overloaded)
                }
            },
        }
    }
}

impl Inner {
    async fn start(
        self: Arc<Self>,
        owner: String,
        study_set_id: i64,
        permit: Option<OwnedSemaphorePermit>,
    ) -> Result<i64> {
        let (study_set, task_id) = self
            .db
            .atomic(move |conn, repos| {
                Box::pin(async move {
                    let study_set = check_ownership(conn, repos, &owner, study_set_id).await?;
                    let task_id = repos.tasks.insert(conn, study_set.id).await?;
                    Ok::<_, ServiceError>((study_set, task_id))
                })
            })
            .await?;

        tracing::info!(task_id, study_set_id, "fill task created");

        let worker = self.clone();
        let span = tracing::info_span!("fill_task", task_id, study_set_id);
        self.tracker.spawn(
            async move {
                let _permit = permit;
                worker.run(task_id, study_set).await;
            }
            .instrument(span),
        );

        Ok(task_id)
    }

    async fn run(&self, task_id: i64, study_set: StudySet) {
        let work = tokio::time::timeout(
            self.config.deadline,
            self.generate_and_store(task_id, &study_set),
        );

        let outcome = match AssertUnwindSafe(work).catch_unwind().await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(FillFailure::new(
                FailureReason::Timeout,
                format!("deadline of {:?} exceeded", self.config.deadline),
            )),
            Err(_) => Err(FillFailure::new(FailureReason::Interrupted, "worker panicked")),
        };

        match outcome {
            Ok(count) => tracing::info!(count, "fill task completed"),
            Err(failure) => {
                tracing::error!(
                    reason = %failure.reason,
                    error = %failure.message,
                    "fill task failed"
                );
                self.finalize_failed(task_id, failure.reason).await;
            }
        }
    }

    async fn generate_and_store(
        &self,
        task_id: i64,
        study_set: &StudySet,
    ) -> std::result::Result<usize, FillFailure> {
        let request = SetGenerationRequest::from(study_set);
        let definitions = self
            .generator
            .generate_definitions(&request)
            .await
            .map_err(|e| FillFailure::new(FailureReason::Generation, e))?;

        tracing::debug!(count = definitions.len(), "storing generated definitions");

        let study_set_id = study_set.id;
        self.db
            .atomic(move |conn, repos| {
                Box::pin(async move {
                    let count = insert_all(conn, repos, study_set_id, &definitions).await?;
                    repos.tasks.complete(conn, task_id).await?;
                    Ok::<_, ServiceError>(count)
                })
            })
            .await
            .map_err(|e| FillFailure::new(FailureReason::Persistence, e))
    }

    // Runs outside the work deadline in a transaction of its own, so a task
    // whose work timed out still gets its terminal state.
    async fn finalize_failed(&self, task_id: i64, reason: FailureReason) {
        let finalize = self.db.atomic(move |conn, repos| {
            Box::pin(async move { repos.tasks.fail(conn, task_id, reason).await })
        });

        match tokio::time::timeout(self.config.finalize_timeout, finalize).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "failed to record task failure"),
            Err(_) => tracing::error!(
                timeout = ?self.config.finalize_timeout,
                "timed out recording task failure"
            ),
        }
    }
}
