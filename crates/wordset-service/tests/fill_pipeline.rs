use async_trait::async_trait;
use std::{
    collections::HashSet,
    io,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::sync::{oneshot, Notify};
use wordset_ai::{DefinitionGenerator, SetGenerationRequest};
use wordset_core::{FailureReason, NewDefinition, NewStudySet, Task, TaskState};
use wordset_db::{Database, DatabaseConfig};
use wordset_service::{
    DefinitionService, FillConfig, FillRunner, Resource, ServiceError, StudySetService,
    TaskService,
};

/// Returns the same batch every time.
struct StaticGenerator(Vec<NewDefinition>);

#[async_trait]
impl DefinitionGenerator for StaticGenerator {
    async fn generate_definitions(
        &self,
        _request: &SetGenerationRequest,
    ) -> wordset_ai::Result<Vec<NewDefinition>> {
        Ok(self.0.clone())
    }
}

struct FailingGenerator;

#[async_trait]
impl DefinitionGenerator for FailingGenerator {
    async fn generate_definitions(
        &self,
        _request: &SetGenerationRequest,
    ) -> wordset_ai::Result<Vec<NewDefinition>> {
        Err(wordset_ai::Error::Unsuccessful("not a word set".to_string()))
    }
}

/// Blocks until the test opens the gate, then returns its batch.
struct GatedGenerator {
    gate: Arc<Notify>,
    batch: Vec<NewDefinition>,
}

#[async_trait]
impl DefinitionGenerator for GatedGenerator {
    async fn generate_definitions(
        &self,
        _request: &SetGenerationRequest,
    ) -> wordset_ai::Result<Vec<NewDefinition>> {
        self.gate.notified().await;
        Ok(self.batch.clone())
    }
}

struct PanickingGenerator;

#[async_trait]
impl DefinitionGenerator for PanickingGenerator {
    async fn generate_definitions(
        &self,
        _request: &SetGenerationRequest,
    ) -> wordset_ai::Result<Vec<NewDefinition>> {
        panic!("generator bug");
    }
}

fn colors() -> Vec<NewDefinition> {
    vec![
        NewDefinition::new("red", "czerwony"),
        NewDefinition::new("green", "zielony"),
        NewDefinition::new("blue", "niebieski"),
    ]
}

struct Harness {
    db: Database,
    runner: FillRunner,
    tasks: TaskService,
    definitions: DefinitionService,
    set_id: i64,
    _dir: Option<tempfile::TempDir>,
}

async fn harness(generator: impl DefinitionGenerator + 'static, config: FillConfig) -> Harness {
    let db = Database::in_memory().await.unwrap();
    harness_on(db, None, generator, config).await
}

/// Harness over a WAL-mode database file with a multi-connection pool.
async fn file_harness(
    generator: impl DefinitionGenerator + 'static,
    config: FillConfig,
) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(&DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("wordset.db").display()),
        max_connections: 5,
    })
    .await
    .unwrap();
    db.init_schema().await.unwrap();
    harness_on(db, Some(dir), generator, config).await
}

async fn harness_on(
    db: Database,
    dir: Option<tempfile::TempDir>,
    generator: impl DefinitionGenerator + 'static,
    config: FillConfig,
) -> Harness {
    let set = StudySetService::new(db.clone())
        .create(
            "alice",
            NewStudySet {
                name: "Colors".to_string(),
                description: "Basic colors".to_string(),
                phrase_language: "en".to_string(),
                definition_language: "pl".to_string(),
            },
        )
        .await
        .unwrap();

    Harness {
        runner: FillRunner::new(db.clone(), Arc::new(generator), config),
        tasks: TaskService::new(db.clone()),
        definitions: DefinitionService::new(db.clone()),
        db,
        set_id: set.id,
        _dir: dir,
    }
}

async fn wait_terminal(tasks: &TaskService, task_id: i64) -> Task {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let task = tasks.get(task_id).await.unwrap();
            if task.state.is_terminal() {
                return task;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("task never left pending")
}

/// Keeps opening the gate until the task ends; `Notify` stores one permit at most.
async fn release(gate: &Notify, tasks: &TaskService, task_id: i64) -> Task {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            gate.notify_one();
            let task = tasks.get(task_id).await.unwrap();
            if task.state.is_terminal() {
                return task;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("task never left pending")
}

#[tokio::test]
async fn test_fill_completes_with_generated_items() {
    let h = harness(StaticGenerator(colors()), FillConfig::default()).await;

    let task_id = h.runner.fill("alice", h.set_id).await.unwrap();
    let task = wait_terminal(&h.tasks, task_id).await;

    assert_eq!(task.state, TaskState::Done);
    assert_eq!(task.failure, None);
    assert!(task.finished_at.is_some());

    let stored = h.definitions.list(h.set_id).await.unwrap();
    let phrases: Vec<_> = stored.iter().map(|d| d.phrase.as_str()).collect();
    assert_eq!(phrases, vec!["red", "green", "blue"]);
}

#[tokio::test]
async fn test_task_is_pending_until_work_finishes() {
    let gate = Arc::new(Notify::new());
    let generator = GatedGenerator {
        gate: gate.clone(),
        batch: colors(),
    };
    let h = harness(generator, FillConfig::default()).await;

    let task_id = h.runner.fill("alice", h.set_id).await.unwrap();
    assert_eq!(h.tasks.get(task_id).await.unwrap().state, TaskState::Pending);
    assert!(h.definitions.list(h.set_id).await.unwrap().is_empty());

    gate.notify_one();
    assert_eq!(wait_terminal(&h.tasks, task_id).await.state, TaskState::Done);

    // Terminal states are final.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.tasks.get(task_id).await.unwrap().state, TaskState::Done);
}

#[tokio::test]
async fn test_generation_failure_leaves_items_untouched() {
    let h = harness(FailingGenerator, FillConfig::default()).await;
    h.definitions
        .create("alice", h.set_id, vec![NewDefinition::new("black", "czarny")])
        .await
        .unwrap();

    let task_id = h.runner.fill("alice", h.set_id).await.unwrap();
    let task = wait_terminal(&h.tasks, task_id).await;

    assert_eq!(task.state, TaskState::Failed);
    assert_eq!(task.failure, Some(FailureReason::Generation));
    assert_eq!(h.definitions.list(h.set_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_persistence_failure_rolls_back_whole_batch() {
    let mut batch = colors();
    batch.push(NewDefinition::new("", "pusty"));
    batch.push(NewDefinition::new("pink", "różowy"));
    let h = harness(StaticGenerator(batch), FillConfig::default()).await;

    let task_id = h.runner.fill("alice", h.set_id).await.unwrap();
    let task = wait_terminal(&h.tasks, task_id).await;

    assert_eq!(task.state, TaskState::Failed);
    assert_eq!(task.failure, Some(FailureReason::Persistence));
    assert!(h.definitions.list(h.set_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_non_owner_is_forbidden_and_creates_no_task() {
    let h = harness(StaticGenerator(colors()), FillConfig::default()).await;

    let err = h.runner.fill("mallory", h.set_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden));

    assert!(h.tasks.list_for(h.set_id).await.unwrap().is_empty());
    assert!(h.definitions.list(h.set_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_study_set_is_not_found() {
    let h = harness(StaticGenerator(colors()), FillConfig::default()).await;

    let err = h.runner.fill("alice", h.set_id + 1).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(Resource::StudySet)));
    assert!(matches!(
        h.tasks.get(1).await,
        Err(ServiceError::NotFound(Resource::Task))
    ));
}

#[tokio::test]
async fn test_worker_outlives_cancelled_request() {
    let gate = Arc::new(Notify::new());
    let generator = GatedGenerator {
        gate: gate.clone(),
        batch: colors(),
    };
    let h = harness(generator, FillConfig::default()).await;

    let (tx, rx) = oneshot::channel();
    let runner = h.runner.clone();
    let set_id = h.set_id;
    let request = tokio::spawn(async move {
        let task_id = runner.fill("alice", set_id).await.unwrap();
        tx.send(task_id).unwrap();
        std::future::pending::<()>().await;
    });

    let task_id = rx.await.unwrap();
    request.abort();
    assert!(request.await.unwrap_err().is_cancelled());

    gate.notify_one();
    let task = wait_terminal(&h.tasks, task_id).await;
    assert_eq!(task.state, TaskState::Done);
    assert_eq!(h.definitions.list(h.set_id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_deadline_fails_task_with_timeout() {
    let gate = Arc::new(Notify::new());
    let generator = GatedGenerator {
        gate,
        batch: colors(),
    };
    let config = FillConfig {
        deadline: Duration::from_millis(50),
        ..FillConfig::default()
    };
    let h = harness(generator, config).await;

    let task_id = h.runner.fill("alice", h.set_id).await.unwrap();
    let task = wait_terminal(&h.tasks, task_id).await;

    assert_eq!(task.state, TaskState::Failed);
    assert_eq!(task.failure, Some(FailureReason::Timeout));
    assert!(h.definitions.list(h.set_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_panicking_worker_still_finalizes() {
    let h = harness(PanickingGenerator, FillConfig::default()).await;

    let task_id = h.runner.fill("alice", h.set_id).await.unwrap();
    let task = wait_terminal(&h.tasks, task_id).await;

    assert_eq!(task.state, TaskState::Failed);
    assert_eq!(task.failure, Some(FailureReason::Interrupted));
}

#[tokio::test]
async fn test_concurrent_fills_get_distinct_tasks() {
    let h = harness(StaticGenerator(colors()), FillConfig::default()).await;

    let (first, second) = tokio::join!(
        h.runner.fill("alice", h.set_id),
        h.runner.fill("alice", h.set_id)
    );
    let (first, second) = (first.unwrap(), second.unwrap());
    assert_ne!(first, second);

    assert_eq!(wait_terminal(&h.tasks, first).await.state, TaskState::Done);
    assert_eq!(wait_terminal(&h.tasks, second).await.state, TaskState::Done);
    assert_eq!(h.definitions.list(h.set_id).await.unwrap().len(), 6);
}

#[tokio::test]
async fn test_admission_limit_rejects_without_side_effects() {
    let gate = Arc::new(Notify::new());
    let generator = GatedGenerator {
        gate: gate.clone(),
        batch: colors(),
    };
    let config = FillConfig {
        max_in_flight: 1,
        ..FillConfig::default()
    };
    let h = harness(generator, config).await;

    let first = h.runner.fill("alice", h.set_id).await.unwrap();
    let err = h.runner.fill("alice", h.set_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Overloaded));
    assert_eq!(h.tasks.list_for(h.set_id).await.unwrap().len(), 1);

    gate.notify_one();
    assert_eq!(wait_terminal(&h.tasks, first).await.state, TaskState::Done);
    h.runner.shutdown().await;

    // The permit is released once the worker is gone.
    let second = h.runner.fill("alice", h.set_id).await.unwrap();
    gate.notify_one();
    assert_eq!(wait_terminal(&h.tasks, second).await.state, TaskState::Done);
}

#[tokio::test]
async fn test_shutdown_drains_workers() {
    let h = harness(StaticGenerator(colors()), FillConfig::default()).await;

    let task_id = h.runner.fill("alice", h.set_id).await.unwrap();
    h.runner.shutdown().await;

    assert_eq!(h.runner.in_flight(), 0);
    let task = h.tasks.get(task_id).await.unwrap();
    assert_eq!(task.state, TaskState::Done);
}

#[tokio::test]
async fn test_deleting_study_set_removes_its_tasks() {
    let h = harness(StaticGenerator(colors()), FillConfig::default()).await;

    let task_id = h.runner.fill("alice", h.set_id).await.unwrap();
    wait_terminal(&h.tasks, task_id).await;

    StudySetService::new(h.db.clone())
        .delete("alice", h.set_id)
        .await
        .unwrap();
    assert!(matches!(
        h.tasks.get(task_id).await,
        Err(ServiceError::NotFound(Resource::Task))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_fills_on_file_database() {
    let config = FillConfig {
        max_in_flight: 0,
        ..FillConfig::default()
    };
    let h = file_harness(StaticGenerator(colors()), config).await;

    let mut requests = Vec::new();
    for _ in 0..20 {
        let runner = h.runner.clone();
        let set_id = h.set_id;
        requests.push(tokio::spawn(async move { runner.fill("alice", set_id).await }));
    }

    let mut ids = HashSet::new();
    for request in requests {
        ids.insert(request.await.unwrap().unwrap());
    }
    assert_eq!(ids.len(), 20);

    for task_id in &ids {
        assert_eq!(wait_terminal(&h.tasks, *task_id).await.state, TaskState::Done);
    }
    assert_eq!(h.definitions.list(h.set_id).await.unwrap().len(), 60);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_paired_fills_on_file_database() {
    let h = file_harness(StaticGenerator(colors()), FillConfig::default()).await;

    for _ in 0..10 {
        let (first, second) = tokio::join!(
            h.runner.fill("alice", h.set_id),
            h.runner.fill("alice", h.set_id)
        );
        let (first, second) = (first.unwrap(), second.unwrap());
        assert_ne!(first, second);
        assert_eq!(wait_terminal(&h.tasks, first).await.state, TaskState::Done);
        assert_eq!(wait_terminal(&h.tasks, second).await.state, TaskState::Done);
    }
    assert_eq!(h.definitions.list(h.set_id).await.unwrap().len(), 60);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_admission_limit_on_file_database() {
    let gate = Arc::new(Notify::new());
    let generator = GatedGenerator {
        gate: gate.clone(),
        batch: colors(),
    };
    let config = FillConfig {
        max_in_flight: 2,
        ..FillConfig::default()
    };
    let h = file_harness(generator, config).await;

    let first = h.runner.fill("alice", h.set_id).await.unwrap();
    let second = h.runner.fill("alice", h.set_id).await.unwrap();
    assert!(matches!(
        h.runner.fill("alice", h.set_id).await,
        Err(ServiceError::Overloaded)
    ));
    assert_eq!(h.tasks.list_for(h.set_id).await.unwrap().len(), 2);

    for task_id in [first, second] {
        assert_eq!(release(&gate, &h.tasks, task_id).await.state, TaskState::Done);
    }
}

#[tokio::test]
async fn test_fill_dropped_while_recording_still_gets_a_worker() {
    let h = harness(StaticGenerator(colors()), FillConfig::default()).await;

    // Hold the only connection so the fill is stuck before its transaction.
    let conn = h.db.acquire().await.unwrap();

    let runner = h.runner.clone();
    let set_id = h.set_id;
    let request = tokio::spawn(async move { runner.fill("alice", set_id).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    request.abort();
    assert!(request.await.unwrap_err().is_cancelled());
    drop(conn);

    let task = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let tasks = h.tasks.list_for(h.set_id).await.unwrap();
            if let Some(task) = tasks.into_iter().find(|t| t.state.is_terminal()) {
                return task;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("no task was finalized");

    assert_eq!(task.state, TaskState::Done);
    assert_eq!(h.definitions.list(h.set_id).await.unwrap().len(), 3);
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_failure_is_logged_with_structured_fields() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let h = harness(FailingGenerator, FillConfig::default()).await;
    let task_id = h.runner.fill("alice", h.set_id).await.unwrap();
    wait_terminal(&h.tasks, task_id).await;

    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    let event = output
        .lines()
        .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap())
        .find(|event| event["fields"]["message"] == "fill task failed")
        .expect("failure was not logged");

    assert_eq!(event["level"], "ERROR");
    assert_eq!(event["fields"]["reason"], "generation");
    assert!(event["fields"]["error"].as_str().unwrap().contains("not a word set"));
    assert_eq!(event["span"]["name"], "fill_task");
    assert_eq!(event["span"]["task_id"], task_id);
}
