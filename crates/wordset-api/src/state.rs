use std::sync::Arc;

use wordset_ai::DefinitionGenerator;
use wordset_db::Database;
use wordset_service::{DefinitionService, FillConfig, FillRunner, StudySetService, TaskService};

#[derive(Clone)]
pub struct ApiState {
    pub study_sets: StudySetService,
    pub definitions: DefinitionService,
    pub tasks: TaskService,
    pub runner: FillRunner,
}

impl ApiState {
    pub fn new(db: Database, generator: Arc<dyn DefinitionGenerator>, fill: FillConfig) -> Self {
        Self {
            study_sets: StudySetService::new(db.clone()),
            definitions: DefinitionService::new(db.clone()),
            tasks: TaskService::new(db.clone()),
            runner: FillRunner::new(db, generator, fill),
        }
    }
}
