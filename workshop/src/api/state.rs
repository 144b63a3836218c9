use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::agents::{AgentStages, LlmStages};
use crate::config::Config;
use crate::db::DatabaseBackend;
use crate::llm::LlmProvider;
use crate::pipeline::AgentOrchestrator;
use crate::services::RetentionManager;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<dyn DatabaseBackend>,
    pub llm: LlmProvider,
    pub orchestrator: Arc<AgentOrchestrator>,
    pub retention: RetentionManager,
    /// Cancelled on graceful shutdown. Pipeline runs get a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Arc<dyn DatabaseBackend>,
        llm: LlmProvider,
        shutdown: CancellationToken,
    ) -> Self {
        let stages = Arc::new(LlmStages::new(llm.clone(), config.pipeline.clone()));
        Self::with_stages(config, db, llm, stages, shutdown)
    }

    /// Same as [`AppState::new`] with the pipeline stages supplied by the caller.
    pub fn with_stages(
        config: Config,
        db: Arc<dyn DatabaseBackend>,
        llm: LlmProvider,
        stages: Arc<dyn AgentStages>,
        shutdown: CancellationToken,
    ) -> Self {
        let config = Arc::new(config);
        let orchestrator = Arc::new(AgentOrchestrator::new(
            db.clone(),
            stages,
            &config.pipeline,
        ));
        let retention = RetentionManager::new(db.clone(), &config.retention);

        Self {
            config,
            db,
            llm,
            orchestrator,
            retention,
            shutdown,
        }
    }
}
