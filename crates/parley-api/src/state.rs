//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Services are generic over repository/hasher/generator traits, but AppState
//! pins them to the concrete infra implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parley_core::reply::cache::ResponseCache;
use parley_core::reply::orchestrator::MessageOrchestrator;
use parley_core::reply::responder::PersonaResponder;
use parley_core::reply::scheduler::TokioScheduler;
use parley_core::service::conversation::ConversationService;
use parley_core::service::tag::TagService;
use parley_core::service::user::UserService;
use parley_infra::config::{database_url, load_global_config, resolve_data_dir};
use parley_infra::crypto::hash::Sha256KeyHasher;
use parley_infra::sqlite::conversation::SqliteConversationRepository;
use parley_infra::sqlite::message::SqliteMessageRepository;
use parley_infra::sqlite::pool::DatabasePool;
use parley_infra::sqlite::tag::SqliteTagRepository;
use parley_infra::sqlite::user::SqliteUserRepository;
use parley_types::config::GlobalConfig;
use tokio::task::JoinHandle;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteConversationService = ConversationService<
    SqliteConversationRepository,
    SqliteMessageRepository,
    SqliteUserRepository,
    SqliteTagRepository,
>;

pub type ConcreteTagService = TagService<SqliteTagRepository, SqliteConversationRepository>;

pub type ConcreteUserService = UserService<SqliteUserRepository, Sha256KeyHasher>;

pub type ConcreteOrchestrator =
    MessageOrchestrator<SqliteConversationRepository, SqliteMessageRepository, PersonaResponder>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub conversation_service: Arc<ConcreteConversationService>,
    pub tag_service: Arc<ConcreteTagService>,
    pub user_service: Arc<ConcreteUserService>,
    pub orchestrator: Arc<ConcreteOrchestrator>,
    pub cache: Arc<ResponseCache>,
    pub scheduler: Arc<TokioScheduler>,
    pub config: Arc<GlobalConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize from the resolved data directory and its `config.toml`.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;
        let config = load_global_config(&data_dir).await;
        Self::open(&data_dir, config).await
    }

    /// Connect to the database under `data_dir` and wire services.
    pub async fn open(data_dir: &Path, config: GlobalConfig) -> anyhow::Result<Self> {
        let db_pool = DatabasePool::new(&database_url(data_dir)).await?;

        let conversation_repo = SqliteConversationRepository::new(db_pool.clone());
        let message_repo = SqliteMessageRepository::new(db_pool.clone());
        let user_repo = SqliteUserRepository::new(db_pool.clone());
        let tag_repo = SqliteTagRepository::new(db_pool.clone());

        let cache = Arc::new(ResponseCache::new(&config.cache));
        let responder = PersonaResponder::new(
            cache.clone(),
            config.orchestration.persona_latency(),
        );
        let scheduler = Arc::new(TokioScheduler::new());

        let orchestrator = MessageOrchestrator::new(
            Arc::new(conversation_repo.clone()),
            Arc::new(message_repo.clone()),
            Arc::new(responder),
            scheduler.clone(),
            config.orchestration.clone(),
        );

        let conversation_service = ConversationService::new(
            conversation_repo.clone(),
            message_repo,
            user_repo.clone(),
            tag_repo.clone(),
        );
        let tag_service = TagService::new(tag_repo, conversation_repo);
        let user_service = UserService::new(user_repo, Sha256KeyHasher::new());

        Ok(Self {
            conversation_service: Arc::new(conversation_service),
            tag_service: Arc::new(tag_service),
            user_service: Arc::new(user_service),
            orchestrator: Arc::new(orchestrator),
            cache,
            scheduler,
            config: Arc::new(config),
            data_dir: data_dir.to_path_buf(),
            db_pool,
        })
    }

    /// Start the periodic cache sweeper. Only the server needs it.
    pub fn start_background_tasks(&self) -> JoinHandle<()> {
        self.cache.spawn_sweeper(self.config.cache.sweep_interval())
    }

    /// Wait for scheduled replies, stop the sweeper, and close the database.
    pub async fn shutdown(&self) {
        let pending = self.scheduler.in_flight();
        if pending > 0 {
            tracing::info!(pending, "waiting for scheduled replies to finish");
        }
        self.scheduler.drain().await;
        self.cache.shutdown();
        self.db_pool.close().await;
    }
}
