//! Talebook - 小说发布后端
//!
//! - Domain: story/, taxonomy/, account/
//! - Application: commands, queries, ports, ordering
//! - Infrastructure: http, memory, persistence, events

use std::sync::Arc;

use talebook::application::{ChapterOrderingEngine, RegisterUserHandler};
use talebook::config::{load_config, print_config, AppConfig};
use talebook::infrastructure::events::EventPublisher;
use talebook::infrastructure::http::{AppState, HttpServer, Repositories, ServerConfig};
use talebook::infrastructure::memory::InMemoryStoryLocks;
use talebook::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteCategoryRepository,
    SqliteChapterRepository, SqliteCommentRepository, SqliteOrderingStore,
    SqliteStoryRepository, SqliteTagRepository, SqliteUserRepository,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Talebook - 小说发布后端");
    print_config(&config);

    // 确保数据目录存在
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config = DatabaseConfig {
        database_url: config.database.database_url(),
        max_connections: config.database.max_connections,
    };
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;

    // 创建 Repository 适配器
    let repos = Repositories {
        users: Arc::new(SqliteUserRepository::new(pool.clone())),
        stories: Arc::new(SqliteStoryRepository::new(pool.clone())),
        chapters: Arc::new(SqliteChapterRepository::new(pool.clone())),
        categories: Arc::new(SqliteCategoryRepository::new(pool.clone())),
        tags: Arc::new(SqliteTagRepository::new(pool.clone())),
        comments: Arc::new(SqliteCommentRepository::new(pool.clone())),
    };

    // 启动时确保管理员账号
    if let Some(username) = &config.accounts.bootstrap_admin {
        let admin_id = RegisterUserHandler::new(repos.users.clone())
            .ensure_administrator(username)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bootstrap administrator: {}", e))?;
        tracing::info!(user_id = %admin_id, username = %username, "Administrator ready");
    }

    // 章节顺序引擎
    let locks = InMemoryStoryLocks::new().arc();
    let engine = Arc::new(ChapterOrderingEngine::with_policy(
        Arc::new(SqliteOrderingStore::new(pool)),
        locks.clone(),
        config.ordering.retry_policy(),
    ));

    let event_publisher = EventPublisher::new().arc();

    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let state = AppState::new(repos, engine, locks, event_publisher);
    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},talebook={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
