use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use major_bracket::adapters::generator::{
    MockContentGenerator, OpenAIGenerator, OpenAIGeneratorConfig,
};
use major_bracket::adapters::http::{app_router, BracketHandlers};
use major_bracket::adapters::{run_migrations, InMemoryStore, PostgresTransactionManager};
use major_bracket::adapters::StaticCategoryExpansions;
use major_bracket::application::{
    AdvanceSessionHandler, CreateSessionHandler, GenerateReportHandler, GetSessionHandler,
    ListSessionsHandler, ResilientGenerator, RetryPolicy, SessionLocks,
};
use major_bracket::config::{AppConfig, GeneratorProvider, ValidationError};
use major_bracket::ports::{CategoryExpansions, ContentGenerator, NoExpansions, TransactionManager};

mod telemetry;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    telemetry::init_tracing(&config.server);
    config.validate()?;

    let transactions = build_store(&config).await?;
    let generator = build_generator(&config)?;
    let expansions: Arc<dyn CategoryExpansions> = match &config.bracket.expansions_path {
        Some(path) => Arc::new(StaticCategoryExpansions::from_file(path)?),
        None => Arc::new(NoExpansions),
    };
    let default_categories = config.bracket.categories()?;
    let locks = SessionLocks::new();

    let handlers = BracketHandlers::new(
        Arc::new(CreateSessionHandler::new(transactions.clone())),
        Arc::new(AdvanceSessionHandler::new(
            transactions.clone(),
            generator.clone(),
            expansions,
            locks.clone(),
            default_categories,
        )),
        Arc::new(GetSessionHandler::new(transactions.clone())),
        Arc::new(ListSessionsHandler::new(transactions.clone())),
        Arc::new(GenerateReportHandler::new(transactions, generator, locks)),
    );

    let app = app_router(handlers, &config.server);
    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn build_store(config: &AppConfig) -> Result<Arc<dyn TransactionManager>, BoxError> {
    let Some(url) = config.database.url() else {
        tracing::warn!(
            "No database URL configured; sessions are kept in memory for this process only \
             and every write copies the whole store"
        );
        return Ok(Arc::new(InMemoryStore::new()));
    };

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .connect(url)
        .await?;

    if config.database.run_migrations {
        run_migrations(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    Ok(Arc::new(PostgresTransactionManager::new(pool)))
}

fn build_generator(config: &AppConfig) -> Result<Arc<dyn ContentGenerator>, BoxError> {
    let settings = &config.generator;
    let inner: Arc<dyn ContentGenerator> = match settings.provider {
        GeneratorProvider::Mock => {
            tracing::warn!("Using the mock content generator");
            Arc::new(MockContentGenerator::new())
        }
        GeneratorProvider::OpenAI => {
            let api_key = settings
                .api_key
                .clone()
                .ok_or(ValidationError::MissingRequired("GENERATOR__API_KEY"))?;
            let generator_config = OpenAIGeneratorConfig::from_secret(api_key)
                .with_model(settings.model.clone())
                .with_base_url(settings.base_url.clone())
                .with_timeout(settings.timeout());
            Arc::new(OpenAIGenerator::new(generator_config)?)
        }
    };

    let policy = RetryPolicy {
        call_timeout: settings.timeout(),
        max_retries: settings.max_retries,
        initial_backoff: settings.initial_backoff(),
    };
    Ok(Arc::new(ResilientGenerator::new(inner, policy)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
