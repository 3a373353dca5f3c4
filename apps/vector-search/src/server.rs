//! Service wiring and HTTP server lifecycle
//!
//! `run` is the whole startup sequence:
//! 1. Error reports and structured logging (JSON for prod, pretty for dev)
//! 2. Configuration from the environment
//! 3. Vector index, embedding providers and item sources
//! 4. Background initialization of every collection
//! 5. HTTP server with graceful shutdown

use std::sync::Arc;

use axum::Router;
use core_config::Environment;
use domain_vector_search::{
    AppState, AzureInferenceProvider, CollectionDefinition, CollectionInitializer, ColorSource,
    EmbeddingProvider, InMemoryIndex, InitializationHandle, InitializationStatusTracker,
    InitializationSupervisor, ObjectStoreImageSource, OllamaProvider, QdrantIndex, SearchService,
    TaskOutcome, VectorIndex, router,
};
use eyre::{Result, WrapErr};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, error, info, warn};

use crate::config::{AppConfig, HttpConfig, IndexBackend};
use crate::shutdown::shutdown_signal;

/// Run the vector search service
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is missing or invalid
/// - The Qdrant client or image storage cannot be created
/// - The server cannot bind its address
/// - The server runtime encounters an error
pub async fn run() -> Result<()> {
    core_config::tracing::install_color_eyre();
    let environment = Environment::from_env();
    core_config::tracing::init_tracing(&environment);

    let config = AppConfig::load(environment).wrap_err("Failed to load configuration")?;
    info!(environment = ?config.environment, "Starting vector search service");

    let state = build_state(&config)?;

    // Initialization runs in the background; the server is up while collections build
    let initialization = state.supervisor.spawn_all();
    tokio::spawn(report_initialization(initialization));

    serve(app_router(state), &config.http).await
}

/// Build the index, providers, sources and per-collection components
pub fn build_state(config: &AppConfig) -> Result<AppState> {
    let index: Arc<dyn VectorIndex> = match &config.index {
        IndexBackend::Qdrant(qdrant) => {
            info!(url = %qdrant.url, "Using Qdrant vector index");
            Arc::new(QdrantIndex::new(qdrant.clone()).wrap_err("Failed to create Qdrant client")?)
        }
        IndexBackend::Memory => {
            warn!("Using in-memory vector index, collections are lost on restart");
            Arc::new(InMemoryIndex::new())
        }
    };
    let tracker = Arc::new(InitializationStatusTracker::new());

    let mut initializers = Vec::new();
    let mut services = Vec::new();

    let text_embedder: Arc<dyn EmbeddingProvider> =
        Arc::new(OllamaProvider::new(config.ollama.clone()));
    let colors = CollectionDefinition::colors().with_call_timeout(config.call_timeout);
    info!(model = %config.ollama.model, "Colors collection uses Ollama embeddings");
    initializers.push(Arc::new(CollectionInitializer::new(
        colors.clone(),
        Arc::new(ColorSource::new()),
        Arc::clone(&text_embedder),
        Arc::clone(&index),
        Arc::clone(&tracker),
    )));
    services.push(Arc::new(SearchService::new(
        colors,
        text_embedder,
        Arc::clone(&index),
    )));

    match &config.images {
        Some(images) => {
            let embedder: Arc<dyn EmbeddingProvider> =
                Arc::new(AzureInferenceProvider::new(images.inference.clone()));
            let source = ObjectStoreImageSource::from_config(images.source.clone())
                .wrap_err("Failed to open image storage")?;
            let definition = CollectionDefinition::images().with_call_timeout(config.call_timeout);
            info!(model = %images.inference.model, "Images collection uses Azure AI Inference embeddings");

            initializers.push(Arc::new(CollectionInitializer::new(
                definition.clone(),
                Arc::new(source),
                Arc::clone(&embedder),
                Arc::clone(&index),
                Arc::clone(&tracker),
            )));
            services.push(Arc::new(SearchService::new(definition, embedder, index)));
        }
        None => {
            warn!("AZURE_AI_INFERENCE_ENDPOINT not set, images collection disabled");
        }
    }

    let supervisor = Arc::new(InitializationSupervisor::new(
        Arc::clone(&tracker),
        initializers,
    ));
    Ok(AppState::new(tracker, supervisor, services))
}

/// Domain routes plus request tracing
pub fn app_router(state: AppState) -> Router {
    router(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

async fn report_initialization(handle: InitializationHandle) {
    let outcomes = handle.join().await;
    let total = outcomes.len();
    let completed = outcomes
        .iter()
        .filter(|(_, outcome)| matches!(outcome, TaskOutcome::Completed(_)))
        .count();

    if completed == total {
        info!(collections = total, "All collections initialized");
    } else {
        error!(
            completed,
            failed = total - completed,
            "Some collections failed to initialize, see /collections/status"
        );
    }
}

async fn serve(router: Router, http: &HttpConfig) -> Result<()> {
    let address = http.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .wrap_err_with(|| format!("Failed to bind {}", address))?;
    info!("Vector search service listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}
