mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::ai::handlers::AiState;
use crate::features::ai::{
    routes as ai_routes, ClassificationService, GeminiClient, GenerativeModel,
    TranscriptionService, VerificationService,
};
use crate::features::auth::{routes as auth_routes, SessionService};
use crate::features::geocoding::{routes as geocoding_routes, GeocodingService};
use crate::features::reports::handlers::ReportState;
use crate::features::reports::{routes as reports_routes, ReportImageService, ReportService};
use crate::features::workers::{routes as workers_routes, WorkerService};
use crate::modules::storage::{MinIOClient, ObjectStore};
use axum::extract::DefaultBodyLimit;
use axum::{middleware::from_fn, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "System info: tokio_worker_threads={}, pid={}",
        worker_threads,
        std::process::id()
    );
    tracing::info!("Configuration loaded successfully");

    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    database::run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    // Generative model is optional; gateways report misconfiguration without it
    let model: Option<Arc<dyn GenerativeModel>> = match config.generative_ai.api_key.clone() {
        Some(api_key) => {
            let client = GeminiClient::new(api_key, &config.generative_ai)
                .map_err(|e| anyhow::anyhow!("Failed to create Gemini client: {}", e))?;
            tracing::info!(
                "Generative model client initialized (model: {})",
                config.generative_ai.model
            );
            Some(Arc::new(client))
        }
        None => {
            tracing::warn!("GEMINI_API_KEY not set; AI gateways will report misconfiguration");
            None
        }
    };

    let ai = &config.generative_ai;
    let classification_service = Arc::new(ClassificationService::new(
        model.clone(),
        ai.classification_temperature,
        ai.classification_max_tokens,
    ));
    let verification_service = Arc::new(VerificationService::new(
        model.clone(),
        ai.verification_temperature,
        ai.verification_max_tokens,
    ));
    let transcription_service = Arc::new(TranscriptionService::new(
        model,
        ai.transcription_max_tokens,
    ));
    tracing::info!("AI gateway services initialized");

    let geocoding_service = Arc::new(
        GeocodingService::new(&config.geocoding)
            .map_err(|e| anyhow::anyhow!("Failed to create geocoding client: {}", e))?,
    );
    tracing::info!("Geocoding service initialized ({})", config.geocoding.base_url);

    let worker_service = Arc::new(WorkerService::new(pool.clone()));
    let session_service = Arc::new(SessionService::new(
        pool.clone(),
        &config.session,
        config.authority.clone(),
        Arc::clone(&worker_service),
    ));
    tracing::info!("Worker and session services initialized");

    let minio_client = MinIOClient::new(config.minio.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize MinIO client: {}", e))?;
    tracing::info!("MinIO client initialized for bucket: {}", config.minio.bucket);
    let storage: Arc<dyn ObjectStore> = Arc::new(minio_client);

    let image_service = Arc::new(ReportImageService::new(
        pool.clone(),
        Arc::clone(&classification_service),
        storage,
    ));
    let report_service = Arc::new(ReportService::new(
        pool.clone(),
        Arc::clone(&geocoding_service),
        Arc::clone(&worker_service),
        Arc::clone(&image_service),
        Arc::clone(&verification_service),
    ));
    tracing::info!("Report services initialized");

    let report_state = ReportState {
        report_service,
        image_service,
    };
    let ai_state = AiState {
        classification_service,
        verification_service,
        transcription_service,
    };

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Protected routes (require a staff session)
    let protected_routes = Router::new()
        .merge(auth_routes::protected_routes(Arc::clone(&session_service)))
        .merge(workers_routes::protected_routes(Arc::clone(&worker_service)))
        .merge(reports_routes::protected_routes(report_state.clone()))
        .route_layer(axum::middleware::from_fn_with_state(
            Arc::clone(&session_service),
            middleware::auth_middleware,
        ));

    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    // Public routes (no auth required)
    let public_routes = Router::new()
        .merge(auth_routes::public_routes(session_service))
        .merge(workers_routes::public_routes(worker_service))
        .merge(ai_routes::routes(ai_state))
        .merge(reports_routes::public_routes(report_state.clone()))
        .merge(geocoding_routes::routes(geocoding_service));

    let app = Router::new()
        .merge(swagger)
        .merge(protected_routes)
        .merge(public_routes)
        .merge(health_route)
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Bridge routes carry their own permissive CORS layer
        .merge(reports_routes::bridge_routes(report_state))
        .layer(DefaultBodyLimit::max(config.app.max_request_body_size))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
