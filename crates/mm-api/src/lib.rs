use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::Method,
    http::Request,
    http::header::{CONTENT_TYPE, HeaderName, HeaderValue},
    middleware,
    middleware::Next,
    response::Response,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use clap::Parser;
use dotenvy::dotenv;
use mm_common::config::EngineConfig;
use mm_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use mm_common::run_id;
use mm_common::service::MatchEngineService;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

pub mod error;
pub mod handlers;

use error::ApiError;
use handlers::{health, matches, predictions, pricing};

const SHUTDOWN_DRAIN_GRACE: std::time::Duration = std::time::Duration::from_millis(200);
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Parser)]
#[command(name = "mm-api", about = "HTTP API for mission matching, pricing and success prediction")]
struct Cli {
    /// Server port
    #[arg(long, env = "PORT", default_value_t = 3001)]
    port: u16,

    /// Comma separated list of allowed CORS origins
    #[arg(long, env = "MM_CORS_ORIGINS", default_value = "http://localhost:3000")]
    cors_origins: String,

    /// Prometheus exporter port (0 disables the exporter)
    #[arg(long, env = "MM_METRICS_PORT")]
    metrics_port: Option<u16>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub metrics_port: u16,
}

impl AppConfig {
    fn from_cli(cli: Cli) -> Result<Self, ApiError> {
        let cors_origins = parse_origins(&cli.cors_origins);

        if cors_origins.iter().any(|origin| origin == "*") {
            return Err(ApiError::BadRequest(
                "MM_CORS_ORIGINS must list explicit origins".into(),
            ));
        }

        Ok(Self {
            port: cli.port,
            cors_origins,
            metrics_port: mm_metrics::resolve_port(cli.metrics_port),
        })
    }

    pub fn for_tests() -> Self {
        Self {
            port: 3001,
            cors_origins: vec!["http://localhost:3000".into()],
            metrics_port: 0,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

pub struct AppState {
    pub service: MatchEngineService,
    pub config: AppConfig,
    pub readiness: Arc<AtomicBool>,
    pub started_at: DateTime<Utc>,
}

pub type SharedState = Arc<AppState>;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

async fn attach_request_id_context(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    Ok(error::with_request_id(request_id, next.run(req)).await)
}

pub fn create_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let request_id_header = HeaderName::from_static("x-request-id");
    let trace_header = request_id_header.clone();

    let trace = TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(&trace_header)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
            status = tracing::field::Empty,
        )
    });

    let api_routes = Router::new()
        .route("/match", post(matches::run_match))
        .route("/price", post(pricing::run_pricing))
        .route("/predict-success", post(predictions::predict_success));

    Router::new()
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .nest("/api", api_routes)
        .layer(middleware::from_fn(attach_request_id_context))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid::default(),
        ))
        .layer(cors)
        .with_state(state)
}

pub fn state_for(service: MatchEngineService) -> SharedState {
    Arc::new(AppState {
        service,
        config: AppConfig::for_tests(),
        readiness: Arc::new(AtomicBool::new(true)),
        started_at: Utc::now(),
    })
}

pub fn test_state() -> SharedState {
    state_for(MatchEngineService::new(EngineConfig::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn sets_request_id_when_missing() {
        let app = create_router(test_state());

        let response = app
            .oneshot(Request::builder().uri("/livez").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn propagates_caller_request_id() {
        let app = create_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/livez")
                    .header("x-request-id", "caller-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()["x-request-id"], "caller-42");
    }

    #[test]
    fn wildcard_cors_origin_is_rejected() {
        let cli = Cli {
            port: 3001,
            cors_origins: "http://localhost:3000, *".into(),
            metrics_port: Some(0),
        };
        assert!(matches!(AppConfig::from_cli(cli), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            parse_origins(" http://a.test ,, http://b.test "),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }
}

pub async fn run() -> Result<(), ApiError> {
    dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));
    install_tracing_panic_hook(env!("CARGO_PKG_NAME"));

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli)?;
    mm_metrics::init_metrics(config.metrics_port);

    let engine_config = EngineConfig::from_env();
    let service = MatchEngineService::new(engine_config);
    let sweeper = service.spawn_sweeper();

    let state = Arc::new(AppState {
        service,
        config: config.clone(),
        readiness: Arc::new(AtomicBool::new(true)),
        started_at: Utc::now(),
    });

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let app = create_router(state.clone());

    info!(
        %addr,
        run_id = run_id::get(),
        external = state.service.has_external(),
        "mm-api listening"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    sweeper.shutdown().await;
    info!(run_id = run_id::get(), "mm-api stopped");

    Ok(())
}

async fn shutdown_signal(state: SharedState) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            let _ = sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    state
        .readiness
        .store(false, std::sync::atomic::Ordering::SeqCst);

    // Load balancers get a brief window to observe /readyz as not ready.
    tokio::time::sleep(SHUTDOWN_DRAIN_GRACE).await;
}
