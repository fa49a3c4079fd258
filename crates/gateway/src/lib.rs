//! HTTP API for Jarvis.
//!
//! - `POST /api/chat`: run one conversational turn
//! - `POST /api/speak`: speak text through the configured voice
//! - `GET /health`: liveness probe
//!
//! Every request shares one [`TurnOrchestrator`]; its memory log serializes
//! concurrent turns.

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::{HeaderValue, StatusCode},
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};

use jarvis_agent::TurnOrchestrator;
use jarvis_core::error::SpeechError;
use jarvis_tools::{PlaybackOutcome, Voice};

const BODY_LIMIT: usize = 1024 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub orchestrator: Arc<TurnOrchestrator>,
    /// `None` when voice output is disabled
    pub voice: Option<Arc<Voice>>,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
///
/// Layers: 1 MB body limit, CORS for `cors_origins`, HTTP trace logging.
pub fn build_router(state: SharedState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/speak", post(speak_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors_layer(cors_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}

/// Start the gateway HTTP server.
pub async fn start(config: jarvis_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let orchestrator = Arc::new(jarvis_agent::build_orchestrator(&config).await?);
    let voice = Voice::from_config(&config.voice).map(Arc::new);
    let state = Arc::new(GatewayState {
        orchestrator,
        voice,
    });

    let app = build_router(state, &config.gateway.cors_origins);

    info!(addr = %addr, "Gateway listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Serialize, Deserialize)]
struct ChatResponse {
    response: String,
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "No message provided"));
    }

    info!(message_len = message.len(), "Chat request received");
    let response = state.orchestrator.process(message).await;
    Ok(Json(ChatResponse { response }))
}

#[derive(Deserialize)]
struct SpeakRequest {
    text: String,
}

#[derive(Serialize, Deserialize)]
struct SpeakResponse {
    played: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_to: Option<String>,
}

async fn speak_handler(
    State(state): State<SharedState>,
    Json(payload): Json<SpeakRequest>,
) -> Result<Json<SpeakResponse>, ApiError> {
    let text = payload.text.trim();
    if text.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "No text provided"));
    }

    let Some(voice) = &state.voice else {
        return Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            SpeechError::Disabled.to_string(),
        ));
    };

    match voice.speak(text).await {
        Ok(PlaybackOutcome::Played { player }) => {
            info!(player = %player, "Speech played");
            Ok(Json(SpeakResponse {
                played: true,
                saved_to: None,
            }))
        }
        Ok(PlaybackOutcome::Saved(path)) => Ok(Json(SpeakResponse {
            played: false,
            saved_to: Some(path.display().to_string()),
        })),
        Err(e) => {
            error!(error = %e, "Speech synthesis failed");
            Err(api_error(StatusCode::BAD_GATEWAY, format!("Speech failed: {e}")))
        }
    }
}
