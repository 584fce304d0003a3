//! HTTP API server for integration with other systems.
//!
//! Holds many conversation sessions keyed by id. Each session owns its own
//! index and history; the map itself is the only shared state.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::VidraError;
use crate::pipeline::Pipeline;
use crate::rag::Turn;
use crate::session::{AskOutcome, ConversationSession};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use uuid::Uuid;

type SessionFactory = dyn Fn() -> ConversationSession + Send + Sync;

/// Shared application state.
struct AppState {
    settings: Settings,
    new_session: Box<SessionFactory>,
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

struct SessionEntry {
    session: Arc<ConversationSession>,
    created_at: DateTime<Utc>,
}

impl AppState {
    async fn session(&self, id: Uuid) -> Result<Arc<ConversationSession>, ApiError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .map(|entry| entry.session.clone())
            .ok_or(ApiError::SessionNotFound(id))
    }

    /// Transcript text from the request body, or from a stored transcript.
    fn transcript_text(&self, source: &TranscriptSource) -> Result<String, ApiError> {
        match (&source.transcript, &source.video_id) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(video_id)) => {
                let path = self.settings.transcript_path(video_id)?;
                std::fs::read_to_string(&path).map_err(|_| {
                    ApiError::Vidra(VidraError::InvalidInput(format!(
                        "No stored transcript for '{}'",
                        video_id
                    )))
                })
            }
            (None, None) => Err(ApiError::Vidra(VidraError::InvalidInput(
                "Provide either 'transcript' or 'video_id'".to_string(),
            ))),
        }
    }
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(settings.clone())?;

    let state = Arc::new(AppState {
        settings,
        new_session: Box::new(move || pipeline.new_session()),
        sessions: RwLock::new(HashMap::new()),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state).layer(cors);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Vidra API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Create session", "POST   /sessions");
    Output::kv("Ask", "POST   /sessions/{id}/ask");
    Output::kv("New video", "POST   /sessions/{id}/video");
    Output::kv("History", "GET    /sessions/{id}/history");
    Output::kv("Summary", "GET    /sessions/{id}/summary");
    Output::kv("Close session", "DELETE /sessions/{id}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", axum::routing::delete(delete_session))
        .route("/sessions/{id}/ask", post(ask))
        .route("/sessions/{id}/video", post(new_video))
        .route("/sessions/{id}/history", get(history))
        .route("/sessions/{id}/summary", get(summary))
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct TranscriptSource {
    /// Timestamped transcript text.
    #[serde(default)]
    transcript: Option<String>,
    /// ID of a transcript stored by `vidra process`.
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Deserialize)]
struct CreateSessionRequest {
    #[serde(flatten)]
    source: TranscriptSource,
    /// Also produce a summary of the video.
    #[serde(default)]
    summarize: bool,
}

#[derive(Serialize)]
struct CreateSessionResponse {
    session_id: Uuid,
    chunks: usize,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct NewVideoResponse {
    chunks: usize,
}

#[derive(Serialize)]
struct HistoryResponse {
    history: Vec<Turn>,
}

#[derive(Serialize)]
struct SummaryResponse {
    summary: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

enum ApiError {
    SessionNotFound(Uuid),
    Vidra(VidraError),
}

impl From<VidraError> for ApiError {
    fn from(e: VidraError) -> Self {
        ApiError::Vidra(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, kind) = match self {
            ApiError::SessionNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Session not found: {}", id),
                "session_not_found",
            ),
            ApiError::Vidra(e) => {
                let status = match &e {
                    VidraError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                    VidraError::NotReady(_) => StatusCode::CONFLICT,
                    VidraError::IndexBuild(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string(), e.kind())
            }
        };
        (status, Json(ErrorResponse { error, kind })).into_response()
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    let text = state.transcript_text(&req.source)?;

    let session = (state.new_session)();
    let chunks = session.build_index(&text).await?;
    let summary = if req.summarize {
        Some(session.summarize().await?)
    } else {
        None
    };

    let id = Uuid::new_v4();
    let created_at = Utc::now();
    state.sessions.write().await.insert(
        id,
        SessionEntry {
            session: Arc::new(session),
            created_at,
        },
    );
    info!(session = %id, chunks, "Created session");

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: id,
            chunks,
            created_at,
            summary,
        }),
    ))
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskOutcome>, ApiError> {
    let session = state.session(id).await?;
    Ok(Json(session.ask(&req.question).await?))
}

async fn new_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(source): Json<TranscriptSource>,
) -> Result<Json<NewVideoResponse>, ApiError> {
    let session = state.session(id).await?;
    let text = state.transcript_text(&source)?;
    let chunks = session.new_video(&text).await?;
    Ok(Json(NewVideoResponse { chunks }))
}

async fn history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let session = state.session(id).await?;
    Ok(Json(HistoryResponse {
        history: session.history().await,
    }))
}

async fn summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let session = state.session(id).await?;
    Ok(Json(SummaryResponse {
        summary: session.summarize().await?,
    }))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match state.sessions.write().await.remove(&id) {
        Some(entry) => {
            info!(session = %id, since = %entry.created_at, "Closed session");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::SessionNotFound(id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::testing::{HashEmbedder, ScriptedModel};

    const TRANSCRIPT: &str = "[00:00:00.000] --> [00:00:04.000] the tide rises twice a day";

    fn state() -> Arc<AppState> {
        Arc::new(AppState {
            settings: Settings::default(),
            new_session: Box::new(|| {
                ConversationSession::with_model(
                    Arc::new(HashEmbedder::new(32)),
                    Arc::new(ScriptedModel::new(|_| Ok("Twice a day [00:00:00.000].".to_string()))),
                    Prompts::default(),
                    &Settings::default(),
                )
            }),
            sessions: RwLock::new(HashMap::new()),
        })
    }

    async fn create(state: &Arc<AppState>) -> Uuid {
        let req = CreateSessionRequest {
            source: TranscriptSource {
                transcript: Some(TRANSCRIPT.to_string()),
                video_id: None,
            },
            summarize: false,
        };
        let Ok((status, Json(resp))) = create_session(State(state.clone()), Json(req)).await else {
            panic!("session creation failed");
        };
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(resp.chunks, 1);
        resp.session_id
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let state = state();
        let id = create(&state).await;

        let Ok(Json(outcome)) = ask(
            State(state.clone()),
            Path(id),
            Json(AskRequest { question: "how often does the tide rise?".to_string() }),
        )
        .await
        else {
            panic!("ask failed");
        };
        assert_eq!(outcome.answer, "Twice a day [00:00:00.000].");

        let Ok(Json(resp)) = history(State(state.clone()), Path(id)).await else {
            panic!("history failed");
        };
        assert_eq!(resp.history.len(), 1);

        let Ok(status) = delete_session(State(state.clone()), Path(id)).await else {
            panic!("delete failed");
        };
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.sessions.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let state = state();
        let first = create(&state).await;
        let second = create(&state).await;
        assert_ne!(first, second);

        let question = Json(AskRequest { question: "tide?".to_string() });
        assert!(ask(State(state.clone()), Path(first), question).await.is_ok());

        let Ok(Json(resp)) = history(State(state.clone()), Path(second)).await else {
            panic!("history failed");
        };
        assert!(resp.history.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let state = state();
        let Err(err) = summary(State(state), Path(Uuid::new_v4())).await else {
            panic!("expected an error");
        };
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_video_id_cannot_leave_transcripts_dir() {
        let data = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.data_dir = data.path().join("data").to_string_lossy().to_string();
        std::fs::write(
            data.path().join("secret.txt"),
            "[00:00:00.000] --> [00:00:01.000] private notes",
        )
        .unwrap();

        let state = Arc::new(AppState {
            settings,
            new_session: Box::new(|| -> ConversationSession {
                unreachable!("the request must be rejected before a session is built")
            }),
            sessions: RwLock::new(HashMap::new()),
        });
        let req = CreateSessionRequest {
            source: TranscriptSource {
                transcript: None,
                video_id: Some("../../secret".to_string()),
            },
            summarize: false,
        };

        let Err(err) = create_session(State(state.clone()), Json(req)).await else {
            panic!("expected an error");
        };
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        assert!(state.sessions.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_transcript_is_bad_request() {
        let state = state();
        let req = CreateSessionRequest {
            source: TranscriptSource { transcript: None, video_id: None },
            summarize: false,
        };
        let Err(err) = create_session(State(state), Json(req)).await else {
            panic!("expected an error");
        };
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
