use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use report_extract::OcrEngine;
use serde_json::{Value, json};
use std::{sync::Arc, time::Duration};
use tokio::sync::OwnedMutexGuard;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::{
    analysis::{AnalysisInvoker, AnalysisModel},
    chat::{self, ChatError},
    config::ServiceConfig,
    gemini::GeminiModel,
    models::{ChatRequest, ChatResponse, SessionResponse, UploadResponse, UploadedFile},
    session::{InMemorySessionStorage, Session, SessionLocks, SessionStorage},
    upload,
    workflow::UploadWorkflow,
};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "session_id": id
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

fn insufficient_context_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "error": message,
            "session_id": id
        })),
    )
}

fn bad_gateway_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({
            "error": message,
            "session_id": id
        })),
    )
}

#[derive(Clone)]
pub struct AppState {
    pub session_storage: Arc<dyn SessionStorage>,
    pub session_locks: SessionLocks,
    pub workflow: UploadWorkflow,
    pub invoker: AnalysisInvoker,
}

impl AppState {
    pub fn new(model: Arc<dyn AnalysisModel>, ocr: Arc<dyn OcrEngine>, timeout: Duration) -> Self {
        let invoker = AnalysisInvoker::new(model, timeout);
        Self {
            session_storage: Arc::new(InMemorySessionStorage::new()),
            session_locks: SessionLocks::new(),
            workflow: UploadWorkflow::new(ocr, invoker.clone()),
            invoker,
        }
    }
}

pub fn create_app(config: &ServiceConfig) -> Router {
    let model = Arc::new(GeminiModel::new(&config.gemini_api_key, &config.model));
    let app_state = AppState::new(
        model,
        report_extract::default_engine(),
        config.request_timeout,
    );
    build_router(app_state, config.max_upload_bytes)
}

pub fn build_router(app_state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/sessions", post(create_session))
        .route(
            "/sessions/{session_id}",
            get(get_session_status).delete(end_session),
        )
        .route("/sessions/{session_id}/files", post(upload_files))
        .route("/sessions/{session_id}/chat", post(ask_question))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Medical Report & X-ray Analyzer",
        "version": "1.0.0",
        "description": "Upload medical reports (PDF/TXT/Image) or X-rays (JPG/PNG/DICOM) for AI-based analysis",
        "accepted_extensions": upload::ACCEPTED_EXTENSIONS,
        "endpoints": {
            "POST /sessions": "Start a new analysis session",
            "GET /sessions/{session_id}": "Get session status and accumulated context",
            "DELETE /sessions/{session_id}": "End a session and discard its context",
            "POST /sessions/{session_id}/files": "Upload files (multipart) for extraction and analysis",
            "POST /sessions/{session_id}/chat": "Ask a question about the uploaded files",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn create_session(State(state): State<AppState>) -> ApiResult<Value> {
    let session = Session::new();
    let session_id = session.id.clone();

    save_session(&state, session).await?;
    state.session_locks.register(&session_id);
    info!("Session {} created", session_id);

    Ok(Json(json!({
        "session_id": session_id,
        "status": "created"
    })))
}

async fn get_session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionResponse> {
    let session = load_session(&state, &session_id).await?;

    Ok(Json(SessionResponse {
        session_id: session.id,
        created_at: session.created_at.to_rfc3339(),
        files_processed: session.files_processed,
        context_sources: session.context.sources().to_vec(),
        context: session.context.text().to_string(),
    }))
}

async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Value> {
    let _guard = lock_session(&state, &session_id).await?;

    match state.session_storage.delete(&session_id).await {
        Ok(true) => {
            state.session_locks.remove(&session_id);
            info!("Session {} ended", session_id);
            Ok(Json(json!({
                "session_id": session_id,
                "status": "ended"
            })))
        }
        Ok(false) => Err(not_found_error("Session not found", &session_id)),
        Err(e) => {
            error!("Failed to delete session {}: {}", session_id, e);
            Err(internal_error("Failed to end session", &e.to_string()))
        }
    }
}

async fn upload_files(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<UploadResponse> {
    let _guard = lock_session(&state, &session_id).await?;
    let mut session = load_session(&state, &session_id).await?;
    let files = read_files(&mut multipart).await?;

    if files.is_empty() {
        return Err(bad_request_error("At least one file is required"));
    }

    info!("Processing {} files for session {}", files.len(), session_id);
    let reports = state.workflow.process_all(files, &mut session.context).await;
    session.files_processed += reports.len();

    save_session(&state, session).await?;

    Ok(Json(UploadResponse {
        session_id,
        files: reports,
    }))
}

async fn read_files(multipart: &mut Multipart) -> Result<Vec<UploadedFile>, ApiError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Rejected multipart upload: {}", e);
        (
            e.status(),
            Json(json!({
                "error": "Invalid multipart upload",
                "details": e.body_text()
            })),
        )
    })? {
        // Parts without a file name are form fields, not uploads
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let part_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request_error(&format!("Failed to read {}: {}", name, e)))?;

        files.push(upload::uploaded_file(name, part_type.as_deref(), bytes));
    }

    Ok(files)
}

async fn ask_question(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
    validate_question(&request.question)?;

    let session = load_session(&state, &session_id).await?;

    match chat::answer_question(&state.invoker, &session.context, &request.question).await {
        Ok(answer) => Ok(Json(ChatResponse { session_id, answer })),
        Err(e @ ChatError::InsufficientContext) => {
            Err(insufficient_context_error(&e.to_string(), &session_id))
        }
        Err(e @ ChatError::Analysis(_)) => {
            error!("Chat answer failed for session {}: {}", session_id, e);
            Err(bad_gateway_error(&e.to_string(), &session_id))
        }
    }
}

fn validate_question(question: &str) -> Result<(), ApiError> {
    if question.trim().is_empty() {
        return Err(bad_request_error("Question cannot be empty"));
    }
    Ok(())
}

/// Serialise writers of one session until the returned guard is dropped.
async fn lock_session(
    state: &AppState,
    session_id: &str,
) -> Result<OwnedMutexGuard<()>, ApiError> {
    state
        .session_locks
        .acquire(session_id)
        .await
        .ok_or_else(|| not_found_error("Session not found", session_id))
}

async fn load_session(state: &AppState, session_id: &str) -> Result<Session, ApiError> {
    match state.session_storage.get(session_id).await {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err(not_found_error("Session not found", session_id)),
        Err(e) => {
            error!("Failed to load session {}: {}", session_id, e);
            Err(internal_error("Failed to load session", &e.to_string()))
        }
    }
}

async fn save_session(state: &AppState, session: Session) -> Result<(), ApiError> {
    state.session_storage.save(session).await.map_err(|e| {
        error!("Failed to save session: {}", e);
        internal_error("Failed to save session", &e.to_string())
    })
}
