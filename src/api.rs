use axum::{
    Router,
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::{
    assistant::AssistantService,
    auth::AuthService,
    errors::{ApiError, ErrorBody, ErrorContext},
    explainer::ExplainerService,
    extraction,
    mentor::MentorService,
    models::*,
    quiz,
    summarizer::SummaryMode,
};

// Import logging macros
use crate::{log_api_start, log_api_success};

#[derive(Clone)]
pub struct AppState {
    pub assistant: AssistantService,
    pub mentor: MentorService,
    pub explainer: ExplainerService,
    pub auth: AuthService,
}

#[derive(Deserialize)]
pub struct ChatParams {
    pub message: String,
}

#[derive(Deserialize)]
pub struct ContextualParams {
    pub message: String,
    pub context: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorBody>)>;

// Root / liveness

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "EduLearn backend running",
        "model_provider": state.assistant.provider_name(),
    }))
}

pub async fn mentor_root() -> Json<MessageResponse> {
    Json(MessageResponse {
        msg: "Virtual mentor is active and ready to help students!".to_string(),
    })
}

// Assistant endpoints

pub async fn summarize_quick(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<SummaryResponse> {
    summarize_upload(state, multipart, SummaryMode::Quick, "summarize_quick").await
}

pub async fn summarize_detailed(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<SummaryResponse> {
    summarize_upload(state, multipart, SummaryMode::Detailed, "summarize_detailed").await
}

async fn summarize_upload(
    state: AppState,
    multipart: Multipart,
    mode: SummaryMode,
    operation: &'static str,
) -> ApiResult<SummaryResponse> {
    let text = extract_upload_text(multipart, operation).await?;
    let summary = state.assistant.summarize(&text, mode).await;
    log_api_success!(operation, "summary produced");
    Ok(Json(SummaryResponse { summary }))
}

pub async fn create_flowchart(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<FlowchartResponse> {
    let text = extract_upload_text(multipart, "create_flowchart").await?;
    let flowchart = state.assistant.flowchart(&text).await;
    Ok(Json(FlowchartResponse { flowchart }))
}

pub async fn create_quiz(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<QuizResponse> {
    let text = extract_upload_text(multipart, "create_quiz").await?;
    let items = state.assistant.generate_quiz(&text).await;
    log_api_success!("create_quiz", count = items.len(), "quiz generated");
    Ok(Json(QuizResponse { quiz: items }))
}

pub async fn submit_quiz(
    State(_state): State<AppState>,
    Json(payload): Json<Value>,
) -> ApiResult<GradedSubmission> {
    log_api_start!("grade_quiz");

    match quiz::grade(&payload) {
        Ok(graded) => {
            info!(
                score = graded.score,
                total = graded.total,
                "Quiz submission graded"
            );
            Ok(Json(graded))
        }
        Err(e) => {
            let error: ApiError = e.into();
            let context = ErrorContext::new("grade_quiz", "submission");
            Err(error.to_response_with_context(context))
        }
    }
}

// Explainer endpoint

pub async fn explain_code(
    State(state): State<AppState>,
    Json(input): Json<CodeInput>,
) -> Json<ExplanationResponse> {
    debug!(code_length = input.code.len(), "Explaining code snippet");
    Json(state.explainer.explain(&input.code).await)
}

// Mentor endpoints

pub async fn mentor_chat(
    State(state): State<AppState>,
    Query(params): Query<ChatParams>,
) -> ApiResult<ReplyResponse> {
    match state.mentor.chat(&params.message).await {
        Ok(reply) => Ok(Json(ReplyResponse { reply })),
        Err(e) => {
            let error = ApiError::ModelError(e.to_string());
            let context = ErrorContext::new("mentor_chat", "reply");
            Err(error.to_response_with_context(context))
        }
    }
}

pub async fn mentor_contextual(
    State(state): State<AppState>,
    Query(params): Query<ContextualParams>,
) -> ApiResult<ReplyResponse> {
    match state.mentor.contextual(&params.message, &params.context).await {
        Ok(reply) => Ok(Json(ReplyResponse { reply })),
        Err(e) => {
            let error = ApiError::ModelError(e.to_string());
            let context = ErrorContext::new("mentor_contextual", "reply");
            Err(error.to_response_with_context(context))
        }
    }
}

// Auth endpoints

pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> ApiResult<MessageResponse> {
    log_api_start!("signup", email = request.email);

    match state.auth.signup(request).await {
        Ok(_user) => {
            log_api_success!("signup", "user created");
            Ok(Json(MessageResponse {
                msg: "User created successfully".to_string(),
            }))
        }
        Err(e) => {
            let error: ApiError = e.into();
            let context = ErrorContext::new("signup", "user");
            Err(error.to_response_with_context(context))
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<TokenResponse> {
    log_api_start!("login", email = request.email);

    match state.auth.login(request).await {
        Ok(token) => Ok(Json(token)),
        Err(e) => {
            let error: ApiError = e.into();
            let context = ErrorContext::new("login", "user");
            Err(error.to_response_with_context(context))
        }
    }
}

// Upload plumbing

/// Pull the `file` part out of a multipart upload and extract its text.
/// Every failure here is a client error; no model call happens before this
/// step succeeds.
async fn extract_upload_text(
    mut multipart: Multipart,
    operation: &'static str,
) -> Result<String, (StatusCode, Json<ErrorBody>)> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Invalid multipart data: {e}"))
            .to_response_with_context(ErrorContext::new(operation, "upload"))
    })? {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(|e| {
                ApiError::BadRequest(format!("Failed to read upload: {e}"))
                    .to_response_with_context(ErrorContext::new(operation, "upload"))
            })?;
            upload = Some((filename, bytes.to_vec()));
            break;
        }
    }

    let Some((filename, bytes)) = upload else {
        let error = ApiError::BadRequest("Missing 'file' upload field".to_string());
        return Err(error.to_response_with_context(ErrorContext::new(operation, "upload")));
    };

    log_api_start!(operation, file_name = filename);

    extraction::extract_text(&filename, &bytes).map_err(|e| {
        let error: ApiError = e.into();
        let context = ErrorContext::new(operation, "upload").with_id(&filename);
        error.to_response_with_context(context)
    })
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        // Assistant routes
        .route("/assistant/summarize/quick", post(summarize_quick))
        .route("/assistant/summarize/detailed", post(summarize_detailed))
        .route("/assistant/flowchart", post(create_flowchart))
        .route("/assistant/quiz", post(create_quiz))
        .route("/assistant/quiz/submit", post(submit_quiz))
        // Explainer routes
        .route("/explainer/explain", post(explain_code))
        // Mentor routes
        .route("/mentor/", get(mentor_root))
        .route("/mentor/chat", post(mentor_chat))
        .route("/mentor/contextual", post(mentor_contextual))
        // Auth routes
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .with_state(state)
}
