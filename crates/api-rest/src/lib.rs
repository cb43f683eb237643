//! # API REST
//!
//! REST API for the daily report page.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! Uses `api-shared` for request/response bodies and `report-core` for the form
//! workflow itself.

#![warn(rust_2018_idioms)]

pub mod view;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Json, Redirect},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use api_shared::{dto, HealthService};
use report_core::{
    ControllerError, CoreConfig, FieldInput, FieldPath, ReportError, SessionRegistry,
    SubmissionWorkflow, Theme, ThemeContext,
};

/// Application state for the REST API server
///
/// Shared by every handler: the resolved configuration, the open page sessions and
/// the theme preference.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub sessions: Arc<SessionRegistry>,
    pub theme: Arc<ThemeContext>,
}

type ApiError = (StatusCode, &'static str);

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        form_descriptor,
        open_session,
        get_session,
        close_session,
        set_field,
        submit,
        get_theme,
        set_theme,
    ),
    components(schemas(
        dto::HealthRes,
        dto::PageDescriptor,
        dto::SectionDescriptor,
        dto::FieldDescriptor,
        dto::FormView,
        dto::FormValues,
        dto::EquipmentValues,
        dto::MedicalSuppliesValues,
        dto::FieldErrorRes,
        dto::PersonalNumberRes,
        dto::SubmitRes,
        dto::NotificationRes,
        dto::ConfirmationRes,
        dto::SetFieldReq,
        dto::FieldValue,
        dto::ThemeRes,
        dto::SetThemeReq,
    ))
)]
pub struct ApiDoc;

/// Builds the page API router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/form", get(form_descriptor).post(open_session))
        .route("/form/:session", get(get_session).delete(close_session))
        .route("/form/:session/fields", put(set_field))
        .route("/form/:session/submit", post(submit))
        .route("/preferences/theme", get(get_theme).put(set_theme))
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> Redirect {
    Redirect::temporary("/form")
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = dto::HealthRes)
    )
)]
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<dto::HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/form",
    responses(
        (status = 200, description = "Layout of the daily report page", body = dto::PageDescriptor)
    )
)]
/// Static page layout: title, sections, field labels, placeholders and kinds.
async fn form_descriptor() -> Json<dto::PageDescriptor> {
    Json(view::page_descriptor())
}

async fn session(state: &AppState, id: Uuid) -> Result<Arc<SubmissionWorkflow>, ApiError> {
    state.sessions.get(&id).await.ok_or_else(|| {
        tracing::warn!(session = %id, "unknown page session");
        (StatusCode::NOT_FOUND, "Unknown session")
    })
}

async fn render(id: Uuid, workflow: &SubmissionWorkflow) -> dto::FormView {
    let mut controller = workflow.controller().lock().await;
    view::form_view(id, &mut controller)
}

#[utoipa::path(
    post,
    path = "/form",
    responses(
        (status = 201, description = "Page session opened", body = dto::FormView)
    )
)]
/// Opens a page session
///
/// Starts the one-time personal number fetch in the background; the returned view is
/// usually still `loading`.
#[axum::debug_handler]
async fn open_session(State(state): State<AppState>) -> (StatusCode, Json<dto::FormView>) {
    let (id, workflow) = state.sessions.open().await;
    (StatusCode::CREATED, Json(render(id, &workflow).await))
}

#[utoipa::path(
    get,
    path = "/form/{session}",
    params(("session" = String, Path, description = "Page session id")),
    responses(
        (status = 200, description = "Current page state", body = dto::FormView),
        (status = 404, description = "Unknown session")
    )
)]
#[axum::debug_handler]
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<dto::FormView>, ApiError> {
    let workflow = session(&state, id).await?;
    Ok(Json(render(id, &workflow).await))
}

#[utoipa::path(
    delete,
    path = "/form/{session}",
    params(("session" = String, Path, description = "Page session id")),
    responses(
        (status = 204, description = "Session closed, pending reset cancelled"),
        (status = 404, description = "Unknown session")
    )
)]
#[axum::debug_handler]
async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.close(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Unknown session"))
    }
}

fn controller_status(e: &ControllerError) -> ApiError {
    match e {
        ControllerError::Locked(_) => (StatusCode::CONFLICT, "Form is locked"),
        ControllerError::DirectoryUnavailable => {
            (StatusCode::CONFLICT, "Personal number directory unavailable")
        }
        ControllerError::DirectoryPending => {
            (StatusCode::CONFLICT, "Personal number directory still loading")
        }
        ControllerError::SubmitUnavailable(_) => (StatusCode::CONFLICT, "Submit not available"),
        ControllerError::FieldKindMismatch { .. } => {
            (StatusCode::BAD_REQUEST, "Value does not fit field")
        }
        ControllerError::UnknownField(_) => (StatusCode::BAD_REQUEST, "Unknown field"),
    }
}

#[utoipa::path(
    put,
    path = "/form/{session}/fields",
    params(("session" = String, Path, description = "Page session id")),
    request_body = dto::SetFieldReq,
    responses(
        (status = 200, description = "Field updated", body = dto::FormView),
        (status = 400, description = "Unknown field or value of the wrong kind"),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Form locked or directory not ready"),
        (status = 422, description = "Body is not a field edit")
    )
)]
/// Applies one edit
///
/// `value` is a boolean for `equipment.hasCompass` and a string or number for every
/// other field. An empty quantity clears it.
#[axum::debug_handler]
async fn set_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<dto::SetFieldReq>,
) -> Result<Json<dto::FormView>, ApiError> {
    let workflow = session(&state, id).await?;

    let field: FieldPath = req.field.parse().map_err(|e: ControllerError| {
        tracing::warn!("Set field error: {}", e);
        controller_status(&e)
    })?;
    let input = match req.value {
        dto::FieldValue::Flag(flag) => FieldInput::Flag(flag),
        dto::FieldValue::Integer(n) => FieldInput::Text(n.to_string()),
        dto::FieldValue::Number(n) => FieldInput::Text(n.to_string()),
        dto::FieldValue::Text(text) => FieldInput::Text(text),
    };

    match workflow.set_field(field, input).await {
        Ok(()) => Ok(Json(render(id, &workflow).await)),
        Err(e) => {
            tracing::warn!("Set field error: {}", e);
            Err(controller_status(&e))
        }
    }
}

#[utoipa::path(
    post,
    path = "/form/{session}/submit",
    params(("session" = String, Path, description = "Page session id")),
    responses(
        (status = 200, description = "Submission outcome: confirmation, field errors or a failure notification", body = dto::FormView),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Submit not available")
    )
)]
/// Submits the report
///
/// Validation errors and backend failures are part of the returned view: the
/// former as field errors, the latter as an error notification with every value kept.
#[axum::debug_handler]
async fn submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<dto::FormView>, ApiError> {
    let workflow = session(&state, id).await?;

    match workflow.submit().await {
        Ok(_) | Err(ReportError::Validation(_)) | Err(ReportError::Submission(_)) => {
            Ok(Json(render(id, &workflow).await))
        }
        Err(ReportError::Controller(e)) => {
            tracing::warn!("Submit rejected: {}", e);
            Err(controller_status(&e))
        }
        Err(e) => {
            tracing::error!("Submit error: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
    }
}

#[utoipa::path(
    get,
    path = "/preferences/theme",
    responses(
        (status = 200, description = "Current theme", body = dto::ThemeRes)
    )
)]
#[axum::debug_handler]
async fn get_theme(State(state): State<AppState>) -> Json<dto::ThemeRes> {
    Json(view::theme_res(&state.theme))
}

#[utoipa::path(
    put,
    path = "/preferences/theme",
    request_body = dto::SetThemeReq,
    responses(
        (status = 200, description = "Theme stored", body = dto::ThemeRes),
        (status = 400, description = "Not one of dark, light, system"),
        (status = 500, description = "Internal server error")
    )
)]
/// Persists the theme preference under the configured storage key.
#[axum::debug_handler]
async fn set_theme(
    State(state): State<AppState>,
    Json(req): Json<dto::SetThemeReq>,
) -> Result<Json<dto::ThemeRes>, ApiError> {
    let theme: Theme = req.theme.parse().map_err(|e| {
        tracing::warn!("Set theme error: {}", e);
        (StatusCode::BAD_REQUEST, "Invalid theme")
    })?;

    match state.theme.set_theme(theme) {
        Ok(()) => Ok(Json(view::theme_res(&state.theme))),
        Err(e) => {
            tracing::error!("Set theme error: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
    }
}
