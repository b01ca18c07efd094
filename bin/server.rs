// Creator Payouts - Web Server
// REST API over the bank account registry, validator and store

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use creator_payouts::registry::normalize_type_code;
use creator_payouts::{
    calculate_reading_time, create_bank_account, format_reading_time,
    get_alive_bank_account_for_user, registry, setup_database, summary, AppConfig,
    BankAccountFields, BankAccountInstance, BankAccountRegistry, BankAccountRule,
    BankAccountSummary, BankAccountValidator, FieldError, RegistryError, RuntimeContext,
    StoreError,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

/// Shared application state
#[derive(Clone)]
struct AppState {
    registry: &'static BankAccountRegistry,
    context: RuntimeContext,
    db: Arc<Mutex<Connection>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
        .into_response()
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ApiResponse::<()> {
        success: false,
        data: None,
        error: Some(message.into()),
    };
    (status, Json(body)).into_response()
}

fn registry_error_response(err: RegistryError) -> Response {
    match err {
        RegistryError::NotFound(_) => error_response(StatusCode::NOT_FOUND, err.to_string()),
        other => error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

// ============================================================================
// Request / Response types
// ============================================================================

#[derive(Deserialize)]
struct BankAccountRequest {
    bank_account_type: String,
    #[serde(flatten)]
    fields: BankAccountFields,
}

#[derive(Serialize)]
struct ValidationResponse {
    valid: bool,
    errors: Vec<FieldError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<BankAccountSummary>,
}

#[derive(Serialize)]
struct SavedAccountResponse {
    id: String,
    #[serde(flatten)]
    summary: BankAccountSummary,
}

#[derive(Deserialize)]
struct ReadingTimeRequest {
    content: String,
}

#[derive(Serialize)]
struct ReadingTimeResponse {
    minutes: u32,
    label: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Response {
    ApiResponse::ok("OK")
}

/// GET /api/bank-account-types - All rules
async fn list_types(State(state): State<AppState>) -> Response {
    let rules: Vec<&BankAccountRule> = state.registry.all_rules().iter().collect();
    ApiResponse::ok(rules)
}

/// GET /api/bank-account-types/:code - One rule
async fn get_type(State(state): State<AppState>, Path(code): Path<String>) -> Response {
    match state.registry.lookup(&normalize_type_code(&code)) {
        Ok(rule) => ApiResponse::ok(rule),
        Err(e) => registry_error_response(e),
    }
}

/// POST /api/bank-accounts/validate - Check details without saving
async fn validate_account(
    State(state): State<AppState>,
    Json(request): Json<BankAccountRequest>,
) -> Response {
    let rule = match state.registry.lookup(&normalize_type_code(&request.bank_account_type)) {
        Ok(rule) => rule,
        Err(e) => return registry_error_response(e),
    };

    let account = BankAccountInstance::create("anonymous", rule, request.fields);
    let validator = BankAccountValidator::new(state.registry, state.context);

    match validator.validate(&account) {
        Ok(Ok(())) => ApiResponse::ok(ValidationResponse {
            valid: true,
            errors: vec![],
            summary: Some(summary(rule, &account)),
        }),
        Ok(Err(errors)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse {
                success: false,
                data: Some(ValidationResponse {
                    valid: false,
                    errors,
                    summary: None,
                }),
                error: None,
            }),
        )
            .into_response(),
        Err(e) => registry_error_response(e),
    }
}

/// POST /api/users/:user_id/bank-accounts - Save new payout details
async fn save_account(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<BankAccountRequest>,
) -> Response {
    let rule = match state.registry.lookup(&normalize_type_code(&request.bank_account_type)) {
        Ok(rule) => rule,
        Err(e) => return registry_error_response(e),
    };

    let account = BankAccountInstance::create(user_id, rule, request.fields);
    let mut conn = state.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    match create_bank_account(&mut conn, state.registry, &account, state.context) {
        Ok(saved) => (
            StatusCode::CREATED,
            Json(ApiResponse {
                success: true,
                data: Some(SavedAccountResponse {
                    id: saved.id.clone(),
                    summary: summary(rule, &saved),
                }),
                error: None,
            }),
        )
            .into_response(),
        Err(StoreError::Invalid(errors)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse {
                success: false,
                data: Some(ValidationResponse {
                    valid: false,
                    errors,
                    summary: None,
                }),
                error: None,
            }),
        )
            .into_response(),
        Err(StoreError::Registry(e)) => registry_error_response(e),
        Err(e) => {
            tracing::error!(error = %e, "failed to save bank account");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save bank account")
        }
    }
}

/// GET /api/users/:user_id/bank-account - Current payout details, masked
async fn get_user_account(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    let conn = state.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    match get_alive_bank_account_for_user(&conn, &user_id) {
        Ok(Some(account)) => match state.registry.lookup(&account.type_code) {
            Ok(rule) => ApiResponse::ok(SavedAccountResponse {
                id: account.id.clone(),
                summary: summary(rule, &account),
            }),
            Err(e) => registry_error_response(e),
        },
        Ok(None) => error_response(StatusCode::NOT_FOUND, format!("No bank account for user {}", user_id)),
        Err(e) => {
            tracing::error!(error = %e, "failed to load bank account");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load bank account")
        }
    }
}

/// POST /api/reading-time - Reading time of a post body
async fn reading_time(Json(request): Json<ReadingTimeRequest>) -> Response {
    let minutes = calculate_reading_time(&request.content);
    ApiResponse::ok(ReadingTimeResponse {
        minutes,
        label: format_reading_time(minutes),
    })
}

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/bank-account-types", get(list_types))
        .route("/bank-account-types/:code", get(get_type))
        .route("/bank-accounts/validate", post(validate_account))
        .route("/users/:user_id/bank-accounts", post(save_account))
        .route("/users/:user_id/bank-account", get(get_user_account))
        .route("/reading-time", post(reading_time))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load_or_default(creator_payouts::config::DEFAULT_CONFIG_PATH)
        .context("Failed to load config")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let conn = Connection::open(&config.database_path)
        .with_context(|| format!("Failed to open database {}", config.database_path))?;
    setup_database(&conn)?;

    let state = AppState {
        registry: registry::global(),
        context: config.runtime_context(),
        db: Arc::new(Mutex::new(conn)),
    };

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server_addr))?;

    tracing::info!(
        addr = %config.server_addr,
        environment = %config.environment,
        database = %config.database_path,
        rules = state.registry.count(),
        "payouts server listening"
    );

    axum::serve(listener, build_router(state))
        .await
        .context("Server error")?;

    Ok(())
}
