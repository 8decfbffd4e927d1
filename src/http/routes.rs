//! JSON routes for the authentication API.
//!
//! One endpoint per auth operation plus the authenticated user routes and
//! a health check. Rate limiting is a deployment concern applied in front
//! of this router, not reimplemented here.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::account::InMemoryAccountStore;
use crate::auth::types::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
    RegisterResponse, RegisteredUser, ResendVerificationRequest, ResetPasswordRequest,
    SessionUser, VerifyEmailResponse,
};
use crate::auth::{AuthService, SessionTokenIssuer};
use crate::config::Config;
use crate::email::ConsoleMailer;
use crate::error::Result;

use super::extract::CurrentAccount;

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    /// Whether a real SMTP backend is configured (reported by /api/health).
    pub email_configured: bool,
    pub max_body_size: usize,
}

impl AppState {
    pub fn new(auth: Arc<AuthService>, email_configured: bool) -> Self {
        Self {
            auth,
            email_configured,
            max_body_size: 10 * 1024 * 1024,
        }
    }

    /// Wire up an in-memory store with the console mailer. Suitable for
    /// development and tests; production deployments plug in their own
    /// store and mailer via [`AppState::new`].
    pub fn in_memory(config: &Config) -> Self {
        let store = Arc::new(InMemoryAccountStore::new());
        let mailer = Arc::new(ConsoleMailer::new());
        let sessions = SessionTokenIssuer::new(
            config.auth.jwt_secret.as_bytes(),
            "lockgate",
            config.auth.session_ttl,
        );
        let auth = AuthService::new(store, mailer, sessions, &config.auth, config.lockout.clone());

        Self {
            auth: Arc::new(auth),
            email_configured: false,
            max_body_size: config.server.max_body_size,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let max_body_size = state.max_body_size;

    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/verify-email/{token}", get(verify_email))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password/{token}", post(reset_password))
        .route("/api/auth/resend-verification", post(resend_verification))
        .route("/api/user/profile", get(profile))
        .route("/api/user/dashboard-stats", get(dashboard_stats))
        .route("/api/health", get(health))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let account = state.auth.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "Registration successful! Please check your email to verify your account."
                .to_string(),
            user: RegisteredUser::from(&account),
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let (token, account) = state.auth.login(req).await?;

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        token,
        user: SessionUser::from(&account),
    }))
}

async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<VerifyEmailResponse>> {
    let account = state.auth.verify_email(&token).await?;

    Ok(Json(VerifyEmailResponse {
        success: true,
        message: "Email verified successfully! You can now login.".to_string(),
        is_fully_verified: account.is_verified,
    }))
}

async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    state.auth.forgot_password(&req.email).await?;

    Ok(Json(MessageResponse::ok(
        "Password reset instructions sent to your email",
    )))
}

async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    state.auth.reset_password(&token, &req.password).await?;

    Ok(Json(MessageResponse::ok("Password reset successfully")))
}

async fn resend_verification(
    State(state): State<AppState>,
    Json(req): Json<ResendVerificationRequest>,
) -> Result<Json<MessageResponse>> {
    state.auth.resend_verification(&req.email).await?;

    Ok(Json(MessageResponse::ok(
        "Verification email sent successfully",
    )))
}

#[derive(Serialize)]
struct ProfileResponse {
    success: bool,
    user: SessionUser,
}

async fn profile(CurrentAccount(account): CurrentAccount) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        success: true,
        user: SessionUser::from(&account),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardStats {
    is_fully_verified: bool,
    account_created: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct DashboardStatsResponse {
    success: bool,
    stats: DashboardStats,
}

async fn dashboard_stats(CurrentAccount(account): CurrentAccount) -> Json<DashboardStatsResponse> {
    Json(DashboardStatsResponse {
        success: true,
        stats: DashboardStats {
            is_fully_verified: account.is_verified,
            account_created: account.created_at,
            last_login: account.last_login,
        },
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    success: bool,
    status: &'static str,
    timestamp: DateTime<Utc>,
    email_configured: bool,
    notifier_healthy: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "API is running",
        timestamp: Utc::now(),
        email_configured: state.email_configured,
        notifier_healthy: state.auth.notifier_healthy(),
    })
}
