//! Lockgate - email/password account authentication service
//!
//! Lockgate implements the account credential lifecycle for a web
//! application on top of Axum and Tokio: registration, login with
//! account lockout, email verification, password reset, and session
//! token issuance.
//!
//! # Components
//!
//! - **Accounts**: the account entity and a pluggable [`account::AccountStore`]
//!   with atomic per-account mutations
//! - **Auth**: Argon2id password hashing, CSPRNG link tokens, lockout
//!   policy, JWT session tokens, and the orchestrating [`auth::AuthService`]
//! - **Email**: a [`email::Mailer`] seam with console and SMTP backends
//! - **HTTP**: JSON routes under `/api/auth` and `/api/user`
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use lockgate::{ConfigBuilder, http::AppState};
//!
//! #[tokio::main]
//! async fn main() {
//!     lockgate::init_tracing();
//!
//!     let config = ConfigBuilder::new().from_env().build().unwrap();
//!     let state = AppState::in_memory(&config);
//!     let app = lockgate::http::router(state);
//!
//!     let addr = config.server.addr().unwrap();
//!     let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod account;
pub mod auth;
mod config;
pub mod email;
mod error;
pub mod http;

// Re-exports for public API
pub use account::{Account, AccountStore, InMemoryAccountStore, Role};
pub use auth::{AuthService, LockoutPolicy, PasswordHasher, PasswordPolicy, SessionTokenIssuer};
pub use config::{AuthConfig, Config, ConfigBuilder, LoggingConfig, ServerConfig};
pub use error::{FieldError, LockgateError, Result};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// This should be called early in your application, typically in main()
/// before building the router.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "lockgate=debug")
/// - `LOCKGATE_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("LOCKGATE_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing with a custom configuration
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
