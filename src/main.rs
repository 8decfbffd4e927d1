use std::sync::Arc;

use lockgate::email::{ConsoleMailer, Mailer, SmtpMailer};
use lockgate::http::{AppState, router};
use lockgate::{AuthService, ConfigBuilder, InMemoryAccountStore, SessionTokenIssuer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    lockgate::init_tracing();

    let config = ConfigBuilder::new().from_env().build()?;

    let store = Arc::new(InMemoryAccountStore::new());

    // Fall back to the console mailer when SMTP is not configured, so the
    // auth flows keep working in development (links land in stdout).
    let (mailer, email_configured): (Arc<dyn Mailer>, bool) = match SmtpMailer::from_env() {
        Ok(smtp) => (Arc::new(smtp), true),
        Err(e) => {
            tracing::warn!(
                error = %e,
                "SMTP not configured (EMAIL_HOST/EMAIL_USER/EMAIL_PASS); using console mailer"
            );
            (Arc::new(ConsoleMailer::new()), false)
        }
    };

    let sessions = SessionTokenIssuer::new(
        config.auth.jwt_secret.as_bytes(),
        "lockgate",
        config.auth.session_ttl,
    );
    let auth = Arc::new(AuthService::new(
        store,
        mailer,
        sessions,
        &config.auth,
        config.lockout.clone(),
    ));

    let mut state = AppState::new(auth, email_configured);
    state.max_body_size = config.server.max_body_size;
    let app = router(state);

    let addr = config.server.addr()?;
    tracing::info!(%addr, "lockgate listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
