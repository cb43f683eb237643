use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use report_core::config::{
    backend_url_from_env_value, bool_from_env_value, duration_ms_from_env_value,
    duration_secs_from_env_value, theme_from_env_value,
};
use report_core::constants::{
    DEFAULT_PREFERENCES_FILE, DEFAULT_REQUEST_TIMEOUT, DEFAULT_RESET_DELAY,
    DEFAULT_SESSION_IDLE_TIMEOUT, DEFAULT_THEME_STORAGE_KEY, SESSION_SWEEP_INTERVAL,
};
use report_core::{CoreConfig, HttpBackend, SessionRegistry, ThemeContext};
use report_types::NonEmptyText;

/// Resolves the configuration once from the environment.
///
/// # Environment Variables
/// - `REPORT_BACKEND_URL`: soldiers backend base URL (default: "http://localhost:8080")
/// - `REPORT_RESET_DELAY_MS`: confirmation time before the form clears (default: 3000)
/// - `REPORT_REQUEST_TIMEOUT_SECS`: backend request timeout (default: 10)
/// - `REPORT_SESSION_IDLE_SECS`: idle time before a page session is dropped (default: 1800)
/// - `REPORT_PREFERENCES_FILE`: YAML file holding the theme preference (default: "preferences.yaml")
/// - `REPORT_THEME_STORAGE_KEY`: key of the theme preference (default: "report-ui-theme")
/// - `REPORT_DEFAULT_THEME`: `dark`, `light` or `system` (default: "system")
/// - `REPORT_SYSTEM_PREFERS_DARK`: host dark mode preference for `system` (default: false)
fn config_from_env() -> anyhow::Result<CoreConfig> {
    let env = |key: &str| std::env::var(key).ok();

    let backend_url = backend_url_from_env_value(env("REPORT_BACKEND_URL"));
    let storage_key = NonEmptyText::new(
        env("REPORT_THEME_STORAGE_KEY").unwrap_or_else(|| DEFAULT_THEME_STORAGE_KEY.into()),
    )?;
    let preferences_file = env("REPORT_PREFERENCES_FILE")
        .unwrap_or_else(|| DEFAULT_PREFERENCES_FILE.into());

    Ok(CoreConfig::new(backend_url)?
        .with_reset_delay(duration_ms_from_env_value(
            env("REPORT_RESET_DELAY_MS"),
            DEFAULT_RESET_DELAY,
        )?)
        .with_request_timeout(duration_secs_from_env_value(
            env("REPORT_REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT,
        )?)
        .with_session_idle_timeout(duration_secs_from_env_value(
            env("REPORT_SESSION_IDLE_SECS"),
            DEFAULT_SESSION_IDLE_TIMEOUT,
        )?)
        .with_preferences_file(PathBuf::from(preferences_file))
        .with_theme_storage_key(storage_key)
        .with_default_theme(theme_from_env_value(env("REPORT_DEFAULT_THEME"))?)
        .with_system_prefers_dark(bool_from_env_value(
            env("REPORT_SYSTEM_PREFERS_DARK"),
            false,
        )?))
}

/// Main entry point for the daily report page server
///
/// Serves the page API on `REPORT_REST_ADDR` (default: "0.0.0.0:3000") with
/// OpenAPI/Swagger documentation, talking to the soldiers backend for the personal
/// number directory and report submission.
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - any configuration value is invalid or the preferences file is unreadable,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("report_run=info".parse()?)
                .add_directive("report_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("REPORT_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let cfg = Arc::new(config_from_env()?);

    tracing::info!("++ Starting daily report page on {}", rest_addr);
    tracing::info!("++ Soldiers backend at {}", cfg.backend_url());

    let backend = Arc::new(HttpBackend::new(&cfg)?);
    let sessions = Arc::new(SessionRegistry::new(
        backend,
        cfg.reset_delay(),
        cfg.session_idle_timeout(),
    ));
    sessions.spawn_sweeper(SESSION_SWEEP_INTERVAL);

    let state = AppState {
        sessions,
        theme: Arc::new(ThemeContext::load(&cfg)?),
        cfg,
    };

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
