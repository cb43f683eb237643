//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core
//! services. Nothing in this crate reads environment variables during request
//! handling; the `*_from_env_value` helpers take the raw values so that the
//! binary decides where they come from.

use crate::constants::{
    DEFAULT_BACKEND_URL, DEFAULT_PREFERENCES_FILE, DEFAULT_REQUEST_TIMEOUT, DEFAULT_RESET_DELAY,
    DEFAULT_SESSION_IDLE_TIMEOUT, DEFAULT_THEME_STORAGE_KEY,
};
use crate::error::{ReportError, ReportResult};
use crate::theme::Theme;
use report_types::NonEmptyText;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    backend_url: String,
    reset_delay: Duration,
    request_timeout: Duration,
    session_idle_timeout: Duration,
    preferences_file: PathBuf,
    theme_storage_key: NonEmptyText,
    default_theme: Theme,
    system_prefers_dark: bool,
}

impl CoreConfig {
    /// Create a `CoreConfig` for the given backend with default settings.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidInput` if the URL is empty or not http(s).
    pub fn new(backend_url: impl AsRef<str>) -> ReportResult<Self> {
        let backend_url = backend_url.as_ref().trim().trim_end_matches('/');
        if backend_url.is_empty() {
            return Err(ReportError::InvalidInput(
                "backend_url cannot be empty".into(),
            ));
        }
        if !(backend_url.starts_with("http://") || backend_url.starts_with("https://")) {
            return Err(ReportError::InvalidInput(format!(
                "backend_url must start with http:// or https:// (got {backend_url})"
            )));
        }

        Ok(Self {
            backend_url: backend_url.to_string(),
            reset_delay: DEFAULT_RESET_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            session_idle_timeout: DEFAULT_SESSION_IDLE_TIMEOUT,
            preferences_file: PathBuf::from(DEFAULT_PREFERENCES_FILE),
            theme_storage_key: NonEmptyText::new(DEFAULT_THEME_STORAGE_KEY)
                .map_err(|e| ReportError::InvalidInput(e.to_string()))?,
            default_theme: Theme::System,
            system_prefers_dark: false,
        })
    }

    pub fn with_reset_delay(mut self, delay: Duration) -> Self {
        self.reset_delay = delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_session_idle_timeout(mut self, timeout: Duration) -> Self {
        self.session_idle_timeout = timeout;
        self
    }

    pub fn with_preferences_file(mut self, path: PathBuf) -> Self {
        self.preferences_file = path;
        self
    }

    pub fn with_theme_storage_key(mut self, key: NonEmptyText) -> Self {
        self.theme_storage_key = key;
        self
    }

    pub fn with_default_theme(mut self, theme: Theme) -> Self {
        self.default_theme = theme;
        self
    }

    pub fn with_system_prefers_dark(mut self, prefers_dark: bool) -> Self {
        self.system_prefers_dark = prefers_dark;
        self
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    pub fn reset_delay(&self) -> Duration {
        self.reset_delay
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// How long a page session may go untouched before it is dropped.
    pub fn session_idle_timeout(&self) -> Duration {
        self.session_idle_timeout
    }

    pub fn preferences_file(&self) -> &Path {
        &self.preferences_file
    }

    pub fn theme_storage_key(&self) -> &NonEmptyText {
        &self.theme_storage_key
    }

    pub fn default_theme(&self) -> Theme {
        self.default_theme
    }

    pub fn system_prefers_dark(&self) -> bool {
        self.system_prefers_dark
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Backend URL from an optional value, falling back to the local default.
pub fn backend_url_from_env_value(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
}

/// Parse a millisecond duration; `None` or blank yields `default`.
pub fn duration_ms_from_env_value(
    value: Option<String>,
    default: Duration,
) -> ReportResult<Duration> {
    non_blank(value)
        .map(|v| {
            v.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ReportError::InvalidInput(format!("invalid milliseconds: {v}")))
        })
        .transpose()
        .map(|d| d.unwrap_or(default))
}

/// Parse a whole-second duration; `None` or blank yields `default`.
pub fn duration_secs_from_env_value(
    value: Option<String>,
    default: Duration,
) -> ReportResult<Duration> {
    non_blank(value)
        .map(|v| {
            v.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ReportError::InvalidInput(format!("invalid seconds: {v}")))
        })
        .transpose()
        .map(|d| d.unwrap_or(default))
}

/// Parse `true`/`false`/`1`/`0`; `None` or blank yields `default`.
pub fn bool_from_env_value(value: Option<String>, default: bool) -> ReportResult<bool> {
    match non_blank(value).map(|v| v.to_ascii_lowercase()).as_deref() {
        None => Ok(default),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => Err(ReportError::InvalidInput(format!(
            "invalid boolean: {other}"
        ))),
    }
}

/// Parse the default theme; `None` or blank yields `Theme::System`.
pub fn theme_from_env_value(value: Option<String>) -> ReportResult<Theme> {
    Ok(non_blank(value)
        .map(|v| v.parse::<Theme>())
        .transpose()?
        .unwrap_or(Theme::System))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_trailing_slash_and_keeps_defaults() {
        let cfg = CoreConfig::new("http://backend:8080/").unwrap();
        assert_eq!(cfg.backend_url(), "http://backend:8080");
        assert_eq!(cfg.reset_delay(), Duration::from_secs(3));
        assert_eq!(cfg.session_idle_timeout(), Duration::from_secs(1800));
        assert_eq!(cfg.theme_storage_key().as_str(), "report-ui-theme");
        assert_eq!(cfg.default_theme(), Theme::System);
    }

    #[test]
    fn new_rejects_empty_or_non_http_urls() {
        assert!(CoreConfig::new("  ").is_err());
        assert!(CoreConfig::new("ftp://backend").is_err());
    }

    #[test]
    fn env_value_helpers_fall_back_on_blank() {
        assert_eq!(backend_url_from_env_value(Some(" ".into())), DEFAULT_BACKEND_URL);
        assert_eq!(
            duration_ms_from_env_value(None, Duration::from_secs(3)).unwrap(),
            Duration::from_secs(3)
        );
        assert_eq!(
            duration_ms_from_env_value(Some("250".into()), Duration::ZERO).unwrap(),
            Duration::from_millis(250)
        );
        assert_eq!(
            duration_secs_from_env_value(Some("7".into()), Duration::ZERO).unwrap(),
            Duration::from_secs(7)
        );
        assert!(bool_from_env_value(Some("TRUE".into()), false).unwrap());
        assert_eq!(theme_from_env_value(None).unwrap(), Theme::System);
        assert_eq!(theme_from_env_value(Some("dark".into())).unwrap(), Theme::Dark);
    }

    #[test]
    fn env_value_helpers_reject_garbage() {
        assert!(duration_ms_from_env_value(Some("soon".into()), Duration::ZERO).is_err());
        assert!(bool_from_env_value(Some("maybe".into()), false).is_err());
        assert!(theme_from_env_value(Some("sepia".into())).is_err());
    }
}
