//! Soldiers backend access.
//!
//! [`ReportBackend`] is the seam between the form workflow and the network; the
//! workflow only ever talks to the trait. [`HttpBackend`] is the production
//! implementation over `reqwest`.

use async_trait::async_trait;
use report_types::PersonalNumber;

use crate::config::CoreConfig;
use crate::constants::{PERSONAL_NUMBERS_PATH, REPORTS_PATH, SOLDIERS_PATH};
use crate::error::{DirectoryFetchError, ReportError, ReportResult, SubmissionError};
use crate::schema::{Report, ReportFormData};

/// Backend acknowledgment for a submitted report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// The stored report, when the backend echoes one back.
    pub report: Option<Report>,
}

#[async_trait]
pub trait ReportBackend: Send + Sync {
    /// Fetches the authoritative list of valid personal numbers.
    async fn fetch_personal_numbers(&self) -> Result<Vec<PersonalNumber>, DirectoryFetchError>;

    /// Lists soldier records. Not used by the form itself.
    async fn list_soldiers(&self) -> Result<Vec<serde_json::Value>, DirectoryFetchError>;

    /// Sends one report. Called exactly once per user-initiated submit.
    async fn submit_report(
        &self,
        data: &ReportFormData,
    ) -> Result<SubmissionReceipt, SubmissionError>;
}

/// `reqwest` client for the soldiers backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Builds a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::HttpClient` if the TLS backend cannot be initialised.
    pub fn new(cfg: &CoreConfig) -> ReportResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.request_timeout())
            .build()
            .map_err(ReportError::HttpClient)?;

        Ok(Self {
            base_url: cfg.backend_url().to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned + Send>(
        &self,
        path: &str,
    ) -> Result<T, DirectoryFetchError> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DirectoryFetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DirectoryFetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DirectoryFetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ReportBackend for HttpBackend {
    async fn fetch_personal_numbers(&self) -> Result<Vec<PersonalNumber>, DirectoryFetchError> {
        self.get_json(PERSONAL_NUMBERS_PATH).await.inspect_err(|e| {
            tracing::error!("Error fetching personal numbers: {}", e);
        })
    }

    async fn list_soldiers(&self) -> Result<Vec<serde_json::Value>, DirectoryFetchError> {
        let soldiers: Vec<serde_json::Value> =
            self.get_json(SOLDIERS_PATH).await.inspect_err(|e| {
                tracing::error!("Error fetching soldiers: {}", e);
            })?;
        tracing::debug!(count = soldiers.len(), "fetched soldiers");
        Ok(soldiers)
    }

    async fn submit_report(
        &self,
        data: &ReportFormData,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let response = self
            .client
            .post(self.url(REPORTS_PATH))
            .json(data)
            .send()
            .await
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(SubmissionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // The response shape is not part of the contract; keep it if it is a report.
        let report = serde_json::from_str::<Report>(&body).ok();
        Ok(SubmissionReceipt { report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, routing::post, Json, Router};
    use std::time::Duration;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn backend_for(url: &str) -> HttpBackend {
        let cfg = CoreConfig::new(url)
            .unwrap()
            .with_request_timeout(Duration::from_secs(5));
        HttpBackend::new(&cfg).unwrap()
    }

    #[tokio::test]
    async fn fetches_personal_numbers_as_json_numbers() {
        let app = Router::new().route(
            PERSONAL_NUMBERS_PATH,
            get(|| async { Json(vec![12345u64, 67890]) }),
        );
        let backend = backend_for(&serve(app).await);

        let numbers = backend.fetch_personal_numbers().await.unwrap();
        let numbers: Vec<&str> = numbers.iter().map(|n| n.as_str()).collect();
        assert_eq!(numbers, vec!["12345", "67890"]);
    }

    #[tokio::test]
    async fn directory_server_error_is_reported_with_status() {
        let app = Router::new().route(
            PERSONAL_NUMBERS_PATH,
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "down") }),
        );
        let backend = backend_for(&serve(app).await);

        match backend.fetch_personal_numbers().await {
            Err(DirectoryFetchError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "down");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_directory_is_a_decode_error() {
        let app = Router::new().route(PERSONAL_NUMBERS_PATH, get(|| async { "not json" }));
        let backend = backend_for(&serve(app).await);

        assert!(matches!(
            backend.fetch_personal_numbers().await,
            Err(DirectoryFetchError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let backend = backend_for("http://127.0.0.1:1");
        assert!(matches!(
            backend.fetch_personal_numbers().await,
            Err(DirectoryFetchError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn lists_soldiers() {
        let app = Router::new().route(
            SOLDIERS_PATH,
            get(|| async { Json(serde_json::json!([{ "name": "a" }, { "name": "b" }])) }),
        );
        let backend = backend_for(&serve(app).await);

        assert_eq!(backend.list_soldiers().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn submits_report_body_and_accepts_any_success() {
        let app = Router::new().route(
            REPORTS_PATH,
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["personalNumber"], "12345");
                assert_eq!(body["medicalSupplies"]["actiq"], 2);
                StatusCode::CREATED
            }),
        );
        let backend = backend_for(&serve(app).await);

        let mut data = ReportFormData {
            personal_number: "12345".into(),
            ..Default::default()
        };
        data.medical_supplies.actiq = Some(2);

        let receipt = backend.submit_report(&data).await.unwrap();
        assert!(receipt.report.is_none());
    }

    #[tokio::test]
    async fn rejected_submission_is_a_status_error() {
        let app = Router::new().route(
            REPORTS_PATH,
            post(|| async { (StatusCode::BAD_REQUEST, "bad") }),
        );
        let backend = backend_for(&serve(app).await);

        let err = backend
            .submit_report(&ReportFormData::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::Status { status: 400, .. }));
    }
}
