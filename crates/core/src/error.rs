use crate::controller::{FormState, SubmitAvailability};
use crate::schema::ValidationErrors;

/// Failure to load the personal number directory.
///
/// Fatal for the page session that requested it: the form is never shown.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryFetchError {
    #[error("directory request failed: {0}")]
    Transport(String),
    #[error("directory responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode directory response: {0}")]
    Decode(String),
}

/// Failure to deliver a report to the backend.
///
/// Transient: the form keeps every value so the user can resubmit.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("report request failed: {0}")]
    Transport(String),
    #[error("report endpoint responded with status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Rejected controller operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("form is locked while {0:?}")]
    Locked(FormState),
    #[error("the personal number directory is unavailable")]
    DirectoryUnavailable,
    #[error("personal numbers are still loading")]
    DirectoryPending,
    #[error("submit is not available: {0:?}")]
    SubmitUnavailable(SubmitAvailability),
    #[error("field {field} expects {expected}")]
    FieldKindMismatch {
        field: &'static str,
        expected: &'static str,
    },
    #[error("unknown field: {0}")]
    UnknownField(String),
}

/// Failures reading or writing persisted preferences.
#[derive(Debug, thiserror::Error)]
pub enum PreferencesError {
    #[error("failed to read preferences file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write preferences file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize preferences: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to deserialize preferences: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error("unknown theme: {0}")]
    InvalidTheme(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Directory(#[from] DirectoryFetchError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Controller(#[from] ControllerError),
    #[error(transparent)]
    Preferences(#[from] PreferencesError),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;
