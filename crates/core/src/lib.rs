//! # Report Core
//!
//! Core logic of the daily report form.
//!
//! This crate contains the form workflow and its collaborators:
//! - the report schema and its validation
//! - the soldiers backend client and the session's personal number directory
//! - the form state controller and the submission workflow around it
//! - page sessions and the persisted theme preference
//!
//! **No API concerns**: HTTP routing, DTOs and OpenAPI documentation belong in
//! `api-rest` and `api-shared`.

pub mod backend;
pub mod config;
pub mod constants;
pub mod controller;
pub mod directory;
pub mod error;
pub mod schema;
pub mod sessions;
pub mod theme;
pub mod workflow;

pub use backend::{HttpBackend, ReportBackend, SubmissionReceipt};
pub use config::CoreConfig;
pub use controller::{
    FieldInput, FormController, FormDraft, FormState, Notification, NotificationLevel,
    PersonalNumberStatus, SubmitAvailability,
};
pub use directory::{DirectorySnapshot, DirectoryState};
pub use error::{
    ControllerError, DirectoryFetchError, PreferencesError, ReportError, ReportResult,
    SubmissionError,
};
pub use schema::{
    Equipment, FieldKind, FieldPath, MedicalSupplies, Medication, Report, ReportFormData, Serial,
    ValidationErrors,
};
pub use sessions::SessionRegistry;
pub use theme::{Theme, ThemeContext};
pub use workflow::SubmissionWorkflow;

pub use report_types::{NonEmptyText, PersonalNumber};
