//! Form state controller.
//!
//! Owns the field values of one page session, the per-field errors and the
//! lifecycle state machine:
//!
//! ```text
//! Idle ──edit──▶ Editing ──submit──▶ Validating ──ok──▶ Submitting ──▶ Submitted ──reset──▶ Editing
//!                  ▲                     │                   │
//!                  └───── invalid ───────┘                   └──▶ SubmitFailed ──edit/submit──▶ …
//! ```
//!
//! Whether the submit action can be offered at all is an explicit
//! [`SubmitAvailability`], derived from the lifecycle state, the directory state and
//! the personal number. The controller performs no I/O; the workflow drives it.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::backend::SubmissionReceipt;
use crate::constants::{
    MSG_FIX_FIELDS, MSG_PERSONAL_NUMBER_NOT_FOUND, MSG_SUBMIT_FAILED, MSG_SUBMIT_SUCCESS,
};
use crate::directory::{DirectorySnapshot, DirectoryState};
use crate::error::{ControllerError, ReportResult, SubmissionError};
use crate::schema::{self, FieldKind, FieldPath, Medication, ReportFormData, Serial, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FormState {
    Idle,
    Editing,
    Validating,
    Submitting,
    Submitted,
    SubmitFailed,
}

/// Why the submit action is, or is not, offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmitAvailability {
    Available,
    DirectoryPending,
    DirectoryUnavailable,
    PersonalNumberMissing,
    PersonalNumberNotFound,
    SubmissionInFlight,
    AwaitingReset,
}

impl SubmitAvailability {
    pub fn is_available(&self) -> bool {
        matches!(self, SubmitAvailability::Available)
    }
}

/// Result of the live directory membership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PersonalNumberStatus {
    Empty,
    /// No snapshot to check against yet.
    Checking,
    Known,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A transient toast for the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// One user edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput {
    Text(String),
    Flag(bool),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentDraft {
    pub personal_weapon_number: String,
    pub personal_sights_number: String,
    pub night_vision_number: String,
    pub binoculars_number: String,
    pub has_compass: bool,
}

/// Raw quantity inputs; `None` is unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SuppliesDraft {
    pub actiq: Option<String>,
    pub morphine: Option<String>,
    pub midazolam: Option<String>,
    pub ketamine50mg: Option<String>,
    pub ketamine10mg: Option<String>,
}

impl SuppliesDraft {
    pub fn get(&self, medication: Medication) -> Option<&str> {
        match medication {
            Medication::Actiq => self.actiq.as_deref(),
            Medication::Morphine => self.morphine.as_deref(),
            Medication::Midazolam => self.midazolam.as_deref(),
            Medication::Ketamine50mg => self.ketamine50mg.as_deref(),
            Medication::Ketamine10mg => self.ketamine10mg.as_deref(),
        }
    }

    fn slot_mut(&mut self, medication: Medication) -> &mut Option<String> {
        match medication {
            Medication::Actiq => &mut self.actiq,
            Medication::Morphine => &mut self.morphine,
            Medication::Midazolam => &mut self.midazolam,
            Medication::Ketamine50mg => &mut self.ketamine50mg,
            Medication::Ketamine10mg => &mut self.ketamine10mg,
        }
    }
}

/// The values currently on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDraft {
    pub personal_number: String,
    pub equipment: EquipmentDraft,
    pub medical_supplies: SuppliesDraft,
}

impl FormDraft {
    pub fn serial(&self, serial: Serial) -> &str {
        match serial {
            Serial::PersonalWeapon => &self.equipment.personal_weapon_number,
            Serial::PersonalSights => &self.equipment.personal_sights_number,
            Serial::NightVision => &self.equipment.night_vision_number,
            Serial::Binoculars => &self.equipment.binoculars_number,
        }
    }

    /// Applies one edit. Blank quantity text clears the quantity (unset, not zero).
    pub fn set(&mut self, field: FieldPath, input: FieldInput) -> Result<(), ControllerError> {
        match (field, input) {
            (FieldPath::PersonalNumber, FieldInput::Text(text)) => self.personal_number = text,
            (FieldPath::Serial(serial), FieldInput::Text(text)) => {
                let slot = match serial {
                    Serial::PersonalWeapon => &mut self.equipment.personal_weapon_number,
                    Serial::PersonalSights => &mut self.equipment.personal_sights_number,
                    Serial::NightVision => &mut self.equipment.night_vision_number,
                    Serial::Binoculars => &mut self.equipment.binoculars_number,
                };
                *slot = text;
            }
            (FieldPath::HasCompass, FieldInput::Flag(flag)) => self.equipment.has_compass = flag,
            (FieldPath::Medication(medication), FieldInput::Text(text)) => {
                let trimmed = text.trim();
                *self.medical_supplies.slot_mut(medication) = if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                };
            }
            (field, _) => {
                return Err(ControllerError::FieldKindMismatch {
                    field: field.as_str(),
                    expected: match field.kind() {
                        FieldKind::Flag => "a boolean",
                        FieldKind::Text | FieldKind::Quantity => "text",
                    },
                })
            }
        }
        Ok(())
    }

    /// Shapes the draft the way the schema expects it.
    ///
    /// Quantity text that reads as an integer becomes a JSON number; anything else
    /// stays text so that the schema rejects it.
    pub fn to_candidate(&self) -> Value {
        let mut supplies = Map::new();
        for medication in Medication::ALL {
            if let Some(raw) = self.medical_supplies.get(medication) {
                supplies.insert(medication.key().to_string(), quantity_value(raw));
            }
        }

        json!({
            "personalNumber": self.personal_number,
            "equipment": {
                "personalWeaponNumber": self.equipment.personal_weapon_number,
                "personalSightsNumber": self.equipment.personal_sights_number,
                "nightVisionNumber": self.equipment.night_vision_number,
                "binocularsNumber": self.equipment.binoculars_number,
                "hasCompass": self.equipment.has_compass,
            },
            "medicalSupplies": supplies,
        })
    }
}

/// Quantity text as the schema sees it. Whole numbers outside `i64` saturate,
/// keeping their sign, so they still read as too large or negative.
fn quantity_value(raw: &str) -> Value {
    let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Value::String(raw.to_string());
    }
    match raw.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) if raw.starts_with('-') => Value::from(i64::MIN),
        Err(_) => Value::from(u64::MAX),
    }
}

/// Field values, errors and lifecycle of one page session.
#[derive(Debug)]
pub struct FormController {
    state: FormState,
    directory: DirectoryState,
    draft: FormDraft,
    errors: ValidationErrors,
    form_message: Option<&'static str>,
    notifications: Vec<Notification>,
    generation: u64,
}

impl Default for FormController {
    fn default() -> Self {
        Self::new()
    }
}

impl FormController {
    /// An empty form waiting for the directory.
    pub fn new() -> Self {
        Self {
            state: FormState::Idle,
            directory: DirectoryState::Pending,
            draft: FormDraft::default(),
            errors: ValidationErrors::default(),
            form_message: None,
            notifications: Vec::new(),
            generation: 0,
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn directory(&self) -> &DirectoryState {
        &self.directory
    }

    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn form_message(&self) -> Option<&'static str> {
        self.form_message
    }

    /// Number of acknowledged submissions so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Records the outcome of the one-time directory fetch.
    pub fn directory_loaded(&mut self, result: Result<DirectorySnapshot, String>) {
        if !self.directory.is_pending() {
            tracing::warn!("directory result ignored: already loaded");
            return;
        }
        self.directory = match result {
            Ok(snapshot) => {
                tracing::info!(count = snapshot.len(), "personal numbers loaded");
                DirectoryState::Ready(snapshot)
            }
            Err(reason) => DirectoryState::Unavailable(reason),
        };
    }

    pub fn personal_number_status(&self) -> PersonalNumberStatus {
        if self.draft.personal_number.is_empty() {
            return PersonalNumberStatus::Empty;
        }
        match self.directory.snapshot() {
            None => PersonalNumberStatus::Checking,
            Some(snapshot) if snapshot.contains(&self.draft.personal_number) => {
                PersonalNumberStatus::Known
            }
            Some(_) => PersonalNumberStatus::NotFound,
        }
    }

    /// Inline message under the personal number field.
    pub fn personal_number_message(&self) -> Option<&'static str> {
        match self.personal_number_status() {
            PersonalNumberStatus::NotFound => Some(MSG_PERSONAL_NUMBER_NOT_FOUND),
            _ => None,
        }
    }

    pub fn submit_availability(&self) -> SubmitAvailability {
        match self.state {
            FormState::Validating | FormState::Submitting => {
                return SubmitAvailability::SubmissionInFlight
            }
            FormState::Submitted => return SubmitAvailability::AwaitingReset,
            FormState::Idle | FormState::Editing | FormState::SubmitFailed => {}
        }
        match self.directory {
            DirectoryState::Pending => return SubmitAvailability::DirectoryPending,
            DirectoryState::Unavailable(_) => return SubmitAvailability::DirectoryUnavailable,
            DirectoryState::Ready(_) => {}
        }
        match self.personal_number_status() {
            PersonalNumberStatus::Empty => SubmitAvailability::PersonalNumberMissing,
            PersonalNumberStatus::NotFound | PersonalNumberStatus::Checking => {
                SubmitAvailability::PersonalNumberNotFound
            }
            PersonalNumberStatus::Known => SubmitAvailability::Available,
        }
    }

    /// Applies one user edit.
    ///
    /// # Errors
    ///
    /// - `Locked` while a submission is in flight or its confirmation is showing,
    /// - `DirectoryUnavailable` once the directory failed to load,
    /// - `DirectoryPending` for the personal number while the directory loads,
    /// - `FieldKindMismatch` when a flag is sent to a text field or vice versa.
    pub fn set_field(&mut self, field: FieldPath, input: FieldInput) -> Result<(), ControllerError> {
        match self.state {
            FormState::Validating | FormState::Submitting | FormState::Submitted => {
                return Err(ControllerError::Locked(self.state))
            }
            FormState::Idle | FormState::Editing | FormState::SubmitFailed => {}
        }
        if self.directory.is_unavailable() {
            return Err(ControllerError::DirectoryUnavailable);
        }
        if field == FieldPath::PersonalNumber && self.directory.is_pending() {
            return Err(ControllerError::DirectoryPending);
        }

        self.draft.set(field, input)?;
        self.errors.clear_field(field);
        if self.errors.is_empty() {
            self.form_message = None;
        }
        self.state = FormState::Editing;
        Ok(())
    }

    /// Validates and, when valid, moves to `Submitting`.
    ///
    /// Returns the report to send. On validation failure the form returns to
    /// `Editing` with per-field errors and nothing must be sent.
    ///
    /// # Errors
    ///
    /// `ControllerError::SubmitUnavailable` when the submit action is not offered,
    /// `ReportError::Validation` when the schema rejects the draft.
    pub fn begin_submit(&mut self) -> ReportResult<ReportFormData> {
        let availability = self.submit_availability();
        if !availability.is_available() {
            tracing::warn!(?availability, "submit rejected");
            return Err(ControllerError::SubmitUnavailable(availability).into());
        }

        self.state = FormState::Validating;
        let validated = schema::validate(&self.draft.to_candidate())
            .and_then(|data| schema::validate_report(&data).map(|()| data));

        match validated {
            Ok(data) => {
                self.errors = ValidationErrors::default();
                self.form_message = None;
                self.state = FormState::Submitting;
                Ok(data)
            }
            Err(errors) => {
                tracing::warn!("report withheld: {}", errors);
                self.errors = errors.clone();
                self.form_message = Some(MSG_FIX_FIELDS);
                self.state = FormState::Editing;
                Err(errors.into())
            }
        }
    }

    /// Records the backend's answer to the in-flight submission.
    ///
    /// Returns the submission generation on success, which the caller hands back
    /// to [`FormController::reset`] once the confirmation delay has elapsed.
    pub fn complete_submit(
        &mut self,
        result: &Result<SubmissionReceipt, SubmissionError>,
    ) -> Option<u64> {
        if self.state != FormState::Submitting {
            tracing::warn!(state = ?self.state, "submission result ignored");
            return None;
        }
        match result {
            Ok(_) => {
                self.generation += 1;
                self.state = FormState::Submitted;
                self.notify(NotificationLevel::Success, MSG_SUBMIT_SUCCESS);
                Some(self.generation)
            }
            Err(_) => {
                self.state = FormState::SubmitFailed;
                self.notify(NotificationLevel::Error, MSG_SUBMIT_FAILED);
                None
            }
        }
    }

    /// Clears the form after a confirmed submission.
    ///
    /// Only acts while the confirmation for `generation` is still showing.
    pub fn reset(&mut self, generation: u64) -> bool {
        if self.state != FormState::Submitted || self.generation != generation {
            return false;
        }
        self.draft = FormDraft::default();
        self.errors = ValidationErrors::default();
        self.form_message = None;
        self.state = FormState::Editing;
        true
    }

    /// Takes the notifications raised since the last call.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    fn notify(&mut self, level: NotificationLevel, message: &str) {
        self.notifications.push(Notification {
            level,
            message: message.to_string(),
        });
    }
}
