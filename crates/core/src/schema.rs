//! Daily report shape and validation.
//!
//! The schema accepts a loosely typed candidate (`serde_json::Value`) and either
//! produces a typed [`ReportFormData`] or the full list of field errors. It never
//! looks at the personal number directory: presence of the personal number is the
//! only rule for that field here, membership is checked by the controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::ControllerError;

const MSG_REQUIRED: &str = "שדה חובה";
const MSG_EXPECTED_TEXT: &str = "יש להזין טקסט";
const MSG_EXPECTED_BOOLEAN: &str = "ערך לא תקין";
const MSG_EXPECTED_WHOLE_NUMBER: &str = "יש להזין מספר שלם";
const MSG_NEGATIVE_QUANTITY: &str = "הכמות חייבת להיות 0 או יותר";
const MSG_QUANTITY_TOO_LARGE: &str = "הכמות גדולה מדי";
const MSG_EXPECTED_SECTION: &str = "מבנה טופס לא תקין";

/// Serial numbers of the gear assigned to the reporting soldier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_weapon_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_sights_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub night_vision_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binoculars_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_compass: Option<bool>,
}

/// Dose counts carried by the reporting soldier. Unset means "not reported".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalSupplies {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actiq: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morphine: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midazolam: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ketamine50mg: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ketamine10mg: Option<u32>,
}

impl MedicalSupplies {
    fn slot_mut(&mut self, medication: Medication) -> &mut Option<u32> {
        match medication {
            Medication::Actiq => &mut self.actiq,
            Medication::Morphine => &mut self.morphine,
            Medication::Midazolam => &mut self.midazolam,
            Medication::Ketamine50mg => &mut self.ketamine50mg,
            Medication::Ketamine10mg => &mut self.ketamine10mg,
        }
    }

    pub fn get(&self, medication: Medication) -> Option<u32> {
        match medication {
            Medication::Actiq => self.actiq,
            Medication::Morphine => self.morphine,
            Medication::Midazolam => self.midazolam,
            Medication::Ketamine50mg => self.ketamine50mg,
            Medication::Ketamine10mg => self.ketamine10mg,
        }
    }
}

/// What the page submits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFormData {
    pub personal_number: String,
    pub equipment: Equipment,
    pub medical_supplies: MedicalSupplies,
}

/// A stored daily report as the backend keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub personal_number: String,
    pub equipment: Equipment,
    pub medical_supplies: MedicalSupplies,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Report {
    /// Wraps form data in a new, not yet submitted report.
    pub fn from_form(data: ReportFormData, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: None,
            personal_number: data.personal_number,
            equipment: data.equipment,
            medical_supplies: data.medical_supplies,
            timestamp,
            submitted_at: None,
        }
    }

    pub fn mark_submitted(&mut self, at: DateTime<Utc>) {
        self.submitted_at = Some(at);
    }
}

/// The five tracked medications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Medication {
    Actiq,
    Morphine,
    Midazolam,
    Ketamine50mg,
    Ketamine10mg,
}

impl Medication {
    pub const ALL: [Medication; 5] = [
        Medication::Actiq,
        Medication::Morphine,
        Medication::Midazolam,
        Medication::Ketamine50mg,
        Medication::Ketamine10mg,
    ];

    /// JSON key inside `medicalSupplies`.
    pub fn key(self) -> &'static str {
        match self {
            Medication::Actiq => "actiq",
            Medication::Morphine => "morphine",
            Medication::Midazolam => "midazolam",
            Medication::Ketamine50mg => "ketamine50mg",
            Medication::Ketamine10mg => "ketamine10mg",
        }
    }

    pub fn field(self) -> FieldPath {
        FieldPath::Medication(self)
    }
}

/// The four equipment serial number fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Serial {
    PersonalWeapon,
    PersonalSights,
    NightVision,
    Binoculars,
}

impl Serial {
    pub const ALL: [Serial; 4] = [
        Serial::PersonalWeapon,
        Serial::PersonalSights,
        Serial::NightVision,
        Serial::Binoculars,
    ];

    /// JSON key inside `equipment`.
    pub fn key(self) -> &'static str {
        match self {
            Serial::PersonalWeapon => "personalWeaponNumber",
            Serial::PersonalSights => "personalSightsNumber",
            Serial::NightVision => "nightVisionNumber",
            Serial::Binoculars => "binocularsNumber",
        }
    }

    pub fn field(self) -> FieldPath {
        FieldPath::Serial(self)
    }
}

/// How a field is entered on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Flag,
    Quantity,
}

/// Addressable form field, rendered as its dotted JSON path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldPath {
    PersonalNumber,
    Serial(Serial),
    HasCompass,
    Medication(Medication),
}

impl FieldPath {
    /// Every field in page order.
    pub fn all() -> impl Iterator<Item = FieldPath> {
        Serial::ALL
            .into_iter()
            .map(FieldPath::Serial)
            .chain(std::iter::once(FieldPath::HasCompass))
            .chain(Medication::ALL.into_iter().map(FieldPath::Medication))
            .chain(std::iter::once(FieldPath::PersonalNumber))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldPath::PersonalNumber => "personalNumber",
            FieldPath::Serial(Serial::PersonalWeapon) => "equipment.personalWeaponNumber",
            FieldPath::Serial(Serial::PersonalSights) => "equipment.personalSightsNumber",
            FieldPath::Serial(Serial::NightVision) => "equipment.nightVisionNumber",
            FieldPath::Serial(Serial::Binoculars) => "equipment.binocularsNumber",
            FieldPath::HasCompass => "equipment.hasCompass",
            FieldPath::Medication(Medication::Actiq) => "medicalSupplies.actiq",
            FieldPath::Medication(Medication::Morphine) => "medicalSupplies.morphine",
            FieldPath::Medication(Medication::Midazolam) => "medicalSupplies.midazolam",
            FieldPath::Medication(Medication::Ketamine50mg) => "medicalSupplies.ketamine50mg",
            FieldPath::Medication(Medication::Ketamine10mg) => "medicalSupplies.ketamine10mg",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldPath::PersonalNumber | FieldPath::Serial(_) => FieldKind::Text,
            FieldPath::HasCompass => FieldKind::Flag,
            FieldPath::Medication(_) => FieldKind::Quantity,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FieldPath::PersonalNumber => "מס׳ אישי",
            FieldPath::Serial(Serial::PersonalWeapon) => "מס׳ נשק אישי",
            FieldPath::Serial(Serial::PersonalSights) => "מס׳ כוונות אישית",
            FieldPath::Serial(Serial::NightVision) => "מס׳ אמר״ל",
            FieldPath::Serial(Serial::Binoculars) => "מס׳ משקפת",
            FieldPath::HasCompass => "מצפן (יש או אין)",
            FieldPath::Medication(Medication::Actiq) => "אקטיק",
            FieldPath::Medication(Medication::Morphine) => "מורפין",
            FieldPath::Medication(Medication::Midazolam) => "מידזולם",
            FieldPath::Medication(Medication::Ketamine50mg) => "קטאמין 50 מ״ג",
            FieldPath::Medication(Medication::Ketamine10mg) => "קטאמין 10 מ״ג",
        }
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            FieldPath::PersonalNumber => Some("הכנס מספר אישי..."),
            FieldPath::Serial(Serial::PersonalWeapon) => Some("הכנס מספר נשק..."),
            FieldPath::Serial(Serial::PersonalSights) => Some("הכנס מספר כוונות..."),
            FieldPath::Serial(Serial::NightVision) => Some("הכנס מספר אמר״ל..."),
            FieldPath::Serial(Serial::Binoculars) => Some("הכנס מספר משקפת..."),
            FieldPath::HasCompass => None,
            FieldPath::Medication(_) => Some("כמות..."),
        }
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldPath {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::all()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| ControllerError::UnknownField(s.to_string()))
    }
}

impl Serialize for FieldPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One rejected value, keyed by its dotted path (`"$"` for the root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

/// All errors found in one validation pass, in schema declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    fn push(&mut self, path: impl Into<String>, message: &str) {
        self.0.push(FieldError {
            path: path.into(),
            message: message.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Drops the errors recorded for `field`.
    pub fn clear_field(&mut self, field: FieldPath) {
        self.0.retain(|e| e.path != field.as_str());
    }

    /// Message attached to `field`, if any.
    pub fn for_field(&self, field: FieldPath) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.path == field.as_str())
            .map(|e| e.message.as_str())
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect();
        write!(f, "validation failed ({})", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Validates a candidate report.
///
/// # Errors
///
/// Returns every field error found; nothing is short-circuited after the first.
pub fn validate(candidate: &Value) -> Result<ReportFormData, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let mut data = ReportFormData::default();

    let Some(root) = candidate.as_object() else {
        errors.push("$", MSG_EXPECTED_SECTION);
        return Err(errors);
    };

    match root.get("personalNumber") {
        Some(Value::String(s)) if !s.is_empty() => data.personal_number = s.clone(),
        Some(Value::String(_)) | None | Some(Value::Null) => {
            errors.push(FieldPath::PersonalNumber.as_str(), MSG_REQUIRED)
        }
        Some(_) => errors.push(FieldPath::PersonalNumber.as_str(), MSG_EXPECTED_TEXT),
    }

    if let Some(equipment) = section(root, "equipment", &mut errors) {
        data.equipment = validate_equipment(equipment, &mut errors);
    }

    if let Some(supplies) = section(root, "medicalSupplies", &mut errors) {
        data.medical_supplies = validate_supplies(supplies, &mut errors);
    }

    if errors.is_empty() {
        Ok(data)
    } else {
        Err(errors)
    }
}

/// Re-checks a typed report before it leaves the page.
///
/// Quantities are non-negative by construction, so only the personal number
/// presence rule remains.
pub fn validate_report(data: &ReportFormData) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if data.personal_number.is_empty() {
        errors.push(FieldPath::PersonalNumber.as_str(), MSG_REQUIRED);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn section<'a>(
    root: &'a Map<String, Value>,
    key: &str,
    errors: &mut ValidationErrors,
) -> Option<&'a Map<String, Value>> {
    match root.get(key) {
        Some(Value::Object(map)) => Some(map),
        None | Some(Value::Null) => {
            errors.push(key, MSG_REQUIRED);
            None
        }
        Some(_) => {
            errors.push(key, MSG_EXPECTED_SECTION);
            None
        }
    }
}

fn validate_equipment(map: &Map<String, Value>, errors: &mut ValidationErrors) -> Equipment {
    let mut equipment = Equipment::default();

    for serial in Serial::ALL {
        let value = match map.get(serial.key()) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                errors.push(serial.field().as_str(), MSG_EXPECTED_TEXT);
                None
            }
        };
        match serial {
            Serial::PersonalWeapon => equipment.personal_weapon_number = value,
            Serial::PersonalSights => equipment.personal_sights_number = value,
            Serial::NightVision => equipment.night_vision_number = value,
            Serial::Binoculars => equipment.binoculars_number = value,
        }
    }

    equipment.has_compass = match map.get("hasCompass") {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => {
            errors.push(FieldPath::HasCompass.as_str(), MSG_EXPECTED_BOOLEAN);
            None
        }
    };

    equipment
}

fn validate_supplies(map: &Map<String, Value>, errors: &mut ValidationErrors) -> MedicalSupplies {
    let mut supplies = MedicalSupplies::default();

    for medication in Medication::ALL {
        let path = medication.field().as_str();
        let value = match map.get(medication.key()) {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => {
                if let Some(v) = n.as_u64() {
                    match u32::try_from(v) {
                        Ok(v) => Some(v),
                        Err(_) => {
                            errors.push(path, MSG_QUANTITY_TOO_LARGE);
                            None
                        }
                    }
                } else if n.as_i64().is_some() {
                    errors.push(path, MSG_NEGATIVE_QUANTITY);
                    None
                } else if n.as_f64().is_some_and(|f| f < 0.0) {
                    errors.push(path, MSG_NEGATIVE_QUANTITY);
                    None
                } else {
                    errors.push(path, MSG_EXPECTED_WHOLE_NUMBER);
                    None
                }
            }
            Some(_) => {
                errors.push(path, MSG_EXPECTED_WHOLE_NUMBER);
                None
            }
        };
        *supplies.slot_mut(medication) = value;
    }

    supplies
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate() -> Value {
        json!({
            "personalNumber": "12345",
            "equipment": {
                "personalWeaponNumber": "W-1",
                "personalSightsNumber": "",
                "nightVisionNumber": "",
                "binocularsNumber": "",
                "hasCompass": true
            },
            "medicalSupplies": { "actiq": 2 }
        })
    }

    #[test]
    fn accepts_minimal_valid_report() {
        let data = validate(&candidate()).expect("candidate should validate");
        assert_eq!(data.personal_number, "12345");
        assert_eq!(data.equipment.has_compass, Some(true));
        assert_eq!(data.equipment.personal_weapon_number.as_deref(), Some("W-1"));
        assert_eq!(data.medical_supplies.actiq, Some(2));
        assert_eq!(data.medical_supplies.morphine, None);
    }

    #[test]
    fn negative_quantity_flags_exact_field() {
        for medication in Medication::ALL {
            let mut value = candidate();
            value["medicalSupplies"][medication.key()] = json!(-1);

            let errors = validate(&value).expect_err("negative quantity must fail");
            assert_eq!(errors.len(), 1);
            assert_eq!(
                errors.for_field(medication.field()),
                Some(MSG_NEGATIVE_QUANTITY),
                "{medication:?} should be flagged"
            );
        }
    }

    #[test]
    fn non_numeric_quantity_is_rejected() {
        let mut value = candidate();
        value["medicalSupplies"]["morphine"] = json!("abc");
        value["medicalSupplies"]["midazolam"] = json!(1.5);

        let errors = validate(&value).unwrap_err();
        assert_eq!(
            errors.for_field(Medication::Morphine.field()),
            Some(MSG_EXPECTED_WHOLE_NUMBER)
        );
        assert_eq!(
            errors.for_field(Medication::Midazolam.field()),
            Some(MSG_EXPECTED_WHOLE_NUMBER)
        );
    }

    #[test]
    fn empty_personal_number_is_required() {
        let mut value = candidate();
        value["personalNumber"] = json!("");

        let errors = validate(&value).unwrap_err();
        assert_eq!(errors.for_field(FieldPath::PersonalNumber), Some(MSG_REQUIRED));
    }

    #[test]
    fn collects_all_errors_in_declaration_order() {
        let value = json!({
            "personalNumber": 5,
            "equipment": { "hasCompass": "yes" },
            "medicalSupplies": { "actiq": -3, "ketamine10mg": "x" }
        });

        let errors = validate(&value).unwrap_err();
        let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "personalNumber",
                "equipment.hasCompass",
                "medicalSupplies.actiq",
                "medicalSupplies.ketamine10mg"
            ]
        );
    }

    #[test]
    fn missing_sections_are_reported() {
        let errors = validate(&json!({ "personalNumber": "1" })).unwrap_err();
        let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["equipment", "medicalSupplies"]);

        let errors = validate(&json!([])).unwrap_err();
        assert_eq!(errors.iter().next().unwrap().path, "$");
    }

    #[test]
    fn field_paths_round_trip_through_strings() {
        for field in FieldPath::all() {
            assert_eq!(field.as_str().parse::<FieldPath>().unwrap(), field);
        }
        assert!("equipment.unknown".parse::<FieldPath>().is_err());
    }

    #[test]
    fn report_form_data_serialises_without_unset_fields() {
        let data = validate(&candidate()).unwrap();
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["medicalSupplies"], json!({ "actiq": 2 }));
        assert_eq!(json["equipment"]["hasCompass"], json!(true));
    }

    #[test]
    fn report_wraps_form_data() {
        let data = validate(&candidate()).unwrap();
        let now = Utc::now();
        let mut report = Report::from_form(data.clone(), now);
        assert_eq!(report.personal_number, data.personal_number);
        assert!(report.submitted_at.is_none());

        report.mark_submitted(now);
        assert_eq!(report.submitted_at, Some(now));
    }
}
