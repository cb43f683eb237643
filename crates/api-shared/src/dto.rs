//! Request and response bodies of the page API.
//!
//! Field names are camelCase on the wire, matching the report JSON shape.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// One input on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Dotted field path, e.g. `medicalSupplies.actiq`.
    pub path: String,
    pub label: String,
    /// `text`, `flag` or `quantity`.
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectionDescriptor {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldDescriptor>,
}

/// Static layout of the form page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageDescriptor {
    pub title: String,
    pub subtitle: String,
    pub sections: Vec<SectionDescriptor>,
    pub submit_label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentValues {
    pub personal_weapon_number: String,
    pub personal_sights_number: String,
    pub night_vision_number: String,
    pub binoculars_number: String,
    pub has_compass: bool,
}

/// Raw quantity inputs; absent means unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MedicalSuppliesValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actiq: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub morphine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub midazolam: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ketamine50mg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ketamine10mg: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormValues {
    pub personal_number: String,
    pub equipment: EquipmentValues,
    pub medical_supplies: MedicalSuppliesValues,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldErrorRes {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersonalNumberRes {
    /// `empty`, `checking`, `known` or `notFound`.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRes {
    pub enabled: bool,
    /// Why the submit action is (not) offered, e.g. `personalNumberNotFound`.
    pub availability: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NotificationRes {
    /// `success` or `error`.
    pub level: String,
    pub message: String,
}

/// Shown after the backend accepted a report, until the form resets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConfirmationRes {
    pub title: String,
    pub message: String,
}

/// Everything a client needs to render one page session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub session_id: String,
    /// `loading`, `ready`, `submitted` or `unavailable`.
    pub page: String,
    pub form_state: String,
    /// Absent when the page is unavailable: no field can be reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<FormValues>,
    pub field_errors: Vec<FieldErrorRes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_message: Option<String>,
    pub personal_number: PersonalNumberRes,
    pub submit: SubmitRes,
    pub notifications: Vec<NotificationRes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loading_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<ConfirmationRes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_error: Option<String>,
}

/// A boolean for the compass flag; text or a number for every other field.
///
/// Numbers are taken as the text they print as, so `2` and `"2"` are the same edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SetFieldReq {
    /// Dotted field path, e.g. `equipment.hasCompass`.
    pub field: String,
    pub value: FieldValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThemeRes {
    /// `dark`, `light` or `system`.
    pub theme: String,
    pub is_dark_mode: bool,
    /// Class applied to the document root: `dark` or `light`.
    pub applied_theme: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SetThemeReq {
    pub theme: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_value_accepts_text_and_flags() {
        let req: SetFieldReq =
            serde_json::from_str(r#"{"field":"equipment.hasCompass","value":true}"#).unwrap();
        assert_eq!(req.value, FieldValue::Flag(true));

        let req: SetFieldReq =
            serde_json::from_str(r#"{"field":"medicalSupplies.actiq","value":"2"}"#).unwrap();
        assert_eq!(req.value, FieldValue::Text("2".into()));
    }

    #[test]
    fn numeric_values_are_accepted() {
        let req: SetFieldReq =
            serde_json::from_str(r#"{"field":"medicalSupplies.actiq","value":2}"#).unwrap();
        assert_eq!(req.value, FieldValue::Integer(2));

        let req: SetFieldReq =
            serde_json::from_str(r#"{"field":"medicalSupplies.actiq","value":2.5}"#).unwrap();
        assert_eq!(req.value, FieldValue::Number(2.5));
    }

    #[test]
    fn unset_quantities_are_omitted() {
        let values = MedicalSuppliesValues {
            actiq: Some("2".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(values).unwrap(),
            serde_json::json!({ "actiq": "2" })
        );
    }
}
