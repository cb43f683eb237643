//! Rendering of controller state into page API bodies.

use serde::Serialize;
use uuid::Uuid;

use api_shared::dto;
use report_core::constants::{
    CONFIRMATION_TITLE, LABEL_SUBMIT, LABEL_SUBMITTING, MSG_DIRECTORY_LOADING,
    MSG_DIRECTORY_UNAVAILABLE, MSG_THANK_YOU, PAGE_SUBTITLE, PAGE_TITLE, SECTION_EQUIPMENT,
    SECTION_MEDICAL_SUPPLIES, SECTION_MEDICAL_SUPPLIES_HINT, SECTION_PERSONAL_DETAILS,
};
use report_core::{
    DirectoryState, FieldKind, FieldPath, FormController, FormDraft, FormState, Medication,
    Serial, ThemeContext,
};

/// Renders a unit enum through its serde name, e.g. `SubmitFailed` as `submitFailed`.
fn wire_name<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_owned))
        .unwrap_or_default()
}

fn field_descriptor(field: FieldPath) -> dto::FieldDescriptor {
    let kind = match field.kind() {
        FieldKind::Text => "text",
        FieldKind::Flag => "flag",
        FieldKind::Quantity => "quantity",
    };
    dto::FieldDescriptor {
        path: field.as_str().to_string(),
        label: field.label().to_string(),
        kind: kind.to_string(),
        placeholder: field.placeholder().map(str::to_string),
    }
}

/// Static layout of the form page.
pub fn page_descriptor() -> dto::PageDescriptor {
    let equipment = Serial::ALL
        .into_iter()
        .map(FieldPath::Serial)
        .chain(std::iter::once(FieldPath::HasCompass));

    dto::PageDescriptor {
        title: PAGE_TITLE.to_string(),
        subtitle: PAGE_SUBTITLE.to_string(),
        sections: vec![
            dto::SectionDescriptor {
                title: SECTION_EQUIPMENT.to_string(),
                description: None,
                fields: equipment.map(field_descriptor).collect(),
            },
            dto::SectionDescriptor {
                title: SECTION_MEDICAL_SUPPLIES.to_string(),
                description: Some(SECTION_MEDICAL_SUPPLIES_HINT.to_string()),
                fields: Medication::ALL
                    .into_iter()
                    .map(|m| field_descriptor(m.field()))
                    .collect(),
            },
            dto::SectionDescriptor {
                title: SECTION_PERSONAL_DETAILS.to_string(),
                description: None,
                fields: vec![field_descriptor(FieldPath::PersonalNumber)],
            },
        ],
        submit_label: LABEL_SUBMIT.to_string(),
    }
}

fn form_values(draft: &FormDraft) -> dto::FormValues {
    let supplies = |m: Medication| draft.medical_supplies.get(m).map(str::to_string);
    dto::FormValues {
        personal_number: draft.personal_number.clone(),
        equipment: dto::EquipmentValues {
            personal_weapon_number: draft.serial(Serial::PersonalWeapon).to_string(),
            personal_sights_number: draft.serial(Serial::PersonalSights).to_string(),
            night_vision_number: draft.serial(Serial::NightVision).to_string(),
            binoculars_number: draft.serial(Serial::Binoculars).to_string(),
            has_compass: draft.equipment.has_compass,
        },
        medical_supplies: dto::MedicalSuppliesValues {
            actiq: supplies(Medication::Actiq),
            morphine: supplies(Medication::Morphine),
            midazolam: supplies(Medication::Midazolam),
            ketamine50mg: supplies(Medication::Ketamine50mg),
            ketamine10mg: supplies(Medication::Ketamine10mg),
        },
    }
}

/// Renders one session. Drains the notifications raised since the previous view.
pub fn form_view(session: Uuid, controller: &mut FormController) -> dto::FormView {
    let state = controller.state();
    let availability = controller.submit_availability();

    let (page, loading_message, page_error) = match controller.directory() {
        DirectoryState::Unavailable(_) => {
            ("unavailable", None, Some(MSG_DIRECTORY_UNAVAILABLE.to_string()))
        }
        DirectoryState::Pending => ("loading", Some(MSG_DIRECTORY_LOADING.to_string()), None),
        DirectoryState::Ready(_) if state == FormState::Submitted => ("submitted", None, None),
        DirectoryState::Ready(_) => ("ready", None, None),
    };

    let confirmation = (page == "submitted").then(|| dto::ConfirmationRes {
        title: CONFIRMATION_TITLE.to_string(),
        message: MSG_THANK_YOU.to_string(),
    });

    let label = match state {
        FormState::Validating | FormState::Submitting => LABEL_SUBMITTING,
        _ => LABEL_SUBMIT,
    };

    let notifications = controller
        .drain_notifications()
        .into_iter()
        .map(|n| dto::NotificationRes {
            level: wire_name(&n.level),
            message: n.message,
        })
        .collect();

    dto::FormView {
        session_id: session.to_string(),
        page: page.to_string(),
        form_state: wire_name(&state),
        values: (page != "unavailable").then(|| form_values(controller.draft())),
        field_errors: controller
            .errors()
            .iter()
            .map(|e| dto::FieldErrorRes {
                path: e.path.clone(),
                message: e.message.clone(),
            })
            .collect(),
        form_message: controller.form_message().map(str::to_string),
        personal_number: dto::PersonalNumberRes {
            status: wire_name(&controller.personal_number_status()),
            message: controller.personal_number_message().map(str::to_string),
        },
        submit: dto::SubmitRes {
            enabled: availability.is_available(),
            availability: wire_name(&availability),
            label: label.to_string(),
        },
        notifications,
        loading_message,
        confirmation,
        page_error,
    }
}

pub fn theme_res(theme: &ThemeContext) -> dto::ThemeRes {
    dto::ThemeRes {
        theme: theme.theme().as_str().to_string(),
        is_dark_mode: theme.is_dark_mode(),
        applied_theme: theme.applied_theme().as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_core::{DirectorySnapshot, FieldInput};

    #[test]
    fn descriptor_lists_every_field_once() {
        let page = page_descriptor();
        let paths: Vec<_> = page
            .sections
            .iter()
            .flat_map(|s| s.fields.iter().map(|f| f.path.clone()))
            .collect();
        let expected: Vec<_> = FieldPath::all().map(|f| f.as_str().to_string()).collect();
        assert_eq!(paths, expected);
        assert_eq!(page.sections[1].fields[0].kind, "quantity");
    }

    #[test]
    fn unavailable_directory_hides_values() {
        let mut controller = FormController::new();
        controller.directory_loaded(Err("503".into()));

        let view = form_view(Uuid::new_v4(), &mut controller);
        assert_eq!(view.page, "unavailable");
        assert!(view.values.is_none());
        assert_eq!(view.page_error.as_deref(), Some(MSG_DIRECTORY_UNAVAILABLE));
        assert_eq!(view.submit.availability, "directoryUnavailable");
    }

    #[test]
    fn unknown_personal_number_is_flagged_inline() {
        let mut controller = FormController::new();
        controller.directory_loaded(Ok(DirectorySnapshot::from_iter([12345u64])));
        controller
            .set_field(FieldPath::PersonalNumber, FieldInput::Text("99999".into()))
            .unwrap();

        let view = form_view(Uuid::new_v4(), &mut controller);
        assert_eq!(view.page, "ready");
        assert_eq!(view.personal_number.status, "notFound");
        assert_eq!(
            view.personal_number.message.as_deref(),
            Some("מספר אישי לא קיים במערכת")
        );
        assert!(!view.submit.enabled);
        assert_eq!(view.submit.availability, "personalNumberNotFound");
    }
}
