//! Constants used throughout the report core crate.
//!
//! Backend paths, defaults and the user-facing (Hebrew) messages live here so that
//! the controller, the workflow and the page API all agree on them.

use std::time::Duration;

/// Backend path listing the valid personal numbers.
pub const PERSONAL_NUMBERS_PATH: &str = "/soldiers/personal-numbers";

/// Backend path listing soldier records.
pub const SOLDIERS_PATH: &str = "/soldiers";

/// Backend path accepting daily report submissions.
pub const REPORTS_PATH: &str = "/reports";

/// Default backend base URL when none is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";

/// Delay between a confirmed submission and the form reset.
pub const DEFAULT_RESET_DELAY: Duration = Duration::from_secs(3);

/// Default timeout applied to every backend request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time a page session may go untouched before it is dropped.
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// How often idle page sessions are swept.
pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Default file holding persisted page preferences.
pub const DEFAULT_PREFERENCES_FILE: &str = "preferences.yaml";

/// Default key under which the theme preference is stored.
pub const DEFAULT_THEME_STORAGE_KEY: &str = "report-ui-theme";

/// Toast shown after the backend acknowledges a report.
pub const MSG_SUBMIT_SUCCESS: &str = "דיווח נשלח בהצלחה";

/// Toast shown when the backend rejects or cannot be reached.
pub const MSG_SUBMIT_FAILED: &str = "שגיאה בשליחת הדיווח. נא לנסות שוב.";

/// Inline message under the personal number field.
pub const MSG_PERSONAL_NUMBER_NOT_FOUND: &str = "מספר אישי לא קיים במערכת";

/// Full-page message when the directory could not be loaded.
pub const MSG_DIRECTORY_UNAVAILABLE: &str = "שגיאה בטעינת הנתונים. נא לרענן את הדף.";

/// Shown while the directory is loading.
pub const MSG_DIRECTORY_LOADING: &str = "טוען מספרים אישיים...";

/// Shown when schema validation withholds a submission.
pub const MSG_FIX_FIELDS: &str = "נא לתקן את השדות המסומנים";

/// Confirmation shown between acknowledgment and reset.
pub const MSG_THANK_YOU: &str = "הדיווח היומי שלך נקלט בהצלחה. הטופס יתאפס בעוד רגע.";

/// Submit button label when idle.
pub const LABEL_SUBMIT: &str = "שלח דיווח";

/// Submit button label while a report is in flight.
pub const LABEL_SUBMITTING: &str = "שולח דיווח...";

/// Page title.
pub const PAGE_TITLE: &str = "דיווח יומי";

/// Page subtitle.
pub const PAGE_SUBTITLE: &str = "דווח על מצב הציוד והסמים. כל השדות למעט השם אופציונליים.";

/// Heading of the confirmation view.
pub const CONFIRMATION_TITLE: &str = "תודה!";

/// Section headings, in page order.
pub const SECTION_EQUIPMENT: &str = "ארמו״ן";
pub const SECTION_MEDICAL_SUPPLIES: &str = "סמים";
pub const SECTION_MEDICAL_SUPPLIES_HINT: &str = "הכנס כמות";
pub const SECTION_PERSONAL_DETAILS: &str = "פרטים אישיים";
