//! Translation from form-editor drafts to backend payloads
//!
//! Drafts come from an editor speaking camelCase with loosely typed fields
//! (ids as strings, dates as whatever the picker produced). The backend wants
//! snake_case, integer ids and an ISO due date.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{FormData, FormStatus, Question};
use crate::utils::{DEFAULT_DEPARTMENT_ID, DEFAULT_TRAINER_ID, DateInput, coerce_date, coerce_id};

/// A form as edited on the client
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDraft {
    /// Title
    #[serde(default)]
    pub title: String,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Department id, numeric or numeric string
    #[serde(default)]
    pub department_id: Option<Value>,

    /// Trainer id, numeric or numeric string
    #[serde(default)]
    pub trainer_id: Option<Value>,

    /// Due date in any shape the editor produced
    #[serde(default)]
    pub due_date: Option<DateInput>,

    /// Draft or published
    #[serde(default)]
    pub status: FormStatus,

    /// Questions in display order
    #[serde(default)]
    pub questions: Vec<Question>,

    /// Form settings
    #[serde(default)]
    pub settings: Value,

    /// Training session details
    #[serde(default)]
    pub session: Value,
}

/// The create/update body the backend expects
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormPayload {
    /// Title
    pub title: String,

    /// Description
    pub description: String,

    /// Department id
    pub department_id: i64,

    /// Trainer id
    pub trainer_id: i64,

    /// ISO due date, or `null`
    pub due_date: Option<String>,

    /// Draft or published
    pub status: FormStatus,

    /// Questions, settings and session
    pub form_data: FormData,
}

impl FormDraft {
    /// Translate the draft into the backend payload.
    ///
    /// Never fails: unusable ids fall back to the defaults and an unusable
    /// due date becomes `null`.
    pub fn to_payload(&self) -> FormPayload {
        let due_date = self.due_date.as_ref().and_then(coerce_date);

        FormPayload {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            department_id: coerce_id(self.department_id.as_ref(), DEFAULT_DEPARTMENT_ID),
            trainer_id: coerce_id(self.trainer_id.as_ref(), DEFAULT_TRAINER_ID),
            due_date,
            status: self.status,
            form_data: FormData {
                questions: self.questions.clone(),
                settings: object_or_empty(&self.settings),
                session: object_or_empty(&self.session),
            },
        }
    }
}

fn object_or_empty(value: &Value) -> Value {
    if value.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        value.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_camel_case_draft_becomes_snake_case_payload() {
        let draft: FormDraft = serde_json::from_value(json!({
            "title": "  Line check feedback ",
            "description": "Recurrent training",
            "departmentId": "4",
            "trainerId": 9,
            "dueDate": "2024-07-01T00:00:00.000Z",
            "status": "published",
            "questions": [{"id": 1, "text": "Overall rating", "type": "rating"}],
            "settings": {"anonymous": false},
            "session": {"date": "2024-06-20", "aircraft": "B737"}
        }))
        .unwrap();

        let payload = serde_json::to_value(draft.to_payload()).unwrap();

        assert_eq!(
            payload,
            json!({
                "title": "Line check feedback",
                "description": "Recurrent training",
                "department_id": 4,
                "trainer_id": 9,
                "due_date": "2024-07-01T00:00:00.000Z",
                "status": "published",
                "form_data": {
                    "questions": [{"id": "1", "text": "Overall rating", "type": "rating", "required": false}],
                    "settings": {"anonymous": false},
                    "session": {"date": "2024-06-20", "aircraft": "B737"}
                }
            })
        );
    }

    #[test]
    fn test_missing_fields_take_fallbacks() {
        let draft: FormDraft = serde_json::from_value(json!({
            "title": "Untargeted",
            "departmentId": "not-a-number",
            "dueDate": {"broken": true}
        }))
        .unwrap();

        let payload = draft.to_payload();
        assert_eq!(payload.department_id, DEFAULT_DEPARTMENT_ID);
        assert_eq!(payload.trainer_id, DEFAULT_TRAINER_ID);
        assert_eq!(payload.due_date, None);
        assert_eq!(payload.status, FormStatus::Draft);
        assert_eq!(payload.form_data.settings, json!({}));
    }

    #[test]
    fn test_typed_due_date() {
        let draft = FormDraft {
            title: "Typed".to_string(),
            due_date: Some(Utc.with_ymd_and_hms(2024, 8, 15, 17, 0, 0).unwrap().into()),
            ..FormDraft::default()
        };

        assert_eq!(
            draft.to_payload().due_date.as_deref(),
            Some("2024-08-15T17:00:00.000Z")
        );
    }
}
