//! Transport DTOs mirrored from the `AeroFeedback` backend
//!
//! These are held only as transient state by callers. Unknown fields are
//! ignored on the way in, and the nested, backend-owned parts of a form
//! (`settings`, `session`, extra question attributes) stay opaque JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::utils::{id_string, lenient_timestamp};

/// Department reference data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// Department ID
    pub id: i64,

    /// Display name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

/// A trainer who can own forms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trainer {
    /// Trainer ID
    pub id: i64,

    /// Full name
    pub name: String,

    /// Contact email
    #[serde(default)]
    pub email: Option<String>,

    /// Department the trainer belongs to
    #[serde(default)]
    pub department_id: Option<i64>,
}

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Platform administrator
    Admin,
    /// Trainer creating forms
    Trainer,
    /// Department answering forms
    Department,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Trainer => write!(f, "trainer"),
            Self::Department => write!(f, "department"),
        }
    }
}

/// Authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User ID
    pub id: i64,

    /// Login email
    pub email: String,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Role
    pub role: Role,

    /// Department for department-role accounts
    #[serde(default)]
    pub department_id: Option<i64>,
}

/// Lifecycle of a form-creation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormRequestStatus {
    /// Not yet submitted
    Draft,
    /// Awaiting admin review
    #[default]
    Pending,
    /// Approved by an admin
    Approved,
    /// Rejected by an admin
    Rejected,
    /// A form has been created from it
    Processed,
}

impl fmt::Display for FormRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Processed => "processed",
        };
        f.pad(label)
    }
}

/// A trainer's request to create a new form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormRequest {
    /// Request ID
    pub id: i64,

    /// Requesting trainer
    #[serde(default)]
    pub requester: Option<i64>,

    /// Proposed form title
    #[serde(default)]
    pub title: Option<String>,

    /// Why the form is needed
    #[serde(default)]
    pub reason: Option<String>,

    /// Current status
    #[serde(default)]
    pub status: FormRequestStatus,

    /// Creation time
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,

    /// Last update time
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body for creating a form request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFormRequest {
    /// Proposed form title
    pub title: String,

    /// Why the form is needed
    pub reason: String,

    /// Department the form targets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<i64>,
}

/// Publication state of a form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormStatus {
    /// Still being edited
    #[default]
    Draft,
    /// Open for responses
    Published,
}

impl fmt::Display for FormStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => f.pad("draft"),
            Self::Published => f.pad("published"),
        }
    }
}

/// A single question on a form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Question ID, normalised to a string
    #[serde(deserialize_with = "id_string")]
    pub id: String,

    /// Question text
    #[serde(default)]
    pub text: String,

    /// Question type (`text`, `rating`, `multiple_choice`, ...)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Whether an answer is required
    #[serde(default)]
    pub required: bool,

    /// Choices for choice-type questions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<Value>,

    /// Any other attributes the backend attaches
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Question {
    /// Header label for exports: the text, or the id when the text is blank
    pub fn label(&self) -> &str {
        if self.text.trim().is_empty() {
            &self.id
        } else {
            &self.text
        }
    }
}

/// The nested structure stored in `form_data`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormData {
    /// Questions in display order
    #[serde(default)]
    pub questions: Vec<Question>,

    /// Form settings (opaque)
    #[serde(default)]
    pub settings: Value,

    /// Training session details (opaque)
    #[serde(default)]
    pub session: Value,
}

/// A feedback form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    /// Form ID
    pub id: i64,

    /// Title
    pub title: String,

    /// Description
    #[serde(default)]
    pub description: Option<String>,

    /// Target department
    #[serde(default)]
    pub department_id: Option<i64>,

    /// Owning trainer
    #[serde(default)]
    pub trainer_id: Option<i64>,

    /// Due date as stored by the backend
    #[serde(default)]
    pub due_date: Option<String>,

    /// Publication state
    #[serde(default)]
    pub status: FormStatus,

    /// Questions, settings and session
    #[serde(default)]
    pub form_data: FormData,

    /// Creation time
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// An answer is either a single value or a list of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    /// Multi-select style answer
    List(Vec<Value>),
    /// Any single value
    Scalar(Value),
}

impl Answer {
    /// Render the answer as plain text. List entries are joined with `"; "`.
    pub fn display(&self) -> String {
        match self {
            Self::List(values) => values
                .iter()
                .map(scalar_text)
                .collect::<Vec<_>>()
                .join("; "),
            Self::Scalar(value) => scalar_text(value),
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// A submitted response to a form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormResponse {
    /// Response ID
    pub id: i64,

    /// Form answered
    pub form_id: i64,

    /// Responding department
    #[serde(default)]
    pub department_name: Option<String>,

    /// Submission time
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub submitted_at: Option<DateTime<Utc>>,

    /// Answers keyed by question id
    #[serde(default)]
    pub response_data: BTreeMap<String, Answer>,
}

/// Lifecycle of a deletion request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletionStatus {
    /// Awaiting admin review
    #[default]
    Pending,
    /// Approved; the form is deleted
    Approved,
    /// Rejected; the form stays
    Rejected,
}

impl fmt::Display for DeletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.pad("pending"),
            Self::Approved => f.pad("approved"),
            Self::Rejected => f.pad("rejected"),
        }
    }
}

/// A trainer's request to delete a published form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletionRequest {
    /// Request ID
    pub id: i64,

    /// Form to delete
    pub form_id: i64,

    /// Why the form should go
    #[serde(default)]
    pub reason: Option<String>,

    /// Current status
    #[serde(default)]
    pub status: DeletionStatus,

    /// Requesting trainer
    #[serde(default)]
    pub requested_by: Option<i64>,

    /// Creation time
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Counters shown on the admin dashboard
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Forms on the platform
    #[serde(default)]
    pub total_forms: u64,

    /// Responses received
    #[serde(default)]
    pub total_responses: u64,

    /// Registered trainers
    #[serde(default)]
    pub total_trainers: u64,

    /// Departments
    #[serde(default)]
    pub total_departments: u64,

    /// Form requests awaiting review
    #[serde(default)]
    pub pending_form_requests: u64,

    /// Deletion requests awaiting review
    #[serde(default)]
    pub pending_deletion_requests: u64,

    /// Counters this client does not know about
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Login credentials
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login email
    pub email: String,

    /// Password
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login payload
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token
    pub access_token: String,

    /// Token type, normally `bearer`
    #[serde(default)]
    pub token_type: Option<String>,

    /// The logged-in user
    pub user: User,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("user", &self.user)
            .finish()
    }
}
