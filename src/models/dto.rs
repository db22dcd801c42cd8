// Request and response shapes for the JSON API. Responses also derive
// Deserialize so the client module can read them back.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::enums::{ComplaintStatus, PrincipalKind, Priority};
use super::{admins, complaint_attachments, complaint_categories, complaint_updates, complaints, users};
use crate::errors::ApiError;

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Missing fields deserialize as empty so they surface as field errors.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255, message = "The username field is required."))]
    pub username: String,
    #[validate(email(message = "The email field must be a valid email address."))]
    pub email: String,
    #[validate(length(min = 6, message = "The password field must be at least 6 characters."))]
    pub password: String,
    #[validate(must_match(other = "password", message = "The password field confirmation does not match."))]
    pub password_confirmation: String,
    #[validate(length(min = 1, max = 255, message = "The full name field is required."))]
    pub full_name: String,
    pub contact_number: Option<String>,
    pub department: Option<String>,
}

/// Username or email, plus password. At least one identifier must be given.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct LoginRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "The email field must be a valid email address."))]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "The password field is required."))]
    pub password: String,
}

impl LoginRequest {
    pub fn with_username(username: &str, password: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            email: None,
            password: password.to_string(),
        }
    }

    pub fn with_email(email: &str, password: &str) -> Self {
        Self {
            username: None,
            email: Some(email.to_string()),
            password: password.to_string(),
        }
    }

    /// Non-blank identifiers, checked so that at least one is present.
    pub fn identifiers(&self) -> Result<(Option<&str>, Option<&str>), ApiError> {
        let username = self.username.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let email = self.email.as_deref().map(str::trim).filter(|s| !s.is_empty());

        if username.is_none() && email.is_none() {
            let mut errors = crate::errors::FieldErrors::new();
            errors.insert(
                "username".to_string(),
                vec!["The username field is required when email is not present.".to_string()],
            );
            errors.insert(
                "email".to_string(),
                vec!["The email field is required when username is not present.".to_string()],
            );
            return Err(ApiError::Validation(errors));
        }

        Ok((username, email))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<users::Model>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<admins::Model>,
    pub token: String,
    #[serde(rename = "type")]
    pub kind: PrincipalKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSummary {
    pub id: i32,
    pub full_name: String,
    pub role: String,
}

impl From<&admins::Model> for AdminSummary {
    fn from(admin: &admins::Model) -> Self {
        Self {
            id: admin.id,
            full_name: admin.full_name.clone(),
            role: admin.role.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Password reset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "The email field must be a valid email address."))]
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "The email field must be a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "The token field is required."))]
    pub token: String,
    #[validate(length(min = 6, message = "The password field must be at least 6 characters."))]
    pub password: String,
    #[validate(must_match(other = "password", message = "The password field confirmation does not match."))]
    pub password_confirmation: String,
    /// `user` or `admin`; see [`ResetPasswordRequest::principal_kind`].
    #[serde(rename = "type")]
    pub kind: String,
}

impl ResetPasswordRequest {
    pub fn principal_kind(&self) -> Result<PrincipalKind, ApiError> {
        PrincipalKind::from_label(self.kind.trim())
            .ok_or_else(|| ApiError::field("type", "The selected type is invalid."))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

// ---------------------------------------------------------------------------
// Complaints
// ---------------------------------------------------------------------------

/// Fields of a complaint submission. The attachment travels separately.
#[derive(Debug, Clone, Default, Validate)]
pub struct NewComplaint {
    pub category_id: i32,
    #[validate(length(min = 1, max = 255, message = "The subject field is required and may not exceed 255 characters."))]
    pub subject: String,
    #[validate(length(min = 1, message = "The description field is required."))]
    pub description: String,
    pub assigned_to: Option<i32>,
    pub is_anonymous: bool,
    pub priority: Option<Priority>,
    #[validate(length(max = 255, message = "The location may not exceed 255 characters."))]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateStatusRequest {
    pub status: ComplaintStatus,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub resolution_details: Option<String>,
}

/// Raw body of a status change; the status label is checked in [`UpdateStatusBody::into_request`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateStatusBody {
    pub status: Option<String>,
    pub comments: Option<String>,
    pub resolution_details: Option<String>,
}

impl UpdateStatusBody {
    pub fn into_request(self) -> Result<UpdateStatusRequest, ApiError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => return Err(ApiError::field("status", "The status field is required.")),
            Some(label) => ComplaintStatus::from_label(label)
                .ok_or_else(|| ApiError::field("status", "The selected status is invalid."))?,
        };

        Ok(UpdateStatusRequest {
            status,
            comments: self.comments,
            resolution_details: self.resolution_details,
        })
    }
}

/// Raw `?status=&category=` query of the admin listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComplaintFilterQuery {
    pub status: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComplaintFilter {
    pub status: Option<ComplaintStatus>,
    pub category_id: Option<i32>,
}

impl ComplaintFilterQuery {
    /// Empty values mean "no filter"; anything else must parse.
    pub fn into_filter(self) -> Result<ComplaintFilter, ApiError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(label) => Some(
                ComplaintStatus::from_label(label)
                    .ok_or_else(|| ApiError::field("status", "The selected status is invalid."))?,
            ),
        };

        let category_id = match self.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<i32>()
                    .map_err(|_| ApiError::field("category", "The category must be an integer."))?,
            ),
        };

        Ok(ComplaintFilter { status, category_id })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResponse {
    #[serde(flatten)]
    pub update: complaint_updates::Model,
    pub admin: Option<AdminSummary>,
}

/// A complaint with its relations loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplaintResponse {
    #[serde(flatten)]
    pub complaint: complaints::Model,
    pub category: Option<complaint_categories::Model>,
    pub user: Option<users::Model>,
    pub assigned_admin: Option<AdminSummary>,
    pub attachment: Option<complaint_attachments::Model>,
    #[serde(default)]
    pub updates: Vec<UpdateResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplaintEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub complaint: ComplaintResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplaintList {
    pub complaints: Vec<ComplaintResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryList {
    pub categories: Vec<complaint_categories::Model>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category_id: i32,
    pub category_name: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityCount {
    pub priority: Priority,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsResponse {
    pub total: u64,
    pub pending: u64,
    pub in_progress: u64,
    pub resolved: u64,
    pub by_category: Vec<CategoryCount>,
    pub by_priority: Vec<PriorityCount>,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SendMessageRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 5000, message = "The message field is required and may not exceed 5000 characters."))]
    pub message: String,
}

/// Display info of a message author: email for users, role for admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderInfo {
    pub id: i32,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i32,
    pub complaint_id: i32,
    pub sender_id: i32,
    pub sender_type: PrincipalKind,
    pub sender: Option<SenderInfo>,
    pub message: String,
    pub attachment_path: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub unread_count: u64,
}
