use std::path::Path;

use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::auth::first_success;
use super::error::ClientError;
use super::session::Session;
use crate::models::dto::{
    AdminSummary, AuthResponse, CategoryList, ChatMessage, ComplaintEnvelope, ComplaintFilter, ComplaintList,
    ComplaintResponse, LoginRequest, MessageResponse, NewComplaint, RegisterRequest, SendMessageRequest,
    StatisticsResponse, UnreadCountResponse, UpdateStatusRequest,
};
use crate::models::{PrincipalKind, complaint_categories};
use crate::services::storage::content_type_for;

#[derive(Deserialize)]
struct AdminList {
    admins: Vec<AdminSummary>,
}

/// Thin typed wrapper over the JSON API rooted at `base_url` (e.g. `http://host/api`).
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Public URL of a stored attachment: the API base without its `/api`
    /// suffix, then `/storage/<path>`.
    pub fn attachment_url(&self, file_path: &str) -> String {
        attachment_url(&self.base_url, file_path)
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.header("Accept", "application/json").send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(api_error(status, &body))
    }

    fn authed(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
        request.bearer_auth(&session.token)
    }

    // -- auth ---------------------------------------------------------------

    pub async fn register(&self, request: &RegisterRequest) -> Result<Session, ClientError> {
        let response: AuthResponse = Self::send(self.http.post(self.url("/auth/register")).json(request)).await?;
        Session::from_auth(response)
    }

    pub async fn login_user(&self, request: &LoginRequest) -> Result<Session, ClientError> {
        let response: AuthResponse = Self::send(self.http.post(self.url("/auth/login")).json(request)).await?;
        Session::from_auth(response)
    }

    pub async fn login_admin(&self, request: &LoginRequest) -> Result<Session, ClientError> {
        let response: AuthResponse = Self::send(self.http.post(self.url("/auth/admin/login")).json(request)).await?;
        Session::from_auth(response)
    }

    /// Tries the user login, then the admin login.
    pub async fn login(&self, request: &LoginRequest) -> Result<Session, ClientError> {
        first_success(|| self.login_user(request), || self.login_admin(request)).await
    }

    pub async fn logout(&self, session: Session) -> Result<(), ClientError> {
        let path = match session.kind {
            PrincipalKind::User => "/user/logout",
            PrincipalKind::Admin => "/admin/logout",
        };
        let _: MessageResponse = Self::send(self.authed(self.http.post(self.url(path)), &session)).await?;
        debug!("Logged out {}", session.full_name());
        Ok(())
    }

    pub async fn categories(&self) -> Result<Vec<complaint_categories::Model>, ClientError> {
        let list: CategoryList = Self::send(self.http.get(self.url("/categories"))).await?;
        Ok(list.categories)
    }

    pub async fn available_admins(&self) -> Result<Vec<AdminSummary>, ClientError> {
        let list: AdminList = Self::send(self.http.get(self.url("/admins/available"))).await?;
        Ok(list.admins)
    }

    // -- complaints ---------------------------------------------------------

    pub async fn submit_complaint(
        &self,
        session: &Session,
        complaint: &NewComplaint,
        attachment: Option<&Path>,
    ) -> Result<ComplaintResponse, ClientError> {
        let mut form = Form::new()
            .text("category_id", complaint.category_id.to_string())
            .text("subject", complaint.subject.clone())
            .text("description", complaint.description.clone())
            .text("is_anonymous", if complaint.is_anonymous { "1" } else { "0" });

        if let Some(admin_id) = complaint.assigned_to {
            form = form.text("assigned_to", admin_id.to_string());
        }
        if let Some(priority) = complaint.priority {
            form = form.text("priority", priority.label());
        }
        if let Some(location) = &complaint.location {
            form = form.text("location", location.clone());
        }
        if let Some(path) = attachment {
            let bytes = tokio::fs::read(path).await?;
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("attachment")
                .to_string();
            let part = Part::bytes(bytes).file_name(file_name).mime_str(content_type_for(path))?;
            form = form.part("attachment", part);
        }

        let request = self.authed(self.http.post(self.url("/complaints")), session).multipart(form);
        let envelope: ComplaintEnvelope = Self::send(request).await?;
        Ok(envelope.complaint)
    }

    pub async fn my_complaints(&self, session: &Session) -> Result<Vec<ComplaintResponse>, ClientError> {
        let list: ComplaintList = Self::send(self.authed(self.http.get(self.url("/complaints")), session)).await?;
        Ok(list.complaints)
    }

    pub async fn all_complaints(
        &self,
        session: &Session,
        filter: &ComplaintFilter,
    ) -> Result<Vec<ComplaintResponse>, ClientError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(status) = filter.status {
            query.push(("status", status.label().to_string()));
        }
        if let Some(category_id) = filter.category_id {
            query.push(("category", category_id.to_string()));
        }

        let request = self.authed(self.http.get(self.url("/admin/complaints")), session).query(&query);
        let list: ComplaintList = Self::send(request).await?;
        Ok(list.complaints)
    }

    pub async fn complaint(&self, session: &Session, id: i32) -> Result<ComplaintResponse, ClientError> {
        let path = match session.kind {
            PrincipalKind::User => format!("/complaints/{}", id),
            PrincipalKind::Admin => format!("/admin/complaints/{}", id),
        };
        let envelope: ComplaintEnvelope = Self::send(self.authed(self.http.get(self.url(&path)), session)).await?;
        Ok(envelope.complaint)
    }

    pub async fn delete_complaint(&self, session: &Session, id: i32) -> Result<(), ClientError> {
        let url = self.url(&format!("/complaints/{}", id));
        let _: MessageResponse = Self::send(self.authed(self.http.delete(url), session)).await?;
        Ok(())
    }

    pub async fn update_status(
        &self,
        session: &Session,
        id: i32,
        request: &UpdateStatusRequest,
    ) -> Result<ComplaintResponse, ClientError> {
        let url = self.url(&format!("/admin/complaints/{}/status", id));
        let envelope: ComplaintEnvelope = Self::send(self.authed(self.http.put(url), session).json(request)).await?;
        Ok(envelope.complaint)
    }

    pub async fn statistics(&self, session: &Session) -> Result<StatisticsResponse, ClientError> {
        Self::send(self.authed(self.http.get(self.url("/admin/statistics")), session)).await
    }

    // -- messages -----------------------------------------------------------

    pub async fn messages(&self, session: &Session, complaint_id: i32) -> Result<Vec<ChatMessage>, ClientError> {
        let url = self.url(&format!("/complaints/{}/messages", complaint_id));
        Self::send(self.authed(self.http.get(url), session)).await
    }

    pub async fn send_message(
        &self,
        session: &Session,
        complaint_id: i32,
        message: &str,
    ) -> Result<ChatMessage, ClientError> {
        let url = self.url(&format!("/complaints/{}/messages", complaint_id));
        let body = SendMessageRequest { message: message.to_string() };
        Self::send(self.authed(self.http.post(url), session).json(&body)).await
    }

    pub async fn mark_read(&self, session: &Session, message_id: i32) -> Result<(), ClientError> {
        let url = self.url(&format!("/messages/{}/read", message_id));
        let _: MessageResponse = Self::send(self.authed(self.http.put(url), session)).await?;
        Ok(())
    }

    pub async fn unread_count(&self, session: &Session, complaint_id: i32) -> Result<u64, ClientError> {
        let url = self.url(&format!("/complaints/{}/messages/unread-count", complaint_id));
        let count: UnreadCountResponse = Self::send(self.authed(self.http.get(url), session)).await?;
        Ok(count.unread_count)
    }
}

pub fn attachment_url(api_base: &str, file_path: &str) -> String {
    let base = api_base.trim_end_matches('/');
    let base = base.strip_suffix("/api").unwrap_or(base);
    format!("{}/storage/{}", base, file_path.trim_start_matches('/'))
}

/// Error message from a failed response: `message`, then `error`, then the raw body.
fn api_error(status: StatusCode, body: &str) -> ClientError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.get("message")
                .or_else(|| json.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string());

    ClientError::Api { status: status.as_u16(), message }
}
