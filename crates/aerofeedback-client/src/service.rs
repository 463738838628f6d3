//! Admin façade: one method per backend endpoint
//!
//! Every method follows the same shape: issue the request through
//! [`ApiClient`], surface the server's message on failure, and unwrap the
//! named payload field on success. Only deletion approval retries.

use aerofeedback_core::{
    Answer, Config, DashboardStats, DeletionRequest, Department, Form, FormDraft, FormRequest,
    FormResponse, NewFormRequest, Trainer,
};
use reqwest::Method;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::{ApprovalFailure, ClientError, ClientResult};
use crate::http::{ApiClient, unwrap_field};
use crate::retry::{AttemptFailure, RetryError, RetryPolicy, retry_with_backoff};
use crate::token::TokenStore;

/// Typed access to the admin-facing backend endpoints
#[derive(Debug, Clone)]
pub struct AdminService {
    client: ApiClient,
    retry: RetryPolicy,
}

impl AdminService {
    /// Wrap an existing client, retrying deletion approval with the default policy
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
        }
    }

    /// Build the service from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &Config, tokens: Arc<dyn TokenStore>) -> ClientResult<Self> {
        Ok(Self::new(ApiClient::from_config(&config.api, tokens)?)
            .with_retry_policy(RetryPolicy::from_config(&config.retry)))
    }

    /// Replace the retry policy used for deletion approval
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// The underlying HTTP client
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// The retry policy for deletion approval
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    // Reference data

    /// List all departments
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is malformed.
    pub async fn get_departments(&self) -> ClientResult<Vec<Department>> {
        let body = self
            .client
            .call(Method::GET, "/api/departments", "Failed to fetch departments")
            .await?;
        unwrap_field(body, "departments")
    }

    /// List all trainers
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is malformed.
    pub async fn get_trainers(&self) -> ClientResult<Vec<Trainer>> {
        let body = self
            .client
            .call(Method::GET, "/api/trainers", "Failed to fetch trainers")
            .await?;
        unwrap_field(body, "trainers")
    }

    /// List the trainers of one department
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is malformed.
    pub async fn get_department_trainers(&self, department_id: i64) -> ClientResult<Vec<Trainer>> {
        let body = self
            .client
            .call(
                Method::GET,
                &format!("/api/departments/{department_id}/trainers"),
                "Failed to fetch department trainers",
            )
            .await?;
        unwrap_field(body, "trainers")
    }

    // Forms

    /// List forms visible to the current user
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is malformed.
    pub async fn get_forms(&self) -> ClientResult<Vec<Form>> {
        let body = self
            .client
            .call(Method::GET, "/api/forms", "Failed to fetch forms")
            .await?;
        unwrap_field(body, "forms")
    }

    /// Fetch a single form
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is malformed.
    pub async fn get_form(&self, form_id: i64) -> ClientResult<Form> {
        let body = self
            .client
            .call(
                Method::GET,
                &format!("/api/forms/{form_id}"),
                "Failed to fetch form",
            )
            .await?;
        unwrap_field(body, "form")
    }

    /// Create a form from an editor draft
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is malformed.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create_form(&self, draft: &FormDraft) -> ClientResult<Form> {
        let payload = draft.to_payload();
        let body = self
            .client
            .call_with_body(Method::POST, "/api/forms", &payload, "Failed to create form")
            .await?;
        let form: Form = unwrap_field(body, "form")?;
        info!(form_id = form.id, "Created form");
        Ok(form)
    }

    /// Replace a form with an editor draft
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is malformed.
    #[instrument(skip(self, draft))]
    pub async fn update_form(&self, form_id: i64, draft: &FormDraft) -> ClientResult<Form> {
        let payload = draft.to_payload();
        let body = self
            .client
            .call_with_body(
                Method::PUT,
                &format!("/api/forms/{form_id}"),
                &payload,
                "Failed to update form",
            )
            .await?;
        unwrap_field(body, "form")
    }

    /// Publish a draft form
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is malformed.
    #[instrument(skip(self))]
    pub async fn publish_form(&self, form_id: i64) -> ClientResult<Form> {
        let body = self
            .client
            .call(
                Method::POST,
                &format!("/api/forms/{form_id}/publish"),
                "Failed to publish form",
            )
            .await?;
        let form: Form = unwrap_field(body, "form")?;
        info!(form_id, "Published form");
        Ok(form)
    }

    /// Delete a form outright
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn delete_form(&self, form_id: i64) -> ClientResult<()> {
        self.client
            .call(
                Method::DELETE,
                &format!("/api/forms/{form_id}"),
                "Failed to delete form",
            )
            .await?;
        info!(form_id, "Deleted form");
        Ok(())
    }

    // Form requests

    /// List form-creation requests
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is malformed.
    pub async fn get_form_requests(&self) -> ClientResult<Vec<FormRequest>> {
        let body = self
            .client
            .call(Method::GET, "/api/form-requests", "Failed to fetch form requests")
            .await?;
        unwrap_field(body, "requests")
    }

    /// Ask for a new form to be created
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is malformed.
    pub async fn create_form_request(&self, request: &NewFormRequest) -> ClientResult<FormRequest> {
        let body = self
            .client
            .call_with_body(
                Method::POST,
                "/api/form-requests",
                request,
                "Failed to create form request",
            )
            .await?;
        unwrap_field(body, "request")
    }

    /// Approve a form-creation request
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is malformed.
    #[instrument(skip(self))]
    pub async fn approve_form_request(&self, request_id: i64) -> ClientResult<FormRequest> {
        let body = self
            .client
            .call(
                Method::POST,
                &format!("/api/form-requests/{request_id}/approve"),
                "Failed to approve form request",
            )
            .await?;
        unwrap_field(body, "request")
    }

    /// Reject a form-creation request
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is malformed.
    #[instrument(skip(self, reason))]
    pub async fn reject_form_request(
        &self,
        request_id: i64,
        reason: Option<&str>,
    ) -> ClientResult<FormRequest> {
        let body = self
            .client
            .call_with_body(
                Method::POST,
                &format!("/api/form-requests/{request_id}/reject"),
                &json!({ "reason": reason }),
                "Failed to reject form request",
            )
            .await?;
        unwrap_field(body, "request")
    }

    // Deletion requests

    /// List form-deletion requests
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is malformed.
    pub async fn get_deletion_requests(&self) -> ClientResult<Vec<DeletionRequest>> {
        let body = self
            .client
            .call(
                Method::GET,
                "/api/form-deletion-requests",
                "Failed to fetch deletion requests",
            )
            .await?;
        unwrap_field(body, "requests")
    }

    /// Ask for a published form to be deleted
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is malformed.
    #[instrument(skip(self, reason))]
    pub async fn create_deletion_request(
        &self,
        form_id: i64,
        reason: &str,
    ) -> ClientResult<DeletionRequest> {
        let body = self
            .client
            .call_with_body(
                Method::POST,
                "/api/form-deletion-requests",
                &json!({ "form_id": form_id, "reason": reason }),
                "Failed to create deletion request",
            )
            .await?;
        unwrap_field(body, "request")
    }

    /// Approve a deletion request, retrying slow or failing attempts.
    ///
    /// Each attempt first probes the backend's health endpoint; an
    /// unreachable backend fails at once without sending the approval.
    /// Timeouts and HTTP 500 are retried with exponential backoff, any
    /// other error status is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Approval`] when the retries are used up or the
    /// backend is unreachable, and [`ClientError::Api`] for other statuses.
    pub async fn approve_form_deletion_request(
        &self,
        request_id: i64,
    ) -> ClientResult<DeletionRequest> {
        self.approve_form_deletion_request_with_cancel(request_id, &CancellationToken::new())
            .await
    }

    /// Like [`AdminService::approve_form_deletion_request`], stopping early
    /// when `cancel` fires.
    ///
    /// # Errors
    ///
    /// As [`AdminService::approve_form_deletion_request`], plus
    /// [`ClientError::Cancelled`].
    #[instrument(skip(self, cancel))]
    pub async fn approve_form_deletion_request_with_cancel(
        &self,
        request_id: i64,
        cancel: &CancellationToken,
    ) -> ClientResult<DeletionRequest> {
        let path = format!("/api/form-deletion-requests/{request_id}/approve");
        let path = path.as_str();
        let client = &self.client;

        let outcome = retry_with_backoff(
            &self.retry,
            cancel,
            ClientError::is_retryable,
            move |attempt| async move {
                client.probe_health().await?;
                debug!(attempt, "Backend healthy, sending approval");
                client
                    .call(Method::POST, path, "Failed to approve deletion request")
                    .await
            },
        )
        .await;

        match outcome {
            Ok(body) => {
                let request: DeletionRequest = unwrap_field(body, "request")?;
                info!(request_id, form_id = request.form_id, "Approved deletion request");
                Ok(request)
            }
            Err(failure) => {
                let error = approval_error(failure);
                warn!(request_id, error = %error, "Deletion approval failed");
                Err(error)
            }
        }
    }

    /// Reject a deletion request
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is malformed.
    #[instrument(skip(self, reason))]
    pub async fn reject_form_deletion_request(
        &self,
        request_id: i64,
        reason: Option<&str>,
    ) -> ClientResult<DeletionRequest> {
        let body = self
            .client
            .call_with_body(
                Method::POST,
                &format!("/api/form-deletion-requests/{request_id}/reject"),
                &json!({ "reason": reason }),
                "Failed to reject deletion request",
            )
            .await?;
        unwrap_field(body, "request")
    }

    // Responses

    /// List the responses collected for a form
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is malformed.
    pub async fn get_form_responses(&self, form_id: i64) -> ClientResult<Vec<FormResponse>> {
        let body = self
            .client
            .call(
                Method::GET,
                &format!("/api/forms/{form_id}/responses"),
                "Failed to fetch form responses",
            )
            .await?;
        unwrap_field(body, "responses")
    }

    /// Submit answers to a form, keyed by question id
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is malformed.
    pub async fn submit_form_response(
        &self,
        form_id: i64,
        answers: &BTreeMap<String, Answer>,
    ) -> ClientResult<FormResponse> {
        let body = self
            .client
            .call_with_body(
                Method::POST,
                &format!("/api/forms/{form_id}/responses"),
                &json!({ "response_data": answers }),
                "Failed to submit form response",
            )
            .await?;
        unwrap_field(body, "response")
    }

    // Dashboard

    /// Counters for the admin dashboard
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is malformed.
    pub async fn get_dashboard_stats(&self) -> ClientResult<DashboardStats> {
        let body = self
            .client
            .call(
                Method::GET,
                "/api/admin/dashboard/stats",
                "Failed to fetch dashboard statistics",
            )
            .await?;
        unwrap_field(body, "stats")
    }
}

/// Translate a finished retry loop into what the caller is shown
fn approval_error(failure: RetryError<ClientError>) -> ClientError {
    match failure {
        RetryError::Exhausted {
            last: AttemptFailure::TimedOut(_) | AttemptFailure::Failed(ClientError::Timeout),
            ..
        } => ApprovalFailure::TimedOut.into(),
        RetryError::Exhausted {
            last: AttemptFailure::Failed(ClientError::Api { status: 500, .. }),
            ..
        } => ApprovalFailure::ServerError.into(),
        RetryError::Exhausted {
            last: AttemptFailure::Failed(error),
            ..
        }
        | RetryError::Aborted { error, .. } => match error {
            ClientError::Network(_) => ApprovalFailure::NetworkUnreachable.into(),
            other => other,
        },
        RetryError::Cancelled { .. } => ClientError::Cancelled,
    }
}
