//! Façade methods against a mock backend

mod common;

use aerofeedback_client::ClientError;
use aerofeedback_core::{
    Answer, FormDraft, FormRequestStatus, FormStatus, NewFormRequest, export_responses_csv,
};
use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::BTreeMap;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_get_departments_unwraps_payload_and_sends_token() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path("/api/departments"))
        .and(header("authorization", format!("Bearer {TEST_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "departments": [
                {"id": 1, "name": "Flight Operations"},
                {"id": 2, "name": "Cabin Crew", "description": "Safety and service"}
            ]
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    let departments = backend.admin().get_departments().await.unwrap();

    assert_eq!(departments.len(), 2);
    assert_eq!(departments[1].name, "Cabin Crew");
    assert_eq!(departments[1].description.as_deref(), Some("Safety and service"));
}

#[tokio::test]
async fn test_requests_without_token_carry_no_authorization() {
    let backend = TestBackend::start_logged_out().await;

    Mock::given(method("GET"))
        .and(path("/api/trainers"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"trainers": []})))
        .expect(0)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/trainers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"trainers": [
            {"id": 5, "name": "F/O Lindqvist", "department_id": 1}
        ]})))
        .expect(1)
        .mount(&backend.server)
        .await;

    let trainers = backend.admin().get_trainers().await.unwrap();
    assert_eq!(trainers[0].department_id, Some(1));
}

#[tokio::test]
async fn test_token_is_read_on_every_call() {
    let backend = TestBackend::start_logged_out().await;

    Mock::given(method("GET"))
        .and(path("/api/forms"))
        .and(header("authorization", "Bearer rotated"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"forms": [form_json(1)]})))
        .expect(1)
        .mount(&backend.server)
        .await;

    let admin = backend.admin();
    aerofeedback_client::TokenStore::store(backend.tokens.as_ref(), "rotated")
        .await
        .unwrap();

    let forms = admin.get_forms().await.unwrap();
    assert_eq!(forms[0].status, FormStatus::Published);
}

#[tokio::test]
async fn test_department_trainers_path() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path("/api/departments/3/trainers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"trainers": [
            {"id": 8, "name": "Capt. Okafor", "email": "okafor@example.com", "department_id": 3}
        ]})))
        .expect(1)
        .mount(&backend.server)
        .await;

    let trainers = backend.admin().get_department_trainers(3).await.unwrap();
    assert_eq!(trainers[0].email.as_deref(), Some("okafor@example.com"));
}

#[tokio::test]
async fn test_server_detail_is_surfaced_verbatim() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path("/api/forms/77"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Form not found"})))
        .mount(&backend.server)
        .await;

    let error = backend.admin().get_form(77).await.unwrap_err();

    assert_eq!(error.status(), Some(404));
    assert_eq!(error.to_string(), "Form not found");
}

#[tokio::test]
async fn test_non_json_error_uses_fallback_message() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/dashboard/stats"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&backend.server)
        .await;

    let error = backend.admin().get_dashboard_stats().await.unwrap_err();

    assert_eq!(error.status(), Some(500));
    assert_eq!(error.to_string(), "Failed to fetch dashboard statistics");
}

#[tokio::test]
async fn test_missing_payload_field() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path("/api/form-requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&backend.server)
        .await;

    let error = backend.admin().get_form_requests().await.unwrap_err();
    assert!(matches!(error, ClientError::MissingField { field: "requests" }));
}

#[tokio::test]
async fn test_create_form_sends_translated_payload() {
    let backend = TestBackend::start().await;

    let draft: FormDraft = serde_json::from_value(json!({
        "title": "  Line check feedback ",
        "description": "Observed sector LHR-AMS",
        "departmentId": "2",
        "trainerId": "not-a-number",
        "dueDate": "2024-07-01T00:00:00.000Z",
        "questions": [
            {"id": "q1", "text": "Rate the briefing", "type": "rating", "required": true}
        ],
        "settings": null
    }))
    .unwrap();

    Mock::given(method("POST"))
        .and(path("/api/forms"))
        .and(body_json(json!({
            "title": "Line check feedback",
            "description": "Observed sector LHR-AMS",
            "department_id": 2,
            "trainer_id": 1,
            "due_date": "2024-07-01T00:00:00.000Z",
            "status": "draft",
            "form_data": {
                "questions": [
                    {"id": "q1", "text": "Rate the briefing", "type": "rating", "required": true}
                ],
                "settings": {},
                "session": {}
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"form": form_json(12)})))
        .expect(1)
        .mount(&backend.server)
        .await;

    let form = backend.admin().create_form(&draft).await.unwrap();
    assert_eq!(form.id, 12);
}

#[tokio::test]
async fn test_update_and_publish_form() {
    let backend = TestBackend::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/forms/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"form": form_json(12)})))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/forms/12/publish"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"form": form_json(12)})))
        .expect(1)
        .mount(&backend.server)
        .await;

    let admin = backend.admin();
    let draft = FormDraft {
        title: "Updated".to_string(),
        ..FormDraft::default()
    };

    assert_eq!(admin.update_form(12, &draft).await.unwrap().id, 12);
    assert_eq!(
        admin.publish_form(12).await.unwrap().status,
        FormStatus::Published
    );
}

#[tokio::test]
async fn test_delete_form_accepts_empty_body() {
    let backend = TestBackend::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/forms/12"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&backend.server)
        .await;

    backend.admin().delete_form(12).await.unwrap();
}

#[tokio::test]
async fn test_form_request_lifecycle() {
    let backend = TestBackend::start().await;
    let request = |status: &str| {
        json!({
            "id": 4,
            "requester": 5,
            "title": "CRM refresher survey",
            "reason": "Annual recurrent training",
            "status": status,
            "created_at": "2024-04-02 10:15:00"
        })
    };

    Mock::given(method("POST"))
        .and(path("/api/form-requests"))
        .and(body_json(json!({
            "title": "CRM refresher survey",
            "reason": "Annual recurrent training"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"request": request("pending")})))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/form-requests/4/approve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"request": request("approved")})))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/form-requests/4/reject"))
        .and(body_json(json!({"reason": "Duplicate"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"request": request("rejected")})))
        .expect(1)
        .mount(&backend.server)
        .await;

    let admin = backend.admin();
    let created = admin
        .create_form_request(&NewFormRequest {
            title: "CRM refresher survey".to_string(),
            reason: "Annual recurrent training".to_string(),
            department_id: None,
        })
        .await
        .unwrap();
    assert_eq!(created.status, FormRequestStatus::Pending);
    assert!(created.created_at.is_some());

    let approved = admin.approve_form_request(4).await.unwrap();
    assert_eq!(approved.status, FormRequestStatus::Approved);

    let rejected = admin.reject_form_request(4, Some("Duplicate")).await.unwrap();
    assert_eq!(rejected.status, FormRequestStatus::Rejected);
}

#[tokio::test]
async fn test_deletion_request_create_and_reject() {
    let backend = TestBackend::start().await;

    Mock::given(method("POST"))
        .and(path("/api/form-deletion-requests"))
        .and(body_json(json!({"form_id": 42, "reason": "Course retired"})))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"request": deletion_request_json(9, "pending")})),
        )
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/form-deletion-requests"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"requests": [deletion_request_json(9, "pending")]})),
        )
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/form-deletion-requests/9/reject"))
        .and(body_json(json!({"reason": null})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"request": deletion_request_json(9, "rejected")})),
        )
        .expect(1)
        .mount(&backend.server)
        .await;

    let admin = backend.admin();
    let created = admin.create_deletion_request(42, "Course retired").await.unwrap();
    assert_eq!(created.form_id, 42);

    assert_eq!(admin.get_deletion_requests().await.unwrap().len(), 1);

    let rejected = admin.reject_form_deletion_request(9, None).await.unwrap();
    assert_eq!(rejected.status, aerofeedback_core::DeletionStatus::Rejected);
}

#[tokio::test]
async fn test_responses_submit_and_export() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path("/api/forms/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"form": form_json(12)})))
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/forms/12/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"responses": [
            {
                "id": 100,
                "form_id": 12,
                "department_name": "Flight Operations",
                "submitted_at": "2024-06-10T14:00:00Z",
                "response_data": {"q1": 5, "q2": "Clear, concise"}
            }
        ]})))
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/forms/12/responses"))
        .and(body_json(json!({"response_data": {"q1": 4, "q2": ["Good pacing", "More CRM"]}})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"response": {
            "id": 101,
            "form_id": 12,
            "response_data": {"q1": 4, "q2": ["Good pacing", "More CRM"]}
        }})))
        .expect(1)
        .mount(&backend.server)
        .await;

    let admin = backend.admin();

    let mut answers = BTreeMap::new();
    answers.insert("q1".to_string(), Answer::Scalar(json!(4)));
    answers.insert(
        "q2".to_string(),
        Answer::List(vec![json!("Good pacing"), json!("More CRM")]),
    );
    let submitted = admin.submit_form_response(12, &answers).await.unwrap();
    assert_eq!(submitted.response_data["q2"].display(), "Good pacing; More CRM");

    let form = admin.get_form(12).await.unwrap();
    let responses = admin.get_form_responses(12).await.unwrap();

    let mut out = Vec::new();
    let rows = export_responses_csv(&form, &responses, &mut out).unwrap();
    let csv = String::from_utf8(out).unwrap();

    assert_eq!(rows, 1);
    assert!(csv.contains("\"Clear, concise\""));
    assert!(csv.starts_with("\"Response ID\",\"Department\",\"Submitted At\",\"How clear was the briefing?\",\"Comments\""));
}

#[tokio::test]
async fn test_dashboard_stats_keep_unknown_counters() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/dashboard/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"stats": {
            "total_forms": 14,
            "total_responses": 230,
            "pending_deletion_requests": 2,
            "active_sessions": 3
        }})))
        .mount(&backend.server)
        .await;

    let stats = backend.admin().get_dashboard_stats().await.unwrap();

    assert_eq!(stats.total_forms, 14);
    assert_eq!(stats.pending_deletion_requests, 2);
    assert_eq!(stats.total_trainers, 0);
    assert_eq!(stats.extra.get("active_sessions"), Some(&json!(3)));
}
