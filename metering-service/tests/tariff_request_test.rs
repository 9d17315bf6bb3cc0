//! Tariff change workflow over HTTP.

mod common;

use common::{tariff_body, TestApp, CLIENT_ID, OTHER_CLIENT_ID};
use serde_json::{json, Value};

async fn create_request(app: &TestApp, subject_id: &str, description: &str) -> Value {
    let response = app
        .client_post(subject_id, "/v1/tariff-requests")
        .json(&json!({ "description": description }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.expect("Failed to parse JSON")
}

#[tokio::test]
async fn client_creates_pending_request() {
    let app = TestApp::spawn().await;

    let body = create_request(&app, CLIENT_ID, "need a bulk discount").await;

    assert_eq!(body["subject_id"], CLIENT_ID);
    assert_eq!(body["status"], "pending");
    assert!(body["admin_response"].is_null());
    assert!(body["proposed_tariff"].is_null());
}

#[tokio::test]
async fn empty_description_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .client_post(CLIENT_ID, "/v1/tariff-requests")
        .json(&json!({ "description": "   " }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn client_cannot_file_for_another_subject() {
    let app = TestApp::spawn().await;

    let response = app
        .client_post(CLIENT_ID, "/v1/tariff-requests")
        .json(&json!({ "subject_id": OTHER_CLIENT_ID, "description": "x" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn approve_then_activate_changes_subject_tariff() {
    let app = TestApp::spawn().await;
    let request = create_request(&app, CLIENT_ID, "bulk").await;
    let id = request["request_id"].as_str().unwrap();

    let response = app
        .admin_post(&format!("/v1/tariff-requests/{}/approve", id))
        .json(&json!({ "tariff": tariff_body("bulk"), "admin_response": "granted" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let approved: Value = response.json().await.unwrap();
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["admin_response"], "granted");
    assert_eq!(approved["proposed_tariff"]["name"], "bulk");
    let tariff_id = approved["proposed_tariff"]["tariff_id"].as_str().unwrap();

    // Approval alone leaves the subject on the default tariff
    let current: Value = app
        .client_get(CLIENT_ID, &format!("/v1/subjects/{}/tariff", CLIENT_ID))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["name"], "default");

    let response = app
        .as_admin(
            app.client
                .put(app.url(&format!("/v1/subjects/{}/tariff", CLIENT_ID))),
        )
        .json(&json!({ "tariff_id": tariff_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let current: Value = app
        .client_get(CLIENT_ID, &format!("/v1/subjects/{}/tariff", CLIENT_ID))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["name"], "bulk");
    assert_eq!(current["is_default"], false);
}

#[tokio::test]
async fn resolved_request_conflicts() {
    let app = TestApp::spawn().await;
    let request = create_request(&app, CLIENT_ID, "cheaper").await;
    let id = request["request_id"].as_str().unwrap();

    let response = app
        .admin_post(&format!("/v1/tariff-requests/{}/reject", id))
        .json(&json!({ "admin_response": "not this quarter" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let rejected: Value = response.json().await.unwrap();
    assert_eq!(rejected["status"], "rejected");

    let response = app
        .admin_post(&format!("/v1/tariff-requests/{}/approve", id))
        .json(&json!({ "tariff": tariff_body("late"), "admin_response": "ok" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let response = app
        .admin_post(&format!("/v1/tariff-requests/{}/reject", id))
        .json(&json!({ "admin_response": "again" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn negative_price_keeps_request_pending() {
    let app = TestApp::spawn().await;
    let request = create_request(&app, CLIENT_ID, "free please").await;
    let id = request["request_id"].as_str().unwrap();

    let mut tariff = tariff_body("broken");
    tariff["ram_price"] = json!("-0.5");

    let response = app
        .admin_post(&format!("/v1/tariff-requests/{}/approve", id))
        .json(&json!({ "tariff": tariff, "admin_response": "sure" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);

    let listed: Value = app
        .admin_get("/v1/tariff-requests?status=pending")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["requests"].as_array().unwrap().len(), 1);
    assert_eq!(listed["requests"][0]["request_id"], id);
}

#[tokio::test]
async fn unknown_and_malformed_ids() {
    let app = TestApp::spawn().await;

    let response = app
        .admin_post(&format!("/v1/tariff-requests/{}/reject", uuid::Uuid::new_v4()))
        .json(&json!({ "admin_response": "no" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = app
        .admin_post("/v1/tariff-requests/not-a-uuid/reject")
        .json(&json!({ "admin_response": "no" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn clients_only_see_their_own_requests() {
    let app = TestApp::spawn().await;
    create_request(&app, CLIENT_ID, "first").await;
    create_request(&app, OTHER_CLIENT_ID, "other").await;
    create_request(&app, CLIENT_ID, "second").await;

    let listed: Value = app
        .client_get(CLIENT_ID, "/v1/tariff-requests")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let requests = listed["requests"].as_array().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0]["description"], "second");

    let response = app
        .client_get(
            CLIENT_ID,
            &format!("/v1/tariff-requests?subject_id={}", OTHER_CLIENT_ID),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let listed: Value = app
        .admin_get("/v1/tariff-requests?page_size=2")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["requests"].as_array().unwrap().len(), 2);

    let response = app
        .admin_get("/v1/tariff-requests?status=archived")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn only_admins_resolve_requests() {
    let app = TestApp::spawn().await;
    let request = create_request(&app, CLIENT_ID, "self-approve").await;
    let id = request["request_id"].as_str().unwrap();

    let response = app
        .client_post(CLIENT_ID, &format!("/v1/tariff-requests/{}/approve", id))
        .json(&json!({ "tariff": tariff_body("mine"), "admin_response": "ok" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}
