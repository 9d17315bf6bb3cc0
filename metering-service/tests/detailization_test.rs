mod common;

use common::{TestApp, CLIENT_ID, OTHER_CLIENT_ID};
use serde_json::{json, Value};

#[tokio::test]
async fn create_detailization_request() {
    let app = TestApp::spawn().await;

    let response = app
        .client_post(CLIENT_ID, "/v1/detailization-requests")
        .json(&json!({ "start_date": "2024-05-01", "end_date": "2024-05-31" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["subject_id"], CLIENT_ID);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["start_date"], "2024-05-01");
    assert_eq!(body["end_date"], "2024-05-31");
}

#[tokio::test]
async fn single_day_range_is_accepted() {
    let app = TestApp::spawn().await;

    let response = app
        .client_post(CLIENT_ID, "/v1/detailization-requests")
        .json(&json!({ "start_date": "2024-05-01", "end_date": "2024-05-01" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn invalid_ranges_are_rejected() {
    let app = TestApp::spawn().await;

    for body in [
        json!({ "start_date": "2024-05-02", "end_date": "2024-05-01" }),
        json!({ "start_date": "2024-05-02" }),
        json!({ "end_date": "2024-05-02" }),
    ] {
        let response = app
            .client_post(CLIENT_ID, "/v1/detailization-requests")
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 422, "body: {}", body);
    }

    let listed: Value = app
        .client_get(CLIENT_ID, "/v1/detailization-requests")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listed["requests"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn listing_is_scoped_to_the_caller() {
    let app = TestApp::spawn().await;

    for (subject, start) in [
        (CLIENT_ID, "2024-01-01"),
        (OTHER_CLIENT_ID, "2024-02-01"),
        (CLIENT_ID, "2024-03-01"),
    ] {
        app.client_post(subject, "/v1/detailization-requests")
            .json(&json!({ "start_date": start, "end_date": start }))
            .send()
            .await
            .unwrap();
    }

    let listed: Value = app
        .client_get(CLIENT_ID, "/v1/detailization-requests?status=pending")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let requests = listed["requests"].as_array().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0]["start_date"], "2024-03-01");

    let listed: Value = app
        .admin_get("/v1/detailization-requests")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["requests"].as_array().unwrap().len(), 3);

    let listed: Value = app
        .admin_get("/v1/detailization-requests?status=completed")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listed["requests"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn admin_can_file_for_a_subject() {
    let app = TestApp::spawn().await;

    let response = app
        .admin_post("/v1/detailization-requests")
        .json(&json!({
            "subject_id": OTHER_CLIENT_ID,
            "start_date": "2024-05-01",
            "end_date": "2024-05-02"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["subject_id"], OTHER_CLIENT_ID);
}

#[tokio::test]
async fn unparseable_bodies_get_the_json_error_envelope() {
    let app = TestApp::spawn().await;

    let response = app
        .client_post(CLIENT_ID, "/v1/detailization-requests")
        .json(&json!({ "start_date": "2024-02-30", "end_date": "2024-03-01" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Validation error");
    assert!(body["details"].is_string());

    let response = app
        .client_post(CLIENT_ID, "/v1/tariff-requests")
        .header("content-type", "application/json")
        .body("{\"description\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Validation error");
}
