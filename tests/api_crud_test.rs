//! HTTP-level CRUD behavior: role gating, validation, derived fields, and
//! the notification feed.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::Utc;
use common::*;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

fn post_json(uri: &str, role: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(role) = role {
        builder = builder.header("x-user-role", role);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn admin_creates_a_train_but_viewer_and_anonymous_cannot() {
    let app = TestApp::new().await;
    let payload = json!({
        "train_code": "KRL-10",
        "name": "Commuter 10",
        "type": "KRL",
        "year": 2021
    });

    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/v1/trains", Some("admin"), payload.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["train_code"], json!("KRL-10"));

    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/v1/trains", Some("viewer"), payload.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/v1/trains", None, payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn teknisi_may_file_reports_but_not_trains() {
    let app = TestApp::new().await;
    let train = insert_train(&app.state, "KRL-01", "Commuter 01", "KRL").await;

    let report = json!({
        "train_id": train,
        "severity": "High",
        "status": "Open",
        "description": "Pantograph arcing",
        "reported_date": Utc::now().to_rfc3339()
    });
    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/v1/reports", Some("teknisi"), report))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let train_payload = json!({
        "train_code": "KRL-11",
        "name": "Commuter 11",
        "type": "KRL",
        "year": 2022
    });
    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/v1/trains", Some("teknisi"), train_payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_roles_and_unknown_trains_are_rejected() {
    let app = TestApp::new().await;

    let payload = json!({
        "train_code": "KRL-12",
        "name": "Commuter 12",
        "type": "KRL",
        "year": 2022
    });
    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/v1/trains", Some("superuser"), payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let report = json!({
        "train_id": Uuid::new_v4(),
        "severity": "Low",
        "status": "Open",
        "description": "Ghost train",
        "reported_date": Utc::now().to_rfc3339()
    });
    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/v1/reports", Some("admin"), report))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_severity_values_fail_deserialization() {
    let app = TestApp::new().await;
    let train = insert_train(&app.state, "KRL-01", "Commuter 01", "KRL").await;

    let report = json!({
        "train_id": train,
        "severity": "Catastrophic",
        "status": "Open",
        "description": "Bad value",
        "reported_date": Utc::now().to_rfc3339()
    });
    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/v1/reports", Some("admin"), report))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn train_listing_derives_condition_from_open_reports() {
    let app = TestApp::new().await;
    let healthy = insert_train(&app.state, "KRL-01", "Commuter 01", "KRL").await;
    let broken = insert_train(&app.state, "KRL-02", "Commuter 02", "KRL").await;
    insert_report(&app.state, broken, None, "High", "Open", Utc::now()).await;
    insert_report(&app.state, healthy, None, "Low", "Finished", Utc::now()).await;

    let response = app
        .router
        .clone()
        .oneshot(get("/api/v1/trains"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    // Ordered by train code.
    assert_eq!(items[0]["train_code"], json!("KRL-01"));
    assert_eq!(items[0]["kondisi"], json!("Layak"));
    assert_eq!(items[0]["total_laporan"], json!(1));
    assert_eq!(items[1]["kondisi"], json!("Perbaikan"));
    assert_eq!(items[1]["total_laporan_open"], json!(1));
}

#[tokio::test]
async fn train_detail_includes_reports_maintenance_and_inspections() {
    let app = TestApp::new().await;
    let train = insert_train(&app.state, "KRL-01", "Commuter 01", "KRL").await;
    let tech = insert_technician(&app.state, "Ayu", "Electrical").await;
    insert_report(&app.state, train, Some(tech), "High", "Open", Utc::now()).await;
    insert_maintenance(&app.state, train, "Brake check", "High", "Pending", Utc::now()).await;
    insert_inspection(&app.state, train, "Medium").await;

    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/api/v1/trains/{}", train)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["data"]["crash_reports"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["data"]["crash_reports"][0]["technicians"]["name"],
        json!("Ayu")
    );
    assert_eq!(body["data"]["maintenance"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["inspections"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn report_listing_supports_free_text_search() {
    let app = TestApp::new().await;
    let train = insert_train(&app.state, "KRL-01", "Commuter 01", "KRL").await;
    let other = insert_train(&app.state, "LRT-01", "Light 01", "LRT").await;
    insert_report(&app.state, train, None, "High", "Open", Utc::now()).await;
    insert_report(&app.state, other, None, "Low", "Open", Utc::now()).await;

    let response = app
        .router
        .clone()
        .oneshot(get("/api/v1/reports?search=krl"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["trains"]["train_code"], json!("KRL-01"));
}

#[tokio::test]
async fn permission_endpoint_reports_the_matrix() {
    let app = TestApp::new().await;

    let response = app
        .router
        .clone()
        .oneshot(get("/api/v1/permissions/viewer"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["data"]["label"], json!("Viewer"));
    let modules = body["data"]["modules"].as_array().unwrap();
    assert_eq!(modules.len(), 6);
    assert!(modules.iter().all(|m| m["view"] == json!(true)));
    assert!(modules.iter().all(|m| m["delete"] == json!(false)));

    let response = app
        .router
        .clone()
        .oneshot(get("/api/v1/permissions/root"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn creating_a_report_notifies_subscribed_users() {
    let app = TestApp::new().await;
    let train = insert_train(&app.state, "KRL-01", "Commuter 01", "KRL").await;
    let user = Uuid::new_v4();
    let mut live = app.state.notifications.subscribe(user);

    let report = json!({
        "train_id": train,
        "severity": "Critical",
        "status": "Open",
        "description": "Derailment near depot",
        "reported_date": Utc::now().to_rfc3339()
    });
    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/v1/reports", Some("admin"), report))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let delivered = tokio::time::timeout(std::time::Duration::from_secs(2), live.recv())
        .await
        .expect("notification within deadline")
        .expect("channel open");
    assert_eq!(delivered.title, "New crash report");

    // The stored feed serves the REST endpoints as well.
    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/api/v1/notifications/{}", user)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["unread_count"], json!(1));
    let id = body["data"]["notifications"][0]["id"].as_str().unwrap().to_string();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/notifications/{}/{}/read", user, id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.state.notifications.unread_count(user), 0);

    app.state.notifications.unsubscribe(user);
}

#[tokio::test]
async fn status_changes_emit_status_notifications() {
    let app = TestApp::new().await;
    let train = insert_train(&app.state, "KRL-01", "Commuter 01", "KRL").await;
    let report = insert_report(&app.state, train, None, "High", "Open", Utc::now()).await;
    let user = Uuid::new_v4();
    let mut live = app.state.notifications.subscribe(user);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/v1/reports/{}", report))
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-user-role", "teknisi")
                .body(Body::from(json!({ "status": "Finished" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The update emits a generic update followed by the status change.
    let mut titles = Vec::new();
    for _ in 0..2 {
        let delivered = tokio::time::timeout(std::time::Duration::from_secs(2), live.recv())
            .await
            .expect("notification within deadline")
            .expect("channel open");
        titles.push(delivered.title);
    }
    assert!(titles.contains(&"Report status changed".to_string()));
}
