#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode, header},
    response::Response,
};
use course_planner::{DayLocale, ScheduleStore, http_api};
use serde_json::{Value, json};
use tower::util::ServiceExt;

fn new_router() -> axum::Router {
    let store = ScheduleStore::in_memory(DayLocale::English);
    let state = http_api::AppState::new(store);
    http_api::router(state)
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn merge_then_view_via_http_api() {
    let app = new_router();

    let response = send(
        &app,
        "POST",
        "/schedule/merge",
        Some(json!([{ "day": "Monday", "courses": [{ "name": "Math", "topics": ["Algebra"] }] }])),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        "POST",
        "/schedule/merge",
        Some(json!([{ "day": "Monday", "isDate": false, "courses": [{ "name": "Physics" }] }])),
    )
    .await;
    let merged = json_body(response).await;
    assert_eq!(merged.as_array().unwrap().len(), 1);
    assert_eq!(merged[0]["courses"][1]["name"], json!("Physics"));

    let response = send(&app, "GET", "/view?date=2024-10-07", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let view = json_body(response).await;
    assert_eq!(view["weekday"], json!("Monday"));
    assert_eq!(view["date"], json!("2024-10-07"));
    assert_eq!(view["items"][0]["course"]["name"], json!("Math"));
    assert_eq!(view["items"][1]["dayIndex"], json!(0));
    assert_eq!(view["items"][1]["courseIndex"], json!(1));

    let response = send(&app, "GET", "/courses", None).await;
    assert_eq!(json_body(response).await, json!(["Math", "Physics"]));
}

#[tokio::test]
async fn merge_rejects_non_list_payload() {
    let app = new_router();
    let response = send(&app, "POST", "/schedule/merge", Some(json!({ "day": "Monday" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], json!("invalid_request"));

    let response = send(&app, "GET", "/schedule", None).await;
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn view_rejects_malformed_date() {
    let app = new_router();
    let response = send(&app, "GET", "/view?date=07.10.2024", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn destructive_routes_require_confirmation() {
    let app = new_router();
    send(
        &app,
        "POST",
        "/schedule/merge",
        Some(json!([
            { "day": "2024-10-05", "isDate": true, "courses": [{ "name": "Art" }] },
            { "day": "Tuesday", "courses": [{ "name": "Math" }, { "name": "Art" }] }
        ])),
    )
    .await;

    let response = send(&app, "DELETE", "/schedule/days/0/courses/0", None).await;
    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    assert_eq!(json_body(response).await["error"], json!("confirmation_required"));

    let response = send(&app, "DELETE", "/schedule/days/0/courses/0?confirm=true", None).await;
    assert_eq!(json_body(response).await, json!({ "removed": true }));

    let response = send(&app, "GET", "/schedule", None).await;
    let schedule = json_body(response).await;
    assert_eq!(schedule.as_array().unwrap().len(), 1);
    assert_eq!(schedule[0]["day"], json!("Tuesday"));

    let response = send(&app, "DELETE", "/schedule/days/9/courses/0?confirm=true", None).await;
    assert_eq!(json_body(response).await, json!({ "removed": false }));

    let response = send(&app, "DELETE", "/courses/Art", None).await;
    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    let response = send(&app, "DELETE", "/courses/Art?confirm=true", None).await;
    assert_eq!(
        json_body(response).await,
        json!({ "course": "Art", "removed": 1 })
    );

    let response = send(&app, "DELETE", "/schedule", None).await;
    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    let response = send(&app, "DELETE", "/schedule?confirm=true", None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = send(&app, "GET", "/schedule", None).await;
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn config_toggle_and_replace() {
    let app = new_router();
    send(
        &app,
        "POST",
        "/schedule/merge",
        Some(json!([{ "day": "Monday", "courses": [{ "name": "Math" }] }])),
    )
    .await;

    let response = send(
        &app,
        "POST",
        "/config/toggle",
        Some(json!({ "course": " Math ", "day": "Tuesday" })),
    )
    .await;
    assert_eq!(
        json_body(response).await,
        json!({ "course": "Math", "days": ["Tuesday"] })
    );

    let response = send(&app, "GET", "/view?date=2024-10-07", None).await;
    assert_eq!(json_body(response).await["items"], json!([]));

    let response = send(&app, "PUT", "/config", Some(json!(["Monday"]))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "PUT",
        "/config",
        Some(json!({ "Math": ["Monday", "Friday"] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/config", None).await;
    assert_eq!(
        json_body(response).await,
        json!({ "Math": ["Monday", "Friday"] })
    );
    let response = send(&app, "GET", "/view?date=2024-10-07", None).await;
    assert_eq!(
        json_body(response).await["items"][0]["course"]["name"],
        json!("Math")
    );
}

#[tokio::test]
async fn backup_export_and_import() {
    let app = new_router();
    send(
        &app,
        "POST",
        "/schedule/merge",
        Some(json!([{ "day": "Friday", "courses": [{ "name": "Music", "note": "bring flute" }] }])),
    )
    .await;
    send(
        &app,
        "POST",
        "/config/toggle",
        Some(json!({ "course": "Music", "day": "Friday" })),
    )
    .await;

    let response = send(&app, "GET", "/backup", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"ders_programi_yedek_"));
    let backup = json_body(response).await;
    assert_eq!(backup["version"], json!(1));
    assert_eq!(backup["courseDayConfig"], json!({ "Music": ["Friday"] }));

    let other = new_router();
    send(
        &other,
        "POST",
        "/schedule/merge",
        Some(json!([{ "day": "Monday", "courses": [{ "name": "Math" }] }])),
    )
    .await;
    let response = send(&other, "POST", "/backup/import", Some(backup)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let restored = json_body(response).await;
    assert_eq!(restored[0]["courses"][0]["note"], json!("bring flute"));
    assert_eq!(restored.as_array().unwrap().len(), 1);

    let response = send(&other, "GET", "/config", None).await;
    assert_eq!(json_body(response).await, json!({ "Music": ["Friday"] }));

    let response = send(&other, "POST", "/backup/import", Some(json!({ "version": 1 }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_ok() {
    let app = new_router();
    let response = send(&app, "GET", "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "status": "ok" }));
}
