// src/tests/router_tests/prospect_routes_tests.rs

use super::{read_json, TestApp};
use http::Method;
use serde_json::json;

fn create(app: &TestApp, name: &str, city: &str) -> String {
    let resp = app.call(
        Method::POST,
        "/api/prospects",
        Some(json!({ "name": name, "phone": "0601", "city": city, "entryDate": "2024-05-02" })),
    );
    assert_eq!(resp.status(), 201);
    read_json(resp)["id"].as_str().unwrap().to_string()
}

#[test]
fn create_then_fetch_by_id() {
    let app = TestApp::new();
    let id = create(&app, "Ana", "Lyon");

    let resp = app.call(Method::GET, &format!("/api/prospects/{id}"), None);
    assert_eq!(resp.status(), 200);

    let body = read_json(resp);
    assert_eq!(body["name"], "Ana");
    assert_eq!(body["status"], "new-lead");
    assert_eq!(body["projectType"], "pergolas");
    assert_eq!(body["entryDate"], "2024-05-02");
}

#[test]
fn create_from_split_names() {
    let app = TestApp::new();
    let resp = app.call(
        Method::POST,
        "/api/prospects",
        Some(json!({ "firstName": "Ada", "lastName": "Lovelace", "phone": "0601" })),
    );
    assert_eq!(resp.status(), 201);
    assert_eq!(read_json(resp)["name"], "Ada Lovelace");
}

#[test]
fn create_without_phone_is_bad_request() {
    let app = TestApp::new();
    let resp = app.call(Method::POST, "/api/prospects", Some(json!({ "name": "Ana" })));

    assert_eq!(resp.status(), 400);
    assert!(read_json(resp)["error"].as_str().unwrap().contains("phone"));
}

#[test]
fn malformed_body_is_bad_request() {
    let app = TestApp::new();
    let resp = app.call(Method::PATCH, "/api/prospects/1", Some(json!([1, 2])));
    assert_eq!(resp.status(), 400);
}

#[test]
fn list_filters_with_query() {
    let app = TestApp::new();
    create(&app, "Ana", "Lyon");
    create(&app, "Ben", "Nantes");

    let all = read_json(app.call(Method::GET, "/api/prospects", None));
    assert_eq!(all.as_array().unwrap().len(), 2);

    let found = read_json(app.call(Method::GET, "/api/prospects?q=nan", None));
    let names: Vec<&str> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Ben"]);
}

#[test]
fn patch_clears_nullable_fields() {
    let app = TestApp::new();
    let id = create(&app, "Ana", "Lyon");
    let uri = format!("/api/prospects/{id}");

    app.call(
        Method::PATCH,
        &uri,
        Some(json!({ "callbackDate": "2024-05-20", "notes": "call after 6pm" })),
    );
    let resp = app.call(Method::PATCH, &uri, Some(json!({ "callbackDate": null })));
    assert_eq!(resp.status(), 200);

    let body = read_json(resp);
    assert_eq!(body["callbackDate"], json!(null));
    assert_eq!(body["notes"], "call after 6pm");
}

#[test]
fn status_route_moves_the_card() {
    let app = TestApp::new();
    let id = create(&app, "Ana", "Lyon");

    let resp = app.call(
        Method::PUT,
        &format!("/api/prospects/{id}/status"),
        Some(json!({ "status": "not-interested" })),
    );
    assert_eq!(read_json(resp)["status"], "not-interested");

    let board = read_json(app.call(Method::GET, "/api/board", None));
    assert_eq!(board.as_array().unwrap().len(), 8);
    assert_eq!(board[6]["status"], "not-interested");
    assert_eq!(board[6]["prospects"][0]["id"], id);
}

#[test]
fn no_answer_action_advances_followups() {
    let app = TestApp::new();
    let id = create(&app, "Ana", "Lyon");
    let uri = format!("/api/prospects/{id}/actions");

    let first = read_json(app.call(Method::POST, &uri, Some(json!({ "action": "no-answer" }))));
    let second = read_json(app.call(Method::POST, &uri, Some(json!({ "action": "no-answer" }))));

    assert_eq!(first["status"], "followup-1");
    assert_eq!(second["status"], "followup-3");
}

#[test]
fn appointment_route_schedules_and_notifies() {
    let app = TestApp::new();
    let id = create(&app, "Ana", "Lyon");

    let resp = app.call(
        Method::POST,
        &format!("/api/prospects/{id}/appointment"),
        Some(json!({ "date": "2030-01-15", "time": "14:00" })),
    );
    assert_eq!(resp.status(), 200);

    let body = read_json(resp);
    assert_eq!(body["status"], "appointment-scheduled");
    assert_eq!(body["appointmentDate"], "2030-01-15");
    assert_eq!(body["appointmentTime"], "14:00");

    let sent = app.webhook.wait_for(1);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].json()["appointmentTime"], "14:00");
}

#[test]
fn delete_returns_no_content_then_not_found() {
    let app = TestApp::new();
    let id = create(&app, "Ana", "Lyon");
    let uri = format!("/api/prospects/{id}");

    assert_eq!(app.call(Method::DELETE, &uri, None).status(), 204);
    assert_eq!(app.call(Method::GET, &uri, None).status(), 404);
}
