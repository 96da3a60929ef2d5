// src/tests/router_tests/session_routes_tests.rs

use super::{read_json, TestApp};
use http::Method;
use serde_json::json;

#[test]
fn session_reports_backend_and_count() {
    let app = TestApp::new();
    let body = read_json(app.call(Method::GET, "/api/session", None));

    assert_eq!(body["backend"], "local");
    assert_eq!(body["loading"], false);
    assert_eq!(body["count"], 0);
    assert_eq!(body["error"], json!(null));
}

#[test]
fn banner_survives_until_dismissed() {
    let app = TestApp::new();
    app.call(Method::POST, "/api/prospects", Some(json!({ "phone": "01" })));

    let body = read_json(app.call(Method::GET, "/api/session", None));
    assert!(body["error"].is_string());

    assert_eq!(
        app.call(Method::DELETE, "/api/session/error", None).status(),
        204
    );
    let body = read_json(app.call(Method::GET, "/api/session", None));
    assert_eq!(body["error"], json!(null));
}

#[test]
fn dashboard_counts_the_collection() {
    let app = TestApp::new();
    app.call(
        Method::POST,
        "/api/prospects",
        Some(json!({ "name": "Ana", "phone": "01", "projectType": "woodwork" })),
    );

    let body = read_json(app.call(Method::GET, "/api/dashboard", None));
    assert_eq!(body["total"], 1);
    assert_eq!(body["byStatus"][0]["count"], 1);
    assert_eq!(body["projectTypes"][1]["percent"], 100);
}

#[test]
fn visibility_toggles_the_refresher() {
    let app = TestApp::new();

    let resp = app.call(Method::POST, "/api/visibility", Some(json!({ "visible": false })));
    assert_eq!(resp.status(), 200);
    assert!(!app.state.refresher.is_visible());

    app.call(Method::POST, "/api/visibility", Some(json!({ "visible": true })));
    assert!(app.state.refresher.is_visible());
}

#[test]
fn manual_refresh_on_local_cache_is_ok() {
    let app = TestApp::new();
    let resp = app.call(Method::POST, "/api/refresh", None);

    assert_eq!(resp.status(), 200);
    assert_eq!(read_json(resp)["refreshing"], false);
}

#[test]
fn unknown_route_is_not_found() {
    let app = TestApp::new();
    let resp = app.call(Method::GET, "/api/nowhere", None);

    assert_eq!(resp.status(), 404);
    assert!(read_json(resp)["error"]
        .as_str()
        .unwrap()
        .contains("/api/nowhere"));
}
