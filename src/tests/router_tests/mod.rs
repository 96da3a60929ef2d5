mod prospect_routes_tests;
mod session_routes_tests;

use crate::refresh::Refresher;
use crate::router::{handle, AppState};
use crate::tests::utils::{local_book, temp_cache, FakeServer};
use astra::{Body, Request, Response};
use http::Method;
use serde_json::Value;
use std::io::Read;
use std::time::Duration;
use tempfile::TempDir;

/// A local-cache app plus what must stay alive alongside it.
pub struct TestApp {
    pub state: AppState,
    pub webhook: FakeServer,
    _dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let (dir, db) = temp_cache();
        let webhook = FakeServer::spawn(|_| (200, "{}".to_string()));
        let book = local_book(db, &webhook);
        let refresher = Refresher::spawn(book.clone(), Duration::from_secs(3600));
        Self {
            state: AppState { book, refresher },
            webhook,
            _dir: dir,
        }
    }

    /// Route a request and turn handler errors into responses like the server does.
    pub fn call(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let body = match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        };
        let req: Request = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(body)
            .unwrap();

        match handle(req, &self.state) {
            Ok(resp) => resp,
            Err(err) => crate::responses::error_to_response(err),
        }
    }
}

pub fn read_json(mut resp: Response) -> Value {
    let mut buf = Vec::new();
    resp.body_mut().reader().read_to_end(&mut buf).unwrap();
    serde_json::from_slice(&buf).unwrap_or(Value::Null)
}
