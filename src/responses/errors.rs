use crate::errors::CrmError;
use astra::{Body, Response, ResponseBuilder};
use serde_json::json;

pub type ResultResp = Result<Response, CrmError>;

/// Convert a CrmError into a JSON error response
pub fn error_to_response(err: CrmError) -> Response {
    json_error_response(err.status_code(), &err.to_string())
}

/// Build a JSON error body: `{"error": "..."}`
pub fn json_error_response(status: u16, message: &str) -> Response {
    let body = json!({ "error": message }).to_string();

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .body(Body::from(body.clone()))
        .unwrap_or_else(|_| Response::new(Body::from(body)))
}
