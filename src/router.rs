use std::collections::HashMap;
use std::io::Read;

use astra::Request;
use chrono::{NaiveDate, NaiveTime};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::book::ProspectBook;
use crate::domain::prospect::today;
use crate::domain::{Action, AppointmentCapture, ProspectDraft, ProspectPatch, QuickAction, Status};
use crate::errors::CrmError;
use crate::refresh::Refresher;
use crate::responses::{json_response, no_content, ResultResp};

/// What every request handler gets.
pub struct AppState {
    pub book: ProspectBook,
    pub refresher: Refresher,
}

#[derive(Deserialize)]
struct StatusBody {
    status: Status,
}

#[derive(Deserialize)]
struct ActionBody {
    action: QuickAction,
}

#[derive(Deserialize)]
struct AppointmentBody {
    #[serde(default, deserialize_with = "crate::domain::prospect::blank_date")]
    date: Option<NaiveDate>,
    /// Absent: default time. `null` or "": no time.
    #[serde(default, deserialize_with = "crate::domain::prospect::present_time")]
    time: Option<Option<NaiveTime>>,
}

#[derive(Deserialize)]
struct VisibilityBody {
    visible: bool,
}

pub fn handle(mut req: Request, state: &AppState) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let query = parse_query(&req);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let book = &state.book;
    let q = query.get("q").map(String::as_str).unwrap_or("");

    match (method.as_str(), segments.as_slice()) {
        ("GET", ["api", "prospects"]) => json_response(200, &book.search(q)),
        ("POST", ["api", "prospects"]) => {
            let draft: ProspectDraft = read_json(&mut req)?;
            json_response(201, &book.create(draft)?)
        }
        ("GET", ["api", "prospects", id]) => json_response(200, &book.get(id)?),
        ("PATCH", ["api", "prospects", id]) => {
            let patch: ProspectPatch = read_json(&mut req)?;
            json_response(200, &book.update(id, patch)?)
        }
        ("DELETE", ["api", "prospects", id]) => {
            book.delete(id)?;
            no_content()
        }
        ("PUT", ["api", "prospects", id, "status"]) => {
            let body: StatusBody = read_json(&mut req)?;
            json_response(200, &book.update_status(id, body.status)?)
        }
        ("POST", ["api", "prospects", id, "actions"]) => {
            let body: ActionBody = read_json(&mut req)?;
            json_response(200, &book.apply_action(id, body.action.into(), today())?)
        }
        ("POST", ["api", "prospects", id, "appointment"]) => {
            let body: AppointmentBody = read_json(&mut req)?;
            let today = today();
            let capture = AppointmentCapture::confirm(today, body.date, body.time);
            let action = Action::ScheduleAppointment(capture);
            json_response(200, &book.apply_action(id, action, today)?)
        }
        ("GET", ["api", "board"]) => json_response(200, &book.board(q)),
        ("GET", ["api", "dashboard"]) => json_response(200, &book.dashboard(today())),
        ("POST", ["api", "refresh"]) => {
            book.refresh()?;
            json_response(200, &book.status())
        }
        ("POST", ["api", "visibility"]) => {
            let body: VisibilityBody = read_json(&mut req)?;
            state.refresher.set_visible(body.visible);
            json_response(200, &book.status())
        }
        ("GET", ["api", "session"]) => json_response(200, &book.status()),
        ("DELETE", ["api", "session", "error"]) => {
            book.dismiss_error();
            no_content()
        }
        _ => Err(CrmError::NotFound(format!("no route for {method} {path}"))),
    }
}

fn read_json<T: DeserializeOwned>(req: &mut Request) -> Result<T, CrmError> {
    let mut buf = Vec::new();
    req.body_mut()
        .reader()
        .read_to_end(&mut buf)
        .map_err(|e| CrmError::BadRequest(format!("read body: {e}")))?;

    serde_json::from_slice(&buf).map_err(|e| CrmError::BadRequest(format!("invalid json: {e}")))
}

fn parse_query(req: &Request) -> HashMap<String, String> {
    req.uri()
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}
