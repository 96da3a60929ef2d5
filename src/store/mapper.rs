// src/store/mapper.rs
//
// Translation between `Prospect` and the record store's column names and
// option labels.

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::prospect::hhmm;
use crate::domain::{ProjectType, Prospect, ProspectPatch, Status};

pub const FIELD_NAME: &str = "Full name";
pub const FIELD_PHONE: &str = "Phone";
pub const FIELD_EMAIL: &str = "Email";
pub const FIELD_CITY: &str = "City";
pub const FIELD_PROJECT_TYPE: &str = "Project type";
/// Computed by the store on insert; read-only from our side.
pub const FIELD_ENTRY_DATE: &str = "Entry date";
pub const FIELD_CALLBACK_DATE: &str = "Callback date";
/// Date and time of day in one UTC timestamp.
pub const FIELD_APPOINTMENT: &str = "Appointment date";
pub const FIELD_STATUS: &str = "Prospect status";
pub const FIELD_NOTES: &str = "Notes";

/// One row as the store returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// Option label for each status in the store's "Prospect status" column.
pub fn status_label(status: Status) -> &'static str {
    match status {
        Status::NewLead => "New lead",
        Status::Followup1 => "Follow-up +1",
        Status::Followup3 => "Follow-up +3",
        Status::CallbackDue => "Callback due",
        Status::AppointmentScheduled => "Appointment scheduled",
        Status::Sold => "Sold",
        Status::NotInterested => "Not interested",
        Status::ClosedRequest => "Request closed",
    }
}

/// Unknown or missing labels land in new-lead.
pub fn status_from_label(label: Option<&str>) -> Status {
    label
        .and_then(|l| Status::ALL.into_iter().find(|s| status_label(*s) == l))
        .unwrap_or(Status::NewLead)
}

pub fn project_type_label(project_type: ProjectType) -> String {
    project_type.label()
}

/// Unknown or missing labels land in pergolas.
pub fn project_type_from_label(label: Option<&str>) -> ProjectType {
    label.and_then(ProjectType::from_key).unwrap_or_default()
}

/// `2024-05-02` or `2024-05-02T…` → date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.split('T').next()?.trim();
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Date plus optional `HH:MM` as a UTC timestamp; no time means midnight.
pub fn join_timestamp(date: NaiveDate, time: Option<NaiveTime>) -> String {
    let time = time.map(hhmm::format).unwrap_or_else(|| "00:00".to_string());
    format!("{}T{}:00.000Z", date.format("%Y-%m-%d"), time)
}

/// Inverse of `join_timestamp`, reading the time of day in UTC.
pub fn split_timestamp(raw: &str) -> (Option<NaiveDate>, Option<NaiveTime>) {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw.trim()) {
        let utc = ts.with_timezone(&Utc);
        let time = NaiveTime::from_hms_opt(utc.hour(), utc.minute(), 0);
        return (Some(utc.date_naive()), time);
    }
    match parse_date(raw) {
        Some(date) => (Some(date), Some(NaiveTime::MIN)),
        None => (None, None),
    }
}

fn text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::String(_) | Value::Null => None,
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Store row → prospect. `today` stands in for a missing entry date.
pub fn record_to_prospect(record: StoreRecord, today: NaiveDate) -> Prospect {
    let f = &record.fields;

    let entry_date = text(f, FIELD_ENTRY_DATE)
        .as_deref()
        .and_then(parse_date)
        .unwrap_or(today);
    let (appointment_date, appointment_time) = match text(f, FIELD_APPOINTMENT) {
        Some(raw) => split_timestamp(&raw),
        None => (None, None),
    };

    Prospect {
        name: text(f, FIELD_NAME).unwrap_or_default(),
        phone: text(f, FIELD_PHONE).unwrap_or_default(),
        email: text(f, FIELD_EMAIL).unwrap_or_default(),
        city: text(f, FIELD_CITY).unwrap_or_default(),
        project_type: project_type_from_label(text(f, FIELD_PROJECT_TYPE).as_deref()),
        entry_date,
        callback_date: text(f, FIELD_CALLBACK_DATE).as_deref().and_then(parse_date),
        appointment_date,
        appointment_time: appointment_date.and(appointment_time),
        status: status_from_label(text(f, FIELD_STATUS).as_deref()),
        notes: text(f, FIELD_NOTES),
        id: record.id,
    }
}

/// Patch → store fields. Unset, cleared and empty values are left out so the
/// store keeps whatever it already has. The entry date is never written.
pub fn patch_to_fields(patch: &ProspectPatch) -> Map<String, Value> {
    let mut fields = Map::new();
    let mut put = |key: &str, value: Option<String>| {
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            fields.insert(key.to_string(), Value::String(v));
        }
    };

    put(FIELD_NAME, patch.name.clone());
    put(FIELD_PHONE, patch.phone.clone());
    put(FIELD_EMAIL, patch.email.clone());
    put(FIELD_CITY, patch.city.clone());
    put(FIELD_PROJECT_TYPE, patch.project_type.map(project_type_label));
    put(
        FIELD_CALLBACK_DATE,
        patch
            .callback_date
            .flatten()
            .map(|d| d.format("%Y-%m-%d").to_string()),
    );
    put(
        FIELD_APPOINTMENT,
        patch
            .appointment_date
            .flatten()
            .map(|d| join_timestamp(d, patch.appointment_time.flatten())),
    );
    put(FIELD_STATUS, patch.status.map(|s| status_label(s).to_string()));
    put(FIELD_NOTES, patch.notes.clone().flatten());

    fields
}
