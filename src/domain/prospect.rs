// src/domain/prospect.rs

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::CrmError;

/// Pipeline stage of a prospect.
///
/// The declaration order is the board/dashboard order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    NewLead,
    #[serde(rename = "followup-1")]
    Followup1,
    #[serde(rename = "followup-3")]
    Followup3,
    CallbackDue,
    AppointmentScheduled,
    Sold,
    NotInterested,
    ClosedRequest,
}

impl Status {
    pub const ALL: [Status; 8] = [
        Status::NewLead,
        Status::Followup1,
        Status::Followup3,
        Status::CallbackDue,
        Status::AppointmentScheduled,
        Status::Sold,
        Status::NotInterested,
        Status::ClosedRequest,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Status::NewLead => "new-lead",
            Status::Followup1 => "followup-1",
            Status::Followup3 => "followup-3",
            Status::CallbackDue => "callback-due",
            Status::AppointmentScheduled => "appointment-scheduled",
            Status::Sold => "sold",
            Status::NotInterested => "not-interested",
            Status::ClosedRequest => "closed-request",
        }
    }

    /// Column heading shown on the board and dashboard.
    pub fn label(self) -> &'static str {
        match self {
            Status::NewLead => "New leads",
            Status::Followup1 => "Follow-up +1",
            Status::Followup3 => "Follow-up +3",
            Status::CallbackDue => "Callback due",
            Status::AppointmentScheduled => "Appointment scheduled",
            Status::Sold => "Sold",
            Status::NotInterested => "Not interested",
            Status::ClosedRequest => "Request closed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    #[default]
    Pergolas,
    Woodwork,
    Conservatory,
}

impl ProjectType {
    pub const ALL: [ProjectType; 3] = [
        ProjectType::Pergolas,
        ProjectType::Woodwork,
        ProjectType::Conservatory,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ProjectType::Pergolas => "pergolas",
            ProjectType::Woodwork => "woodwork",
            ProjectType::Conservatory => "conservatory",
        }
    }

    /// Capitalised key, e.g. "Woodwork".
    pub fn label(self) -> String {
        let key = self.key();
        let mut chars = key.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Case-insensitive key lookup.
    pub fn from_key(raw: &str) -> Option<ProjectType> {
        let lower = raw.trim().to_lowercase();
        ProjectType::ALL.into_iter().find(|t| t.key() == lower)
    }
}

/// A sales lead tracked through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prospect {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub project_type: ProjectType,
    pub entry_date: NaiveDate,
    #[serde(default)]
    pub callback_date: Option<NaiveDate>,
    #[serde(default)]
    pub appointment_date: Option<NaiveDate>,
    #[serde(default, with = "hhmm")]
    pub appointment_time: Option<NaiveTime>,
    pub status: Status,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Prospect {
    /// Build a prospect from a draft and the identifier the backend picked.
    pub fn from_draft(id: String, draft: ProspectDraft) -> Self {
        Self {
            id,
            name: draft.name,
            phone: draft.phone,
            email: draft.email,
            city: draft.city,
            project_type: draft.project_type,
            entry_date: draft.entry_date,
            callback_date: draft.callback_date,
            appointment_date: draft.appointment_date,
            appointment_time: draft.appointment_time,
            status: draft.status,
            notes: draft.notes,
        }
    }

    /// Merge a partial update in place. Later patches win.
    pub fn apply(&mut self, patch: &ProspectPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(phone) = &patch.phone {
            self.phone = phone.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        if let Some(city) = &patch.city {
            self.city = city.clone();
        }
        if let Some(project_type) = patch.project_type {
            self.project_type = project_type;
        }
        if let Some(callback_date) = patch.callback_date {
            self.callback_date = callback_date;
        }
        if let Some(appointment_date) = patch.appointment_date {
            self.appointment_date = appointment_date;
        }
        if let Some(appointment_time) = patch.appointment_time {
            self.appointment_time = appointment_time;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(notes) = &patch.notes {
            self.notes = notes.clone();
        }
    }

    /// Case-insensitive substring match across the searchable fields.
    /// `needle` must already be trimmed and lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.email.to_lowercase().contains(needle)
            || self.phone.contains(needle)
            || self.city.to_lowercase().contains(needle)
            || self.project_type.key().contains(needle)
    }
}

/// Everything a new prospect carries except the identifier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProspectDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub project_type: ProjectType,
    #[serde(default = "today")]
    pub entry_date: NaiveDate,
    #[serde(default, deserialize_with = "blank_date")]
    pub callback_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_date")]
    pub appointment_date: Option<NaiveDate>,
    #[serde(default, with = "hhmm")]
    pub appointment_time: Option<NaiveTime>,
    #[serde(default = "new_lead")]
    pub status: Status,
    #[serde(default, deserialize_with = "blank_string")]
    pub notes: Option<String>,

    /// Split-name form input; folded into `name` by `normalize`.
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Current local calendar day.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn new_lead() -> Status {
    Status::NewLead
}

impl ProspectDraft {
    pub fn new(name: impl Into<String>, phone: impl Into<String>, entry_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: String::new(),
            city: String::new(),
            project_type: ProjectType::default(),
            entry_date,
            callback_date: None,
            appointment_date: None,
            appointment_time: None,
            status: Status::NewLead,
            notes: None,
            first_name: None,
            last_name: None,
        }
    }

    /// Fold split names into `name`, trim, and enforce the mandatory fields.
    pub fn normalize(mut self) -> Result<Self, CrmError> {
        if self.name.trim().is_empty() {
            let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
                .into_iter()
                .flatten()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            self.name = parts.join(" ");
        }
        self.first_name = None;
        self.last_name = None;

        self.name = self.name.trim().to_string();
        self.phone = self.phone.trim().to_string();

        if self.name.is_empty() {
            return Err(CrmError::BadRequest("name is required".into()));
        }
        if self.phone.is_empty() {
            return Err(CrmError::BadRequest("phone is required".into()));
        }
        if self.notes.as_deref().is_some_and(str::is_empty) {
            self.notes = None;
        }
        Ok(self)
    }
}

/// Partial update. `None` leaves a field untouched; for nullable fields
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProspectPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub project_type: Option<ProjectType>,
    #[serde(default, deserialize_with = "present_date")]
    pub callback_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "present_date")]
    pub appointment_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "present_time")]
    pub appointment_time: Option<Option<NaiveTime>>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default, deserialize_with = "present_string")]
    pub notes: Option<Option<String>>,
}

impl ProspectPatch {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

impl From<&ProspectDraft> for ProspectPatch {
    fn from(draft: &ProspectDraft) -> Self {
        Self {
            name: Some(draft.name.clone()),
            phone: Some(draft.phone.clone()),
            email: Some(draft.email.clone()),
            city: Some(draft.city.clone()),
            project_type: Some(draft.project_type),
            callback_date: Some(draft.callback_date),
            appointment_date: Some(draft.appointment_date),
            appointment_time: Some(draft.appointment_time),
            status: Some(draft.status),
            notes: Some(draft.notes.clone()),
        }
    }
}

// Form inputs send "" for a cleared picker; treat it like null.

fn blank_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.filter(|s| !s.is_empty()))
}

pub(crate) fn blank_date<'de, D>(d: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(d)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn present_string<'de, D>(d: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    blank_string(d).map(Some)
}

fn present_date<'de, D>(d: D) -> Result<Option<Option<NaiveDate>>, D::Error>
where
    D: Deserializer<'de>,
{
    blank_date(d).map(Some)
}

pub(crate) fn present_time<'de, D>(d: D) -> Result<Option<Option<NaiveTime>>, D::Error>
where
    D: Deserializer<'de>,
{
    hhmm::deserialize(d).map(Some)
}

/// `HH:MM` wire format for an optional time of day.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn parse(raw: &str) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(raw, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .ok()
    }

    pub fn format(time: NaiveTime) -> String {
        time.format(FORMAT).to_string()
    }

    pub fn serialize<S>(value: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(t) => s.serialize_str(&format(*t)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => parse(s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid time `{s}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_keys_match_serde_names() {
        for status in Status::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.key()));
        }
    }

    #[test]
    fn project_type_label_is_capitalised_key() {
        assert_eq!(ProjectType::Conservatory.label(), "Conservatory");
        assert_eq!(ProjectType::from_key(" WOODWORK "), Some(ProjectType::Woodwork));
        assert_eq!(ProjectType::from_key("shed"), None);
    }

    #[test]
    fn patch_distinguishes_absent_from_null() {
        let patch: ProspectPatch =
            serde_json::from_str(r#"{"callbackDate": null, "appointmentTime": "09:30"}"#).unwrap();
        assert_eq!(patch.callback_date, Some(None));
        assert_eq!(patch.appointment_date, None);
        assert_eq!(
            patch.appointment_time,
            Some(NaiveTime::from_hms_opt(9, 30, 0))
        );
    }

    #[test]
    fn draft_joins_split_names() {
        let draft: ProspectDraft = serde_json::from_str(
            r#"{"firstName": " Ada ", "lastName": "Lovelace", "phone": "0600", "notes": ""}"#,
        )
        .unwrap();
        let draft = draft.normalize().unwrap();
        assert_eq!(draft.name, "Ada Lovelace");
        assert_eq!(draft.notes, None);
        assert_eq!(draft.status, Status::NewLead);
    }

    #[test]
    fn draft_requires_phone() {
        let draft = ProspectDraft::new("Ada", "  ", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(matches!(draft.normalize(), Err(CrmError::BadRequest(_))));
    }
}
