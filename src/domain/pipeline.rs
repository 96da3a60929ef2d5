// src/domain/pipeline.rs

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use super::prospect::{Prospect, ProspectPatch, Status};

/// Time offered by the appointment capture step before the operator edits it.
pub fn default_appointment_time() -> NaiveTime {
    NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Card actions. Transitions are decided by the action, not by a table of
/// allowed state pairs, so any action is accepted from any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    NoAnswer,
    ScheduleCallback,
    ScheduleAppointment(AppointmentCapture),
    MarkSold,
    MarkNotInterested,
}

/// Simple actions as they arrive over the wire. Appointments go through their
/// own capture step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuickAction {
    NoAnswer,
    ScheduleCallback,
    MarkSold,
    MarkNotInterested,
}

impl From<QuickAction> for Action {
    fn from(action: QuickAction) -> Self {
        match action {
            QuickAction::NoAnswer => Action::NoAnswer,
            QuickAction::ScheduleCallback => Action::ScheduleCallback,
            QuickAction::MarkSold => Action::MarkSold,
            QuickAction::MarkNotInterested => Action::MarkNotInterested,
        }
    }
}

/// Values confirmed in the "schedule appointment" step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppointmentCapture {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

impl AppointmentCapture {
    /// Pre-filled step: today at the default time.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            date: today,
            time: Some(default_appointment_time()),
        }
    }

    /// Fill whatever the operator left out with the step's defaults.
    /// An explicitly cleared time stays cleared.
    pub fn confirm(today: NaiveDate, date: Option<NaiveDate>, time: Option<Option<NaiveTime>>) -> Self {
        let defaults = Self::new(today);
        Self {
            date: date.unwrap_or(defaults.date),
            time: time.unwrap_or(defaults.time),
        }
    }
}

/// "No answer": new-lead → followup-1 → followup-3 → closed-request.
/// Every other status, pipeline ends included, falls back to followup-1.
pub fn next_after_no_answer(current: Status) -> Status {
    match current {
        Status::Followup1 => Status::Followup3,
        Status::Followup3 => Status::ClosedRequest,
        _ => Status::Followup1,
    }
}

/// The change an action makes to a prospect.
pub fn plan(action: Action, prospect: &Prospect, today: NaiveDate) -> ProspectPatch {
    match action {
        Action::NoAnswer => ProspectPatch::status(next_after_no_answer(prospect.status)),
        Action::ScheduleCallback => ProspectPatch {
            callback_date: Some(Some(today)),
            status: Some(Status::CallbackDue),
            ..ProspectPatch::default()
        },
        Action::ScheduleAppointment(capture) => ProspectPatch {
            appointment_date: Some(Some(capture.date)),
            appointment_time: Some(capture.time),
            status: Some(Status::AppointmentScheduled),
            ..ProspectPatch::default()
        },
        Action::MarkSold => ProspectPatch::status(Status::Sold),
        Action::MarkNotInterested => ProspectPatch::status(Status::NotInterested),
    }
}
