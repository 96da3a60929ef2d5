// src/domain/dashboard.rs

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::prospect::{ProjectType, Prospect, Status};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: Status,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTypeShare {
    pub project_type: ProjectType,
    pub label: String,
    pub count: usize,
    /// Rounded to the nearest integer; 0 for an empty collection.
    pub percent: u32,
}

/// Everything the dashboard page shows, derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: usize,
    pub by_status: Vec<StatusCount>,
    pub new_this_month: usize,
    /// Filters on entry date; there is no sale date field.
    pub sold_this_month: usize,
    pub appointments_scheduled: usize,
    pub callbacks_due: usize,
    pub upcoming_callbacks: Vec<Prospect>,
    pub qualified_appointments: Vec<Prospect>,
    pub project_types: Vec<ProjectTypeShare>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
    pub status: Status,
    pub label: &'static str,
    pub prospects: Vec<Prospect>,
}

fn first_of_month(today: NaiveDate) -> NaiveDate {
    today.with_day(1).unwrap_or(today)
}

/// Counts for all eight statuses, in pipeline order, zeros included.
pub fn status_counts(prospects: &[Prospect]) -> Vec<StatusCount> {
    Status::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            label: status.label(),
            count: prospects.iter().filter(|p| p.status == status).count(),
        })
        .collect()
}

pub fn new_this_month(prospects: &[Prospect], today: NaiveDate) -> usize {
    let start = first_of_month(today);
    prospects.iter().filter(|p| p.entry_date >= start).count()
}

pub fn sold_this_month(prospects: &[Prospect], today: NaiveDate) -> usize {
    let start = first_of_month(today);
    prospects
        .iter()
        .filter(|p| p.status == Status::Sold && p.entry_date >= start)
        .count()
}

/// Callbacks dated today or later, soonest first.
pub fn upcoming_callbacks(prospects: &[Prospect], today: NaiveDate) -> Vec<Prospect> {
    let mut out: Vec<Prospect> = prospects
        .iter()
        .filter(|p| p.callback_date.is_some_and(|d| d >= today))
        .cloned()
        .collect();
    out.sort_by_key(|p| p.callback_date);
    out
}

/// Scheduled appointments that actually carry a date, soonest first.
pub fn qualified_appointments(prospects: &[Prospect]) -> Vec<Prospect> {
    let mut out: Vec<Prospect> = prospects
        .iter()
        .filter(|p| p.status == Status::AppointmentScheduled && p.appointment_date.is_some())
        .cloned()
        .collect();
    out.sort_by_key(|p| p.appointment_date);
    out
}

pub fn project_type_distribution(prospects: &[Prospect]) -> Vec<ProjectTypeShare> {
    let total = prospects.len();
    ProjectType::ALL
        .into_iter()
        .map(|project_type| {
            let count = prospects
                .iter()
                .filter(|p| p.project_type == project_type)
                .count();
            let percent = if total == 0 {
                0
            } else {
                (count as f64 * 100.0 / total as f64).round() as u32
            };
            ProjectTypeShare {
                project_type,
                label: project_type.label(),
                count,
                percent,
            }
        })
        .collect()
}

pub fn dashboard(prospects: &[Prospect], today: NaiveDate) -> DashboardStats {
    let count_status = |status| prospects.iter().filter(|p| p.status == status).count();

    DashboardStats {
        total: prospects.len(),
        by_status: status_counts(prospects),
        new_this_month: new_this_month(prospects, today),
        sold_this_month: sold_this_month(prospects, today),
        appointments_scheduled: count_status(Status::AppointmentScheduled),
        callbacks_due: count_status(Status::CallbackDue),
        upcoming_callbacks: upcoming_callbacks(prospects, today),
        qualified_appointments: qualified_appointments(prospects),
        project_types: project_type_distribution(prospects),
    }
}

/// Free-text filter over name, email, phone, city and project type.
/// A blank query returns everything in collection order.
pub fn search(prospects: &[Prospect], query: &str) -> Vec<Prospect> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return prospects.to_vec();
    }
    prospects
        .iter()
        .filter(|p| p.matches(&needle))
        .cloned()
        .collect()
}

/// One column per status in pipeline order. Empty columns are kept.
pub fn board(prospects: &[Prospect]) -> Vec<BoardColumn> {
    Status::ALL
        .into_iter()
        .map(|status| BoardColumn {
            status,
            label: status.label(),
            prospects: prospects
                .iter()
                .filter(|p| p.status == status)
                .cloned()
                .collect(),
        })
        .collect()
}
