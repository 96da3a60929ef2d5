// src/notifier.rs

use chrono::{NaiveDate, NaiveTime};
use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::prospect::hhmm;
use crate::domain::{ProjectType, Prospect};
use crate::errors::CrmError;

/// Body posted to the appointment webhook.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentNotice {
    pub prospect_id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub city: String,
    pub project_type: ProjectType,
    pub appointment_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub appointment_time: Option<NaiveTime>,
}

impl AppointmentNotice {
    pub fn new(prospect: &Prospect, date: NaiveDate, time: Option<NaiveTime>) -> Self {
        Self {
            prospect_id: prospect.id.clone(),
            name: prospect.name.clone(),
            phone: prospect.phone.clone(),
            email: prospect.email.clone(),
            city: prospect.city.clone(),
            project_type: prospect.project_type,
            appointment_date: date,
            appointment_time: time,
        }
    }
}

#[derive(Clone)]
pub struct AppointmentNotifier {
    webhook_url: String,
    client: Client,
}

impl AppointmentNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            client: Client::new(),
        }
    }

    pub fn send(&self, notice: &AppointmentNotice) -> Result<(), CrmError> {
        let resp = self
            .client
            .post(&self.webhook_url)
            .json(notice)
            .send()
            .map_err(|e| CrmError::transport("appointment webhook", e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_else(|_| "(no body)".to_string());
            return Err(CrmError::Remote {
                operation: "notify",
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    /// Fire and forget. Delivery failures are logged and dropped; the
    /// appointment stands either way.
    pub fn notify_in_background(&self, notice: AppointmentNotice) -> std::thread::JoinHandle<()> {
        let notifier = self.clone();
        std::thread::spawn(move || match notifier.send(&notice) {
            Ok(()) => info!(id = %notice.prospect_id, "appointment webhook delivered"),
            Err(e) => warn!(id = %notice.prospect_id, error = %e, "appointment webhook failed"),
        })
    }
}
