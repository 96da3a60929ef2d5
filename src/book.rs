// src/book.rs
//
// In-memory prospect collection shared with the HTTP layer. All mutations go
// through the gateway first and are applied here once the backend accepts
// them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::dashboard::{self, BoardColumn, DashboardStats};
use crate::domain::pipeline::{self, Action};
use crate::domain::{Prospect, ProspectDraft, ProspectPatch, Status};
use crate::errors::{CrmError, Result};
use crate::notifier::{AppointmentNotice, AppointmentNotifier};
use crate::store::{Backend, ProspectGateway};

#[derive(Debug, Default)]
struct BookState {
    prospects: Vec<Prospect>,
    loading: bool,
    refreshes_in_flight: usize,
    /// Dismissible banner text from the last failed operation.
    error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub backend: Backend,
    pub loading: bool,
    pub refreshing: bool,
    pub error: Option<String>,
    pub count: usize,
}

#[derive(Clone)]
pub struct ProspectBook {
    gateway: Arc<dyn ProspectGateway>,
    notifier: AppointmentNotifier,
    state: Arc<Mutex<BookState>>,
    /// Set on teardown; fetches that land afterwards are discarded.
    cancelled: Arc<AtomicBool>,
}

impl ProspectBook {
    pub fn new(gateway: Arc<dyn ProspectGateway>, notifier: AppointmentNotifier) -> Self {
        Self {
            gateway,
            notifier,
            state: Arc::new(Mutex::new(BookState {
                loading: true,
                ..BookState::default()
            })),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    fn state(&self) -> MutexGuard<'_, BookState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn clear_error(&self) {
        self.state().error = None;
    }

    /// Put the failure on the banner and hand it back to the caller.
    fn track<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!(error = %e, "prospect operation failed");
            self.state().error = Some(e.to_string());
        }
        result
    }

    pub fn backend(&self) -> Backend {
        self.gateway.backend()
    }

    /// Initial fetch of the whole collection.
    pub fn load(&self) -> Result<()> {
        {
            let mut state = self.state();
            state.error = None;
            state.loading = true;
        }

        let fetched = self.gateway.list();
        if self.is_cancelled() {
            debug!("discarding load result after teardown");
            self.state().loading = false;
            return Ok(());
        }

        let result = fetched.map(|prospects| {
            info!(count = prospects.len(), backend = ?self.backend(), "prospects loaded");
            self.state().prospects = prospects;
        });
        let result = self.track(result);
        self.state().loading = false;
        result
    }

    /// Re-fetch from the remote store. No-op for the local cache.
    /// Concurrent calls each issue their own fetch.
    pub fn refresh(&self) -> Result<()> {
        if self.backend() == Backend::Local {
            return Ok(());
        }

        {
            let mut state = self.state();
            state.error = None;
            state.refreshes_in_flight += 1;
        }

        let fetched = self.gateway.list();
        self.state().refreshes_in_flight -= 1;

        if self.is_cancelled() {
            debug!("discarding refresh result after teardown");
            return Ok(());
        }

        let result = fetched.map(|prospects| {
            debug!(count = prospects.len(), "prospects refreshed");
            self.state().prospects = prospects;
        });
        self.track(result)
    }

    pub fn refresh_in_background(&self) -> JoinHandle<()> {
        let book = self.clone();
        std::thread::spawn(move || {
            // failures already sit on the banner
            let _ = book.refresh();
        })
    }

    pub fn snapshot(&self) -> Vec<Prospect> {
        self.state().prospects.clone()
    }

    pub fn get(&self, id: &str) -> Result<Prospect> {
        self.state()
            .prospects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| CrmError::NotFound(format!("prospect {id}")))
    }

    /// Nothing is added locally when the backend refuses the insert.
    pub fn create(&self, draft: ProspectDraft) -> Result<Prospect> {
        self.clear_error();
        let result = draft
            .normalize()
            .and_then(|draft| self.gateway.create(draft));
        let prospect = self.track(result)?;

        info!(id = %prospect.id, "prospect created");
        self.state().prospects.push(prospect.clone());
        Ok(prospect)
    }

    pub fn update(&self, id: &str, patch: ProspectPatch) -> Result<Prospect> {
        self.clear_error();
        let current = self.track(self.get(id))?;
        let patch = self.track(complete_appointment(patch, &current))?;

        self.track(self.gateway.update(id, &patch))?;

        let mut state = self.state();
        let updated = match state.prospects.iter_mut().find(|p| p.id == id) {
            Some(prospect) => {
                prospect.apply(&patch);
                prospect.clone()
            }
            // deleted while the update was in flight
            None => {
                let mut prospect = current;
                prospect.apply(&patch);
                prospect
            }
        };
        Ok(updated)
    }

    pub fn update_status(&self, id: &str, status: Status) -> Result<Prospect> {
        self.update(id, ProspectPatch::status(status))
    }

    /// Run a card action. A confirmed appointment also pings the webhook
    /// once the change is committed.
    pub fn apply_action(&self, id: &str, action: Action, today: NaiveDate) -> Result<Prospect> {
        self.clear_error();
        let current = self.track(self.get(id))?;
        let patch = pipeline::plan(action, &current, today);
        let updated = self.update(id, patch)?;

        if let Action::ScheduleAppointment(capture) = action {
            let notice = AppointmentNotice::new(&updated, capture.date, capture.time);
            self.notifier.notify_in_background(notice);
        }
        Ok(updated)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.clear_error();
        self.track(self.get(id))?;
        self.track(self.gateway.delete(id))?;

        self.state().prospects.retain(|p| p.id != id);
        info!(id, "prospect deleted");
        Ok(())
    }

    pub fn search(&self, query: &str) -> Vec<Prospect> {
        dashboard::search(&self.state().prospects, query)
    }

    pub fn board(&self, query: &str) -> Vec<BoardColumn> {
        dashboard::board(&self.search(query))
    }

    pub fn dashboard(&self, today: NaiveDate) -> DashboardStats {
        dashboard::dashboard(&self.state().prospects, today)
    }

    pub fn status(&self) -> SessionStatus {
        let state = self.state();
        SessionStatus {
            backend: self.gateway.backend(),
            loading: state.loading,
            refreshing: state.refreshes_in_flight > 0,
            error: state.error.clone(),
            count: state.prospects.len(),
        }
    }

    pub fn dismiss_error(&self) {
        self.clear_error();
    }

    pub fn shutdown(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// The store keeps appointment date and time in one column, so an edit to
/// either half carries the other half along. A time needs a date to live on.
fn complete_appointment(mut patch: ProspectPatch, current: &Prospect) -> Result<ProspectPatch> {
    let date = patch.appointment_date.unwrap_or(current.appointment_date);
    if matches!(patch.appointment_time, Some(Some(_))) && date.is_none() {
        return Err(CrmError::BadRequest(
            "appointment time needs an appointment date".into(),
        ));
    }

    match (patch.appointment_date, patch.appointment_time) {
        (None, Some(_)) if current.appointment_date.is_some() => {
            patch.appointment_date = Some(current.appointment_date);
        }
        (Some(Some(_)), None) => {
            patch.appointment_time = Some(current.appointment_time);
        }
        _ => {}
    }
    Ok(patch)
}
