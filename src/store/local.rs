// src/store/local.rs

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, warn};

use super::{Backend, ProspectGateway};
use crate::db::cache::{read_blob, write_blob, PROSPECTS_KEY};
use crate::db::connection::{init_db, Database};
use crate::domain::{Prospect, ProspectDraft, ProspectPatch};
use crate::errors::{CrmError, Result};

/// Whole collection kept as one JSON blob in the SQLite cache.
pub struct LocalGateway {
    db: Database,
    /// `None` until the persisted blob has been read once. Nothing is written
    /// while this is `None`.
    collection: Mutex<Option<Vec<Prospect>>>,
}

impl LocalGateway {
    pub fn open(db: Database) -> Result<Self> {
        init_db(&db)?;
        Ok(Self {
            db,
            collection: Mutex::new(None),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<Vec<Prospect>>> {
        self.collection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Malformed data resets to an empty collection instead of failing.
    fn read_persisted(&self) -> Result<Vec<Prospect>> {
        let Some(blob) = self.db.with_conn(|conn| read_blob(conn, PROSPECTS_KEY))? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<Prospect>>(&blob) {
            Ok(prospects) => Ok(prospects),
            Err(e) => {
                warn!(error = %e, "local cache is malformed, starting empty");
                Ok(Vec::new())
            }
        }
    }

    fn persist(&self, prospects: &[Prospect]) -> Result<()> {
        let blob = serde_json::to_string(prospects)?;
        self.db.with_conn(|conn| write_blob(conn, PROSPECTS_KEY, &blob))?;
        debug!(count = prospects.len(), "local cache written");
        Ok(())
    }

    /// Run `f` against the loaded collection and write it back when `f`
    /// reports a change.
    fn mutate<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Prospect>) -> (T, bool),
    {
        let mut guard = self.lock();
        if guard.is_none() {
            *guard = Some(self.read_persisted()?);
        }
        let Some(collection) = guard.as_mut() else {
            return Err(CrmError::Internal("local collection not loaded".into()));
        };

        let (out, changed) = f(collection);
        if changed {
            self.persist(collection)?;
        }
        Ok(out)
    }
}

/// Millisecond timestamp, bumped past any identifier already taken.
fn next_id(taken: &[Prospect]) -> String {
    let mut millis = Utc::now().timestamp_millis();
    loop {
        let candidate = millis.to_string();
        if !taken.iter().any(|p| p.id == candidate) {
            return candidate;
        }
        millis += 1;
    }
}

impl ProspectGateway for LocalGateway {
    fn backend(&self) -> Backend {
        Backend::Local
    }

    fn list(&self) -> Result<Vec<Prospect>> {
        let prospects = self.read_persisted()?;
        *self.lock() = Some(prospects.clone());
        Ok(prospects)
    }

    fn create(&self, draft: ProspectDraft) -> Result<Prospect> {
        self.mutate(|collection| {
            let prospect = Prospect::from_draft(next_id(collection), draft);
            collection.push(prospect.clone());
            (prospect, true)
        })
    }

    fn update(&self, id: &str, patch: &ProspectPatch) -> Result<()> {
        self.mutate(|collection| match collection.iter_mut().find(|p| p.id == id) {
            Some(prospect) => {
                prospect.apply(patch);
                ((), true)
            }
            None => {
                debug!(id, "update for unknown local prospect ignored");
                ((), false)
            }
        })
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.mutate(|collection| {
            let before = collection.len();
            collection.retain(|p| p.id != id);
            ((), collection.len() != before)
        })
    }
}
