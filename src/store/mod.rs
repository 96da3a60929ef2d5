pub mod local;
pub mod mapper;
pub mod remote;

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::config::AppConfig;
use crate::db::connection::Database;
use crate::domain::{Prospect, ProspectDraft, ProspectPatch};
use crate::errors::Result;

pub use local::LocalGateway;
pub use remote::RemoteGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Remote,
    Local,
}

/// Uniform CRUD surface over the remote record store and the local cache.
pub trait ProspectGateway: Send + Sync {
    fn backend(&self) -> Backend;

    /// Whole collection in store order.
    fn list(&self) -> Result<Vec<Prospect>>;

    /// Persist a new prospect and return it with its assigned identifier.
    fn create(&self, draft: ProspectDraft) -> Result<Prospect>;

    fn update(&self, id: &str, patch: &ProspectPatch) -> Result<()>;

    fn delete(&self, id: &str) -> Result<()>;
}

/// Pick the backend once for the session: remote credentials win.
pub fn open_gateway(config: &AppConfig) -> Result<Arc<dyn ProspectGateway>> {
    match &config.remote {
        Some(remote) => {
            info!(base = %remote.base_id, table = %remote.table_id, "using remote record store");
            Ok(Arc::new(RemoteGateway::new(remote.clone())?))
        }
        None => {
            info!(path = %config.cache_path, "no store credentials, using local cache");
            let db = Database::new(config.cache_path.clone());
            Ok(Arc::new(LocalGateway::open(db)?))
        }
    }
}
