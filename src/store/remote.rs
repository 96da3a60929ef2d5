// src/store/remote.rs

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use super::mapper::{patch_to_fields, record_to_prospect, StoreRecord};
use super::{Backend, ProspectGateway};
use crate::config::RemoteStoreConfig;
use crate::domain::prospect::today;
use crate::domain::{Prospect, ProspectDraft, ProspectPatch};
use crate::errors::{CrmError, Result};

#[derive(Debug, Deserialize)]
struct RecordPage {
    #[serde(default)]
    records: Vec<StoreRecord>,
    /// Continuation token; absent on the last page.
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Serialize)]
struct FieldsBody {
    fields: Map<String, Value>,
}

#[derive(Serialize)]
struct CreateBody {
    records: Vec<FieldsBody>,
}

/// Record store reached over its REST API with a bearer token.
pub struct RemoteGateway {
    client: Client,
    table_url: Url,
    token: String,
}

impl RemoteGateway {
    pub fn new(config: RemoteStoreConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| CrmError::transport("build http client", e))?;

        Ok(Self {
            client,
            table_url: table_url(&config)?,
            token: config.token,
        })
    }

    fn record_url(&self, id: &str) -> Result<Url> {
        let mut url = self.table_url.clone();
        url.path_segments_mut()
            .map_err(|_| CrmError::Internal("table url cannot take a path".into()))?
            .push(id);
        Ok(url)
    }

    fn send(&self, req: RequestBuilder, operation: &'static str) -> Result<Response> {
        let resp = req
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| CrmError::transport(format!("record store {operation}"), e))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().unwrap_or_else(|_| "(no body)".to_string());
        warn!(operation, status = status.as_u16(), "record store rejected request");
        Err(CrmError::Remote {
            operation,
            status: status.as_u16(),
            body,
        })
    }
}

/// `{api_base}/{base_id}/{table_id}` with each segment percent-encoded.
fn table_url(config: &RemoteStoreConfig) -> Result<Url> {
    let mut url = Url::parse(&config.api_base)?;
    url.path_segments_mut()
        .map_err(|_| CrmError::Config(format!("`{}` cannot be a base url", config.api_base)))?
        .pop_if_empty()
        .push(&config.base_id)
        .push(&config.table_id);
    Ok(url)
}

impl ProspectGateway for RemoteGateway {
    fn backend(&self) -> Backend {
        Backend::Remote
    }

    fn list(&self) -> Result<Vec<Prospect>> {
        let today = today();
        let mut prospects = Vec::new();
        let mut offset: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut req = self.client.get(self.table_url.clone());
            if let Some(token) = &offset {
                req = req.query(&[("offset", token)]);
            }

            let page: RecordPage = self
                .send(req, "list")?
                .json()
                .map_err(|e| CrmError::transport("decode record page", e))?;
            pages += 1;

            prospects.extend(
                page.records
                    .into_iter()
                    .map(|record| record_to_prospect(record, today)),
            );

            match page.offset.filter(|o| !o.is_empty()) {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        debug!(pages, count = prospects.len(), "fetched prospects from record store");
        Ok(prospects)
    }

    fn create(&self, draft: ProspectDraft) -> Result<Prospect> {
        let body = CreateBody {
            records: vec![FieldsBody {
                fields: patch_to_fields(&ProspectPatch::from(&draft)),
            }],
        };

        let page: RecordPage = self
            .send(self.client.post(self.table_url.clone()).json(&body), "create")?
            .json()
            .map_err(|e| CrmError::transport("decode created record", e))?;

        let record = page
            .records
            .into_iter()
            .next()
            .ok_or_else(|| CrmError::Internal("record store create returned no record".into()))?;

        debug!(id = %record.id, "created record");
        Ok(record_to_prospect(record, today()))
    }

    fn update(&self, id: &str, patch: &ProspectPatch) -> Result<()> {
        let fields = patch_to_fields(patch);
        if fields.is_empty() {
            debug!(id, "nothing to send for update");
            return Ok(());
        }

        let req = self
            .client
            .patch(self.record_url(id)?)
            .json(&FieldsBody { fields });
        self.send(req, "update")?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.send(self.client.delete(self.record_url(id)?), "delete")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_url_encodes_segments() {
        let url = table_url(&RemoteStoreConfig {
            api_base: "https://api.example.com/v0/".into(),
            token: "t".into(),
            base_id: "app123".into(),
            table_id: "Sales Prospects".into(),
        })
        .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v0/app123/Sales%20Prospects");
    }
}
