use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::model::{ItemKind, NewRecord, RecordPatch, RemoteRecord, Snapshot};

use super::store::{RemoteStore, StoreError};

/// A backend speaking JSON over HTTP:
///
/// - `GET    {base}/{kind}` → `[RemoteRecord]`
/// - `POST   {base}/{kind}` with `NewRecord` → `{"id": "..."}`
/// - `PATCH  {base}/{kind}/{id}` with `RecordPatch`
/// - `DELETE {base}/{kind}/{id}`
/// - `PUT    {base}/{kind}/order` with `{"parent_id": .., "ids": [..]}`
pub struct HttpStore {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

#[derive(Debug, Serialize)]
struct OrderBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<&'a str>,
    ids: &'a [String],
}

impl HttpStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpStore {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, kind: ItemKind, rest: Option<&str>) -> String {
        match rest {
            Some(rest) => format!("{}/{}/{}", self.base_url, kind.endpoint(), rest),
            None => format!("{}/{}", self.base_url, kind.endpoint()),
        }
    }

    fn send(
        &self,
        method: &'static str,
        url: String,
        request: RequestBuilder,
    ) -> Result<Response, StoreError> {
        tracing::debug!(target: "planner::http", method, %url, "request");
        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                method,
                url,
            });
        }
        Ok(response)
    }
}

impl RemoteStore for HttpStore {
    fn load(&mut self) -> Result<Snapshot, StoreError> {
        let mut snapshot = Snapshot::default();
        for kind in ItemKind::ALL {
            let url = self.url(kind, None);
            let request = self.client.get(&url);
            let records: Vec<RemoteRecord> = self.send("GET", url, request)?.json()?;
            snapshot.records.insert(kind, records);
        }
        Ok(snapshot)
    }

    fn create(&mut self, kind: ItemKind, record: &NewRecord) -> Result<String, StoreError> {
        let url = self.url(kind, None);
        let request = self.client.post(&url).json(record);
        let created: Created = self.send("POST", url, request)?.json()?;
        Ok(created.id)
    }

    fn update(&mut self, kind: ItemKind, id: &str, patch: &RecordPatch) -> Result<(), StoreError> {
        let url = self.url(kind, Some(id));
        let request = self.client.patch(&url).json(patch);
        self.send("PATCH", url, request)?;
        Ok(())
    }

    fn remove(&mut self, kind: ItemKind, id: &str) -> Result<(), StoreError> {
        let url = self.url(kind, Some(id));
        let request = self.client.delete(&url);
        self.send("DELETE", url, request)?;
        Ok(())
    }

    fn reorder(
        &mut self,
        kind: ItemKind,
        parent_id: Option<&str>,
        ids: &[String],
    ) -> Result<(), StoreError> {
        let url = self.url(kind, Some("order"));
        let request = self.client.put(&url).json(&OrderBody { parent_id, ids });
        self.send("PUT", url, request)?;
        Ok(())
    }
}
