//! Remote store boundary and its PostgREST-style HTTP client.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use url::Url;

use crate::sync::types::{Filters, RemoteOp, RemoteTable, SyncError};

/// A durable store reachable only when online. Every operation is
/// independently retryable.
pub trait RemoteStore: Send + Sync {
    fn apply(&self, op: &RemoteOp) -> impl Future<Output = Result<(), SyncError>> + Send;

    fn fetch(
        &self,
        table: RemoteTable,
        filters: &Filters,
    ) -> impl Future<Output = Result<Vec<serde_json::Value>, SyncError>> + Send;
}

/// HTTP client for a PostgREST endpoint (`<base>/rest/v1/<table>`).
#[derive(Debug, Clone)]
pub struct RestRemote {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl RestRemote {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, SyncError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self, table: RemoteTable, query: &[(String, String)]) -> Result<Url, SyncError> {
        let mut url = self.base_url.join(&format!("rest/v1/{}", table.as_str()))?;
        if !query.is_empty() {
            let encoded = query
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&encoded));
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, SyncError> {
        let response = self.authorized(request).send().await.map_err(|err| {
            if err.is_timeout() {
                SyncError::Timeout
            } else {
                SyncError::Network(err)
            }
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SyncError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

fn eq_filters(filters: &Filters) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|(column, value)| (column.clone(), format!("eq.{value}")))
        .collect()
}

impl RemoteStore for RestRemote {
    async fn apply(&self, op: &RemoteOp) -> Result<(), SyncError> {
        let request = match op {
            RemoteOp::Create { table, rows } => self
                .client
                .post(self.table_url(*table, &[])?)
                .header("Prefer", "return=minimal")
                .json(rows),
            RemoteOp::Upsert { table, rows } => {
                let query = [("on_conflict".to_string(), table.conflict_columns().to_string())];
                self.client
                    .post(self.table_url(*table, &query)?)
                    .header("Prefer", "resolution=merge-duplicates,return=minimal")
                    .json(rows)
            }
            RemoteOp::Update {
                table,
                filters,
                patch,
            } => self
                .client
                .patch(self.table_url(*table, &eq_filters(filters))?)
                .header("Prefer", "return=minimal")
                .json(patch),
            RemoteOp::Delete { table, filters } => self
                .client
                .delete(self.table_url(*table, &eq_filters(filters))?),
        };

        match self.send(request).await {
            Ok(_) => Ok(()),
            // deleting an already-deleted row is a harmless replay
            Err(SyncError::Http { status, .. })
                if matches!(op, RemoteOp::Delete { .. }) && status == StatusCode::NOT_FOUND.as_u16() =>
            {
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn fetch(
        &self,
        table: RemoteTable,
        filters: &Filters,
    ) -> Result<Vec<serde_json::Value>, SyncError> {
        let mut query = vec![("select".to_string(), "*".to_string())];
        query.extend(eq_filters(filters));
        let response = self
            .send(self.client.get(self.table_url(table, &query)?))
            .await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::types::filters;

    #[test]
    fn table_urls_carry_encoded_filters() {
        let remote = RestRemote::new("https://db.example.com", "key", Duration::from_secs(5)).unwrap();
        let url = remote
            .table_url(
                RemoteTable::NonSchoolDays,
                &eq_filters(&filters([("school_year", "2025-2026".to_string())])),
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://db.example.com/rest/v1/non_school_days?school_year=eq.2025-2026"
        );
    }

    #[test]
    fn base_path_is_preserved() {
        let remote = RestRemote::new("http://localhost:9000/api", "key", Duration::from_secs(5)).unwrap();
        let url = remote.table_url(RemoteTable::Classes, &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/api/rest/v1/classes");
    }

    #[test]
    fn rejects_malformed_base_url() {
        assert!(matches!(
            RestRemote::new("not a url", "key", Duration::from_secs(5)),
            Err(SyncError::InvalidUrl(_))
        ));
    }
}
