use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

use super::{decode_row, AccountStatus, ProfileError, ProfileStore};

/// Profile lookups through the database's REST gateway (PostgREST dialect)
pub struct RestProfileStore {
    client: Client,
    base_url: String,
    service_key: String,
    table: String,
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    status: String,
    role: String,
}

impl RestProfileStore {
    pub fn new(base_url: &str, service_key: &str, table: &str, timeout: Duration) -> Result<Self, ProfileError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            table: table.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }
}

#[async_trait]
impl ProfileStore for RestProfileStore {
    async fn lookup_account_status(&self, subject_id: Uuid) -> Result<Option<AccountStatus>, ProfileError> {
        let id_filter = format!("eq.{}", subject_id);
        let response = self
            .client
            .get(self.endpoint())
            .query(&[("id", id_filter.as_str()), ("select", "status,role"), ("limit", "1")])
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = response.text().await.unwrap_or_default();
            return Err(ProfileError::Rejected {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let rows = response.json::<Vec<ProfileRow>>().await?;
        rows.into_iter()
            .next()
            .map(|row| decode_row(subject_id, &row.status, &row.role))
            .transpose()
    }
}
