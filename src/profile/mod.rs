//! Profile store seam: account status and role by subject id.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{AppConfig, ProfileBackend};
use crate::types::{AccountState, Role};

pub mod postgres;
pub mod rest;

pub use postgres::PgProfileStore;
pub use rest::RestProfileStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatus {
    pub subject_id: Uuid,
    pub status: AccountState,
    pub role: Role,
}

impl AccountStatus {
    pub fn is_active(&self) -> bool {
        match self.status {
            AccountState::Active => true,
            AccountState::Suspended | AccountState::Inactive => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Profile store unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("Profile store returned HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("Invalid profile row for {subject_id}: {message}")]
    Decode { subject_id: Uuid, message: String },
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// `Ok(None)` when no profile row exists for the subject
    async fn lookup_account_status(&self, subject_id: Uuid) -> Result<Option<AccountStatus>, ProfileError>;
}

/// Build the configured backend. Postgres pools connect lazily.
pub fn from_config(config: &AppConfig) -> anyhow::Result<Arc<dyn ProfileStore>> {
    let store: Arc<dyn ProfileStore> = match config.profiles.backend {
        ProfileBackend::Rest => Arc::new(RestProfileStore::new(
            config.profile_rest_url(),
            config.profiles.service_key.as_deref().unwrap_or(&config.identity.anon_key),
            &config.profiles.table,
            std::time::Duration::from_secs(config.identity.request_timeout_secs),
        )?),
        ProfileBackend::Postgres => {
            let url = config
                .profiles
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for the postgres profile backend"))?;
            Arc::new(PgProfileStore::connect_lazy(url, &config.profiles.table)?)
        }
    };
    Ok(store)
}

/// Parse the raw status/role columns into the closed enums
pub(crate) fn decode_row(subject_id: Uuid, status: &str, role: &str) -> Result<AccountStatus, ProfileError> {
    let decode_err = |e: crate::types::UnknownVariant| ProfileError::Decode {
        subject_id,
        message: e.to_string(),
    };

    Ok(AccountStatus {
        subject_id,
        status: status.parse().map_err(decode_err)?,
        role: role.parse().map_err(decode_err)?,
    })
}
