use axum::extract::FromRef;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::gate::{AccessGate, GatePaths};
use crate::identity::{CredentialCookies, HttpIdentityProvider, IdentityProvider};
use crate::profile::{self, ProfileStore};

/// Shared, read-only application state. Built once at start-up.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub identity: Arc<dyn IdentityProvider>,
    pub profiles: Arc<dyn ProfileStore>,
    pub cookies: Arc<CredentialCookies>,
    pub gate: AccessGate,
}

impl AppState {
    pub fn new(config: AppConfig, identity: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        let gate = AccessGate::new(identity.clone(), profiles.clone(), GatePaths::from_config(&config.gate));
        let cookies = Arc::new(CredentialCookies::from_config(&config.cookies));

        Self {
            config: Arc::new(config),
            identity,
            profiles,
            cookies,
            gate,
        }
    }

    /// Wire the HTTP identity provider and the configured profile backend
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(HttpIdentityProvider::new(&config.identity, &config.cookies)?);
        let profiles = profile::from_config(&config)?;
        Ok(Self::new(config, identity, profiles))
    }
}

impl FromRef<AppState> for AccessGate {
    fn from_ref(state: &AppState) -> Self {
        state.gate.clone()
    }
}
