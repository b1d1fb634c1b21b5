//! Coarse, path-based access gate run in front of every page request.

use async_trait::async_trait;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::{Authorize, Session};
use crate::identity::{IdentityProvider, Rotation};
use crate::profile::{AccountStatus, ProfileStore};
use crate::types::AccountState;

pub mod paths;

pub use paths::{GatePaths, PathClass};

/// Where a gated request goes next
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GateDecision {
    #[default]
    Proceed,
    RedirectToLogin(LoginRedirect),
    RedirectToDashboard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginRedirect {
    /// No session; come back to this path after signing in
    ReturnTo(String),
    /// Session belonged to a suspended or inactive account
    AccountInactive,
}

/// Decision plus everything the caller must propagate
#[derive(Debug, Default)]
pub struct GateOutcome {
    pub decision: GateDecision,
    pub rotation: Rotation,
    pub session: Option<Session>,
    pub account: Option<AccountStatus>,
}

impl GateOutcome {
    fn decided(decision: GateDecision, rotation: Rotation) -> Self {
        Self {
            decision,
            rotation,
            ..Self::default()
        }
    }
}

#[derive(Clone)]
pub struct AccessGate {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    paths: Arc<GatePaths>,
}

impl AccessGate {
    pub fn new(identity: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileStore>, paths: GatePaths) -> Self {
        Self {
            identity,
            profiles,
            paths: Arc::new(paths),
        }
    }

    pub fn paths(&self) -> &GatePaths {
        &self.paths
    }

    /// Redirect target for a non-`Proceed` decision
    pub fn location(&self, decision: &GateDecision) -> Option<String> {
        match decision {
            GateDecision::Proceed => None,
            GateDecision::RedirectToLogin(LoginRedirect::ReturnTo(path)) => Some(self.paths.login_redirect(path)),
            GateDecision::RedirectToLogin(LoginRedirect::AccountInactive) => {
                Some(self.paths.account_inactive_redirect())
            }
            GateDecision::RedirectToDashboard => Some(self.paths.dashboard_path.clone()),
        }
    }

    pub async fn evaluate(&self, path: &str, credentials: &CookieJar) -> GateOutcome {
        if !self.paths.is_gated(path) {
            return GateOutcome::default();
        }

        let class = self.paths.classify(path);
        if class == PathClass::Exempt {
            return GateOutcome::default();
        }

        let mut rotation = Rotation::default();
        let session = match self.identity.resolve_session(credentials, &mut rotation).await {
            Ok(session) => session,
            Err(e) => {
                warn!(path, "Session resolution failed, treating as signed out: {}", e);
                None
            }
        };

        let Some(session) = session else {
            let decision = match class {
                PathClass::Protected => GateDecision::RedirectToLogin(LoginRedirect::ReturnTo(path.to_string())),
                PathClass::Public | PathClass::Exempt => GateDecision::Proceed,
            };
            debug!(path, ?decision, "No session");
            return GateOutcome::decided(decision, rotation);
        };

        // Fail open: a missing row or a failed lookup does not block the request
        let account = match self.profiles.lookup_account_status(session.subject_id).await {
            Ok(Some(account)) => Some(account),
            Ok(None) => {
                warn!(subject_id = %session.subject_id, "No profile row; status check inconclusive");
                None
            }
            Err(e) => {
                warn!(subject_id = %session.subject_id, "Status lookup failed; status check inconclusive: {}", e);
                None
            }
        };

        if let Some(account) = &account {
            match account.status {
                AccountState::Active => {}
                AccountState::Suspended | AccountState::Inactive => {
                    info!(
                        subject_id = %session.subject_id,
                        status = %account.status,
                        "Signing out account that is not active"
                    );
                    if let Err(e) = self.identity.invalidate_session(&session, &mut rotation).await {
                        warn!(subject_id = %session.subject_id, "Sign-out call failed: {}", e);
                    }
                    return GateOutcome::decided(
                        GateDecision::RedirectToLogin(LoginRedirect::AccountInactive),
                        rotation,
                    );
                }
            }
        }

        let decision = match class {
            PathClass::Public => GateDecision::RedirectToDashboard,
            PathClass::Protected | PathClass::Exempt => GateDecision::Proceed,
        };
        debug!(path, subject_id = %session.subject_id, ?decision, "Session resolved");

        GateOutcome {
            decision,
            rotation,
            session: Some(session),
            account,
        }
    }
}

#[async_trait]
impl Authorize for AccessGate {
    type Decision = GateOutcome;

    async fn authorize(&self, request: &Parts) -> GateOutcome {
        let credentials = CookieJar::from_headers(&request.headers);
        self.evaluate(request.uri.path(), &credentials).await
    }
}
