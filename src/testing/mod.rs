//! In-memory identity provider and profile store with call counters.
//!
//! Used by the unit tests and the integration tests under `tests/`.

use async_trait::async_trait;
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

use crate::auth::Session;
use crate::config::CookieConfig;
use crate::identity::{CredentialCookies, IdentityError, IdentityProvider, Rotation};
use crate::profile::{AccountStatus, ProfileError, ProfileStore};
use crate::types::{AccountState, Role};

/// Cookie settings shared by the fakes (insecure so tests can read them back)
pub fn test_cookies() -> CredentialCookies {
    CredentialCookies::from_config(&CookieConfig {
        secure: false,
        ..CookieConfig::default()
    })
}

pub fn session_for(subject_id: Uuid, access_token: &str) -> Session {
    let now = Utc::now();
    Session::new(subject_id, Some(format!("{}@example.com", subject_id.simple())), now, now + Duration::hours(1))
        .with_tokens(access_token, None)
}

#[derive(Clone)]
struct RefreshGrant {
    access_token: String,
    refresh_token: String,
    session: Session,
}

#[derive(Default)]
pub struct FakeIdentityProvider {
    sessions: Mutex<HashMap<String, Session>>,
    refresh_grants: Mutex<HashMap<String, RefreshGrant>>,
    unreachable: AtomicBool,
    resolve_calls: AtomicUsize,
    invalidate_calls: AtomicUsize,
}

impl FakeIdentityProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Accept `access_token` as a live session
    pub fn with_session(self: &Arc<Self>, access_token: &str, session: Session) -> Arc<Self> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(access_token.to_string(), session.with_tokens(access_token, None));
        self.clone()
    }

    /// Exchange `refresh_token` for a new token pair on resolution
    pub fn with_refresh(
        self: &Arc<Self>,
        refresh_token: &str,
        new_access_token: &str,
        new_refresh_token: &str,
        session: Session,
    ) -> Arc<Self> {
        self.refresh_grants.lock().unwrap_or_else(PoisonError::into_inner).insert(
            refresh_token.to_string(),
            RefreshGrant {
                access_token: new_access_token.to_string(),
                refresh_token: new_refresh_token.to_string(),
                session: session.with_tokens(new_access_token, Some(new_refresh_token.to_string())),
            },
        );
        self.clone()
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn invalidate_calls(&self) -> usize {
        self.invalidate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn resolve_session(
        &self,
        credentials: &CookieJar,
        rotation: &mut Rotation,
    ) -> Result<Option<Session>, IdentityError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);

        if self.unreachable.load(Ordering::SeqCst) {
            return Err(IdentityError::Rejected {
                status: 503,
                message: "identity provider offline".to_string(),
            });
        }

        let cookies = test_cookies();
        let access = cookies.access_token(credentials);
        let refresh = cookies.refresh_token(credentials);

        let live = access.and_then(|t| self.sessions.lock().unwrap_or_else(PoisonError::into_inner).get(t).cloned());
        if let Some(session) = live {
            return Ok(Some(session));
        }

        let grant = refresh.and_then(|t| {
            self.refresh_grants
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(t)
                .cloned()
        });
        if let Some(grant) = grant {
            rotation.replace(cookies.issue(&grant.access_token, &grant.refresh_token));
            return Ok(Some(grant.session));
        }

        if access.is_some() || refresh.is_some() {
            rotation.replace(cookies.clear());
        }
        Ok(None)
    }

    async fn invalidate_session(
        &self,
        session: &Session,
        rotation: &mut Rotation,
    ) -> Result<(), IdentityError> {
        self.invalidate_calls.fetch_add(1, Ordering::SeqCst);
        rotation.replace(test_cookies().clear());
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, s| s.subject_id != session.subject_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeProfileStore {
    profiles: Mutex<HashMap<Uuid, AccountStatus>>,
    unreachable: AtomicBool,
    lookup_calls: AtomicUsize,
}

impl FakeProfileStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_profile(self: &Arc<Self>, subject_id: Uuid, status: AccountState, role: Role) -> Arc<Self> {
        self.profiles.lock().unwrap_or_else(PoisonError::into_inner).insert(
            subject_id,
            AccountStatus {
                subject_id,
                status,
                role,
            },
        );
        self.clone()
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for FakeProfileStore {
    async fn lookup_account_status(&self, subject_id: Uuid) -> Result<Option<AccountStatus>, ProfileError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);

        if self.unreachable.load(Ordering::SeqCst) {
            return Err(ProfileError::Rejected {
                status: 503,
                message: "profile store offline".to_string(),
            });
        }

        Ok(self.profiles.lock().unwrap_or_else(PoisonError::into_inner).get(&subject_id).cloned())
    }
}
