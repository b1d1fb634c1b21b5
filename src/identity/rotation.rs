use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponseParts, ResponseParts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::convert::Infallible;
use time::Duration;

use crate::config::CookieConfig;

/// A single credential cookie change requested by the identity provider
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialUpdate {
    Set(Cookie<'static>),
    Unset(Cookie<'static>),
}

impl CredentialUpdate {
    pub fn name(&self) -> &str {
        match self {
            CredentialUpdate::Set(cookie) | CredentialUpdate::Unset(cookie) => cookie.name(),
        }
    }

    fn cookie(&self) -> &Cookie<'static> {
        match self {
            CredentialUpdate::Set(cookie) | CredentialUpdate::Unset(cookie) => cookie,
        }
    }
}

/// Credential changes collected while handling one request.
///
/// Each `replace` supersedes the previous batch wholesale; the last write wins.
#[derive(Debug, Clone, Default)]
pub struct Rotation {
    updates: Vec<CredentialUpdate>,
}

impl Rotation {
    pub fn replace(&mut self, updates: Vec<CredentialUpdate>) {
        self.updates = updates;
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn updates(&self) -> &[CredentialUpdate] {
        &self.updates
    }

    /// Rewrite the forwarded request's `Cookie` header so downstream handlers
    /// see the refreshed credentials.
    pub fn apply_to_request(&self, headers: &mut HeaderMap) {
        if self.is_empty() {
            return;
        }

        let mut jar = CookieJar::from_headers(headers);
        for update in &self.updates {
            jar = match update {
                CredentialUpdate::Set(cookie) => {
                    jar.add(Cookie::new(cookie.name().to_string(), cookie.value().to_string()))
                }
                CredentialUpdate::Unset(cookie) => jar.remove(Cookie::from(cookie.name().to_string())),
            };
        }

        let header = jar
            .iter()
            .map(|c| format!("{}={}", c.name(), c.value()))
            .collect::<Vec<_>>()
            .join("; ");

        headers.remove(COOKIE);
        if header.is_empty() {
            return;
        }
        match HeaderValue::from_str(&header) {
            Ok(value) => {
                headers.insert(COOKIE, value);
            }
            Err(e) => tracing::warn!("Dropping rotated cookie header: {}", e),
        }
    }

    /// Append a `Set-Cookie` header per update
    pub fn apply_to_response(&self, headers: &mut HeaderMap) {
        for update in &self.updates {
            match HeaderValue::from_str(&update.cookie().to_string()) {
                Ok(value) => {
                    headers.append(SET_COOKIE, value);
                }
                Err(e) => tracing::warn!("Dropping Set-Cookie for '{}': {}", update.name(), e),
            }
        }
    }
}

impl IntoResponseParts for Rotation {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        self.apply_to_response(res.headers_mut());
        Ok(res)
    }
}

/// Names and attributes of the two credential cookies
#[derive(Debug, Clone)]
pub struct CredentialCookies {
    pub access_token_name: String,
    pub refresh_token_name: String,
    pub secure: bool,
    pub max_age: Duration,
}

impl CredentialCookies {
    pub fn from_config(config: &CookieConfig) -> Self {
        Self {
            access_token_name: config.access_token_name.clone(),
            refresh_token_name: config.refresh_token_name.clone(),
            secure: config.secure,
            max_age: Duration::seconds(config.max_age_days.saturating_mul(86_400)),
        }
    }

    pub fn access_token<'a>(&self, jar: &'a CookieJar) -> Option<&'a str> {
        jar.get(&self.access_token_name).map(|c| c.value()).filter(|v| !v.is_empty())
    }

    pub fn refresh_token<'a>(&self, jar: &'a CookieJar) -> Option<&'a str> {
        jar.get(&self.refresh_token_name).map(|c| c.value()).filter(|v| !v.is_empty())
    }

    /// Updates storing a freshly issued token pair
    pub fn issue(&self, access_token: &str, refresh_token: &str) -> Vec<CredentialUpdate> {
        vec![
            CredentialUpdate::Set(self.cookie(&self.access_token_name, access_token)),
            CredentialUpdate::Set(self.cookie(&self.refresh_token_name, refresh_token)),
        ]
    }

    /// Updates removing both credential cookies
    pub fn clear(&self) -> Vec<CredentialUpdate> {
        vec![
            CredentialUpdate::Unset(removal_cookie(&self.access_token_name)),
            CredentialUpdate::Unset(removal_cookie(&self.refresh_token_name)),
        ]
    }

    fn cookie(&self, name: &str, value: &str) -> Cookie<'static> {
        Cookie::build((name.to_string(), value.to_string()))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/".to_string())
            .max_age(self.max_age)
            .build()
    }
}

fn removal_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), ""))
        .path("/".to_string())
        .max_age(Duration::ZERO)
        .build()
}
