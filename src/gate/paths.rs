use serde::Serialize;

use crate::config::GateConfig;

/// How the gate treats a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathClass {
    /// Static assets, API namespace, anything that looks like a file
    Exempt,
    /// Login/signup/password pages: open to anonymous callers only
    Public,
    Protected,
}

const UNGATED_PREFIXES: [&str; 3] = ["/_next/static", "/_next/image", "/favicon.ico"];
const IMAGE_EXTENSIONS: [&str; 6] = [".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp"];

/// Path rules for the access gate
#[derive(Debug, Clone)]
pub struct GatePaths {
    pub login_path: String,
    pub dashboard_path: String,
    api_prefix: String,
    internal_asset_prefix: String,
    static_prefix: String,
    public_prefixes: Vec<String>,
}

impl GatePaths {
    pub fn from_config(config: &GateConfig) -> Self {
        Self {
            login_path: config.login_path.clone(),
            dashboard_path: config.dashboard_path.clone(),
            api_prefix: config.api_prefix.clone(),
            internal_asset_prefix: config.internal_asset_prefix.clone(),
            static_prefix: config.static_prefix.clone(),
            public_prefixes: config.public_prefixes.clone(),
        }
    }

    /// Outer router filter: requests failing it never reach the gate
    pub fn is_gated(&self, path: &str) -> bool {
        if UNGATED_PREFIXES.iter().any(|p| path.starts_with(p)) {
            return false;
        }
        let lower = path.to_ascii_lowercase();
        !IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
    }

    pub fn classify(&self, path: &str) -> PathClass {
        if self.is_exempt(path) {
            PathClass::Exempt
        } else if self.public_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            PathClass::Public
        } else {
            PathClass::Protected
        }
    }

    /// Prefix matches are plain `starts_with`; a `.` anywhere counts as a file extension
    fn is_exempt(&self, path: &str) -> bool {
        path.starts_with(self.internal_asset_prefix.as_str())
            || path.starts_with(self.api_prefix.as_str())
            || path.starts_with(self.static_prefix.as_str())
            || path.contains('.')
    }

    /// `/login?redirect=<path>`
    pub fn login_redirect(&self, original_path: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("redirect", original_path)
            .finish();
        format!("{}?{}", self.login_path, query)
    }

    /// `/login?error=account_inactive`
    pub fn account_inactive_redirect(&self) -> String {
        format!("{}?error=account_inactive", self.login_path)
    }
}

impl Default for GatePaths {
    fn default() -> Self {
        Self::from_config(&GateConfig::default())
    }
}
