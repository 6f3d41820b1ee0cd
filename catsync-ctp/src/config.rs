use crate::error::{CtpError, CtpResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default API host (Europe, Google Cloud).
pub const DEFAULT_API_URL: &str = "https://api.europe-west1.gcp.commercetools.com";

/// Default OAuth host (Europe, Google Cloud).
pub const DEFAULT_AUTH_URL: &str = "https://auth.europe-west1.gcp.commercetools.com";

/// Default timeout for a single HTTP request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for one commercetools project.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CtpConfig {
    pub project_key: String,
    /// OAuth2 client id of an API client of the project.
    pub client_id: String,
    pub client_secret: String,
    /// Requested scopes; empty means `manage_project:{project_key}`.
    pub scopes: Vec<String>,
    /// Base URL of the HTTP API, without trailing slash.
    pub api_url: String,
    /// Base URL of the OAuth server, without trailing slash.
    pub auth_url: String,
    pub timeout_secs: u64,
}

impl Default for CtpConfig {
    fn default() -> Self {
        Self {
            project_key: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            scopes: Vec::new(),
            api_url: DEFAULT_API_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for CtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CtpConfig")
            .field("project_key", &self.project_key)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scopes", &self.scopes)
            .field("api_url", &self.api_url)
            .field("auth_url", &self.auth_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl CtpConfig {
    pub fn new(
        project_key: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            project_key: project_key.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            ..Self::default()
        }
    }

    /// The space-separated scope string sent with a token request.
    pub fn scope(&self) -> String {
        if self.scopes.is_empty() {
            format!("manage_project:{}", self.project_key)
        } else {
            self.scopes.join(" ")
        }
    }

    pub fn validate(&self) -> CtpResult<()> {
        let required = [
            ("project key", &self.project_key),
            ("client id", &self.client_id),
            ("client secret", &self.client_secret),
            ("API URL", &self.api_url),
            ("auth URL", &self.auth_url),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(CtpError::Config(format!("{name} must not be empty")));
            }
        }
        if self.timeout_secs == 0 {
            return Err(CtpError::Config("timeout must be greater than zero".into()));
        }
        Ok(())
    }

    pub(crate) fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    pub(crate) fn auth_base(&self) -> &str {
        self.auth_url.trim_end_matches('/')
    }
}
