//! Service-account credential minter
//!
//! Exchanges a signed JWT assertion for a short-lived bearer token using
//! the OAuth 2.0 JWT-bearer grant. The assertion is issued for the
//! read-only spreadsheet scope and expires one hour after issue.
//!
//! The credential bundle is loaded fresh on every `mint()` call and nothing
//! is cached between passes. Neither the private key nor the resulting
//! token is ever written to a log.

use crate::error::AuthError;
use crate::types::{AccessToken, CredentialMinter};
use chrono::{DateTime, Utc};
use hrfb_common::config::ServiceAccountSource;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Long-lived service-account credential bundle
///
/// Deserialized from the standard service-account JSON; unknown fields are
/// ignored.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let mut key: ServiceAccountKey = serde_json::from_str(json)
            .map_err(|e| AuthError::MalformedCredentials(format!("invalid JSON: {}", e)))?;

        if key.client_email.trim().is_empty() {
            return Err(AuthError::MalformedCredentials("client_email is empty".to_string()));
        }
        // Secret stores sometimes hand over the PEM with literal "\n" sequences
        if !key.private_key.contains('\n') && key.private_key.contains("\\n") {
            key.private_key = key.private_key.replace("\\n", "\n");
        }
        Ok(key)
    }

    /// Load the bundle from its configured source
    pub fn load(source: &ServiceAccountSource) -> Result<Self, AuthError> {
        match source {
            ServiceAccountSource::Inline(json) => Self::from_json(json),
            ServiceAccountSource::File(path) => {
                let json = std::fs::read_to_string(path).map_err(|e| {
                    AuthError::MalformedCredentials(format!("read {}: {}", path.display(), e))
                })?;
                Self::from_json(&json)
            }
            ServiceAccountSource::Missing => Err(AuthError::MissingCredentials),
        }
    }
}

/// JWT claims for the token exchange
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Sign an RS256 assertion for `token_uri`, issued at `issued_at`
pub fn sign_assertion(
    key: &ServiceAccountKey,
    token_uri: &str,
    issued_at: DateTime<Utc>,
) -> Result<String, AuthError> {
    let iat = issued_at.timestamp();
    let claims = AssertionClaims {
        iss: key.client_email.clone(),
        scope: SHEETS_READONLY_SCOPE.to_string(),
        aud: token_uri.to_string(),
        iat,
        exp: iat + ASSERTION_LIFETIME_SECS,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| AuthError::MalformedCredentials(format!("private key: {}", e)))?;

    jsonwebtoken::encode(&header, &claims, &encoding_key).map_err(|e| AuthError::Signing(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Mints spreadsheet bearer tokens from a service account
pub struct ServiceAccountMinter {
    http_client: reqwest::Client,
    source: ServiceAccountSource,
    token_uri_override: Option<String>,
}

impl ServiceAccountMinter {
    pub fn new(
        source: ServiceAccountSource,
        token_uri_override: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            source,
            token_uri_override,
        })
    }

    fn token_uri<'a>(&'a self, key: &'a ServiceAccountKey) -> &'a str {
        self.token_uri_override
            .as_deref()
            .or(key.token_uri.as_deref())
            .unwrap_or(DEFAULT_TOKEN_URI)
    }
}

#[async_trait::async_trait]
impl CredentialMinter for ServiceAccountMinter {
    async fn mint(&self) -> Result<AccessToken, AuthError> {
        let key = ServiceAccountKey::load(&self.source)?;
        let token_uri = self.token_uri(&key);
        let assertion = sign_assertion(&key, token_uri, Utc::now())?;

        tracing::debug!(issuer = %key.client_email, token_uri = %token_uri, "Exchanging service account assertion");

        let response = self
            .http_client
            .post(token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        match token.access_token.filter(|t| !t.trim().is_empty()) {
            Some(access_token) => {
                tracing::info!(expires_in = ?token.expires_in, "Obtained spreadsheet access token");
                Ok(AccessToken::new(access_token))
            }
            None => Err(AuthError::InvalidResponse(
                "access_token missing from response".to_string(),
            )),
        }
    }
}
