//! GitHub App authentication: app JWT in, installation access token out.

use std::fmt;

use chrono::{DateTime, Utc};
use jsonwebtoken::EncodingKey;
use reqwest::header::ACCEPT;
use reqwest::Client;

use crate::config::GitHubAppConfig;
use crate::error::{SigningError, TokenFetchError};
use crate::github::jwt::{create_jwt, now_unix, SignedAssertion};
use crate::github::models::AccessTokenResponse;
use crate::github::{GITHUB_ACCEPT, GITHUB_API_VERSION, GITHUB_API_VERSION_HEADER};

/// Token scoped to one installation. Valid for about an hour; never cached.
pub struct InstallationToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for InstallationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallationToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

pub struct TokenIssuer {
    app_id: u64,
    encoding_key: EncodingKey,
    api_base_url: String,
    client: Client,
}

impl TokenIssuer {
    /// Reads and parses the app's private key once; the key is read-only afterwards.
    pub fn new(config: &GitHubAppConfig, client: Client) -> Result<Self, SigningError> {
        let pem = std::fs::read(&config.private_key_pem_path).map_err(|source| {
            SigningError::ReadKey {
                path: config.private_key_pem_path.clone(),
                source,
            }
        })?;
        let encoding_key = EncodingKey::from_rsa_pem(&pem).map_err(SigningError::InvalidKey)?;

        Ok(TokenIssuer {
            app_id: config.app_id,
            encoding_key,
            api_base_url: config.api_base_url.clone(),
            client,
        })
    }

    pub fn app_id(&self) -> u64 {
        self.app_id
    }

    pub fn generate_assertion(&self) -> Result<SignedAssertion, SigningError> {
        self.generate_assertion_at(now_unix())
    }

    pub fn generate_assertion_at(&self, issued_at: u64) -> Result<SignedAssertion, SigningError> {
        create_jwt(self.app_id, &self.encoding_key, issued_at)
    }

    pub async fn fetch_installation_token(
        &self,
        installation_id: u64,
        assertion: &SignedAssertion,
    ) -> Result<InstallationToken, TokenFetchError> {
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.api_base_url, installation_id
        );

        let res = self
            .client
            .post(&url)
            .bearer_auth(assertion.as_str())
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(GITHUB_API_VERSION_HEADER, GITHUB_API_VERSION)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(TokenFetchError::Status { status, body });
        }

        let body: AccessTokenResponse = res.json().await?;
        match body.token {
            Some(token) if !token.is_empty() => Ok(InstallationToken {
                token,
                expires_at: body.expires_at,
            }),
            _ => Err(TokenFetchError::MissingToken),
        }
    }
}
