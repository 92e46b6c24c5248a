use std::num::ParseIntError;
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),
    #[error("APP_ID must be numeric, got {value:?}")]
    InvalidAppId {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// The app's private key could not be loaded or used to sign an assertion.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("failed to read private key {}", path.display())]
    ReadKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("private key is not a valid RSA PEM key")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),
    #[error("failed to sign assertion")]
    Encode(#[source] jsonwebtoken::errors::Error),
    #[error("assertion issued at {0} would expire past the end of time")]
    ExpiryOverflow(u64),
}

#[derive(Debug, Error)]
pub enum TokenFetchError {
    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("token endpoint returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("token endpoint response has no token")]
    MissingToken,
}

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("API base URL {0} cannot take path segments")]
    CannotBeABase(String),
    #[error("refusing to use {0:?} as a path segment")]
    InvalidSegment(String),
    #[error("pull request update failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("pull request update returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("invalid webhook payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Signing(#[from] SigningError),
    #[error(transparent)]
    Mutation(#[from] MutationError),
}
