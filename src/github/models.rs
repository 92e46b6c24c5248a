use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug)]
pub struct PullRequestEvent {
    pub action: Option<String>,
    pub installation: Option<Installation>,
    pub pull_request: PullRequest,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct Installation {
    pub id: Option<u64>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct PullRequest {
    pub number: u64,
    pub head: Head,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct Head {
    pub repo: HeadRepo,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct HeadRepo {
    pub name: String,
    pub owner: Owner,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct Owner {
    pub login: String,
}

impl PullRequestEvent {
    pub fn installation_id(&self) -> Option<u64> {
        self.installation.as_ref().and_then(|i| i.id)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Claims {
    pub iat: u64,
    pub exp: u64,
    pub iss: String,
}

#[derive(Deserialize, Debug)]
pub struct AccessTokenResponse {
    pub token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Debug)]
pub struct PullRequestTitleUpdate<'a> {
    pub title: &'a str,
}
