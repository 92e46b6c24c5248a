use reqwest::header::ACCEPT;
use reqwest::{Client, Url};

use crate::error::MutationError;
use crate::github::models::PullRequestTitleUpdate;
use crate::github::{GITHUB_ACCEPT, GITHUB_API_VERSION, GITHUB_API_VERSION_HEADER};

pub const UPDATED_TITLE: &str = "Updated Title";

/// `{api_base_url}/repos/{owner}/{repo}/pulls/{number}`, each payload value a single encoded segment.
pub fn pull_request_url(
    api_base_url: &str,
    owner: &str,
    repo: &str,
    number: u64,
) -> Result<Url, MutationError> {
    for segment in [owner, repo] {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(MutationError::InvalidSegment(segment.to_string()));
        }
    }

    let mut url = Url::parse(api_base_url)?;
    let number = number.to_string();
    url.path_segments_mut()
        .map_err(|_| MutationError::CannotBeABase(api_base_url.to_string()))?
        .pop_if_empty()
        .extend(["repos", owner, repo, "pulls", number.as_str()]);
    Ok(url)
}

pub async fn update_pull_request_title(
    client: &Client,
    api_base_url: &str,
    token: &str,
    owner: &str,
    repo: &str,
    number: u64,
    title: &str,
) -> Result<(), MutationError> {
    let url = pull_request_url(api_base_url, owner, repo, number)?;

    let res = client
        .patch(url)
        .bearer_auth(token)
        .header(ACCEPT, GITHUB_ACCEPT)
        .header(GITHUB_API_VERSION_HEADER, GITHUB_API_VERSION)
        .json(&PullRequestTitleUpdate { title })
        .send()
        .await?;

    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(MutationError::Status { status, body });
    }

    Ok(())
}
