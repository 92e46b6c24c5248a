use crate::app_state::AppState;
use crate::error::WebhookError;
use crate::github::models::PullRequestEvent;
use crate::github::pulls::{update_pull_request_title, UPDATED_TITLE};

use axum::body::Bytes;
use axum::http::HeaderMap;
use axum::{extract::State, http::StatusCode};
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};

const PULL_REQUEST_EVENT: &str = "pull_request";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Event type other than `pull_request`; nothing was signed or sent.
    Ignored,
    Aborted(AbortReason),
    Updated {
        owner: String,
        repo: String,
        number: u64,
    },
}

/// Flow stopped before the pull request was touched. Both reasons answer 204 with no body;
/// the reason is only visible in logs and to callers of `handle_webhook`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    MissingInstallationId,
    TokenUnavailable,
}

pub async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let event_type = header_str(&headers, "X-GitHub-Event");
    let delivery = header_str(&headers, "X-GitHub-Delivery").unwrap_or("-");

    let span = info_span!("webhook", delivery, event = event_type.unwrap_or("-"));

    async {
        match handle_webhook(&state, event_type, &body).await {
            Ok(outcome) => {
                info!(?outcome, "webhook handled");
                status_for_outcome(&outcome)
            }
            Err(e) => {
                error!(error = %e, "webhook failed");
                status_for_error(&e)
            }
        }
    }
    .instrument(span)
    .await
}

/// Receiver → token issuer → PR mutator, stopping at the first short-circuit.
pub async fn handle_webhook(
    state: &AppState,
    event_type: Option<&str>,
    body: &[u8],
) -> Result<WebhookOutcome, WebhookError> {
    let payload: serde_json::Value = serde_json::from_slice(body)?;

    if event_type != Some(PULL_REQUEST_EVENT) {
        debug!(event = event_type.unwrap_or("-"), "ignoring event");
        return Ok(WebhookOutcome::Ignored);
    }

    let event: PullRequestEvent = serde_json::from_value(payload)?;
    let pr = &event.pull_request;
    let owner = pr.head.repo.owner.login.as_str();
    let repo = pr.head.repo.name.as_str();

    let Some(installation_id) = event.installation_id() else {
        warn!(owner, repo, number = pr.number, "pull_request event has no installation id");
        return Ok(WebhookOutcome::Aborted(AbortReason::MissingInstallationId));
    };

    let assertion = state.token_issuer.generate_assertion()?;
    let token = match state
        .token_issuer
        .fetch_installation_token(installation_id, &assertion)
        .await
    {
        Ok(token) => {
            debug!(installation_id, expires_at = ?token.expires_at, "installation token issued");
            token
        }
        Err(e) => {
            warn!(installation_id, error = %e, "could not fetch installation token");
            return Ok(WebhookOutcome::Aborted(AbortReason::TokenUnavailable));
        }
    };

    update_pull_request_title(
        &state.client,
        &state.api_base_url,
        &token.token,
        owner,
        repo,
        pr.number,
        UPDATED_TITLE,
    )
    .await?;

    info!(
        installation_id,
        owner,
        repo,
        number = pr.number,
        action = event.action.as_deref().unwrap_or("-"),
        "✅ pull request retitled"
    );
    Ok(WebhookOutcome::Updated {
        owner: owner.to_string(),
        repo: repo.to_string(),
        number: pr.number,
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn status_for_outcome(outcome: &WebhookOutcome) -> StatusCode {
    match outcome {
        WebhookOutcome::Ignored | WebhookOutcome::Aborted(_) => StatusCode::NO_CONTENT,
        WebhookOutcome::Updated { .. } => StatusCode::OK,
    }
}

fn status_for_error(err: &WebhookError) -> StatusCode {
    match err {
        WebhookError::Parse(_) => StatusCode::BAD_REQUEST,
        WebhookError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        WebhookError::Mutation(_) => StatusCode::BAD_GATEWAY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::build_app_state;
    use crate::config::{AppConfig, GitHubAppConfig};
    use crate::github::jwt::tests::PRIVATE_KEY_PATH;
    use axum::http::HeaderValue;
    use httpmock::Method::{PATCH, POST};
    use httpmock::{Mock, MockServer};
    use serde_json::{json, Value};
    use std::path::PathBuf;

    fn state_for(server: &MockServer) -> AppState {
        let config = AppConfig {
            github: GitHubAppConfig {
                app_id: 12345,
                private_key_pem_path: PathBuf::from(PRIVATE_KEY_PATH),
                api_base_url: server.base_url(),
            },
            listen_addr: "127.0.0.1:0".to_string(),
        };
        build_app_state(&config).expect("state")
    }

    fn pull_request_payload() -> Value {
        json!({
            "action": "opened",
            "installation": { "id": 42 },
            "pull_request": {
                "number": 7,
                "head": { "repo": { "owner": { "login": "acme" }, "name": "widgets" } }
            }
        })
    }

    async fn token_endpoint(server: &MockServer, status: u16, body: Value) -> Mock<'_> {
        server
            .mock_async(|when, then| {
                when.method(POST).path("/app/installations/42/access_tokens");
                then.status(status).json_body(body);
            })
            .await
    }

    async fn title_endpoint(server: &MockServer, status: u16) -> Mock<'_> {
        server
            .mock_async(|when, then| {
                when.method(PATCH)
                    .path("/repos/acme/widgets/pulls/7")
                    .header("authorization", "Bearer abc123")
                    .json_body(json!({ "title": "Updated Title" }));
                then.status(status).json_body(json!({ "number": 7 }));
            })
            .await
    }

    fn body_of(value: &Value) -> Vec<u8> {
        serde_json::to_vec(value).expect("serialize")
    }

    #[tokio::test]
    async fn retitles_pull_request_with_fetched_token() {
        let server = MockServer::start_async().await;
        let exchange = token_endpoint(&server, 201, json!({ "token": "abc123" })).await;
        let update = title_endpoint(&server, 200).await;
        let state = state_for(&server);

        let outcome = handle_webhook(&state, Some("pull_request"), &body_of(&pull_request_payload()))
            .await
            .expect("handled");

        assert_eq!(
            outcome,
            WebhookOutcome::Updated {
                owner: "acme".to_string(),
                repo: "widgets".to_string(),
                number: 7,
            }
        );
        exchange.assert_calls_async(1).await;
        update.assert_calls_async(1).await;
    }

    #[tokio::test]
    async fn rejected_token_exchange_skips_update() {
        let server = MockServer::start_async().await;
        let exchange = token_endpoint(&server, 403, json!({ "message": "Forbidden" })).await;
        let update = title_endpoint(&server, 200).await;
        let state = state_for(&server);

        let outcome = handle_webhook(&state, Some("pull_request"), &body_of(&pull_request_payload()))
            .await
            .expect("token failures do not escape");

        assert_eq!(outcome, WebhookOutcome::Aborted(AbortReason::TokenUnavailable));
        exchange.assert_calls_async(1).await;
        update.assert_calls_async(0).await;
    }

    #[tokio::test]
    async fn unauthorized_token_exchange_skips_update() {
        let server = MockServer::start_async().await;
        token_endpoint(&server, 401, json!({ "message": "Bad credentials" })).await;
        let update = title_endpoint(&server, 200).await;
        let state = state_for(&server);

        let outcome = handle_webhook(&state, Some("pull_request"), &body_of(&pull_request_payload()))
            .await
            .expect("handled");

        assert_eq!(outcome, WebhookOutcome::Aborted(AbortReason::TokenUnavailable));
        update.assert_calls_async(0).await;
    }

    #[tokio::test]
    async fn other_events_make_no_calls() {
        let server = MockServer::start_async().await;
        let exchange = token_endpoint(&server, 201, json!({ "token": "abc123" })).await;
        let update = title_endpoint(&server, 200).await;
        let state = state_for(&server);

        for event in [Some("issues"), Some("push"), Some("pull_request_review"), None] {
            let outcome = handle_webhook(&state, event, &body_of(&pull_request_payload()))
                .await
                .expect("handled");
            assert_eq!(outcome, WebhookOutcome::Ignored);
        }

        exchange.assert_calls_async(0).await;
        update.assert_calls_async(0).await;
    }

    #[tokio::test]
    async fn missing_installation_id_skips_token_exchange() {
        let server = MockServer::start_async().await;
        let exchange = token_endpoint(&server, 201, json!({ "token": "abc123" })).await;
        let update = title_endpoint(&server, 200).await;
        let state = state_for(&server);

        let mut payload = pull_request_payload();
        payload.as_object_mut().expect("object").remove("installation");

        let outcome = handle_webhook(&state, Some("pull_request"), &body_of(&payload))
            .await
            .expect("handled");

        assert_eq!(
            outcome,
            WebhookOutcome::Aborted(AbortReason::MissingInstallationId)
        );
        exchange.assert_calls_async(0).await;
        update.assert_calls_async(0).await;
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error() {
        let server = MockServer::start_async().await;
        let state = state_for(&server);

        for event in [Some("pull_request"), Some("issues")] {
            let err = handle_webhook(&state, event, b"{not json")
                .await
                .unwrap_err();
            assert!(matches!(err, WebhookError::Parse(_)));
        }
    }

    #[tokio::test]
    async fn pull_request_without_head_repo_is_a_parse_error() {
        let server = MockServer::start_async().await;
        let exchange = token_endpoint(&server, 201, json!({ "token": "abc123" })).await;
        let state = state_for(&server);

        let payload = json!({ "installation": { "id": 42 }, "pull_request": { "number": 7 } });
        let err = handle_webhook(&state, Some("pull_request"), &body_of(&payload))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::Parse(_)));
        exchange.assert_calls_async(0).await;
    }

    #[tokio::test]
    async fn failed_update_is_a_mutation_error() {
        let server = MockServer::start_async().await;
        token_endpoint(&server, 201, json!({ "token": "abc123" })).await;
        title_endpoint(&server, 422).await;
        let state = state_for(&server);

        let err = handle_webhook(&state, Some("pull_request"), &body_of(&pull_request_payload()))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::Mutation(_)));
        assert_eq!(status_for_error(&err), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn handler_maps_outcomes_to_status_codes() {
        let server = MockServer::start_async().await;
        token_endpoint(&server, 201, json!({ "token": "abc123" })).await;
        title_endpoint(&server, 200).await;
        let state = Arc::new(state_for(&server));

        let mut headers = HeaderMap::new();
        headers.insert("X-GitHub-Event", HeaderValue::from_static("pull_request"));
        headers.insert(
            "X-GitHub-Delivery",
            HeaderValue::from_static("72d3162e-cc78-11e3-81ab-4c9367dc0958"),
        );
        let status = webhook_handler(
            State(state.clone()),
            headers,
            Bytes::from(body_of(&pull_request_payload())),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let mut headers = HeaderMap::new();
        headers.insert("X-GitHub-Event", HeaderValue::from_static("issues"));
        let status = webhook_handler(
            State(state.clone()),
            headers.clone(),
            Bytes::from(body_of(&json!({ "action": "opened" }))),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let status = webhook_handler(State(state), headers, Bytes::from_static(b"[")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn aborted_flows_answer_no_content() {
        assert_eq!(
            status_for_outcome(&WebhookOutcome::Aborted(AbortReason::TokenUnavailable)),
            StatusCode::NO_CONTENT
        );
        assert_eq!(
            status_for_outcome(&WebhookOutcome::Aborted(AbortReason::MissingInstallationId)),
            StatusCode::NO_CONTENT
        );
    }
}
