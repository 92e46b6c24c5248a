use reqwest::Client;

use crate::config::AppConfig;
use crate::github::token::TokenIssuer;

const USER_AGENT: &str = concat!("pr-title-bot/", env!("CARGO_PKG_VERSION"));

pub struct AppState {
    pub client: Client,
    pub token_issuer: TokenIssuer,
    pub api_base_url: String,
}

pub fn build_app_state(config: &AppConfig) -> Result<AppState, Box<dyn std::error::Error>> {
    let client = Client::builder().user_agent(USER_AGENT).build()?;
    let token_issuer = TokenIssuer::new(&config.github, client.clone())?;

    Ok(AppState {
        client,
        token_issuer,
        api_base_url: config.github.api_base_url.clone(),
    })
}
