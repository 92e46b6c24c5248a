pub mod jwt;
pub mod models;
pub mod pulls;
pub mod token;

pub const GITHUB_ACCEPT: &str = "application/vnd.github+json";
pub const GITHUB_API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
pub const GITHUB_API_VERSION: &str = "2022-11-28";
