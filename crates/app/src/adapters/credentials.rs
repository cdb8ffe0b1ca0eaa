use std::process::Command;
use tracing::{debug, info};

/// Environment variables checked for an API token, in order
pub const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Find an API token: the environment first, then the `gh` CLI.
/// `None` means requests go out unauthenticated.
pub fn resolve_token() -> Option<String> {
    resolve_token_with(|name| std::env::var(name).ok(), token_from_gh_cli)
}

/// Token lookup with injectable sources
pub fn resolve_token_with<E, H>(env: E, helper: H) -> Option<String>
where
    E: Fn(&str) -> Option<String>,
    H: FnOnce() -> Option<String>,
{
    for name in TOKEN_ENV_VARS {
        if let Some(token) = non_empty(env(name)) {
            info!("Using API token from {}", name);
            return Some(token);
        }
    }

    let token = non_empty(helper());
    if token.is_some() {
        info!("Using API token from gh CLI");
    } else {
        info!("No API token found, requests are unauthenticated");
    }
    token
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn token_from_gh_cli() -> Option<String> {
    let output = match Command::new("gh").args(["auth", "token"]).output() {
        Ok(output) => output,
        Err(e) => {
            debug!("gh CLI not available: {}", e);
            return None;
        }
    };

    if !output.status.success() {
        debug!("gh auth token exited with {}", output.status);
        return None;
    }

    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}
