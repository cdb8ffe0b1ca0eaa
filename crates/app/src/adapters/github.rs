use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tagwatch_core::ports::{
    Comparison, GitRefInfo, ReleaseInfo, RemoteApi, RemoteConfig, RepositoryInfo, TagInfo,
    TagObjectInfo,
};
use tagwatch_core::{ApiError, ApiResult, RepoRef};
use tracing::debug;

const API_VERSION: &str = "2022-11-28";

/// GitHub REST adapter that implements RemoteApi.
///
/// Uses a blocking client; the reqwest blocking client must be created and
/// dropped outside of an async context.
pub struct GithubApi {
    client: Client,
    api_url: Url,
    authenticated: bool,
}

impl GithubApi {
    pub fn new(remote: &RemoteConfig, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .context("API token contains invalid header characters")?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(concat!("tagwatch/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(Duration::from_secs(remote.timeout_secs.max(1)))
            .build()
            .context("Failed to create HTTP client")?;

        let api_url = Url::parse(&remote.api_url)
            .with_context(|| format!("Invalid API URL {}", remote.api_url))?;
        if api_url.cannot_be_a_base() {
            bail!("Invalid API URL {}", remote.api_url);
        }

        Ok(Self {
            client,
            api_url,
            authenticated: token.is_some(),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn get<T: DeserializeOwned>(&self, url: Url) -> ApiResult<T> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| transport_error(&e))?;

        check_status(response.status())?;

        response
            .json::<T>()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// `{api_url}/repos/{owner}/{repo}/{segments..}` with each segment
/// percent-encoded. A segment containing `/` spans several path levels, as
/// tag and branch names may.
pub fn repo_url(api_url: &Url, target: &RepoRef, segments: &[&str]) -> ApiResult<Url> {
    let mut url = api_url.clone();
    url.path_segments_mut()
        .map_err(|_| ApiError::Transport(format!("invalid API URL {}", api_url)))?
        .pop_if_empty()
        .extend(["repos", target.owner.as_str(), target.repo.as_str()])
        .extend(segments.iter().flat_map(|s| s.split('/')));
    Ok(url)
}

/// Map an HTTP status onto the error taxonomy; success passes through
pub fn check_status(status: StatusCode) -> ApiResult<()> {
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound);
    }
    if status.is_client_error() || status.is_server_error() {
        return Err(ApiError::Status {
            status: status.as_u16(),
        });
    }
    Ok(())
}

fn transport_error(err: &reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Transport("request timed out".to_string())
    } else if err.is_connect() {
        ApiError::Transport("connection failed".to_string())
    } else {
        ApiError::Transport(err.to_string())
    }
}

impl RemoteApi for GithubApi {
    fn repository(&self, target: &RepoRef) -> ApiResult<RepositoryInfo> {
        self.get(repo_url(&self.api_url, target, &[])?)
    }

    fn latest_release(&self, target: &RepoRef) -> ApiResult<ReleaseInfo> {
        self.get(repo_url(&self.api_url, target, &["releases", "latest"])?)
    }

    fn tags(&self, target: &RepoRef, per_page: u32) -> ApiResult<Vec<TagInfo>> {
        let mut url = repo_url(&self.api_url, target, &["tags"])?;
        url.query_pairs_mut()
            .append_pair("per_page", &per_page.to_string());
        self.get(url)
    }

    fn tag_ref(&self, target: &RepoRef, tag: &str) -> ApiResult<GitRefInfo> {
        self.get(repo_url(&self.api_url, target, &["git", "ref", "tags", tag])?)
    }

    fn tag_object(&self, target: &RepoRef, sha: &str) -> ApiResult<TagObjectInfo> {
        self.get(repo_url(&self.api_url, target, &["git", "tags", sha])?)
    }

    fn compare(&self, target: &RepoRef, base: &str, head: &str) -> ApiResult<Comparison> {
        let range = format!("{}...{}", base, head);
        self.get(repo_url(&self.api_url, target, &["compare", &range])?)
    }
}
