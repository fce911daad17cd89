//! GitHub team membership as a [`RosterProvider`].

use async_trait::async_trait;
use metaflask_common_config::GitHubConfig;
use metaflask_common_http::{parse_json, HttpClient};
use metaflask_common_log::remote_span;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::{debug, Instrument};
use url::Url;

use crate::error::{SyncError, SyncResult};
use crate::reconcile::RosterProvider;

const SERVICE: &str = "github";

#[derive(Debug, Deserialize)]
struct TeamMember {
    login: String,
}

#[derive(Debug, Deserialize)]
struct TeamMembership {
    #[serde(default)]
    state: Option<String>,
}

/// The members of one GitHub team, edited through the REST API.
///
/// Requests authenticate with HTTP basic auth using the access token as the
/// user name and `x-oauth-basic` as the password.
#[derive(Debug, Clone)]
pub struct GitHubTeamRoster {
    http: HttpClient,
    api_base: Url,
    access_token: String,
    team_id: u64,
}

impl GitHubTeamRoster {
    pub fn new(http: HttpClient, config: &GitHubConfig) -> SyncResult<Self> {
        let api_base = base_url(&config.api_base_url)?;
        Ok(Self {
            http,
            api_base,
            access_token: config.access_token.clone(),
            team_id: config.member_team_id,
        })
    }

    pub fn team_id(&self) -> u64 {
        self.team_id
    }

    /// `<api base>/teams/<team>/<collection>[/<user>]` with the user name percent-encoded.
    fn team_url(&self, collection: &str, user: Option<&str>) -> SyncResult<Url> {
        let mut url = self.api_base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| SyncError::Url {
                url: self.api_base.to_string(),
                message: "cannot be a base URL".to_string(),
            })?;
            segments
                .pop_if_empty()
                .push("teams")
                .push(&self.team_id.to_string())
                .push(collection);
            if let Some(user) = user {
                segments.push(user);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url.as_str())
            .basic_auth(&self.access_token, Some("x-oauth-basic"))
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
    }

    async fn send_checked(&self, method: Method, url: Url) -> SyncResult<reqwest::Response> {
        let response = self
            .http
            .send(self.request(method, url))
            .await
            .map_err(|e| SyncError::remote(SERVICE, e))?;
        HttpClient::check_response(response)
            .await
            .map_err(|e| SyncError::remote(SERVICE, e))
    }
}

/// Parse a base URL, making sure it ends in a slash so joins append to it.
pub(crate) fn base_url(raw: &str) -> SyncResult<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized).map_err(|e| SyncError::Url {
        url: raw.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl RosterProvider for GitHubTeamRoster {
    async fn list_current(&self) -> SyncResult<Vec<String>> {
        let url = self.team_url("members", None)?;
        async {
            let response = self.send_checked(Method::GET, url).await?;
            let members: Vec<TeamMember> = parse_json(response)
                .await
                .map_err(|e| SyncError::response(SERVICE, e))?;
            debug!(count = members.len(), "team members listed");
            Ok::<Vec<String>, SyncError>(members.into_iter().map(|m| m.login).collect())
        }
        .instrument(remote_span(SERVICE, "list_members"))
        .await
    }

    async fn add(&self, identity: &str) -> SyncResult<()> {
        let url = self.team_url("memberships", Some(identity))?;
        self.send_checked(Method::PUT, url)
            .instrument(remote_span(SERVICE, "add_member"))
            .await?;
        Ok(())
    }

    async fn remove(&self, identity: &str) -> SyncResult<()> {
        let url = self.team_url("members", Some(identity))?;
        self.send_checked(Method::DELETE, url)
            .instrument(remote_span(SERVICE, "remove_member"))
            .await?;
        Ok(())
    }

    async fn is_pending(&self, identity: &str) -> SyncResult<bool> {
        let url = self.team_url("memberships", Some(identity))?;
        async {
            let response = self
                .http
                .send(self.request(Method::GET, url))
                .await
                .map_err(|e| SyncError::remote(SERVICE, e))?;
            if response.status() == StatusCode::NOT_FOUND {
                return Ok::<bool, SyncError>(false);
            }
            let response = HttpClient::check_response(response)
                .await
                .map_err(|e| SyncError::remote(SERVICE, e))?;
            let membership: TeamMembership = parse_json(response)
                .await
                .map_err(|e| SyncError::response(SERVICE, e))?;
            Ok(membership.state.as_deref() == Some("pending"))
        }
        .instrument(remote_span(SERVICE, "membership_state"))
        .await
    }
}
