use reqwest::blocking::{Client, Response};
use serde::Deserialize;

use crate::logging;

/// Field projection requested from the issues endpoint. Fixed; the rest of
/// the crate assumes exactly this shape comes back.
const ISSUE_FIELDS: &str = "idReadable,numberInProject,summary,created,description,\
wikifiedDescription,comments(author(name),created,deleted,text,\
reactions(author(name),reaction)),attachments(name,url),project(id,shortName)";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id_readable: String,
    pub number_in_project: i64,
    pub summary: String,
    pub created: Option<i64>,
    pub description: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub project: ProjectRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub author: Author,
    /// Creation instant in epoch milliseconds.
    pub created: i64,
    pub deleted: bool,
    pub text: Option<String>,
    pub reactions: Vec<Reaction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Reaction {
    pub author: Author,
    pub reaction: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    pub name: String,
    /// Relative to the instance base URL.
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub short_name: String,
}

#[derive(Debug, Clone)]
pub struct Identity {
    pub login: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum YouTrackError {
    #[error("youtrack request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("youtrack returned HTTP {status}: {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to decode youtrack response: {source}; body: {body}")]
    Decode {
        source: serde_json::Error,
        body: String,
    },
    #[error("invalid base url '{0}'")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone)]
pub struct YouTrackClient {
    pub base_url: String,
    token: String,
    http: Client,
}

impl YouTrackClient {
    pub fn new(base_url: String, token: String) -> Result<Self, YouTrackError> {
        let http = Client::builder().build()?;
        let normalized_base_url = normalize_base_url(&base_url)?;
        Ok(Self {
            base_url: normalized_base_url,
            token,
            http,
        })
    }

    /// Fetches every issue in the project with one request. The server does
    /// the filtering and the descending id sort; no pagination is attempted.
    pub fn list_issues(&self, project: &str) -> Result<Vec<Issue>, YouTrackError> {
        let url = format!("{}/youtrack/api/issues", self.base_url);
        let query = format!("project:{{{}}} sort by: {{issue id}} desc", project);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("fields", ISSUE_FIELDS), ("query", query.as_str())])
            .send()?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(YouTrackError::Http { status, body });
        }

        let body = response.text()?;
        let issues: Vec<Issue> = serde_json::from_str(&body).map_err(|source| {
            let short_body = if body.len() > 1000 {
                format!("{}...", &body[..1000])
            } else {
                body.clone()
            };
            logging::warn(format!(
                "failed decoding issue listing for project {}: {}",
                project, short_body
            ));
            YouTrackError::Decode {
                source,
                body: short_body,
            }
        })?;

        logging::debug(format!(
            "youtrack list project={} count={}",
            project,
            issues.len()
        ));
        Ok(issues)
    }

    /// Issues the attachment request and hands back the raw response so the
    /// caller can stream the body. Status checking is the caller's job.
    pub fn fetch_attachment(&self, relative_url: &str) -> Result<Response, YouTrackError> {
        let url = format!("{}{}", self.base_url, relative_url);
        let response = self.http.get(&url).bearer_auth(&self.token).send()?;
        Ok(response)
    }

    /// Resolves the token to its user. Used once at startup as a
    /// connectivity probe; failures are the caller's to tolerate.
    pub fn get_me(&self) -> Result<Identity, YouTrackError> {
        let url = format!("{}/youtrack/api/users/me", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("fields", "login,fullName,email")])
            .send()?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(YouTrackError::Http { status, body });
        }

        let body = response.text()?;
        let payload: MeResponse =
            serde_json::from_str(&body).map_err(|source| YouTrackError::Decode { source, body })?;

        Ok(Identity {
            login: payload.login,
            full_name: payload.full_name,
            email: payload.email,
        })
    }
}

fn normalize_base_url(raw: &str) -> Result<String, YouTrackError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(YouTrackError::InvalidBaseUrl(raw.to_string()));
    }

    let candidate = if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = reqwest::Url::parse(&candidate)
        .map_err(|_| YouTrackError::InvalidBaseUrl(raw.to_string()))?;
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    login: Option<String>,
    full_name: Option<String>,
    email: Option<String>,
}
