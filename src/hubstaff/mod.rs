//! Access to the Hubstaff time tracking API. [HubstaffApi] is the contract the report command
//! relies on, [client::HubstaffClient] implements it over HTTP.

pub mod client;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

pub type UserId = u64;
pub type ProjectId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub projects: Vec<Project>,
}

/// Time a user tracked against a project. Hubstaff reports activities in slots, so one
/// `(user, project)` pair usually appears many times per day.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Activity {
    pub user_id: UserId,
    pub project_id: ProjectId,
    /// Seconds.
    pub tracked: u64,
}

/// Everything needed to talk to Hubstaff on behalf of a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub app_token: String,
    pub auth_token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Error)]
pub enum HubstaffError {
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("Hubstaff API returned {status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("request to Hubstaff failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected Hubstaff response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HubstaffApi: Send + Sync {
    /// Returns an auth token usable for the following requests.
    async fn authenticate(&mut self) -> Result<String, HubstaffError>;

    async fn get_users_list(&self, include_projects: bool) -> Result<Vec<User>, HubstaffError>;

    /// Activities in `[date_from, date_to)`.
    async fn get_activities_list(
        &self,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<Activity>, HubstaffError>;
}
