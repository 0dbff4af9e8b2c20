use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, SecondsFormat};
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, info};

use crate::utils::time::day_start_utc;

use super::{Activity, Credentials, HubstaffApi, HubstaffError, User};

pub const DEFAULT_BASE_URL: &str = "https://api.hubstaff.com";

/// Hubstaff returns at most this many records per request; a full page means there might be more.
const PAGE_LIMIT: usize = 500;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Deserialize)]
struct AuthResponse {
    user: AuthUser,
}

#[derive(Deserialize)]
struct AuthUser {
    auth_token: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Client for the Hubstaff API v1.
pub struct HubstaffClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

impl HubstaffClient {
    pub fn with_base_url(
        base_url: impl Into<String>,
        credentials: Credentials,
    ) -> Result<Self, HubstaffError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.base_url)
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, HubstaffError> {
        let auth_token = self.credentials.auth_token.as_deref().ok_or_else(|| {
            HubstaffError::Authentication("no auth token, authenticate first".into())
        })?;
        Ok(builder
            .header("App-Token", &self.credentials.app_token)
            .header("Auth-Token", auth_token))
    }

    /// Fetches every page of a list endpoint. `key` is the field of the response holding the list.
    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, HubstaffError> {
        let mut items = vec![];
        loop {
            let offset = items.len();
            let request = self
                .authorized(self.http.get(self.url(path)))?
                .query(query)
                .query(&[("offset", offset.to_string())]);
            debug!(path, offset, "requesting Hubstaff page");

            let mut body = check_status(request.send().await?)
                .await?
                .json::<serde_json::Value>()
                .await?;
            let list = body
                .get_mut(key)
                .map(serde_json::Value::take)
                .unwrap_or_default();
            let page: Vec<T> = serde_json::from_value(list)?;
            let page_len = page.len();
            items.extend(page);

            if page_len < PAGE_LIMIT {
                return Ok(items);
            }
        }
    }
}

/// Turns error statuses into [HubstaffError], using the `error` field of the body when present.
async fn check_status(response: Response) -> Result<Response, HubstaffError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|v| v.error)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });
    if status.as_u16() == 401 || status.as_u16() == 403 {
        Err(HubstaffError::Authentication(message))
    } else {
        Err(HubstaffError::Api { status, message })
    }
}

#[async_trait]
impl HubstaffApi for HubstaffClient {
    async fn authenticate(&mut self) -> Result<String, HubstaffError> {
        if let Some(token) = &self.credentials.auth_token {
            debug!("Reusing configured auth token");
            return Ok(token.clone());
        }
        let (Some(username), Some(password)) =
            (&self.credentials.username, &self.credentials.password)
        else {
            return Err(HubstaffError::Authentication(
                "username and password are required to obtain an auth token".into(),
            ));
        };

        let request = self
            .http
            .post(self.url("auth"))
            .header("App-Token", &self.credentials.app_token)
            .form(&[("email", username), ("password", password)]);
        let response = check_status(request.send().await?).await?;
        let AuthResponse { user } = response.json().await?;

        info!("Authenticated as {username}");
        self.credentials.auth_token = Some(user.auth_token.clone());
        Ok(user.auth_token)
    }

    async fn get_users_list(&self, include_projects: bool) -> Result<Vec<User>, HubstaffError> {
        self.get_all(
            "users",
            "users",
            &[("include_projects", include_projects.to_string())],
        )
        .await
    }

    async fn get_activities_list(
        &self,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<Activity>, HubstaffError> {
        let timestamp = |date| day_start_utc(date).to_rfc3339_opts(SecondsFormat::Secs, true);
        self.get_all(
            "activities",
            "activities",
            &[
                ("start_time", timestamp(date_from)),
                ("stop_time", timestamp(date_to)),
            ],
        )
        .await
    }
}
