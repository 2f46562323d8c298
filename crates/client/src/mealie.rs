//! Mealie admin API client.
//!
//! Implements [`GroupGateway`] over HTTP with `reqwest`. Every request carries
//! the bearer credential and JSON content negotiation headers.
//!
//! Endpoints used:
//! - `GET  /api/admin/groups?page={p}&perPage={n}` (paginated)
//! - `POST /api/admin/groups`
//! - `GET  /api/groups/members`
//! - `GET  /api/groups/self`
//! - `PUT  /api/admin/users/{id}`

use async_trait::async_trait;
use groupwarden_core::{GatewayError, Group, GroupGateway, GroupPage, SelfGroup, User};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::retry::RetryPolicy;

/// HTTP client bound to one Mealie server and credential.
pub struct MealieClient {
    base_url: String,
    api_key: String,
    per_page: u32,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl MealieClient {
    /// Create a client with the given request timeout and no retry.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        per_page: u32,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::NotConfigured(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            per_page: per_page.max(1),
            retry: RetryPolicy::none(),
            client,
        })
    }

    /// Build a client from the application config.
    pub fn from_config(config: &groupwarden_config::AppConfig) -> Result<Self, GatewayError> {
        let api_key = config
            .require_api_key()
            .map_err(|e| GatewayError::NotConfigured(e.to_string()))?;

        Ok(Self::new(
            &config.mealie.base_url,
            api_key,
            config.mealie.per_page,
            Duration::from_secs(config.mealie.timeout_secs),
        )?
        .with_retry(RetryPolicy::from(&config.retry)))
    }

    /// Replace the retry policy for idempotent calls.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let response = self
            .request(reqwest::Method::GET, path)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        read_json(response).await
    }

    async fn fetch_group_page(&self, page: u32) -> Result<GroupPage, GatewayError> {
        let path = format!("/api/admin/groups?page={page}&perPage={}", self.per_page);
        self.retry
            .run("list groups", || self.get_json::<GroupPage>(&path))
            .await
    }

    async fn put_user(&self, user: &User) -> Result<User, GatewayError> {
        let response = self
            .request(reqwest::Method::PUT, &format!("/api/admin/users/{}", user.id))
            .json(user)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        read_json(response).await
    }
}

/// Map the response status onto [`GatewayError`] and decode the body.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
    let status = response.status().as_u16();

    if status == 401 || status == 403 {
        return Err(GatewayError::AuthenticationFailed(format!(
            "Invalid API key or insufficient permissions (status: {status})"
        )));
    }

    if !response.status().is_success() {
        let error_body = response.text().await.unwrap_or_default();
        if status == 409 {
            return Err(GatewayError::Conflict(error_body));
        }
        warn!(status, body = %error_body, "Mealie returned error");
        return Err(GatewayError::ApiError {
            status_code: status,
            message: error_body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse response: {e}")))
}

#[async_trait]
impl GroupGateway for MealieClient {
    async fn list_groups(&self) -> Result<Vec<Group>, GatewayError> {
        let mut groups = Vec::new();
        let mut page = 1;

        loop {
            let body = self.fetch_group_page(page).await?;
            let fetched = body.items.len();
            groups.extend(body.items);

            match body.total_pages {
                Some(total) if page < total && fetched > 0 => page += 1,
                _ => break,
            }
        }

        debug!(count = groups.len(), pages = page, "Fetched groups");
        Ok(groups)
    }

    async fn create_group(&self, name: &str) -> Result<Group, GatewayError> {
        let response = self
            .request(reqwest::Method::POST, "/api/admin/groups")
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let group: Group = read_json(response).await?;
        info!(group = %group.name, id = %group.id, "Created group");
        Ok(group)
    }

    async fn list_members(&self) -> Result<Vec<User>, GatewayError> {
        let users: Vec<User> = self
            .retry
            .run("list members", || self.get_json("/api/groups/members"))
            .await?;
        debug!(count = users.len(), "Found users");
        Ok(users)
    }

    async fn self_group(&self) -> Result<SelfGroup, GatewayError> {
        self.retry
            .run("self group", || self.get_json("/api/groups/self"))
            .await
    }

    async fn update_user(&self, user: &User) -> Result<User, GatewayError> {
        self.retry.run("update user", || self.put_user(user)).await
    }
}
