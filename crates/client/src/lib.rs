//! HTTP client for the IoT platform REST API.
//!
//! [`RestClient`] implements [`PlatformApi`] with [`reqwest`]. After
//! [`login`](PlatformApi::login) every request carries the session JWT
//! in the `X-Authorization` header.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use tbprov_core::error::RemoteError;
use tbprov_core::platform::{PlatformApi, RemoteResult};
use tbprov_core::types::{
    AttributeScope, CurrentUser, DashboardInfo, EntityId, RuleChainId, RuleChainInfo,
    WidgetsBundleInfo,
};

/// Header the platform reads the session token from.
const AUTH_HEADER: &str = "X-Authorization";

/// Page size used when searching rule chains by name.
const RULE_CHAIN_SEARCH_PAGE_SIZE: &str = "10";

/// HTTP client for one platform instance and one user session.
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// Body returned by `POST /api/auth/login`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
}

/// One page of a paginated listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageData<T> {
    data: Vec<T>,
    #[serde(default)]
    has_next: bool,
}

impl RestClient {
    /// Create an unauthenticated client for the platform at `base_url`
    /// (e.g. `http://localhost:8080`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> RemoteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the session token, failing if not logged in.
    fn authorized(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> RemoteResult<reqwest::RequestBuilder> {
        let token = self.token.as_deref().ok_or(RemoteError::NotAuthenticated)?;
        Ok(builder.header(AUTH_HEADER, format!("Bearer {token}")))
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> RemoteResult<T> {
        let response = self
            .authorized(self.client.post(self.url(path)))?
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        Self::parse_response(response).await
    }

    async fn post_discard(&self, path: &str, body: Option<&Value>) -> RemoteResult<()> {
        let mut request = self.authorized(self.client.post(self.url(path)))?;
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(transport)?;
        Self::check_status(response).await
    }

    /// Ensure the response has a success status code. On failure returns
    /// [`RemoteError::Status`] with the body text.
    async fn ensure_success(response: reqwest::Response) -> RemoteResult<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> RemoteResult<T> {
        let response = Self::ensure_success(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn check_status(response: reqwest::Response) -> RemoteResult<()> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

fn transport(e: reqwest::Error) -> RemoteError {
    RemoteError::Transport(e.to_string())
}

impl PlatformApi for RestClient {
    async fn login(&mut self, username: &str, password: &str) -> RemoteResult<()> {
        let body = serde_json::json!({
            "username": username,
            "password": password,
        });

        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let login: LoginResponse = Self::parse_response(response).await?;

        self.token = Some(login.token);
        tracing::info!(url = %self.base_url, username, "Logged in to platform");
        Ok(())
    }

    async fn current_user(&self) -> RemoteResult<CurrentUser> {
        let response = self
            .authorized(self.client.get(self.url("/api/auth/user")))?
            .send()
            .await
            .map_err(transport)?;
        Self::parse_response(response).await
    }

    async fn find_rule_chain(&self, name: &str) -> RemoteResult<Option<RuleChainInfo>> {
        let response = self
            .authorized(self.client.get(self.url("/api/ruleChains")))?
            .query(&[
                ("pageSize", RULE_CHAIN_SEARCH_PAGE_SIZE),
                ("page", "0"),
                ("textSearch", name),
            ])
            .send()
            .await
            .map_err(transport)?;
        let page: PageData<RuleChainInfo> = Self::parse_response(response).await?;

        let found = page.data.into_iter().find(|chain| chain.name == name);
        if found.is_none() && page.has_next {
            tracing::debug!(name, "Rule chain search returned more pages than inspected");
        }
        Ok(found)
    }

    async fn save_rule_chain(&self, rule_chain: &Value) -> RemoteResult<RuleChainInfo> {
        self.post_json("/api/ruleChain", rule_chain).await
    }

    async fn save_rule_chain_metadata(&self, metadata: &Value) -> RemoteResult<()> {
        self.post_discard("/api/ruleChain/metadata", Some(metadata)).await
    }

    async fn set_root_rule_chain(&self, id: &RuleChainId) -> RemoteResult<()> {
        self.post_discard(&format!("/api/ruleChain/{id}/root"), None)
            .await
    }

    async fn save_dashboard(&self, dashboard: &Value) -> RemoteResult<DashboardInfo> {
        self.post_json("/api/dashboard", dashboard).await
    }

    async fn save_widgets_bundle(&self, bundle: &Value) -> RemoteResult<WidgetsBundleInfo> {
        self.post_json("/api/widgetsBundle", bundle).await
    }

    async fn save_widget_type(&self, widget_type: &Value) -> RemoteResult<()> {
        self.post_discard("/api/widgetType", Some(widget_type)).await
    }

    async fn save_entity_attributes(
        &self,
        entity: &EntityId,
        scope: AttributeScope,
        attributes: &Value,
    ) -> RemoteResult<()> {
        let path = format!(
            "/api/plugins/telemetry/{}/{}/{}",
            entity.entity_type,
            entity.id,
            scope.as_str()
        );
        self.post_discard(&path, Some(attributes)).await
    }
}
