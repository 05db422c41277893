use anyhow::{bail, Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

/// Thin wrapper over the REST endpoints the scenarios need.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `ws://` or `wss://` URL of the notification endpoint.
    pub fn ws_url(&self) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };
        format!("{ws_base}/ws")
    }

    pub async fn health(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .context("server is not reachable")?;
        if !response.status().is_success() {
            bail!("health check returned {}", response.status());
        }
        Ok(())
    }

    /// Creates a user. Returns `Ok(false)` when the server refused it, which
    /// usually means the account already exists.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<bool> {
        let response = self
            .client
            .post(format!("{}/users", self.base_url))
            .json(&json!({
                "email": email,
                "password": password,
                "display_name": display_name,
            }))
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    /// Returns the `data` object of a successful login.
    pub async fn login(&self, email: &str, password: &str) -> Result<Value> {
        let response = self
            .client
            .post(format!("{}/login", self.base_url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            bail!("login for {email} failed with {}", response.status());
        }

        let body: Value = response.json().await?;
        Ok(body["data"].clone())
    }

    /// Returns the created post, or the status code the server answered with.
    pub async fn create_post(
        &self,
        token: &str,
        post_content: &str,
    ) -> Result<Result<Value, StatusCode>> {
        let response = self
            .client
            .post(format!("{}/posts", self.base_url))
            .bearer_auth(token)
            .json(&json!({ "post_content": post_content }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(Err(response.status()));
        }

        let body: Value = response.json().await?;
        Ok(Ok(body["data"].clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_follows_the_http_scheme() {
        assert_eq!(
            ApiClient::new("http://localhost:4000/").ws_url(),
            "ws://localhost:4000/ws"
        );
        assert_eq!(
            ApiClient::new("https://posts.example.com").ws_url(),
            "wss://posts.example.com/ws"
        );
    }
}
