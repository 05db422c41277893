use anyhow::{Context, Result};
use colored::*;

use crate::api_client::ApiClient;

pub struct AuthenticatedUser {
    pub label: String,
    pub user_id: String,
    pub token: String,
}

/// Signs the user up if needed, then logs in.
pub async fn sign_up_and_login(
    api_client: &ApiClient,
    label: &str,
    email: &str,
    password: &str,
) -> Result<AuthenticatedUser> {
    if api_client.create_user(email, password, label).await? {
        println!("{} Created account {}", "✓".green(), email);
    } else {
        log::debug!("Account {email} not created, assuming it already exists");
    }

    let login = api_client.login(email, password).await?;
    let token = login["token"]
        .as_str()
        .context("login response has no token")?
        .to_string();
    let user_id = login["sub"]
        .as_str()
        .context("login response has no sub")?
        .to_string();

    println!("{} {} logged in as {}", "✓".green(), label.bold(), email);

    Ok(AuthenticatedUser {
        label: label.to_string(),
        user_id,
        token,
    })
}
