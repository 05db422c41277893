use anyhow::Result;
use clap::Parser;
use colored::*;

use testing_tools::api_client::ApiClient;
use testing_tools::auth::sign_up_and_login;
use testing_tools::output::print_test_summary;
use testing_tools::scenarios;
use testing_tools::ws_client::Connection;

/// Exercises live post notifications against a running Postboard server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the server
    #[arg(long, default_value = "http://localhost:4000")]
    base_url: String,

    #[arg(long, default_value = "ws-user1@example.com")]
    user1_email: String,

    #[arg(long, default_value = "ws-user2@example.com")]
    user2_email: String,

    /// Password used for both accounts
    #[arg(long, default_value = "password")]
    password: String,

    /// Send the login token when opening /ws
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    authenticate_ws: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("{}", "=== Postboard WebSocket Test Client ===".bright_white().bold());

    let api_client = ApiClient::new(&args.base_url);
    api_client.health().await?;
    println!("{} Server at {} is up", "✓".green(), api_client.base_url());

    let user1 = sign_up_and_login(&api_client, "User 1", &args.user1_email, &args.password).await?;
    let user2 = sign_up_and_login(&api_client, "User 2", &args.user2_email, &args.password).await?;

    let ws_url = api_client.ws_url();
    let token = |token: &str| args.authenticate_ws.then(|| token.to_string());
    let mut ws1 = Connection::connect(&user1.label, &ws_url, token(&user1.token).as_deref()).await?;
    let mut ws2 = Connection::connect(&user2.label, &ws_url, token(&user2.token).as_deref()).await?;
    println!("{} Both clients connected to {}", "✓".green(), ws_url);

    let mut results = Vec::new();
    results.push(
        scenarios::test_post_created_fanout(&user1, &api_client, &mut ws1, &mut ws2).await?,
    );
    results.push(scenarios::test_rejected_post_is_silent(&user1, &api_client, &mut ws2).await?);
    results.push(scenarios::test_disconnect_cleanup(&user1, &api_client, &mut ws1, ws2).await?);

    print_test_summary(&results);
    ws1.close().await?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
    Ok(())
}
