use anyhow::{Context, Result};
use colored::*;
use std::time::{Duration, Instant};

use crate::api_client::ApiClient;
use crate::auth::AuthenticatedUser;
use crate::output::{print_event, TestResult};
use crate::ws_client::Connection;

const POST_CREATED: &str = "Post_Created";
const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

fn outcome(scenario: &str, start: Instant, failure: Option<String>) -> TestResult {
    match &failure {
        None => println!("{} Scenario passed", "✓".green()),
        Some(msg) => println!("{} {}", "✗".red(), msg),
    }
    TestResult {
        scenario: scenario.to_string(),
        passed: failure.is_none(),
        message: failure,
        duration: start.elapsed(),
    }
}

/// Both clients get the post User 1 just created, with the same id.
pub async fn test_post_created_fanout(
    user1: &AuthenticatedUser,
    api_client: &ApiClient,
    ws1: &mut Connection,
    ws2: &mut Connection,
) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Post Created Fan-out ===".bright_cyan().bold());

    println!("{} {} creating post...", "→".blue(), user1.label);
    let post = match api_client
        .create_post(&user1.token, "Test Post - Fan-out")
        .await?
    {
        Ok(post) => post,
        Err(status) => {
            return Ok(outcome(
                "post_created_fanout",
                start,
                Some(format!("POST /posts returned {status}")),
            ))
        }
    };
    let post_id = post["id"].as_str().context("created post has no id")?.to_string();
    println!("{} Post created (ID: {})", "✓".green(), post_id);

    for ws in [ws1, ws2] {
        println!(
            "{} Waiting for {} to receive {}...",
            "→".blue(),
            ws.user_label,
            POST_CREATED
        );
        let event = match ws.wait_for_event(POST_CREATED, EVENT_TIMEOUT).await {
            Ok(event) => event,
            Err(e) => {
                return Ok(outcome(
                    "post_created_fanout",
                    start,
                    Some(format!("{}: {e}", ws.user_label)),
                ))
            }
        };
        print_event(&ws.user_label, &event);

        let received_id = event.payload["id"].as_str().unwrap_or_default();
        let received_author = event.payload["user_id"].as_str().unwrap_or_default();
        if received_id != post_id || received_author != user1.user_id {
            return Ok(outcome(
                "post_created_fanout",
                start,
                Some(format!(
                    "Expected post_id={}, user_id={}, got post_id={}, user_id={}",
                    post_id, user1.user_id, received_id, received_author
                )),
            ));
        }
    }

    Ok(outcome("post_created_fanout", start, None))
}

/// A rejected post must not reach anyone.
pub async fn test_rejected_post_is_silent(
    user1: &AuthenticatedUser,
    api_client: &ApiClient,
    ws2: &mut Connection,
) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Rejected Post Is Silent ===".bright_cyan().bold());

    println!("{} {} creating an empty post...", "→".blue(), user1.label);
    if let Ok(post) = api_client.create_post(&user1.token, "   ").await? {
        return Ok(outcome(
            "rejected_post_is_silent",
            start,
            Some(format!("empty post was accepted: {post}")),
        ));
    }

    println!("{} Checking {} stays quiet...", "→".blue(), ws2.user_label);
    let failure = ws2
        .expect_silence(Duration::from_secs(1))
        .await
        .err()
        .map(|e| e.to_string());

    Ok(outcome("rejected_post_is_silent", start, failure))
}

/// After User 2 hangs up, User 1 keeps receiving notifications.
pub async fn test_disconnect_cleanup(
    user1: &AuthenticatedUser,
    api_client: &ApiClient,
    ws1: &mut Connection,
    ws2: Connection,
) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Disconnect Cleanup ===".bright_cyan().bold());

    println!("{} {} disconnecting...", "→".blue(), ws2.user_label);
    ws2.close().await?;
    tokio::time::sleep(Duration::from_millis(200)).await;

    if let Err(status) = api_client
        .create_post(&user1.token, "Test Post - After Disconnect")
        .await?
    {
        return Ok(outcome(
            "disconnect_cleanup",
            start,
            Some(format!("POST /posts returned {status}")),
        ));
    }

    let failure = match ws1.wait_for_event(POST_CREATED, EVENT_TIMEOUT).await {
        Ok(event) => {
            print_event(&ws1.user_label, &event);
            None
        }
        Err(e) => Some(format!("{}: {e}", ws1.user_label)),
    };

    Ok(outcome("disconnect_cleanup", start, failure))
}
