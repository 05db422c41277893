use chrono::Utc;
use password_auth::generate_hash;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

pub use entity::{jwt, posts, users, Id};

pub mod error;
pub mod post;
pub mod user;

/// Populates an empty database with a couple of users and a first post so a
/// freshly started server has something to serve.
pub async fn seed_database(db: &DatabaseConnection) -> Result<(), error::Error> {
    let now = Utc::now();

    let jane: users::Model = users::ActiveModel {
        email: Set("jane@example.com".to_owned()),
        display_name: Set(Some("Jane D".to_owned())),
        password: Set(generate_hash("password")),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    users::ActiveModel {
        email: Set("john@example.com".to_owned()),
        display_name: Set(Some("John S".to_owned())),
        password: Set(generate_hash("password")),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    posts::ActiveModel {
        post_content: Set("Hello from the seed data!".to_owned()),
        user_id: Set(jane.id),
        created_at: Set(now.into()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(())
}
