use super::error::{EntityApiErrorKind, Error};
use chrono::Utc;
use entity::users::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*,
    ActiveValue::{Set, Unchanged},
    ConnectionTrait, TryIntoModel,
};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, ToSchema, Deserialize)]
#[schema(as = domain::user::Credentials)] // OpenAPI schema
pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub async fn create(db: &impl ConnectionTrait, user_model: Model) -> Result<Model, Error> {
    debug!("New User to be inserted: {}", user_model.email);

    let now = Utc::now();
    let user_active_model: ActiveModel = ActiveModel {
        email: Set(user_model.email),
        display_name: Set(user_model.display_name),
        password: Set(generate_hash(user_model.password)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(user_active_model.insert(db).await?)
}

/// Updates the email and display name of an existing user. The password is
/// never touched here.
pub async fn update(db: &impl ConnectionTrait, id: Id, model: Model) -> Result<Model, Error> {
    let existing = find_by_id(db, id).await?;
    debug!("Existing User model to be Updated: {}", existing.id);

    let active_model = ActiveModel {
        id: Unchanged(existing.id),
        email: Set(model.email),
        display_name: Set(model.display_name),
        password: Unchanged(existing.password),
        created_at: Unchanged(existing.created_at),
        updated_at: Set(Utc::now().into()),
    };

    Ok(active_model.update(db).await?.try_into_model()?)
}

pub async fn find_by_email(db: &impl ConnectionTrait, email: &str) -> Result<Option<Model>, Error> {
    Ok(Entity::find().filter(Column::Email.eq(email)).one(db).await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::of_kind(EntityApiErrorKind::RecordNotFound))
}

/// Looks up the user by email and checks the password against the stored
/// hash. Unknown emails and wrong passwords are indistinguishable to callers.
pub async fn authenticate(db: &impl ConnectionTrait, creds: Credentials) -> Result<Model, Error> {
    match find_by_email(db, &creds.email).await? {
        Some(user) => {
            verify_password(&creds.password, &user.password)?;
            Ok(user)
        }
        None => {
            debug!("No user found for email {}", creds.email);
            Err(Error::of_kind(EntityApiErrorKind::RecordUnauthenticated))
        }
    }
}

pub fn verify_password(password_to_verify: &str, password_hash: &str) -> Result<(), Error> {
    password_auth::verify_password(password_to_verify, password_hash)
        .map_err(|_| Error::of_kind(EntityApiErrorKind::RecordUnauthenticated))
}

pub fn generate_hash(password: String) -> String {
    password_auth::generate_hash(password)
}
