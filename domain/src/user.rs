use crate::error::{EntityErrorKind, Error};
use crate::jwt::{self, Jwt};
use crate::{users, Id};
use email_address::EmailAddress;
use log::*;
use sea_orm::ConnectionTrait;
use service::config::Config;

pub use entity_api::user::Credentials;

/// Creates a new user after checking the email is well formed and a password
/// was supplied.
pub async fn create(
    db: &impl ConnectionTrait,
    user_model: users::Model,
) -> Result<users::Model, Error> {
    validate_email(&user_model.email)?;
    if user_model.password.is_empty() {
        warn!("Rejecting new user without a password");
        return Err(Error::entity(EntityErrorKind::Invalid));
    }

    Ok(entity_api::user::create(db, user_model).await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<users::Model, Error> {
    Ok(entity_api::user::find_by_id(db, id).await?)
}

pub async fn find_by_email(
    db: &impl ConnectionTrait,
    email: &str,
) -> Result<Option<users::Model>, Error> {
    Ok(entity_api::user::find_by_email(db, email).await?)
}

pub async fn update(
    db: &impl ConnectionTrait,
    user_id: Id,
    user_model: users::Model,
) -> Result<users::Model, Error> {
    validate_email(&user_model.email)?;
    Ok(entity_api::user::update(db, user_id, user_model).await?)
}

/// Verifies `creds` and issues a login token for the matching user.
pub async fn login(
    db: &impl ConnectionTrait,
    config: &Config,
    creds: Credentials,
) -> Result<(users::Model, Jwt), Error> {
    let user = entity_api::user::authenticate(db, creds).await?;
    let jwt = jwt::issue_token(config, user.id)?;
    info!("User {} logged in", user.id);
    Ok((user, jwt))
}

fn validate_email(email: &str) -> Result<(), Error> {
    if EmailAddress::is_valid(email) {
        Ok(())
    } else {
        warn!("Rejecting malformed email address {email:?}");
        Err(Error::entity(EntityErrorKind::Invalid))
    }
}


#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod mock_tests {
    use super::*;
    use crate::error::{DomainErrorKind, InternalErrorKind};
    use chrono::Utc;
    use clap::Parser;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn user(email: &str, password: &str) -> users::Model {
        let now = Utc::now();
        users::Model {
            id: Id::new_v4(),
            email: email.to_string(),
            display_name: None,
            password: password.to_string(),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn create_rejects_an_invalid_email_without_touching_the_database() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = create(&db, user("not-an-email", "password"))
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Invalid))
        );
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_an_empty_password() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = create(&db, user("jane@example.com", "")).await.unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Invalid))
        );
    }

    #[tokio::test]
    async fn login_issues_a_token_for_the_user() -> Result<(), Error> {
        let config = Config::parse_from(["postboard", "--jwt-signing-key", "test-key"]);
        let stored = users::Model {
            password: entity_api::user::generate_hash("password".to_string()),
            ..user("jane@example.com", "")
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![stored.clone()]])
            .into_connection();

        let (logged_in, jwt) = login(
            &db,
            &config,
            Credentials {
                email: stored.email.clone(),
                password: "password".to_string(),
            },
        )
        .await?;

        assert_eq!(logged_in.id, stored.id);
        assert_eq!(jwt::validate_token(&config, &jwt.token)?.sub, stored.id);
        Ok(())
    }

    #[tokio::test]
    async fn login_with_a_wrong_password_is_unauthenticated() {
        let config = Config::parse_from(["postboard", "--jwt-signing-key", "test-key"]);
        let stored = users::Model {
            password: entity_api::user::generate_hash("password".to_string()),
            ..user("jane@example.com", "")
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![stored.clone()]])
            .into_connection();

        let err = login(
            &db,
            &config,
            Credentials {
                email: stored.email,
                password: "wrong".to_string(),
            },
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(
                EntityErrorKind::Unauthenticated
            ))
        );
    }
}
