//! Issuing and validating the HS256 login tokens that protect mutating routes
//! and, optionally, the WebSocket endpoint.
//!
//! # Example
//!
//! ```rust,no_run
//! use domain::jwt::{issue_token, validate_token};
//! use entity::Id;
//! use service::config::Config;
//!
//! fn example(config: &Config, user_id: Id) -> Result<(), domain::error::Error> {
//!     let jwt = issue_token(config, user_id)?;
//!     let claims = validate_token(config, &jwt.token)?;
//!     assert_eq!(claims.sub, user_id);
//!     Ok(())
//! }
//! ```

use crate::error::{EntityErrorKind, Error, InternalErrorKind};
use chrono::Utc;
use entity::Id;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use service::config::Config;

// re-export the Jwt struct from the entity module
pub use entity::jwt::Jwt;

pub use claims::Claims;

mod claims;

/// Signs a token for `user_id` valid for `config.jwt_expiry_seconds`.
pub fn issue_token(config: &Config, user_id: Id) -> Result<Jwt, Error> {
    let signing_key = signing_key(config)?;

    let iat = Utc::now().timestamp().max(0) as u64;
    let claims = Claims {
        sub: user_id,
        iat,
        exp: iat + config.jwt_expiry_seconds,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key.as_bytes()),
    )?;

    Ok(Jwt {
        token,
        sub: user_id.to_string(),
    })
}

/// Checks the signature and expiry of `token` and returns its claims.
pub fn validate_token(config: &Config, token: &str) -> Result<Claims, Error> {
    let signing_key = signing_key(config)?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(signing_key.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|err| {
        debug!("Rejecting token: {err}");
        Error {
            source: Some(Box::new(err)),
            ..Error::entity(EntityErrorKind::Unauthenticated)
        }
    })
}

fn signing_key(config: &Config) -> Result<String, Error> {
    config.jwt_signing_key().ok_or_else(|| {
        warn!("Failed to get JWT signing key from config");
        Error::internal(InternalErrorKind::Config)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainErrorKind;
    use clap::Parser;

    fn config_with_key(key: &str) -> Config {
        Config::parse_from(["postboard", "--jwt-signing-key", key])
    }

    #[test]
    fn issued_tokens_validate_with_the_same_key() {
        let config = config_with_key("test-signing-key");
        let user_id = Id::new_v4();

        let jwt = issue_token(&config, user_id).unwrap();
        let claims = validate_token(&config, &jwt.token).unwrap();

        assert_eq!(jwt.sub, user_id.to_string());
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.exp - claims.iat, config.jwt_expiry_seconds);
    }

    #[test]
    fn tokens_signed_with_another_key_are_rejected() {
        let jwt = issue_token(&config_with_key("one-key"), Id::new_v4()).unwrap();

        let err = validate_token(&config_with_key("another-key"), &jwt.token).unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(
                EntityErrorKind::Unauthenticated
            ))
        );
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let config = config_with_key("test-signing-key");
        let now = Utc::now().timestamp() as u64;
        let claims = Claims {
            sub: Id::new_v4(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-signing-key"),
        )
        .unwrap();

        assert!(validate_token(&config, &token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let config = config_with_key("test-signing-key");
        assert!(validate_token(&config, "not.a.token").is_err());
    }

    #[test]
    fn a_missing_signing_key_is_a_config_error() {
        let config = Config::parse_from(["postboard"]);

        let err = issue_token(&config, Id::new_v4()).unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Config)
        );
    }
}
