use serde::Serialize;
use utoipa::ToSchema;

/// Represents a JSON Web Token (JWT).
/// Note: This struct does not have a corresponding entity in the database.
///
/// - `token`: the signed, encoded JWT to send back as `Authorization: Bearer <token>`.
/// - `sub`: the subject (user id) of the JWT, so clients need not decode it.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, ToSchema)]
#[schema(as = jwt::Jwt)] // OpenAPI schema
pub struct Jwt {
    pub token: String,
    pub sub: String,
}
