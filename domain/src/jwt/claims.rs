use entity::Id;
use serde::{Deserialize, Serialize};

/// Claims carried by a login token.
///
/// `iat` and `exp` are seconds since the Unix epoch; `exp` is checked by
/// `jsonwebtoken` on every decode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The id of the user the token was issued to.
    pub sub: Id,
    pub iat: u64,
    pub exp: u64,
}
