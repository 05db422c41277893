use domain::users;
use serde::Deserialize;
use utoipa::ToSchema;

/// Fields a user may change on their own profile. Absent fields keep their
/// current value.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct UpdateParams {
    pub(crate) email: Option<String>,
    pub(crate) display_name: Option<String>,
}

impl UpdateParams {
    pub(crate) fn apply_to(self, user: users::Model) -> users::Model {
        users::Model {
            email: self.email.unwrap_or(user.email),
            display_name: self.display_name.or(user.display_name),
            ..user
        }
    }
}
