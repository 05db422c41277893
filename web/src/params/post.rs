use domain::Id;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub(crate) struct IndexParams {
    /// Only return posts written by this user.
    #[param(value_type = Option<String>, format = Uuid)]
    pub(crate) user_id: Option<Id>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct UpdateParams {
    pub(crate) post_content: String,
}
