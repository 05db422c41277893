use super::error::{EntityApiErrorKind, Error};
use entity::posts::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*,
    ActiveValue::{Set, Unchanged},
    ConnectionTrait, QueryOrder, TryIntoModel,
};

pub async fn create(
    db: &impl ConnectionTrait,
    post_model: Model,
    user_id: Id,
) -> Result<Model, Error> {
    debug!("New Post to be inserted for user {user_id}");

    let post_content = validate_content(post_model.post_content)?;

    let post_active_model: ActiveModel = ActiveModel {
        post_content: Set(post_content),
        user_id: Set(user_id),
        created_at: Set(chrono::Utc::now().into()),
        ..Default::default()
    };

    Ok(post_active_model.insert(db).await?)
}

/// Replaces the content of an existing post.
pub async fn update(
    db: &impl ConnectionTrait,
    id: Id,
    post_content: String,
) -> Result<Model, Error> {
    let post_content = validate_content(post_content)?;

    match Entity::find_by_id(id).one(db).await? {
        Some(post) => {
            debug!("Existing Post model to be Updated: {}", post.id);

            let active_model = ActiveModel {
                id: Unchanged(post.id),
                post_content: Set(post_content),
                user_id: Unchanged(post.user_id),
                created_at: Unchanged(post.created_at),
            };

            Ok(active_model.update(db).await?.try_into_model()?)
        }
        None => {
            error!("Post with id {id} not found");
            Err(Error::of_kind(EntityApiErrorKind::RecordNotFound))
        }
    }
}

pub async fn delete_by_id(db: &impl ConnectionTrait, id: Id) -> Result<(), Error> {
    let result = Entity::delete_by_id(id).exec(db).await?;

    if result.rows_affected == 0 {
        return Err(Error::of_kind(EntityApiErrorKind::RecordNotFound));
    }

    Ok(())
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::of_kind(EntityApiErrorKind::RecordNotFound))
}

/// Newest posts first, optionally limited to one author.
pub async fn find_all(db: &impl ConnectionTrait, user_id: Option<Id>) -> Result<Vec<Model>, Error> {
    let mut query = Entity::find();
    if let Some(user_id) = user_id {
        query = query.filter(Column::UserId.eq(user_id));
    }

    Ok(query.order_by_desc(Column::CreatedAt).all(db).await?)
}

fn validate_content(post_content: String) -> Result<String, Error> {
    if post_content.trim().is_empty() {
        warn!("Rejecting post with empty content");
        return Err(Error::of_kind(EntityApiErrorKind::ValidationError));
    }
    Ok(post_content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_content_rejects_whitespace_only_posts() {
        let err = validate_content("  \n\t".to_string()).unwrap_err();
        assert_eq!(err.error_kind, EntityApiErrorKind::ValidationError);
    }

    #[test]
    fn validate_content_keeps_content_as_written() {
        assert_eq!(
            validate_content("  hello ".to_string()).unwrap(),
            "  hello ".to_string()
        );
    }
}
