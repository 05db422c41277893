use crate::error::Error;
use crate::{posts, Id};
use events::{DomainEvent, EventPublisher};
use log::*;
use sea_orm::ConnectionTrait;

/// Stores a new post for `user_id` and, only once the insert succeeded,
/// publishes `DomainEvent::PostCreated` carrying the stored record.
pub async fn create(
    db: &impl ConnectionTrait,
    event_publisher: &EventPublisher,
    post_model: posts::Model,
    user_id: Id,
) -> Result<posts::Model, Error> {
    let post = entity_api::post::create(db, post_model, user_id).await?;
    let payload = serde_json::to_value(&post)?;

    debug!("Publishing PostCreated for post {}", post.id);
    event_publisher
        .publish(DomainEvent::PostCreated {
            post_id: post.id,
            user_id: post.user_id,
            post: payload,
        })
        .await;

    Ok(post)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<posts::Model, Error> {
    Ok(entity_api::post::find_by_id(db, id).await?)
}

pub async fn find_all(
    db: &impl ConnectionTrait,
    user_id: Option<Id>,
) -> Result<Vec<posts::Model>, Error> {
    Ok(entity_api::post::find_all(db, user_id).await?)
}

pub async fn update(
    db: &impl ConnectionTrait,
    id: Id,
    post_content: String,
) -> Result<posts::Model, Error> {
    Ok(entity_api::post::update(db, id, post_content).await?)
}

pub async fn delete_by_id(db: &impl ConnectionTrait, id: Id) -> Result<(), Error> {
    Ok(entity_api::post::delete_by_id(db, id).await?)
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use events::EventHandler;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingHandler {
        events: Mutex<Vec<DomainEvent>>,
    }

    #[async_trait]
    impl EventHandler for RecordingHandler {
        async fn handle(&self, event: &DomainEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn post_model(user_id: Id) -> posts::Model {
        posts::Model {
            id: Id::new_v4(),
            post_content: "hello world".to_string(),
            user_id,
            created_at: chrono::Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn create_publishes_post_created_exactly_once() -> Result<(), Error> {
        let recorder = Arc::new(RecordingHandler::default());
        let publisher = EventPublisher::new().with_handler(recorder.clone());
        let user_id = Id::new_v4();
        let stored = post_model(user_id);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![stored.clone()]])
            .into_connection();

        let created = create(&db, &publisher, stored.clone(), user_id).await?;

        let events = recorder.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        let DomainEvent::PostCreated {
            post_id,
            user_id: author,
            post,
        } = &events[0];
        assert_eq!(*post_id, created.id);
        assert_eq!(*author, user_id);
        assert_eq!(*post, serde_json::to_value(&created).unwrap());
        Ok(())
    }

    #[tokio::test]
    async fn create_publishes_nothing_when_the_insert_fails() {
        let recorder = Arc::new(RecordingHandler::default());
        let publisher = EventPublisher::new().with_handler(recorder.clone());
        let user_id = Id::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors(vec![DbErr::Custom("connection lost".to_string())])
            .into_connection();

        let result = create(&db, &publisher, post_model(user_id), user_id).await;

        assert!(result.is_err());
        assert!(recorder.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_publishes_nothing_for_empty_content() {
        let recorder = Arc::new(RecordingHandler::default());
        let publisher = EventPublisher::new().with_handler(recorder.clone());
        let user_id = Id::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let empty = posts::Model {
            post_content: "   ".to_string(),
            ..post_model(user_id)
        };

        assert!(create(&db, &publisher, empty, user_id).await.is_err());
        assert!(recorder.events.lock().unwrap().is_empty());
    }
}
