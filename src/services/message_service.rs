//! Orchestrates the message lifecycle: validate, persist, publish,
//! transition, respond.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::AppResult;
use crate::models::message::Message;
use crate::repository::MessageRepository;
use crate::services::authorization::ensure_author;
use crate::services::publisher::NotificationPublisher;
use crate::status::{MessageStatus, StatusEvent};
use crate::validators;

pub struct MessageService {
    repo: Arc<dyn MessageRepository>,
    publisher: Arc<dyn NotificationPublisher>,
}

impl MessageService {
    pub fn new(repo: Arc<dyn MessageRepository>, publisher: Arc<dyn NotificationPublisher>) -> Self {
        Self { repo, publisher }
    }

    /// Create flow: validate -> persist CREATED -> schedule publish ->
    /// persist CONFIRMED. Validation failures short-circuit before any
    /// write; the publish never gates the final status update.
    pub async fn create_message(
        &self,
        author_id: Uuid,
        author_username: &str,
        content: &str,
        raw_numbers: &[String],
    ) -> AppResult<Message> {
        let numbers = validators::validate_create_request(content, raw_numbers)?;

        let message = self.repo.create(author_id, content, &numbers).await?;

        self.publisher
            .publish_message_changed(author_id, author_username, &message);

        let confirmed = MessageStatus::from_code(message.status_code)?
            .next(StatusEvent::CreateConfirmed)?;

        match self.repo.update_status_code(message.id, confirmed).await {
            Ok(confirmed_message) => Ok(confirmed_message),
            Err(e) => {
                // The CREATED row is already committed; without a failure
                // status there is no recovery path back, so the message
                // stays observably stuck at CREATED.
                tracing::error!(
                    message_id = %message.id,
                    error = %e,
                    "confirm update failed; message left at CREATED"
                );
                Err(e)
            }
        }
    }

    /// Authorization-checked read.
    pub async fn get_message(&self, id: Uuid, acting_user_id: Uuid) -> AppResult<Message> {
        let message = self.repo.get_by_id(id).await?;
        ensure_author(&message, acting_user_id)?;
        Ok(message)
    }

    /// CONFIRMED -> RECEIVED, author only.
    pub async fn mark_received(&self, id: Uuid, acting_user_id: Uuid) -> AppResult<Message> {
        self.transition(id, acting_user_id, StatusEvent::MarkReceived)
            .await
    }

    /// RECEIVED -> SENT, author only.
    pub async fn mark_sent(&self, id: Uuid, acting_user_id: Uuid) -> AppResult<Message> {
        self.transition(id, acting_user_id, StatusEvent::MarkSent).await
    }

    pub async fn list_messages(
        &self,
        author_id: Uuid,
        include_sent: bool,
    ) -> AppResult<Vec<Message>> {
        self.repo.list_for_user(author_id, include_sent).await
    }

    /// Ack flow: look up -> authorize -> transition. NotFound and
    /// Forbidden short-circuit before any mutation is attempted.
    async fn transition(
        &self,
        id: Uuid,
        acting_user_id: Uuid,
        event: StatusEvent,
    ) -> AppResult<Message> {
        let message = self.repo.get_by_id(id).await?;
        ensure_author(&message, acting_user_id)?;

        let next = MessageStatus::from_code(message.status_code)?.next(event)?;

        self.repo.update_status_code(message.id, next).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::predicate::eq;

    use super::*;
    use crate::error::AppError;
    use crate::models::message::PhoneNumber;
    use crate::repository::messages::MockMessageRepository;
    use crate::services::publisher::MockNotificationPublisher;

    fn message(author_id: Uuid, status: MessageStatus) -> Message {
        let now = Utc::now();
        Message {
            id: Uuid::new_v4(),
            content: "Hello there".into(),
            author_id,
            numbers: vec![PhoneNumber::new_unchecked("+16505551234".into())],
            status_code: status.code(),
            status_meta: status.meta(),
            created_at: now,
            updated_at: now,
        }
    }

    fn service(
        repo: MockMessageRepository,
        publisher: MockNotificationPublisher,
    ) -> MessageService {
        MessageService::new(Arc::new(repo), Arc::new(publisher))
    }

    #[tokio::test]
    async fn create_flow_persists_publishes_and_confirms() {
        let author_id = Uuid::new_v4();
        let created = message(author_id, MessageStatus::Created);
        let created_id = created.id;
        let mut confirmed = created.clone();
        confirmed.status_code = MessageStatus::Confirmed.code();
        confirmed.status_meta = MessageStatus::Confirmed.meta();

        let mut repo = MockMessageRepository::new();
        let created_for_repo = created.clone();
        repo.expect_create()
            .withf(move |id, content, numbers| {
                *id == author_id
                    && content == "Hello there"
                    && numbers.len() == 1
                    && numbers[0].as_str() == "+16505551234"
            })
            .times(1)
            .returning(move |_, _, _| Ok(created_for_repo.clone()));
        let confirmed_for_repo = confirmed.clone();
        repo.expect_update_status_code()
            .with(eq(created_id), eq(MessageStatus::Confirmed))
            .times(1)
            .returning(move |_, _| Ok(confirmed_for_repo.clone()));

        let mut publisher = MockNotificationPublisher::new();
        publisher
            .expect_publish_message_changed()
            .withf(move |id, username, msg| {
                *id == author_id && username == "alice" && msg.id == created_id
            })
            .times(1)
            .return_const(());

        let result = service(repo, publisher)
            .create_message(author_id, "alice", "Hello there", &["+1 650-555-1234".into()])
            .await
            .unwrap();

        assert_eq!(result.status_code, 120);
        assert_eq!(result.numbers.len(), 1);
        assert_eq!(result.numbers[0].as_str(), "+16505551234");
    }

    #[tokio::test]
    async fn failed_confirm_surfaces_the_error_after_publish_was_scheduled() {
        let author_id = Uuid::new_v4();
        let created = message(author_id, MessageStatus::Created);
        let created_id = created.id;

        let mut repo = MockMessageRepository::new();
        let created_for_repo = created.clone();
        repo.expect_create()
            .times(1)
            .returning(move |_, _, _| Ok(created_for_repo.clone()));
        repo.expect_update_status_code()
            .with(eq(created_id), eq(MessageStatus::Confirmed))
            .times(1)
            .returning(|_, _| Err(AppError::Database(sqlx::Error::PoolClosed)));

        // The publish is already scheduled by the time the confirm
        // update fails; the CREATED row stays committed.
        let mut publisher = MockNotificationPublisher::new();
        publisher
            .expect_publish_message_changed()
            .withf(move |id, _, msg| *id == author_id && msg.id == created_id)
            .times(1)
            .return_const(());

        let err = service(repo, publisher)
            .create_message(author_id, "alice", "Hello there", &["+16505551234".into()])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn create_with_no_numbers_fails_before_any_write() {
        // No expectations: any repository or publisher call panics.
        let repo = MockMessageRepository::new();
        let publisher = MockNotificationPublisher::new();

        let err = service(repo, publisher)
            .create_message(Uuid::new_v4(), "alice", "Hello there", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn create_with_invalid_number_reports_it_and_persists_nothing() {
        let repo = MockMessageRepository::new();
        let publisher = MockNotificationPublisher::new();

        let err = service(repo, publisher)
            .create_message(Uuid::new_v4(), "alice", "Hello there", &["abc".into()])
            .await
            .unwrap_err();

        match err {
            AppError::Validation(violations) => {
                assert!(violations.iter().any(|v| v.contains("'abc'")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn mark_received_moves_confirmed_to_received() {
        let author_id = Uuid::new_v4();
        let confirmed = message(author_id, MessageStatus::Confirmed);
        let id = confirmed.id;
        let mut received = confirmed.clone();
        received.status_code = MessageStatus::Received.code();
        received.status_meta = MessageStatus::Received.meta();

        let mut repo = MockMessageRepository::new();
        repo.expect_get_by_id()
            .with(eq(id))
            .times(1)
            .returning(move |_| Ok(confirmed.clone()));
        let received_for_repo = received.clone();
        repo.expect_update_status_code()
            .with(eq(id), eq(MessageStatus::Received))
            .times(1)
            .returning(move |_, _| Ok(received_for_repo.clone()));

        let result = service(repo, MockNotificationPublisher::new())
            .mark_received(id, author_id)
            .await
            .unwrap();

        assert_eq!(result.status_code, 130);
    }

    #[tokio::test]
    async fn mark_received_twice_is_a_transition_error() {
        let author_id = Uuid::new_v4();
        let already_received = message(author_id, MessageStatus::Received);
        let id = already_received.id;

        let mut repo = MockMessageRepository::new();
        repo.expect_get_by_id()
            .with(eq(id))
            .times(1)
            .returning(move |_| Ok(already_received.clone()));
        // update_status_code must never be called

        let err = service(repo, MockNotificationPublisher::new())
            .mark_received(id, author_id)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Transition { from: 130, .. }));
    }

    #[tokio::test]
    async fn skipping_created_straight_to_received_is_rejected() {
        let author_id = Uuid::new_v4();
        let created = message(author_id, MessageStatus::Created);
        let id = created.id;

        let mut repo = MockMessageRepository::new();
        repo.expect_get_by_id()
            .with(eq(id))
            .times(1)
            .returning(move |_| Ok(created.clone()));

        let err = service(repo, MockNotificationPublisher::new())
            .mark_received(id, author_id)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Transition { from: 110, requested: 130 }));
    }

    #[tokio::test]
    async fn non_author_is_forbidden_and_status_is_untouched() {
        let author_id = Uuid::new_v4();
        let other_user = Uuid::new_v4();
        let confirmed = message(author_id, MessageStatus::Confirmed);
        let id = confirmed.id;

        let mut repo = MockMessageRepository::new();
        repo.expect_get_by_id()
            .times(3)
            .returning(move |_| Ok(confirmed.clone()));

        let service = service(repo, MockNotificationPublisher::new());

        for result in [
            service.get_message(id, other_user).await,
            service.mark_received(id, other_user).await,
            service.mark_sent(id, other_user).await,
        ] {
            assert!(matches!(result, Err(AppError::Forbidden)));
        }
    }

    #[tokio::test]
    async fn unknown_message_is_not_found_before_authorization() {
        let mut repo = MockMessageRepository::new();
        repo.expect_get_by_id().returning(|_| Err(AppError::NotFound));

        let err = service(repo, MockNotificationPublisher::new())
            .mark_received(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn list_forwards_the_include_sent_flag() {
        let author_id = Uuid::new_v4();

        let mut repo = MockMessageRepository::new();
        repo.expect_list_for_user()
            .with(eq(author_id), eq(true))
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let messages = service(repo, MockNotificationPublisher::new())
            .list_messages(author_id, true)
            .await
            .unwrap();

        assert!(messages.is_empty());
    }
}
