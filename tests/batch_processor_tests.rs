//! Digest batching:
//! - pending email notifications group into one batch per recipient
//! - in-app-only rows never enter a batch
//! - a failing recipient leaves the batch failed without touching others
//! - failed batches are retried as a unit on the next run

mod common;
use common::{create_agent, create_test_db, make_service};

use propalert::models::batch_notification;
use propalert::models::notification::{EntityRef, NotificationKind};
use propalert::models::notification;
use propalert::services::batch::BatchProcessor;
use propalert::services::checkers::{Match, MatchMetadata, TriggerBucket};
use propalert::services::notification::{Channel, NotificationService, ResolvedPreference};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

fn sample_match(agent_id: i64, entity: EntityRef, bucket: TriggerBucket, key: &str) -> Match {
    Match {
        agent_id,
        entity,
        bucket,
        bucket_key: key.to_string(),
        metadata: MatchMetadata {
            days: 5,
            amount: Some(Decimal::from(600)),
            reference: "Main Street 1".to_string(),
            customer: "Acme BV".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2026, 6, 8).unwrap(),
        },
    }
}

async fn opt_into_batched_email(service: &NotificationService, agent_id: i64) {
    for kind in NotificationKind::all() {
        service
            .set_preference(
                agent_id,
                kind,
                ResolvedPreference {
                    enabled: true,
                    channel: Channel::Email,
                    immediate: false,
                },
            )
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn pending_notifications_group_into_one_batch_per_recipient() {
    let db = create_test_db().await;
    let alice = create_agent(&db, "alice", "alice@example.com").await;
    let bob = create_agent(&db, "bob", "bob@example.com").await;
    let (service, provider) = make_service(&db).await;
    opt_into_batched_email(&service, alice.id).await;
    opt_into_batched_email(&service, bob.id).await;

    // Three for alice, one for bob
    for (entity, bucket, key) in [
        (EntityRef::Contract(1), TriggerBucket::ExpiresIn30Days, "expires_in_30_days:2026-07-08"),
        (EntityRef::Invoice(1), TriggerBucket::Overdue, "overdue"),
        (EntityRef::Invoice(2), TriggerBucket::DueIn3Days, "due_in_3_days"),
    ] {
        service
            .notify(&sample_match(alice.id, entity, bucket, key))
            .await
            .unwrap();
    }
    service
        .notify(&sample_match(bob.id, EntityRef::Invoice(3), TriggerBucket::Overdue, "overdue"))
        .await
        .unwrap();

    let processor = BatchProcessor::new(service.clone());
    let report = processor.process_batches(chrono::Utc::now()).await.unwrap();

    assert_eq!(report.batches_sent, 2);
    assert_eq!(report.batches_failed, 0);
    assert_eq!(report.notifications_delivered, 4);
    assert_eq!(provider.sent_count(), 2, "one digest email per recipient");

    let to_alice = provider
        .sent_messages()
        .into_iter()
        .find(|m| m.recipient == "alice@example.com")
        .unwrap();
    assert!(to_alice.subject.contains('3'));

    // Every member is now emailed and attached to a sent batch
    let members = notification::Entity::find().all(&db).await.unwrap();
    assert!(members.iter().all(|n| n.emailed && n.batch_id.is_some()));

    let batches = batch_notification::Entity::find().all(&db).await.unwrap();
    assert_eq!(batches.len(), 2);
    assert!(batches.iter().all(|b| b.status == "sent" && b.sent_at.is_some()));
}

#[tokio::test]
async fn in_app_rows_are_never_batched() {
    let db = create_test_db().await;
    let alice = create_agent(&db, "alice", "alice@example.com").await;
    let (service, provider) = make_service(&db).await;

    // Default preference: in-app only
    service
        .notify(&sample_match(alice.id, EntityRef::Invoice(1), TriggerBucket::Overdue, "overdue"))
        .await
        .unwrap();

    let processor = BatchProcessor::new(service.clone());
    let report = processor.process_batches(chrono::Utc::now()).await.unwrap();

    assert_eq!(report.batches_sent, 0);
    assert_eq!(report.recipients.len(), 0);
    assert_eq!(provider.sent_count(), 0);
    assert_eq!(batch_notification::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn one_failing_recipient_does_not_abort_the_run() {
    let db = create_test_db().await;
    let alice = create_agent(&db, "alice", "alice@example.com").await;
    let bob = create_agent(&db, "bob", "bob@example.com").await;
    let (service, provider) = make_service(&db).await;
    opt_into_batched_email(&service, alice.id).await;
    opt_into_batched_email(&service, bob.id).await;

    service
        .notify(&sample_match(alice.id, EntityRef::Invoice(1), TriggerBucket::Overdue, "overdue"))
        .await
        .unwrap();
    service
        .notify(&sample_match(bob.id, EntityRef::Invoice(2), TriggerBucket::Overdue, "overdue"))
        .await
        .unwrap();

    // Only the second recipient's mailbox is unreachable
    provider.fail_for("bob@example.com");

    let processor = BatchProcessor::new(service.clone());
    let report = processor.process_batches(chrono::Utc::now()).await.unwrap();

    assert_eq!(report.batches_sent, 1);
    assert_eq!(report.batches_failed, 1);
    assert_eq!(provider.sent_count(), 1);
    assert_eq!(provider.sent_messages()[0].recipient, "alice@example.com");

    let failed = batch_notification::Entity::find()
        .filter(batch_notification::Column::Status.eq("failed"))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failed.agent_id, bob.id);
    assert!(failed.error_message.is_some());

    // The failed recipient's notification is still unsent and batched
    let bobs = notification::Entity::find()
        .filter(notification::Column::AgentId.eq(bob.id))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(!bobs.emailed);
    assert_eq!(bobs.batch_id, Some(failed.id));
}

#[tokio::test]
async fn failed_batch_is_retried_on_the_next_run() {
    let db = create_test_db().await;
    let alice = create_agent(&db, "alice", "alice@example.com").await;
    let (service, provider) = make_service(&db).await;
    opt_into_batched_email(&service, alice.id).await;

    service
        .notify(&sample_match(alice.id, EntityRef::Invoice(1), TriggerBucket::Overdue, "overdue"))
        .await
        .unwrap();
    service
        .notify(&sample_match(
            alice.id,
            EntityRef::Invoice(1),
            TriggerBucket::OverdueUrgent,
            "overdue_urgent",
        ))
        .await
        .unwrap();

    let processor = BatchProcessor::new(service.clone());

    // Transport down: the batch is created but stays unsent
    provider.set_fail(true);
    let report = processor.process_batches(chrono::Utc::now()).await.unwrap();
    assert_eq!(report.batches_failed, 1);
    assert_eq!(report.batches_sent, 0);

    let members = notification::Entity::find().all(&db).await.unwrap();
    assert!(members.iter().all(|n| !n.emailed && n.batch_id.is_some()));

    // Transport back: the same batch goes out with all its members
    provider.set_fail(false);
    let report = processor.process_batches(chrono::Utc::now()).await.unwrap();
    assert_eq!(report.batches_sent, 1);
    assert_eq!(report.notifications_delivered, 2);
    assert_eq!(provider.sent_count(), 1);

    let batches = batch_notification::Entity::find().all(&db).await.unwrap();
    assert_eq!(batches.len(), 1, "no second batch is created for the retry");
    assert_eq!(batches[0].status, "sent");

    let members = notification::Entity::find().all(&db).await.unwrap();
    assert!(members.iter().all(|n| n.emailed));
}
