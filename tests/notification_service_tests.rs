//! NotificationService behavior around creation, preferences, email
//! dispatch, and the inbox read path.

mod common;
use common::{create_agent, create_test_db, make_service};

use propalert::error::AppError;
use propalert::models::notification::{EntityRef, NotificationKind};
use propalert::models::{notification, notification_log};
use propalert::services::checkers::{Match, MatchMetadata, TriggerBucket};
use propalert::services::notification::{Channel, NotificationService, ResolvedPreference};
use rust_decimal::Decimal;
use sea_orm::{EntityTrait, PaginatorTrait};

fn sample_match(agent_id: i64, bucket: TriggerBucket, key: &str) -> Match {
    Match {
        agent_id,
        entity: EntityRef::Contract(1),
        bucket,
        bucket_key: key.to_string(),
        metadata: MatchMetadata {
            days: 7,
            amount: Some(Decimal::from(1200)),
            reference: "Main Street 1".to_string(),
            customer: "Acme BV".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2026, 6, 8).unwrap(),
        },
    }
}

#[tokio::test]
async fn notify_creates_notification_and_dedup_entry() {
    let db = create_test_db().await;
    let agent = create_agent(&db, "alice", "alice@example.com").await;
    let (service, _) = make_service(&db).await;

    let m = sample_match(agent.id, TriggerBucket::ExpiresIn7Days, "expires_in_7_days:2026-06-08");

    let created = service.notify(&m).await.unwrap();
    assert!(created.is_some());
    let created = created.unwrap();
    assert_eq!(created.kind, "contract_expiring");
    assert_eq!(created.related_kind.as_deref(), Some("contract"));
    assert_eq!(created.related_id, Some(1));
    assert!(!created.read);

    let logs = notification_log::Entity::find().count(&db).await.unwrap();
    assert_eq!(logs, 1);

    // Same key again: suppressed
    let again = service.notify(&m).await.unwrap();
    assert!(again.is_none());
    let total = notification::Entity::find().count(&db).await.unwrap();
    assert_eq!(total, 1);
}

#[tokio::test]
async fn opted_out_agent_gets_no_rows_at_all() {
    let db = create_test_db().await;
    let agent = create_agent(&db, "bob", "bob@example.com").await;
    let (service, _) = make_service(&db).await;

    service
        .set_preference(
            agent.id,
            NotificationKind::ContractExpiring,
            ResolvedPreference {
                enabled: false,
                channel: Channel::InApp,
                immediate: true,
            },
        )
        .await
        .unwrap();

    let m = sample_match(agent.id, TriggerBucket::ExpiresIn30Days, "expires_in_30_days:2026-07-01");
    let created = service.notify(&m).await.unwrap();
    assert!(created.is_none());

    // Opt-out writes neither a notification nor a dedup entry, so a
    // later opt-in is not shadowed
    assert_eq!(notification::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(notification_log::Entity::find().count(&db).await.unwrap(), 0);

    service
        .set_preference(
            agent.id,
            NotificationKind::ContractExpiring,
            ResolvedPreference::default(),
        )
        .await
        .unwrap();
    let created = service.notify(&m).await.unwrap();
    assert!(created.is_some());
}

#[tokio::test]
async fn default_preference_is_in_app_enabled() {
    let db = create_test_db().await;
    let agent = create_agent(&db, "carol", "carol@example.com").await;
    let (service, provider) = make_service(&db).await;

    let pref = service
        .preference(agent.id, NotificationKind::InvoiceOverdue)
        .await
        .unwrap();
    assert!(pref.enabled);
    assert_eq!(pref.channel, Channel::InApp);

    // In-app only: nothing goes through the provider
    let m = sample_match(agent.id, TriggerBucket::Overdue, "overdue");
    service.notify(&m).await.unwrap();
    assert_eq!(provider.sent_count(), 0);

    let n = notification::Entity::find().one(&db).await.unwrap().unwrap();
    assert!(!n.emailed);
}

#[tokio::test]
async fn email_immediate_sends_and_marks_emailed() {
    let db = create_test_db().await;
    let agent = create_agent(&db, "dave", "dave@example.com").await;
    let (service, provider) = make_service(&db).await;

    service
        .set_preference(
            agent.id,
            NotificationKind::ContractExpiring,
            ResolvedPreference {
                enabled: true,
                channel: Channel::Both,
                immediate: true,
            },
        )
        .await
        .unwrap();

    let m = sample_match(agent.id, TriggerBucket::ExpiresIn7Days, "expires_in_7_days:2026-06-08");
    service.notify(&m).await.unwrap();

    assert_eq!(provider.sent_count(), 1);
    let sent = provider.sent_messages();
    assert_eq!(sent[0].recipient, "dave@example.com");
    assert!(sent[0].subject.contains("Main Street 1"));

    let n = notification::Entity::find().one(&db).await.unwrap().unwrap();
    assert!(n.emailed);
}

#[tokio::test]
async fn failed_immediate_send_leaves_row_for_the_batch_run() {
    let db = create_test_db().await;
    let agent = create_agent(&db, "erin", "erin@example.com").await;
    let (service, provider) = make_service(&db).await;
    provider.set_fail(true);

    service
        .set_preference(
            agent.id,
            NotificationKind::ContractExpiring,
            ResolvedPreference {
                enabled: true,
                channel: Channel::Email,
                immediate: true,
            },
        )
        .await
        .unwrap();

    let m = sample_match(agent.id, TriggerBucket::ExpiresIn7Days, "expires_in_7_days:2026-06-08");
    let created = service.notify(&m).await.unwrap();
    assert!(created.is_some(), "the notification itself still persists");

    let n = notification::Entity::find().one(&db).await.unwrap().unwrap();
    assert!(!n.emailed, "unsent rows stay eligible for batching");
    assert!(n.batch_id.is_none());
}

#[tokio::test]
async fn no_provider_configured_degrades_gracefully() {
    let db = create_test_db().await;
    let agent = create_agent(&db, "frank", "frank@example.com").await;
    let service = NotificationService::new(db.clone());

    service
        .set_preference(
            agent.id,
            NotificationKind::ContractExpiring,
            ResolvedPreference {
                enabled: true,
                channel: Channel::Email,
                immediate: true,
            },
        )
        .await
        .unwrap();

    let m = sample_match(agent.id, TriggerBucket::ExpiresIn7Days, "expires_in_7_days:2026-06-08");
    let created = service.notify(&m).await.unwrap();
    assert!(created.is_some());
    let n = notification::Entity::find().one(&db).await.unwrap().unwrap();
    assert!(!n.emailed);
}

#[tokio::test]
async fn mark_as_read_is_idempotent_and_scoped_to_the_agent() {
    let db = create_test_db().await;
    let agent = create_agent(&db, "grace", "grace@example.com").await;
    let other = create_agent(&db, "heidi", "heidi@example.com").await;
    let (service, _) = make_service(&db).await;

    let m = sample_match(agent.id, TriggerBucket::ExpiresIn7Days, "expires_in_7_days:2026-06-08");
    let n = service.notify(&m).await.unwrap().unwrap();

    assert_eq!(service.unread_count(agent.id).await.unwrap(), 1);

    service.mark_as_read(n.id, agent.id).await.unwrap();
    assert_eq!(service.unread_count(agent.id).await.unwrap(), 0);

    let read_at = notification::Entity::find_by_id(n.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap()
        .read_at;
    assert!(read_at.is_some());

    // Second call is a no-op and keeps the original read_at
    service.mark_as_read(n.id, agent.id).await.unwrap();
    let read_at_again = notification::Entity::find_by_id(n.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap()
        .read_at;
    assert_eq!(read_at, read_at_again);

    // Another agent cannot touch it
    let err = service.mark_as_read(n.id, other.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn mark_all_as_read_covers_every_unread_row() {
    let db = create_test_db().await;
    let agent = create_agent(&db, "ivan", "ivan@example.com").await;
    let (service, _) = make_service(&db).await;

    for (bucket, key) in [
        (TriggerBucket::ExpiresIn30Days, "expires_in_30_days:2026-07-01"),
        (TriggerBucket::ExpiresIn7Days, "expires_in_7_days:2026-06-08"),
        (TriggerBucket::Overdue, "overdue"),
    ] {
        service.notify(&sample_match(agent.id, bucket, key)).await.unwrap();
    }

    assert_eq!(service.unread_count(agent.id).await.unwrap(), 3);

    let updated = service.mark_all_as_read(agent.id).await.unwrap();
    assert_eq!(updated, 3);
    assert_eq!(service.unread_count(agent.id).await.unwrap(), 0);

    // Already read: nothing left to update
    let updated = service.mark_all_as_read(agent.id).await.unwrap();
    assert_eq!(updated, 0);
}

#[tokio::test]
async fn preferences_lists_every_kind_with_defaults() {
    let db = create_test_db().await;
    let agent = create_agent(&db, "judy", "judy@example.com").await;
    let (service, _) = make_service(&db).await;

    service
        .set_preference(
            agent.id,
            NotificationKind::InvoiceDueSoon,
            ResolvedPreference {
                enabled: false,
                channel: Channel::InApp,
                immediate: false,
            },
        )
        .await
        .unwrap();

    let prefs = service.preferences(agent.id).await.unwrap();
    assert_eq!(prefs.len(), NotificationKind::all().len());

    let due_soon = prefs
        .iter()
        .find(|(k, _)| *k == NotificationKind::InvoiceDueSoon)
        .unwrap();
    assert!(!due_soon.1.enabled);

    let overdue = prefs
        .iter()
        .find(|(k, _)| *k == NotificationKind::InvoiceOverdue)
        .unwrap();
    assert_eq!(overdue.1, ResolvedPreference::default());
}

#[tokio::test]
async fn has_notified_reflects_the_dedup_log() {
    use propalert::services::dedup::DedupLog;

    let db = create_test_db().await;
    let agent = create_agent(&db, "leo", "leo@example.com").await;
    let (service, _) = make_service(&db).await;

    let kind = NotificationKind::ContractExpired;
    let entity = EntityRef::Contract(1);

    assert!(!DedupLog::has_notified(&db, kind, entity, "expired:2026-05-31")
        .await
        .unwrap());

    let m = sample_match(agent.id, TriggerBucket::Expired, "expired:2026-05-31");
    service.notify(&m).await.unwrap();

    assert!(DedupLog::has_notified(&db, kind, entity, "expired:2026-05-31")
        .await
        .unwrap());
    // Distinct bucket key: not yet notified
    assert!(!DedupLog::has_notified(&db, kind, entity, "expired:2026-12-31")
        .await
        .unwrap());
}

#[tokio::test]
async fn dedup_holds_across_service_instances() {
    // Two instances over the same store model a scheduled run racing a
    // manual trigger: the unique dedup key keeps it to one notification
    let db = create_test_db().await;
    let agent = create_agent(&db, "kate", "kate@example.com").await;
    let (first, _) = make_service(&db).await;
    let (second, _) = make_service(&db).await;

    let m = sample_match(agent.id, TriggerBucket::Expired, "expired:2026-05-31");

    let a = first.notify(&m).await.unwrap();
    let b = second.notify(&m).await.unwrap();

    assert!(a.is_some());
    assert!(b.is_none());
    assert_eq!(notification::Entity::find().count(&db).await.unwrap(), 1);
}
