//! Test helpers: in-memory database setup, seed data builders, and a
//! recording delivery provider.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;

use propalert::migrations::Migrator;
use propalert::models::{agent, contract, invoice};
use propalert::services::notification::{
    DeliveryMessage, DeliveryProvider, NotificationService, SendResult,
};

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn create_agent(db: &DatabaseConnection, name: &str, email: &str) -> agent::Model {
    agent::ActiveModel {
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Insert an active contract with sensible defaults; override the
/// fields a test cares about afterwards via the returned model's id.
pub struct ContractSpec<'a> {
    pub agent_id: i64,
    pub property_label: &'a str,
    pub customer_name: &'a str,
    pub status: &'a str,
    pub amount: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub increase_frequency: Option<&'a str>,
    pub last_increase_date: Option<NaiveDate>,
}

impl<'a> ContractSpec<'a> {
    pub fn new(agent_id: i64) -> Self {
        Self {
            agent_id,
            property_label: "Main Street 1",
            customer_name: "Acme BV",
            status: "active",
            amount: Decimal::from(1200),
            start_date: date(2025, 1, 1),
            end_date: None,
            increase_frequency: None,
            last_increase_date: None,
        }
    }
}

pub async fn create_contract(db: &DatabaseConnection, spec: ContractSpec<'_>) -> contract::Model {
    contract::ActiveModel {
        agent_id: Set(spec.agent_id),
        property_label: Set(spec.property_label.to_string()),
        customer_name: Set(spec.customer_name.to_string()),
        status: Set(spec.status.to_string()),
        amount: Set(spec.amount),
        start_date: Set(spec.start_date),
        end_date: Set(spec.end_date),
        increase_frequency: Set(spec.increase_frequency.map(|f| f.to_string())),
        last_increase_date: Set(spec.last_increase_date),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_invoice(
    db: &DatabaseConnection,
    number: &str,
    contract_id: Option<i64>,
    status: &str,
    amount_total: Decimal,
    amount_paid: Decimal,
    due_date: NaiveDate,
) -> invoice::Model {
    invoice::ActiveModel {
        number: Set(number.to_string()),
        contract_id: Set(contract_id),
        customer_name: Set("Acme BV".to_string()),
        amount_total: Set(amount_total),
        amount_paid: Set(amount_paid),
        status: Set(status.to_string()),
        due_date: Set(due_date),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Delivery provider that records every message and can be flipped to
/// fail, globally or for one recipient.
pub struct RecordingProvider {
    pub sent: Mutex<Vec<DeliveryMessage>>,
    pub fail: AtomicBool,
    pub fail_recipient: Mutex<Option<String>>,
}

impl RecordingProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            fail_recipient: Mutex::new(None),
        })
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn fail_for(&self, recipient: &str) {
        *self.fail_recipient.lock().unwrap() = Some(recipient.to_string());
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn sent_messages(&self) -> Vec<DeliveryMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryProvider for RecordingProvider {
    async fn send(&self, message: &DeliveryMessage) -> SendResult {
        let recipient_down = self
            .fail_recipient
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|r| r == message.recipient);
        if self.fail.load(Ordering::SeqCst) || recipient_down {
            return SendResult {
                success: false,
                error: Some("simulated transport failure".to_string()),
            };
        }
        self.sent.lock().unwrap().push(message.clone());
        SendResult {
            success: true,
            error: None,
        }
    }
}

/// NotificationService backed by `db` with a recording provider installed
pub async fn make_service(db: &DatabaseConnection) -> (NotificationService, Arc<RecordingProvider>) {
    let service = NotificationService::new(db.clone());
    let provider = RecordingProvider::new();
    service.set_provider(provider.clone()).await;
    (service, provider)
}

/// AppState over `db` for router-level tests
pub fn build_app_state(db: DatabaseConnection) -> propalert::state::AppState {
    propalert::state::AppState::new(db)
}
