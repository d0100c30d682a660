pub use sea_orm_migration::prelude::*;

mod m20260810_000001_create_agents;
mod m20260810_000002_create_contracts;
mod m20260810_000003_create_invoices;
mod m20260810_000004_create_notifications;
mod m20260810_000005_create_notification_logs;
mod m20260810_000006_create_notification_preferences;
mod m20260810_000007_create_batch_notifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260810_000001_create_agents::Migration),
            Box::new(m20260810_000002_create_contracts::Migration),
            Box::new(m20260810_000003_create_invoices::Migration),
            Box::new(m20260810_000004_create_notifications::Migration),
            Box::new(m20260810_000005_create_notification_logs::Migration),
            Box::new(m20260810_000006_create_notification_preferences::Migration),
            Box::new(m20260810_000007_create_batch_notifications::Migration),
        ]
    }
}
