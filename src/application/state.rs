use sea_orm::DatabaseConnection;

use crate::services::batch::BatchProcessor;
use crate::services::notification::NotificationService;

/// Database connection type alias
pub type DbConn = DatabaseConnection;

/// Application state containing all shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DbConn,
    pub notifications: NotificationService,
    pub batches: BatchProcessor,
}

impl AppState {
    pub fn new(db: DbConn) -> Self {
        let notifications = NotificationService::new(db.clone());
        let batches = BatchProcessor::new(notifications.clone());
        Self {
            db,
            notifications,
            batches,
        }
    }
}
