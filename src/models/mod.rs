pub mod agent;
pub mod batch_notification;
pub mod contract;
pub mod invoice;
pub mod notification;
pub mod notification_log;
pub mod notification_preference;

#[allow(unused_imports)]
pub mod prelude {
    pub use super::agent::{self, Entity as Agent};
    pub use super::batch_notification::{self, Entity as BatchNotification};
    pub use super::contract::{self, Entity as Contract};
    pub use super::invoice::{self, Entity as Invoice};
    pub use super::notification::{self, Entity as Notification};
    pub use super::notification_log::{self, Entity as NotificationLog};
    pub use super::notification_preference::{self, Entity as NotificationPreference};
}
