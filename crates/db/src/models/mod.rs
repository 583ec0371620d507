pub mod envelope;
pub mod notification;
pub mod page;

pub use envelope::PushEnvelope;
pub use notification::{Notification, NotificationId, NotificationType};
pub use page::{Ack, NotificationPage};
