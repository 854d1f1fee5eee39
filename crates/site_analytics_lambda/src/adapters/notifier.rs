use crate::error::BackendError;
use crate::runtime::contract::Notification;

pub trait Notifier {
    /// Publishes one message and returns the service's message id, if any.
    fn publish(&self, notification: &Notification) -> Result<Option<String>, BackendError>;
}
