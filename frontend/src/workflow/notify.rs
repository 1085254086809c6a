#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationSeverity {
    Info,
    Destructive,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: NotificationSeverity,
}

impl Notification {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity: NotificationSeverity::Info,
        }
    }

    pub fn destructive(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity: NotificationSeverity::Destructive,
        }
    }
}

/// Where user-facing notices go. The toast layer in the app is one sink.
pub trait Notifier {
    fn notify(&self, notification: Notification);
}
