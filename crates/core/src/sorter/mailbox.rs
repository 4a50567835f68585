use super::types::Notification;

/// Single-slot notification queue with read-and-clear semantics.
///
/// Posting replaces a message nobody has collected yet, so a caller polling
/// status sees each notification at most once.
#[derive(Debug, Default)]
pub struct NotificationMailbox {
    pending: Option<Notification>,
}

impl NotificationMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&mut self, notification: Notification) {
        self.pending = Some(notification);
    }

    /// Take the pending message, leaving the mailbox empty.
    pub fn take(&mut self) -> Option<Notification> {
        self.pending.take()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_clears() {
        let mut mailbox = NotificationMailbox::new();
        assert!(mailbox.is_empty());

        mailbox.post(Notification::RunFinished);
        assert_eq!(mailbox.take(), Some(Notification::RunFinished));
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn test_post_replaces() {
        let mut mailbox = NotificationMailbox::new();
        mailbox.post(Notification::RunFailed);
        mailbox.post(Notification::RunFinished);
        assert_eq!(mailbox.take(), Some(Notification::RunFinished));
        assert!(mailbox.is_empty());
    }
}
