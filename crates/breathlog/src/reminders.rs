//! Check-in reminders for interactive sessions.
//!
//! Each reminder is a one-shot tokio task owned by a [`ReminderScheduler`].
//! Fired reminders arrive on the channel returned by
//! [`ReminderScheduler::new`]. Pending reminders are cancelled by
//! [`ReminderScheduler::cancel_all`] or when the scheduler is dropped, so no
//! reminder outlives the session that scheduled it.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Capacity of the notification channel.
const CHANNEL_CAPACITY: usize = 16;

/// A message shown once after a delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    /// Time after scheduling at which the reminder fires.
    pub delay: Duration,
    /// Text shown to the user.
    pub message: String,
}

impl Reminder {
    /// A reminder firing `delay` after it is scheduled.
    pub fn new(delay: Duration, message: impl Into<String>) -> Self {
        Self {
            delay,
            message: message.into(),
        }
    }
}

/// Owns the pending reminder tasks of one session.
#[derive(Debug)]
pub struct ReminderScheduler {
    tx: mpsc::Sender<Reminder>,
    tasks: Vec<JoinHandle<()>>,
}

impl ReminderScheduler {
    /// A scheduler and the receiver fired reminders are delivered to.
    #[must_use]
    pub fn new() -> (Self, mpsc::Receiver<Reminder>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        (
            Self {
                tx,
                tasks: Vec::new(),
            },
            rx,
        )
    }

    /// Schedule one reminder.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, reminder: Reminder) {
        let tx = self.tx.clone();
        debug!(delay = ?reminder.delay, "Scheduling reminder");
        let task = tokio::spawn(async move {
            tokio::time::sleep(reminder.delay).await;
            trace!(message = %reminder.message, "Reminder fired");
            // The session may already be gone; nothing to do then.
            let _ = tx.send(reminder).await;
        });
        self.tasks.push(task);
    }

    /// Schedule every reminder in `reminders`.
    pub fn schedule_all(&mut self, reminders: impl IntoIterator<Item = Reminder>) {
        for reminder in reminders {
            self.schedule(reminder);
        }
    }

    /// Number of reminders that have not fired yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    /// Cancel every reminder that has not fired. Returns how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let mut cancelled = 0;
        for task in self.tasks.drain(..) {
            if !task.is_finished() {
                task.abort();
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            debug!(cancelled, "Cancelled pending reminders");
        }
        cancelled
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHORT: Duration = Duration::from_millis(10);
    const LONG: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_reminder_fires_once() {
        let (mut scheduler, mut rx) = ReminderScheduler::new();
        scheduler.schedule(Reminder::new(SHORT, "check in"));

        let fired = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fired.message, "check in");

        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_reminders_fire_in_delay_order() {
        let (mut scheduler, mut rx) = ReminderScheduler::new();
        scheduler.schedule_all(vec![
            Reminder::new(Duration::from_millis(60), "second"),
            Reminder::new(SHORT, "first"),
        ]);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.message, "first");
        assert_eq!(second.message, "second");
    }

    #[tokio::test]
    async fn test_cancel_all_stops_pending() {
        let (mut scheduler, mut rx) = ReminderScheduler::new();
        scheduler.schedule_all(vec![
            Reminder::new(LONG, "later"),
            Reminder::new(LONG, "much later"),
        ]);
        assert_eq!(scheduler.pending(), 2);

        assert_eq!(scheduler.cancel_all(), 2);
        assert_eq!(scheduler.pending(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_drop_cancels_and_closes_channel() {
        let (mut scheduler, mut rx) = ReminderScheduler::new();
        scheduler.schedule(Reminder::new(LONG, "never"));
        drop(scheduler);

        let next = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert!(next.is_none());
    }

    #[tokio::test]
    async fn test_cancel_after_firing_counts_nothing() {
        let (mut scheduler, mut rx) = ReminderScheduler::new();
        scheduler.schedule(Reminder::new(SHORT, "done"));
        rx.recv().await.unwrap();

        // Give the task a moment to finish after sending.
        tokio::time::sleep(SHORT).await;
        assert_eq!(scheduler.cancel_all(), 0);
    }
}
