use std::time::Duration;

use tokio::time::Instant;

/// Ticket for the deferred step that follows a counted answer.
///
/// Handed out by `SessionController::submit_answer`. The host waits (or
/// schedules its own timer) and passes it back to
/// `SessionController::complete_transition`. A ticket issued before the
/// session was replaced, or one that was already applied, does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransition {
    generation: u64,
    answered: usize,
    delay: Duration,
    due_at: Instant,
}

impl PendingTransition {
    pub(crate) fn new(generation: u64, answered: usize, delay: Duration) -> Self {
        Self {
            generation,
            answered,
            delay,
            due_at: Instant::now() + delay,
        }
    }

    /// Session generation the answer was counted under.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Answers counted, including the one this ticket follows.
    #[must_use]
    pub fn answered(&self) -> usize {
        self.answered
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    #[must_use]
    pub fn due_at(&self) -> Instant {
        self.due_at
    }

    /// Sleep until the feedback delay has elapsed.
    pub async fn wait(&self) {
        tokio::time::sleep_until(self.due_at).await;
    }
}

/// What `complete_transition` did with a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    /// Moved on to the question at this cursor.
    Advanced(usize),
    Finished,
    /// The ticket no longer matches the live session; nothing changed.
    Stale,
}
