//! Single-slot debounce timer for quiescence-based saves.

use std::time::{Duration, Instant};

/// A trailing-edge debounce with one pending slot.
///
/// Each `arm` replaces the previous deadline, so a flurry of edits
/// collapses into a single firing once the window of quiet has passed.
#[derive(Debug, Clone)]
pub struct Debounce {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    /// Create a disarmed debounce with the given quiescence window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// The quiescence window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Change the quiescence window. Takes effect on the next `arm`.
    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    /// Schedule (or reschedule) the deadline at `now + window`.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// Whether a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Check the deadline. Returns `true` and disarms when it has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drop any pending deadline without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}
