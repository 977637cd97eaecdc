//! Short-lived notifications.

use crate::config::ViewerConfig;
use std::time::{Duration, Instant};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub shown_at: Instant,
}

/// A single toast slot; a new toast replaces the current one.
#[derive(Clone, Debug)]
pub struct Toasts {
    duration: Duration,
    current: Option<Toast>,
}

impl Toasts {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            current: None,
        }
    }

    /// Toasts shown for the configured display time.
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self::new(config.toast_duration)
    }

    pub fn show(&mut self, message: impl Into<String>) {
        self.show_at(message, Instant::now());
    }

    pub fn show_at(&mut self, message: impl Into<String>, now: Instant) {
        let message = message.into();
        tracing::debug!("toast: {}", message);
        self.current = Some(Toast {
            message,
            shown_at: now,
        });
    }

    /// The toast still on screen right now.
    pub fn current(&self) -> Option<&Toast> {
        self.visible_at(Instant::now())
    }

    pub fn visible_at(&self, now: Instant) -> Option<&Toast> {
        self.current
            .as_ref()
            .filter(|toast| now.saturating_duration_since(toast.shown_at) < self.duration)
    }

    /// Drop the toast once its display time has passed.
    pub fn expire(&mut self, now: Instant) {
        if self.visible_at(now).is_none() {
            self.current = None;
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
