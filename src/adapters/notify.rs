use crate::domain::ports::Notifier;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, PoisonError};

/// Console fallback used when the page has no toast UI.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show_toast(&self, message: &str, is_error: bool) {
        if is_error {
            tracing::error!("{}", message);
        } else {
            tracing::info!("{}", message);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub message: String,
    pub is_error: bool,
    pub shown_at: DateTime<Utc>,
}

/// Keeps every toast in memory, in the order shown.
#[derive(Debug, Default)]
pub struct ToastRecorder {
    toasts: Mutex<Vec<Toast>>,
    severity_refreshes: Mutex<usize>,
}

impl ToastRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.toasts().into_iter().map(|t| t.message).collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.toasts()
            .into_iter()
            .filter(|t| t.is_error)
            .map(|t| t.message)
            .collect()
    }

    pub fn severity_refreshes(&self) -> usize {
        *self
            .severity_refreshes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for ToastRecorder {
    fn show_toast(&self, message: &str, is_error: bool) {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Toast {
                message: message.to_string(),
                is_error,
                shown_at: Utc::now(),
            });
    }

    fn refresh_severity_colors(&self) {
        *self
            .severity_refreshes
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
    }
}
