use crate::domain::ports::Confirm;
use std::sync::{Mutex, PoisonError};

/// Answers every confirmation with a fixed value and remembers what was asked.
#[derive(Debug, Default)]
pub struct AutoConfirm {
    answer: bool,
    prompts: Mutex<Vec<String>>,
}

impl AutoConfirm {
    pub fn accept() -> Self {
        Self::new(true)
    }

    pub fn decline() -> Self {
        Self::new(false)
    }

    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Confirm for AutoConfirm {
    fn confirm(&self, message: &str) -> bool {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
        tracing::debug!("Confirm '{}' -> {}", message, self.answer);
        self.answer
    }
}
