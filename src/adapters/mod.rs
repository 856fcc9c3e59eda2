// Adapters layer: concrete implementations of the domain ports (document, tokens, toasts, prompts).

pub mod memory_document;
pub mod notify;
pub mod prompt;
pub mod token;
#[cfg(feature = "web")]
pub mod web_document;

pub use memory_document::{Download, MemoryDocument, NodeId};
pub use notify::{LogNotifier, Toast, ToastRecorder};
pub use prompt::AutoConfirm;
pub use token::{FnTokenProvider, SessionTokenProvider, StaticToken};
#[cfg(feature = "web")]
pub use web_document::{BrowserConfirm, PageNotifier, WebDocument};
