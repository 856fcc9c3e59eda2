pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod html;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::{AutoConfirm, LogNotifier, MemoryDocument, StaticToken, ToastRecorder};
#[cfg(feature = "web")]
pub use adapters::{BrowserConfirm, PageNotifier, WebDocument};
pub use config::ClientConfig;
pub use core::{ApiClient, RulesetAction, RulesetPage};
pub use domain::model::{FormInput, FormPayload, RequestOptions, ResponseBody, UiEvent};
pub use domain::ports::{Confirm, Document, Notifier, TokenProvider};
pub use utils::error::{Result, UiError};
