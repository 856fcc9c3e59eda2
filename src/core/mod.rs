pub mod api_client;
pub mod routes;
pub mod rulesets;

pub use api_client::{ApiClient, ApiClientBuilder};
pub use rulesets::{is_shared_markup, RulesetAction, RulesetPage};
