use crate::config::ClientConfig;
use crate::utils::error::Result;
use crate::utils::validation::validate_required_field;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "ruleset-ui")]
#[command(about = "Run a ruleset page action against a server and print the resulting page")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Server origin, overrides client.base_url
    #[arg(long)]
    pub base_url: Option<String>,

    /// Bearer token, overrides auth.token
    #[arg(long, env = "RULESET_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Delay before each authenticated request, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// HTML file holding the initial <body> content of the page
    #[arg(long)]
    pub page: Option<String>,

    /// Answer "yes" to confirmation prompts
    #[arg(short, long)]
    pub yes: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Load a ruleset into #main-content
    Open { ruleset_id: String },
    /// Delete a ruleset card
    Delete { ruleset_id: String },
    /// Toggle sharing of a ruleset
    Share { ruleset_id: String },
    /// Download a ruleset as TSV
    Export { ruleset_id: String },
    /// Load the new-rule form
    NewRule { ruleset_id: String },
    /// Create a rule from key=value fields
    AddRule {
        ruleset_id: String,
        #[arg(short, long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Load the edit form of a rule
    EditRule { ruleset_id: String, rule_id: String },
    /// Update a rule from key=value fields
    UpdateRule {
        ruleset_id: String,
        rule_id: String,
        #[arg(short, long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Delete a rule
    DeleteRule { ruleset_id: String, rule_id: String },
    /// Append a condition row to #conditions-container
    AddCondition,
}

fn parse_field(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

impl CliConfig {
    /// Merges the optional config file with command line overrides.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::new(
                validate_required_field("base_url (use --base-url or --config)", &self.base_url)?
                    .clone(),
            ),
        };

        if let Some(base_url) = &self.base_url {
            config.client.base_url = base_url.clone();
        }
        if let Some(token) = &self.token {
            config.auth.token = Some(token.clone());
        }
        if let Some(delay) = self.delay_ms {
            config.client.timeout_delay_ms = delay;
        }

        Ok(config)
    }
}
