use anyhow::Context;
use clap::Parser;
use ruleset_ui::adapters::{AutoConfirm, LogNotifier, MemoryDocument, NodeId, StaticToken};
use ruleset_ui::domain::model::UiEvent;
use ruleset_ui::utils::error::ErrorCategory;
use ruleset_ui::utils::logger;
use ruleset_ui::{ApiClient, CliConfig, Command, Document, RulesetAction, RulesetPage, UiError};
use std::sync::Arc;

/// Page skeleton used when no --page file is given.
const DEFAULT_PAGE: &str = r#"<div id="main-content"></div>
<div id="rule-form-container"></div>
<div id="rules-container"></div>
<div id="conditions-container"></div>"#;

/// 用欄位建立一個隱藏的表單節點
fn build_form(doc: &MemoryDocument, fields: &[(String, String)]) -> anyhow::Result<NodeId> {
    let body = doc.body().context("page has no body")?;
    let form = doc.create_element("form")?;
    doc.set_style(&form, "display", "none");
    for (name, value) in fields {
        let input = doc.create_element("input")?;
        doc.set_attribute(&input, "type", "hidden");
        doc.set_attribute(&input, "name", name);
        doc.set_attribute(&input, "value", value);
        doc.append_child(&form, &input);
    }
    doc.append_child(&body, &form);
    Ok(form)
}

/// Row control for a rule, as the rules table renders it.
fn rule_row_target(doc: &MemoryDocument, rule_id: &str) -> Option<NodeId> {
    doc.query_selector(&format!("[data-rule-id=\"{}\"]", rule_id))
}

fn to_action(
    doc: &MemoryDocument,
    command: Command,
) -> anyhow::Result<(RulesetAction<NodeId>, Option<NodeId>)> {
    let action = match command {
        Command::Open { ruleset_id } => (RulesetAction::OpenRuleset { ruleset_id }, None),
        Command::Delete { ruleset_id } => (RulesetAction::DeleteRuleset { ruleset_id }, None),
        Command::Share { ruleset_id } => (RulesetAction::ToggleSharing { ruleset_id }, None),
        Command::Export { ruleset_id } => (RulesetAction::ExportRuleset { ruleset_id }, None),
        Command::NewRule { ruleset_id } => (RulesetAction::NewRule { ruleset_id }, None),
        Command::AddRule { ruleset_id, fields } => {
            let form = build_form(doc, &fields)?;
            (RulesetAction::AddRule { ruleset_id, form }, None)
        }
        Command::EditRule {
            ruleset_id,
            rule_id,
        } => {
            let target = rule_row_target(doc, &rule_id);
            (
                RulesetAction::EditRule {
                    ruleset_id,
                    rule_id,
                },
                target,
            )
        }
        Command::UpdateRule {
            ruleset_id,
            rule_id,
            fields,
        } => {
            let form = build_form(doc, &fields)?;
            (
                RulesetAction::UpdateRule {
                    ruleset_id,
                    rule_id,
                    form,
                },
                None,
            )
        }
        Command::DeleteRule {
            ruleset_id,
            rule_id,
        } => {
            let target = rule_row_target(doc, &rule_id);
            (
                RulesetAction::DeleteRule {
                    ruleset_id,
                    rule_id,
                },
                target,
            )
        }
        Command::AddCondition => (RulesetAction::AddConditionRow, None),
    };
    Ok(action)
}

fn exit_code(e: &UiError) -> i32 {
    match e.category() {
        ErrorCategory::Config => 1,
        ErrorCategory::Auth => 2,
        ErrorCategory::Http => 3,
        ErrorCategory::Network => 4,
        ErrorCategory::Page => 5,
    }
}

fn fail(e: &UiError) -> ! {
    tracing::error!("❌ {} (Category: {:?})", e, e.category());
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e);
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(e));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting ruleset-ui");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = cli.client_config().unwrap_or_else(|e| fail(&e));

    // 載入頁面
    let page_html = match &cli.page {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read page file '{}'", path))?,
        None => DEFAULT_PAGE.to_string(),
    };
    let document = Arc::new(MemoryDocument::from_html(&page_html));

    let api = ApiClient::from_config(
        &config,
        document.clone(),
        Arc::new(StaticToken::none()),
        Arc::new(LogNotifier),
    )
    .unwrap_or_else(|e| fail(&e));
    tracing::info!("🔧 Server: {}", config.client.base_url);

    let controller = RulesetPage::new(api, Arc::new(AutoConfirm::new(cli.yes)));

    let (action, target) = to_action(&document, cli.command)?;
    let mut event = target.map(UiEvent::new);
    if matches!(action, RulesetAction::EditRule { .. } | RulesetAction::DeleteRule { .. })
        && event.is_none()
    {
        tracing::warn!("No [data-rule-id] element on the page, row state is not tracked");
    }

    if let Err(e) = controller.dispatch(action, event.as_mut()).await {
        fail(&e);
    }

    for download in document.downloads() {
        tracing::info!("📁 Download: {} -> {}", download.href, download.file_name);
    }
    if let Some(location) = document.location() {
        tracing::info!("📍 Location: {}", location);
    }

    println!("{}", document.html());

    tracing::info!("✅ Done");
    Ok(())
}
