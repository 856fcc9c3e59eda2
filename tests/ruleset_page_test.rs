use anyhow::Result;
use httpmock::prelude::*;
use ruleset_ui::adapters::{AutoConfirm, Download, MemoryDocument, NodeId, StaticToken, ToastRecorder};
use ruleset_ui::domain::model::{RowState, UiEvent};
use ruleset_ui::{ApiClient, Document, RulesetAction, RulesetPage, UiError};
use std::sync::Arc;
use std::time::Duration;

const PAGE: &str = r#"<nav><button id="new-rule-btn">New rule</button></nav>
<div id="main-content"></div>
<div id="ruleset-card-42" class="card"><span data-shared="False">Private</span></div>
<div id="rule-form-container"><form id="rule-form"><input name="name" value="Wall height"><select name="severity"><option value="Warning">Warning</option><option value="Error" selected>Error</option></select></form></div>
<table><tbody id="rules-container"><tr id="row-1"><td><button data-rule-id="1">Edit</button></td></tr><tr id="row-2"><td><button data-rule-id="2">Edit</button></td></tr><tr id="row-3"><td><button data-rule-id="3">Edit</button></td></tr></tbody></table>
<div id="conditions-container"><div class="condition-row" id="c0"><button class="remove">x</button></div><div class="condition-row" id="c1"><button class="remove">x</button></div></div>"#;

struct Harness {
    page: RulesetPage<MemoryDocument>,
    doc: Arc<MemoryDocument>,
    toasts: Arc<ToastRecorder>,
    confirm: Arc<AutoConfirm>,
}

fn harness(server: &MockServer, accept: bool) -> Harness {
    let doc = Arc::new(MemoryDocument::from_html(PAGE));
    let toasts = Arc::new(ToastRecorder::new());
    let confirm = Arc::new(AutoConfirm::new(accept));
    let api = ApiClient::builder(doc.clone())
        .base_url(server.base_url())
        .timeout_delay(Duration::ZERO)
        .token_provider(Arc::new(StaticToken::new("test-token")))
        .notifier(toasts.clone())
        .build()
        .unwrap();
    Harness {
        page: RulesetPage::new(api, confirm.clone()),
        doc,
        toasts,
        confirm,
    }
}

fn node(doc: &MemoryDocument, selector: &str) -> NodeId {
    doc.query_selector(selector)
        .unwrap_or_else(|| panic!("{} not on page", selector))
}

fn row_state(h: &Harness, selector: &str) -> RowState {
    h.page.row_state(&node(&h.doc, selector))
}

#[tokio::test]
async fn test_open_ruleset_renders_and_records_history() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/rulesets/42")
                .header("Authorization", "Bearer test-token");
            then.status(200).body("<h1>Ruleset 42</h1>");
        })
        .await;

    let h = harness(&server, true);
    let mut event = UiEvent::new(node(&h.doc, "#new-rule-btn"));
    h.page.go_to_ruleset("42", Some(&mut event)).await?;

    mock.assert_async().await;
    assert!(event.is_default_prevented());
    assert_eq!(
        h.doc.inner_html_of("#main-content").as_deref(),
        Some("<h1>Ruleset 42</h1>")
    );
    assert_eq!(h.doc.history(), vec!["/rulesets/42".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_delete_ruleset_removes_card() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/rulesets/42/delete");
            then.status(204);
        })
        .await;

    let h = harness(&server, true);
    h.page.delete_ruleset("42", None).await?;

    mock.assert_async().await;
    assert!(h.doc.query_selector("#ruleset-card-42").is_none());
    assert_eq!(
        h.confirm.prompts(),
        vec!["Are you sure you want to delete this ruleset?".to_string()]
    );
    assert_eq!(h.toasts.messages(), vec!["Ruleset deleted successfully".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_declined_delete_sends_nothing() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE);
            then.status(204);
        })
        .await;

    let h = harness(&server, false);
    h.page.delete_ruleset("42", None).await?;

    mock.assert_hits_async(0).await;
    assert!(h.doc.query_selector("#ruleset-card-42").is_some());
    assert!(h.toasts.toasts().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_toggle_sharing_twice() -> Result<()> {
    let server = MockServer::start_async().await;
    let mut share = server
        .mock_async(|when, then| {
            when.method(httpmock::Method::PATCH)
                .path("/api/rulesets/42/share");
            then.status(200)
                .body(r#"<span data-shared="True">Shared</span>"#);
        })
        .await;

    let h = harness(&server, true);
    assert!(h.page.toggle_ruleset_sharing("42", None).await?);
    assert_eq!(
        h.doc.inner_html_of("#ruleset-card-42").as_deref(),
        Some(r#"<span data-shared="True">Shared</span>"#)
    );

    share.delete_async().await;
    share = server
        .mock_async(|when, then| {
            when.method(httpmock::Method::PATCH)
                .path("/api/rulesets/42/share");
            then.status(200).body(r#"<span class="badge">Private</span>"#);
        })
        .await;

    assert!(!h.page.toggle_ruleset_sharing("42", None).await?);
    share.assert_async().await;
    assert_eq!(
        h.toasts.messages(),
        vec![
            "Ruleset shared successfully".to_string(),
            "Ruleset unshared successfully".to_string()
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_export_clicks_temporary_anchor() -> Result<()> {
    let server = MockServer::start_async().await;
    let h = harness(&server, true);
    let before = h.doc.html();

    h.page.export_ruleset("42", None)?;

    assert_eq!(
        h.doc.downloads(),
        vec![Download {
            href: "/api/rulesets/42/export".to_string(),
            file_name: "ruleset-42.tsv".to_string(),
        }]
    );
    assert_eq!(h.doc.html(), before);
    assert_eq!(h.toasts.messages(), vec!["Exporting ruleset".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_new_rule_loads_form_and_hides_button() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/rulesets/42/rules/new");
            then.status(200).body(r#"<form id="new-rule"></form>"#);
        })
        .await;

    let h = harness(&server, true);
    let button = node(&h.doc, "#new-rule-btn");
    let mut event = UiEvent::new(button);
    h.page.new_rule("42", Some(&mut event)).await?;

    assert_eq!(
        h.doc.inner_html_of("#rule-form-container").as_deref(),
        Some(r#"<form id="new-rule"></form>"#)
    );
    assert_eq!(
        h.doc.get_attribute(&button, "style").as_deref(),
        Some("display: none;")
    );
    assert_eq!(h.toasts.severity_refreshes(), 1);
    Ok(())
}

#[tokio::test]
async fn test_add_rule_posts_form_fields() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/rulesets/42/rules")
                .body_includes("Wall height")
                .body_includes("Error");
            then.status(200)
                .body(r#"<tr id="row-9"><td>Wall height</td></tr>"#);
        })
        .await;

    let h = harness(&server, true);
    let form = node(&h.doc, "#rule-form");
    h.page
        .dispatch(
            RulesetAction::AddRule {
                ruleset_id: "42".to_string(),
                form,
            },
            None,
        )
        .await?;

    mock.assert_async().await;
    assert!(h.doc.query_selector("#row-9").is_some());
    assert!(h.doc.query_selector("#row-1").is_none());
    assert_eq!(h.doc.inner_html_of("#rule-form-container").as_deref(), Some(""));
    assert_eq!(h.toasts.messages(), vec!["Rule added successfully".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_failed_add_keeps_form() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/rulesets/42/rules");
            then.status(400);
        })
        .await;

    let h = harness(&server, true);
    let form = node(&h.doc, "#rule-form");
    let err = h.page.add_new_rule("42", &form, None).await.unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert!(h.doc.query_selector("#rule-form").is_some());
    assert_eq!(
        h.toasts.errors(),
        vec!["Error: API error: 400 Bad Request".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn test_only_one_row_is_editing() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path_includes("/edit");
            then.status(200).body("<form></form>");
        })
        .await;

    let h = harness(&server, true);
    for rule_id in ["2", "3"] {
        let trigger = node(&h.doc, &format!("[data-rule-id=\"{}\"]", rule_id));
        h.page
            .edit_rule("42", rule_id, Some(&mut UiEvent::new(trigger)))
            .await?;
    }

    assert_eq!(row_state(&h, "#row-1"), RowState::Normal);
    assert_eq!(row_state(&h, "#row-2"), RowState::Normal);
    assert_eq!(row_state(&h, "#row-3"), RowState::Editing);
    assert_eq!(h.toasts.severity_refreshes(), 2);
    Ok(())
}

#[tokio::test]
async fn test_update_rule_puts_form() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/api/rulesets/42/rules/2")
                .body_includes("Wall height");
            then.status(200).body(r#"<tr id="row-2"><td>updated</td></tr>"#);
        })
        .await;

    let h = harness(&server, true);
    let form = node(&h.doc, "#rule-form");
    h.page.update_rule("42", "2", &form, None).await?;

    mock.assert_async().await;
    assert_eq!(h.doc.inner_html_of("#row-2").as_deref(), Some("<td>updated</td>"));
    assert_eq!(h.doc.inner_html_of("#rule-form-container").as_deref(), Some(""));
    assert_eq!(h.toasts.messages(), vec!["Rule updated successfully".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_declined_rule_delete_restores_row() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE);
            then.status(200);
        })
        .await;

    let h = harness(&server, false);
    let trigger = node(&h.doc, "[data-rule-id=\"1\"]");
    h.page
        .delete_rule("42", "1", Some(&mut UiEvent::new(trigger)))
        .await?;

    mock.assert_hits_async(0).await;
    assert_eq!(row_state(&h, "#row-1"), RowState::Normal);
    assert_eq!(
        h.confirm.prompts(),
        vec!["Are you sure you want to delete this rule?".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn test_failed_rule_delete_restores_row() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/rulesets/42/rules/1");
            then.status(403);
        })
        .await;

    let h = harness(&server, true);
    let trigger = node(&h.doc, "[data-rule-id=\"1\"]");
    let err = h
        .page
        .delete_rule("42", "1", Some(&mut UiEvent::new(trigger)))
        .await
        .unwrap_err();

    assert!(matches!(err, UiError::HttpError { status: 403, .. }));
    assert_eq!(row_state(&h, "#row-1"), RowState::Normal);
    assert_eq!(h.toasts.errors().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_rule_delete_renders_remaining_rows() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/rulesets/42/rules/1");
            then.status(200)
                .body(r#"<tr id="row-2"><td></td></tr><tr id="row-3"><td></td></tr>"#);
        })
        .await;

    let h = harness(&server, true);
    let trigger = node(&h.doc, "[data-rule-id=\"1\"]");
    h.page
        .delete_rule("42", "1", Some(&mut UiEvent::new(trigger)))
        .await?;

    assert!(h.doc.query_selector("#row-1").is_none());
    assert!(h.doc.query_selector("#row-3").is_some());
    assert_eq!(h.toasts.messages(), vec!["Rule deleted successfully".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_add_condition_row_uses_row_count() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/rule/condition")
                .query_param("index", "2")
                .header_missing("Authorization");
            then.status(200)
                .body(r#"<div class="condition-row" id="c2"></div>"#);
        })
        .await;

    let h = harness(&server, true);
    let index = h.page.add_condition_row(None).await?;

    mock.assert_async().await;
    assert_eq!(index, 2);
    let container = node(&h.doc, "#conditions-container");
    assert_eq!(h.doc.query_selector_all(&container, ".condition-row").len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_failed_condition_fetch_inserts_nothing() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/rule/condition");
            then.status(500).body("<h1>Internal Server Error</h1>");
        })
        .await;

    let h = harness(&server, true);
    let before = h.doc.html();
    let err = h.page.add_condition_row(None).await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(h.doc.html(), before);
    let container = node(&h.doc, "#conditions-container");
    assert_eq!(h.doc.query_selector_all(&container, ".condition-row").len(), 2);
    assert!(h.toasts.toasts().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_sharing_marker_without_space_before_it() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(httpmock::Method::PATCH)
                .path("/api/rulesets/42/share");
            then.status(200)
                .body(r#"<span class="badge"data-shared="True">Shared</span>"#);
        })
        .await;

    let h = harness(&server, true);
    assert!(h.page.toggle_ruleset_sharing("42", None).await?);
    assert_eq!(
        h.toasts.messages(),
        vec!["Ruleset shared successfully".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn test_delete_condition_row() -> Result<()> {
    let server = MockServer::start_async().await;
    let h = harness(&server, true);

    let remove = h
        .doc
        .query_selector_all(&node(&h.doc, "#c1"), ".remove")
        .remove(0);
    let mut event = UiEvent::new(remove);
    h.page
        .dispatch(RulesetAction::DeleteConditionRow, Some(&mut event))
        .await?;

    assert!(event.is_propagation_stopped());
    assert!(h.doc.query_selector("#c1").is_none());
    assert!(h.doc.query_selector("#c0").is_some());
    Ok(())
}

#[tokio::test]
async fn test_rejects_ids_that_escape_the_path() -> Result<()> {
    let server = MockServer::start_async().await;
    let h = harness(&server, true);

    let err = h.page.delete_ruleset("1/../2", None).await.unwrap_err();
    assert!(matches!(err, UiError::InvalidConfigValueError { .. }));
    assert!(h.confirm.prompts().is_empty());
    Ok(())
}
