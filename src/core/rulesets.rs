use crate::core::api_client::ApiClient;
use crate::core::routes;
use crate::domain::model::{FormInput, RowState, UiEvent};
use crate::domain::ports::{Confirm, Document};
use crate::html::{find_first, parse_fragment, Selector};
use crate::utils::error::{Result, UiError};
use crate::utils::validation::validate_path_segment;
use reqwest::Method;
use std::sync::Arc;

pub const DELETE_RULESET_PROMPT: &str = "Are you sure you want to delete this ruleset?";
pub const DELETE_RULE_PROMPT: &str = "Are you sure you want to delete this rule?";

/// One user action on the ruleset page.
#[derive(Debug, Clone, PartialEq)]
pub enum RulesetAction<N> {
    OpenRuleset { ruleset_id: String },
    DeleteRuleset { ruleset_id: String },
    ToggleSharing { ruleset_id: String },
    ExportRuleset { ruleset_id: String },
    NewRule { ruleset_id: String },
    AddRule { ruleset_id: String, form: N },
    EditRule { ruleset_id: String, rule_id: String },
    UpdateRule { ruleset_id: String, rule_id: String, form: N },
    DeleteRule { ruleset_id: String, rule_id: String },
    AddConditionRow,
    DeleteConditionRow,
}

/// Shared state according to the first `data-shared` attribute of the markup.
pub fn is_shared_markup(html: &str) -> bool {
    let Ok(selector) = Selector::parse(routes::SHARED_MARKER) else {
        return false;
    };
    let nodes = parse_fragment(html);
    find_first(&nodes, &selector).and_then(|el| el.attribute("data-shared")) == Some("True")
}

/// Prevents the default action and returns the event target, if any.
fn take_target<N: Clone>(event: Option<&mut UiEvent<N>>) -> Option<N> {
    let event = event?;
    event.prevent_default();
    event.stop_propagation();
    event.target().cloned()
}

/// Controller behind the ruleset page: each method handles one UI action.
pub struct RulesetPage<D: Document> {
    api: ApiClient<D>,
    confirm: Arc<dyn Confirm>,
}

impl<D: Document> RulesetPage<D> {
    pub fn new(api: ApiClient<D>, confirm: Arc<dyn Confirm>) -> Self {
        Self { api, confirm }
    }

    pub fn api(&self) -> &ApiClient<D> {
        &self.api
    }

    fn document(&self) -> &D {
        self.api.document()
    }

    fn toast(&self, message: &str) {
        self.api.notifier().show_toast(message, false);
    }

    fn failed(&self, action: &str, err: UiError) -> UiError {
        tracing::error!("Failed to {}: {}", action, err);
        err
    }

    fn require(&self, selector: &str) -> Result<D::Node> {
        self.document()
            .query_selector(selector)
            .ok_or_else(|| UiError::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    fn clear_rule_form(&self) {
        if let Some(container) = self.document().query_selector(routes::RULE_FORM_CONTAINER) {
            self.document().set_inner_html(&container, "");
        }
    }

    pub fn row_state(&self, row: &D::Node) -> RowState {
        RowState::from_classes(
            self.document().has_class(row, RowState::EDITING_CLASS),
            self.document().has_class(row, RowState::DELETING_CLASS),
        )
    }

    /// Only `row` keeps the editing marker within its table body.
    fn mark_editing(&self, row: &D::Node) {
        let doc = self.document();
        if let Some(tbody) = doc.parent(row) {
            for sibling in doc.children(&tbody) {
                if &sibling != row {
                    doc.remove_class(&sibling, RowState::EDITING_CLASS);
                }
            }
        }
        doc.add_class(row, RowState::EDITING_CLASS);
    }

    pub async fn dispatch(
        &self,
        action: RulesetAction<D::Node>,
        event: Option<&mut UiEvent<D::Node>>,
    ) -> Result<()> {
        match action {
            RulesetAction::OpenRuleset { ruleset_id } => {
                self.go_to_ruleset(&ruleset_id, event).await
            }
            RulesetAction::DeleteRuleset { ruleset_id } => {
                self.delete_ruleset(&ruleset_id, event).await
            }
            RulesetAction::ToggleSharing { ruleset_id } => self
                .toggle_ruleset_sharing(&ruleset_id, event)
                .await
                .map(|_| ()),
            RulesetAction::ExportRuleset { ruleset_id } => self.export_ruleset(&ruleset_id, event),
            RulesetAction::NewRule { ruleset_id } => self.new_rule(&ruleset_id, event).await,
            RulesetAction::AddRule { ruleset_id, form } => {
                self.add_new_rule(&ruleset_id, &form, event).await
            }
            RulesetAction::EditRule {
                ruleset_id,
                rule_id,
            } => self.edit_rule(&ruleset_id, &rule_id, event).await,
            RulesetAction::UpdateRule {
                ruleset_id,
                rule_id,
                form,
            } => self.update_rule(&ruleset_id, &rule_id, &form, event).await,
            RulesetAction::DeleteRule {
                ruleset_id,
                rule_id,
            } => self.delete_rule(&ruleset_id, &rule_id, event).await,
            RulesetAction::AddConditionRow => self.add_condition_row(event).await.map(|_| ()),
            RulesetAction::DeleteConditionRow => self.delete_condition_row(event),
        }
    }

    /// Loads the ruleset into `#main-content` and records `/rulesets/{id}` in the history.
    pub async fn go_to_ruleset(
        &self,
        ruleset_id: &str,
        event: Option<&mut UiEvent<D::Node>>,
    ) -> Result<()> {
        take_target(event);
        validate_path_segment("ruleset_id", ruleset_id)?;

        self.api
            .load_and_render(&routes::ruleset(ruleset_id), routes::MAIN_CONTENT)
            .await;
        self.document().push_history(&routes::ruleset_page(ruleset_id));
        Ok(())
    }

    pub async fn delete_ruleset(
        &self,
        ruleset_id: &str,
        event: Option<&mut UiEvent<D::Node>>,
    ) -> Result<()> {
        take_target(event);
        validate_path_segment("ruleset_id", ruleset_id)?;

        if !self.confirm.confirm(DELETE_RULESET_PROMPT) {
            return Ok(());
        }

        self.api
            .delete_resource(
                &routes::ruleset_delete(ruleset_id),
                Some(&routes::ruleset_card(ruleset_id)),
            )
            .await
            .map_err(|e| self.failed("delete ruleset", e))?;

        self.toast("Ruleset deleted successfully");
        Ok(())
    }

    /// Flips sharing and returns the new state as reported by the returned card markup.
    pub async fn toggle_ruleset_sharing(
        &self,
        ruleset_id: &str,
        event: Option<&mut UiEvent<D::Node>>,
    ) -> Result<bool> {
        take_target(event);
        validate_path_segment("ruleset_id", ruleset_id)?;

        let html = self
            .api
            .patch(
                &routes::ruleset_share(ruleset_id),
                FormInput::default(),
                Some(&routes::ruleset_card(ruleset_id)),
            )
            .await
            .map_err(|e| self.failed("toggle sharing", e))?;

        let shared = is_shared_markup(&html);
        self.toast(if shared {
            "Ruleset shared successfully"
        } else {
            "Ruleset unshared successfully"
        });
        Ok(shared)
    }

    /// Starts the TSV download through a hidden anchor that is removed right after the click.
    pub fn export_ruleset(
        &self,
        ruleset_id: &str,
        event: Option<&mut UiEvent<D::Node>>,
    ) -> Result<()> {
        take_target(event);
        validate_path_segment("ruleset_id", ruleset_id)?;

        let doc = self.document();
        let body = doc.body().ok_or_else(|| {
            self.failed(
                "export ruleset",
                UiError::ElementNotFound {
                    selector: "body".to_string(),
                },
            )
        })?;

        let anchor = doc
            .create_element("a")
            .map_err(|e| self.failed("export ruleset", e))?;
        doc.set_attribute(&anchor, "href", &routes::ruleset_export(ruleset_id));
        doc.set_attribute(
            &anchor,
            "download",
            &routes::ruleset_export_file_name(ruleset_id),
        );
        doc.set_style(&anchor, "display", "none");

        doc.append_child(&body, &anchor);
        doc.click(&anchor);
        doc.remove(&anchor);

        self.toast("Exporting ruleset");
        Ok(())
    }

    pub async fn new_rule(
        &self,
        ruleset_id: &str,
        event: Option<&mut UiEvent<D::Node>>,
    ) -> Result<()> {
        let trigger = take_target(event);
        validate_path_segment("ruleset_id", ruleset_id)?;

        self.api
            .load_and_render(&routes::new_rule_form(ruleset_id), routes::RULE_FORM_CONTAINER)
            .await;

        if let Some(button) = trigger {
            self.document().set_style(&button, "display", "none");
        }
        self.api.notifier().refresh_severity_colors();
        Ok(())
    }

    pub async fn add_new_rule(
        &self,
        ruleset_id: &str,
        form: &D::Node,
        event: Option<&mut UiEvent<D::Node>>,
    ) -> Result<()> {
        take_target(event);
        validate_path_segment("ruleset_id", ruleset_id)?;

        let payload = self.document().form_data(form);
        self.api
            .submit_form(
                &routes::rules(ruleset_id),
                payload,
                Method::POST,
                Some(routes::RULES_CONTAINER),
            )
            .await
            .map_err(|e| self.failed("add rule", e))?;

        self.clear_rule_form();
        self.toast("Rule added successfully");
        Ok(())
    }

    /// Marks the clicked row as the only row being edited and loads its edit form.
    pub async fn edit_rule(
        &self,
        ruleset_id: &str,
        rule_id: &str,
        event: Option<&mut UiEvent<D::Node>>,
    ) -> Result<()> {
        let target = take_target(event);
        validate_path_segment("ruleset_id", ruleset_id)?;
        validate_path_segment("rule_id", rule_id)?;

        let row = target
            .and_then(|t| self.document().closest(&t, routes::TABLE_ROW))
            .ok_or_else(|| {
                self.failed(
                    "load edit form",
                    UiError::ElementNotFound {
                        selector: routes::TABLE_ROW.to_string(),
                    },
                )
            })?;
        self.mark_editing(&row);

        self.api
            .load_and_render(
                &routes::edit_rule_form(ruleset_id, rule_id),
                routes::RULE_FORM_CONTAINER,
            )
            .await;
        self.api.notifier().refresh_severity_colors();
        Ok(())
    }

    pub async fn update_rule(
        &self,
        ruleset_id: &str,
        rule_id: &str,
        form: &D::Node,
        event: Option<&mut UiEvent<D::Node>>,
    ) -> Result<()> {
        take_target(event);
        validate_path_segment("ruleset_id", ruleset_id)?;
        validate_path_segment("rule_id", rule_id)?;

        let payload = self.document().form_data(form);
        self.api
            .submit_form(
                &routes::rule(ruleset_id, rule_id),
                payload,
                Method::PUT,
                Some(routes::RULES_CONTAINER),
            )
            .await
            .map_err(|e| self.failed("update rule", e))?;

        self.clear_rule_form();
        self.toast("Rule updated successfully");
        Ok(())
    }

    /// Shows the row as deleting while asking for confirmation; reverts on decline or failure.
    pub async fn delete_rule(
        &self,
        ruleset_id: &str,
        rule_id: &str,
        event: Option<&mut UiEvent<D::Node>>,
    ) -> Result<()> {
        let target = take_target(event);
        validate_path_segment("ruleset_id", ruleset_id)?;
        validate_path_segment("rule_id", rule_id)?;

        let doc = self.document();
        let row = target.and_then(|t| doc.closest(&t, routes::TABLE_ROW));
        if let Some(row) = &row {
            doc.add_class(row, RowState::DELETING_CLASS);
        }

        if !self.confirm.confirm(DELETE_RULE_PROMPT) {
            if let Some(row) = &row {
                doc.remove_class(row, RowState::DELETING_CLASS);
            }
            return Ok(());
        }

        let result = self
            .api
            .delete_resource(
                &routes::rule(ruleset_id, rule_id),
                Some(routes::RULES_CONTAINER),
            )
            .await;

        match result {
            Ok(_) => {
                self.toast("Rule deleted successfully");
                Ok(())
            }
            Err(e) => {
                if let Some(row) = &row {
                    doc.remove_class(row, RowState::DELETING_CLASS);
                }
                Err(self.failed("delete rule", e))
            }
        }
    }

    /// Appends the next condition row and returns the index it was requested with.
    ///
    /// A non-2xx answer for the fragment is returned as `HttpError` and leaves the
    /// container as it was; the error page is never appended.
    pub async fn add_condition_row(&self, event: Option<&mut UiEvent<D::Node>>) -> Result<usize> {
        take_target(event);

        let container = self
            .require(routes::CONDITIONS_CONTAINER)
            .map_err(|e| self.failed("add condition row", e))?;
        let index = self
            .document()
            .query_selector_all(&container, routes::CONDITION_ROW)
            .len();

        let html = self
            .api
            .fetch_fragment(&routes::condition_row(index))
            .await
            .map_err(|e| self.failed("add condition row", e))?;

        self.document().append_html(&container, &html);
        Ok(index)
    }

    pub fn delete_condition_row(&self, event: Option<&mut UiEvent<D::Node>>) -> Result<()> {
        let target = take_target(event).ok_or_else(|| {
            self.failed(
                "delete condition row",
                UiError::ElementNotFound {
                    selector: "event target".to_string(),
                },
            )
        })?;

        if let Some(row) = self.document().closest(&target, routes::CONDITION_ROW) {
            self.document().remove(&row);
        }
        Ok(())
    }
}
