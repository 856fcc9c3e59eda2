//! Server endpoints and page selectors the ruleset page relies on.

pub const MAIN_CONTENT: &str = "#main-content";
pub const RULE_FORM_CONTAINER: &str = "#rule-form-container";
pub const RULES_CONTAINER: &str = "#rules-container";
pub const CONDITIONS_CONTAINER: &str = "#conditions-container";
pub const CONDITION_ROW: &str = ".condition-row";
pub const TABLE_ROW: &str = "tr";
pub const SHARED_MARKER: &str = "[data-shared]";

pub fn ruleset(ruleset_id: &str) -> String {
    format!("/api/rulesets/{}", ruleset_id)
}

pub fn ruleset_page(ruleset_id: &str) -> String {
    format!("/rulesets/{}", ruleset_id)
}

pub fn ruleset_delete(ruleset_id: &str) -> String {
    format!("/api/rulesets/{}/delete", ruleset_id)
}

pub fn ruleset_share(ruleset_id: &str) -> String {
    format!("/api/rulesets/{}/share", ruleset_id)
}

pub fn ruleset_export(ruleset_id: &str) -> String {
    format!("/api/rulesets/{}/export", ruleset_id)
}

pub fn ruleset_export_file_name(ruleset_id: &str) -> String {
    format!("ruleset-{}.tsv", ruleset_id)
}

pub fn ruleset_card(ruleset_id: &str) -> String {
    format!("#ruleset-card-{}", ruleset_id)
}

pub fn rules(ruleset_id: &str) -> String {
    format!("/api/rulesets/{}/rules", ruleset_id)
}

pub fn new_rule_form(ruleset_id: &str) -> String {
    format!("/api/rulesets/{}/rules/new", ruleset_id)
}

pub fn rule(ruleset_id: &str, rule_id: &str) -> String {
    format!("/api/rulesets/{}/rules/{}", ruleset_id, rule_id)
}

pub fn edit_rule_form(ruleset_id: &str, rule_id: &str) -> String {
    format!("/api/rulesets/{}/rules/{}/edit", ruleset_id, rule_id)
}

pub fn condition_row(index: usize) -> String {
    format!("/api/rule/condition?index={}", index)
}
