//! Zendesk v2 entity models and submission payloads.
//!
//! Fetched entities (`TicketField`, `TicketForm`, `DynamicContent`) mirror the
//! API's JSON shapes, server-assigned fields included. Submission payloads are
//! separate `New*` types that carry only what a create call may send, so a
//! server-assigned id can never leak into an outgoing body.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The two isolated Zendesk instances entities migrate between. Entity ids
/// are scoped to one environment and mean nothing in the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Env {
    Production,
    Sandbox,
}

impl Env {
    pub fn label(&self) -> &'static str {
        match self {
            Env::Production => "production",
            Env::Sandbox => "sandbox",
        }
    }
}

impl Display for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldOption {
    pub id: i64,
    pub name: String,
    pub raw_name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketField {
    pub id: i64,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub raw_title: String,
    pub description: String,
    pub raw_description: String,
    pub position: i64,
    pub active: bool,
    pub required: bool,
    pub collapsed_for_agents: bool,
    pub regexp_for_validation: Option<String>,
    pub title_in_portal: String,
    pub raw_title_in_portal: String,
    pub visible_in_portal: bool,
    pub editable_in_portal: bool,
    pub required_in_portal: bool,
    pub tag: Option<String>,
    pub agent_description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub custom_field_options: Option<Vec<CustomFieldOption>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRequirement {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statuses: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionChildField {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_on_statuses: Option<StatusRequirement>,
}

/// A rule making child fields required or visible based on a parent field's
/// value. Both id slots reference ticket fields by environment-local id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_field_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_fields: Option<Vec<ConditionChildField>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketForm {
    pub id: i64,
    pub name: Option<String>,
    pub raw_name: Option<String>,
    pub display_name: Option<String>,
    pub raw_display_name: Option<String>,
    pub position: Option<i64>,
    pub active: Option<bool>,
    pub end_user_visible: Option<bool>,
    pub ticket_field_ids: Option<Vec<i64>>,
    pub in_all_brands: Option<bool>,
    pub restricted_brand_ids: Option<Vec<i64>>,
    pub agent_conditions: Option<Vec<Condition>>,
    pub end_user_conditions: Option<Vec<Condition>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicContentVariant {
    pub url: String,
    pub id: i64,
    pub content: String,
    pub locale_id: i64,
    pub outdated: bool,
    pub active: bool,
    #[serde(rename = "default")]
    pub is_default: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicContent {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub placeholder: String,
    pub default_locale_id: i64,
    pub outdated: bool,
    pub variants: Vec<DynamicContentVariant>,
    #[serde(rename = "default")]
    pub is_default: Option<bool>,
}

// Submission payloads.

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCustomFieldOption {
    pub name: String,
    pub raw_name: String,
    pub value: String,
}

impl From<&CustomFieldOption> for NewCustomFieldOption {
    fn from(option: &CustomFieldOption) -> Self {
        Self {
            name: option.name.clone(),
            raw_name: option.raw_name.clone(),
            value: option.value.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTicketField {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub raw_title: String,
    pub description: String,
    pub raw_description: String,
    pub position: i64,
    pub active: bool,
    pub required: bool,
    pub collapsed_for_agents: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regexp_for_validation: Option<String>,
    pub title_in_portal: String,
    pub raw_title_in_portal: String,
    pub visible_in_portal: bool,
    pub editable_in_portal: bool,
    pub required_in_portal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_field_options: Option<Vec<NewCustomFieldOption>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTicketForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_user_visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_field_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_all_brands: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restricted_brand_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_conditions: Option<Vec<Condition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_user_conditions: Option<Vec<Condition>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDynamicContentVariant {
    pub content: String,
    pub locale_id: i64,
    pub active: bool,
    #[serde(rename = "default", skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDynamicContent {
    pub name: String,
    pub default_locale_id: i64,
    pub variants: Vec<NewDynamicContentVariant>,
}

// Request/response envelopes. The API wraps every body in a single-key
// object named after the entity.

#[derive(Debug, Deserialize)]
pub struct TicketFieldsResponse {
    pub ticket_fields: Vec<TicketField>,
}

#[derive(Debug, Deserialize)]
pub struct TicketFieldResponse {
    pub ticket_field: TicketField,
}

#[derive(Debug, Deserialize)]
pub struct TicketFormsResponse {
    pub ticket_forms: Vec<TicketForm>,
}

#[derive(Debug, Deserialize)]
pub struct TicketFormResponse {
    pub ticket_form: TicketForm,
}

#[derive(Debug, Deserialize)]
pub struct DynamicContentListResponse {
    pub items: Vec<DynamicContent>,
}

#[derive(Debug, Deserialize)]
pub struct DynamicContentItemResponse {
    pub item: DynamicContent,
}

#[derive(Debug, Deserialize)]
pub struct CustomFieldOptionResponse {
    pub custom_field_option: CustomFieldOption,
}

#[derive(Debug, Serialize)]
pub struct TicketFieldRequest<'a> {
    pub ticket_field: &'a NewTicketField,
}

#[derive(Debug, Serialize)]
pub struct TicketFormRequest<'a> {
    pub ticket_form: &'a NewTicketForm,
}

#[derive(Debug, Serialize)]
pub struct CustomFieldOptionRequest<'a> {
    pub custom_field_option: &'a NewCustomFieldOption,
}

#[derive(Debug, Serialize)]
pub struct DynamicContentRequest<'a> {
    pub item: &'a NewDynamicContent,
}

fn opt<T: Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

// Explicit (label, value) listings for display, declared next to the types
// they render.

impl TicketField {
    pub fn display_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("id", self.id.to_string()),
            ("type", self.kind.clone()),
            ("title", self.title.clone()),
            ("position", self.position.to_string()),
            ("active", self.active.to_string()),
            ("required", self.required.to_string()),
            ("visible in portal", self.visible_in_portal.to_string()),
            ("tag", opt(&self.tag)),
            (
                "options",
                self.custom_field_options
                    .as_ref()
                    .map(|o| o.len().to_string())
                    .unwrap_or_else(|| "0".to_string()),
            ),
        ]
    }
}

impl TicketForm {
    pub fn display_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("id", self.id.to_string()),
            ("name", opt(&self.name)),
            ("position", opt(&self.position)),
            ("active", opt(&self.active)),
            ("end user visible", opt(&self.end_user_visible)),
            (
                "field ids",
                self.ticket_field_ids
                    .as_ref()
                    .map(|ids| {
                        ids.iter()
                            .map(|id| id.to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .unwrap_or_else(|| "-".to_string()),
            ),
            (
                "agent conditions",
                self.agent_conditions
                    .as_ref()
                    .map(|c| c.len().to_string())
                    .unwrap_or_else(|| "0".to_string()),
            ),
            (
                "end user conditions",
                self.end_user_conditions
                    .as_ref()
                    .map(|c| c.len().to_string())
                    .unwrap_or_else(|| "0".to_string()),
            ),
        ]
    }
}

impl DynamicContent {
    pub fn display_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("id", self.id.to_string()),
            ("name", self.name.clone()),
            ("placeholder", self.placeholder.clone()),
            ("default locale", self.default_locale_id.to_string()),
            ("outdated", self.outdated.to_string()),
            ("variants", self.variants.len().to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_field_round_trips_type_key() {
        let json = serde_json::json!({
            "id": 42,
            "url": "https://example.zendesk.com/api/v2/ticket_fields/42.json",
            "type": "tagger",
            "title": "Priority",
            "raw_title": "Priority",
            "description": "",
            "raw_description": "",
            "position": 1,
            "active": true,
            "required": false,
            "collapsed_for_agents": false,
            "regexp_for_validation": null,
            "title_in_portal": "Priority",
            "raw_title_in_portal": "Priority",
            "visible_in_portal": true,
            "editable_in_portal": true,
            "required_in_portal": false,
            "tag": null,
            "agent_description": null,
            "created_at": "2020-03-09T00:00:00Z",
            "updated_at": "2020-03-09T00:00:00Z",
            "custom_field_options": [
                { "id": 1, "name": "High", "raw_name": "High", "value": "high" }
            ]
        });

        let field: TicketField = serde_json::from_value(json).unwrap();
        assert_eq!(field.kind, "tagger");
        assert_eq!(field.custom_field_options.as_ref().unwrap().len(), 1);

        let back = serde_json::to_value(&field).unwrap();
        assert_eq!(back["type"], "tagger");
    }

    #[test]
    fn new_form_omits_absent_fields() {
        let payload = NewTicketForm {
            name: Some("Support".to_string()),
            raw_name: None,
            display_name: None,
            raw_display_name: None,
            position: None,
            active: Some(true),
            end_user_visible: None,
            ticket_field_ids: Some(vec![110, 220]),
            in_all_brands: None,
            restricted_brand_ids: None,
            agent_conditions: None,
            end_user_conditions: None,
        };

        let json = serde_json::to_value(TicketFormRequest {
            ticket_form: &payload,
        })
        .unwrap();
        let form = &json["ticket_form"];
        assert_eq!(form["name"], "Support");
        assert_eq!(form["ticket_field_ids"], serde_json::json!([110, 220]));
        assert!(form.get("raw_name").is_none());
        assert!(form.get("agent_conditions").is_none());
    }

    #[test]
    fn display_pairs_cover_identity_columns() {
        let content = DynamicContent {
            id: 7,
            url: String::new(),
            name: "Greeting".to_string(),
            placeholder: "{{dc.greeting}}".to_string(),
            default_locale_id: 1,
            outdated: false,
            variants: vec![],
            is_default: None,
        };

        let pairs = content.display_pairs();
        assert_eq!(pairs[0], ("id", "7".to_string()));
        assert_eq!(pairs[1], ("name", "Greeting".to_string()));
    }
}
