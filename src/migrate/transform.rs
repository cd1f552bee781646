//! Pure production-to-sandbox payload transforms.
//!
//! Transforms never perform I/O and never mutate the mapper. References that
//! fail to resolve are flagged in the returned `unresolved` list (keeping the
//! production id in place) so the orchestrator can refuse submission instead
//! of sending an id that means nothing in the sandbox.

use crate::api::models::{
    Condition, ConditionChildField, DynamicContent, NewCustomFieldOption, NewDynamicContent,
    NewDynamicContentVariant, NewTicketField, NewTicketForm, TicketField, TicketForm,
};

use super::resolver::{FieldMapper, Resolution};

/// Which slot of the entity held the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefLocation {
    TicketFieldIds,
    ParentFieldId,
    ChildFieldId,
}

impl RefLocation {
    pub fn label(&self) -> &'static str {
        match self {
            RefLocation::TicketFieldIds => "ticket_field_ids",
            RefLocation::ParentFieldId => "parent_field_id",
            RefLocation::ChildFieldId => "child_fields",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefReason {
    NoMatch,
    AmbiguousTitle,
}

impl RefReason {
    pub fn label(&self) -> &'static str {
        match self {
            RefReason::NoMatch => "no sandbox match",
            RefReason::AmbiguousTitle => "ambiguous title match",
        }
    }
}

/// A field reference that could not be rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedRef {
    pub production_id: i64,
    pub location: RefLocation,
    pub reason: RefReason,
}

impl std::fmt::Display for UnresolvedRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "field {} ({}, {})",
            self.production_id,
            self.location.label(),
            self.reason.label()
        )
    }
}

/// Result of rewriting a form for sandbox submission.
#[derive(Debug, Clone)]
pub struct FormTransform {
    pub payload: NewTicketForm,
    pub unresolved: Vec<UnresolvedRef>,
}

fn resolve_or_flag(
    mapper: &FieldMapper,
    production_id: i64,
    location: RefLocation,
    unresolved: &mut Vec<UnresolvedRef>,
) -> i64 {
    match mapper.resolve(production_id) {
        Resolution::Mapped(id) | Resolution::ByTitle(id) => id,
        Resolution::AmbiguousTitle { .. } => {
            unresolved.push(UnresolvedRef {
                production_id,
                location,
                reason: RefReason::AmbiguousTitle,
            });
            production_id
        }
        Resolution::Unknown => {
            unresolved.push(UnresolvedRef {
                production_id,
                location,
                reason: RefReason::NoMatch,
            });
            production_id
        }
    }
}

/// Rewrite a condition list, remapping the parent field and every child
/// field id while leaving the requirement flags untouched.
pub fn rewrite_conditions(
    conditions: &[Condition],
    mapper: &FieldMapper,
    unresolved: &mut Vec<UnresolvedRef>,
) -> Vec<Condition> {
    conditions
        .iter()
        .map(|condition| Condition {
            parent_field_id: condition.parent_field_id.map(|id| {
                resolve_or_flag(mapper, id, RefLocation::ParentFieldId, unresolved)
            }),
            value: condition.value.clone(),
            child_fields: condition.child_fields.as_ref().map(|children| {
                children
                    .iter()
                    .map(|child| ConditionChildField {
                        id: resolve_or_flag(
                            mapper,
                            child.id,
                            RefLocation::ChildFieldId,
                            unresolved,
                        ),
                        is_required: child.is_required,
                        required_on_statuses: child.required_on_statuses.clone(),
                    })
                    .collect()
            }),
        })
        .collect()
}

/// Build the sandbox submission payload for a form, rewriting the field id
/// list and both condition lists. Non-reference fields are copied unchanged.
pub fn form_payload(form: &TicketForm, mapper: &FieldMapper) -> FormTransform {
    let mut unresolved = Vec::new();

    let ticket_field_ids = form.ticket_field_ids.as_ref().map(|ids| {
        ids.iter()
            .map(|&id| resolve_or_flag(mapper, id, RefLocation::TicketFieldIds, &mut unresolved))
            .collect()
    });
    let agent_conditions = form
        .agent_conditions
        .as_ref()
        .map(|conditions| rewrite_conditions(conditions, mapper, &mut unresolved));
    let end_user_conditions = form
        .end_user_conditions
        .as_ref()
        .map(|conditions| rewrite_conditions(conditions, mapper, &mut unresolved));

    FormTransform {
        payload: NewTicketForm {
            name: form.name.clone(),
            raw_name: form.raw_name.clone(),
            display_name: form.display_name.clone(),
            raw_display_name: form.raw_display_name.clone(),
            position: form.position,
            active: form.active,
            end_user_visible: form.end_user_visible,
            ticket_field_ids,
            in_all_brands: form.in_all_brands,
            restricted_brand_ids: form.restricted_brand_ids.clone(),
            agent_conditions,
            end_user_conditions,
        },
        unresolved,
    }
}

/// Build the creation payload for a field. Fields are self-contained (they
/// reference only their own options), so this is a pass-through copy with
/// server-assigned values stripped.
pub fn field_payload(field: &TicketField) -> NewTicketField {
    NewTicketField {
        kind: field.kind.clone(),
        title: field.title.clone(),
        raw_title: field.raw_title.clone(),
        description: field.description.clone(),
        raw_description: field.raw_description.clone(),
        position: field.position,
        active: field.active,
        required: field.required,
        collapsed_for_agents: field.collapsed_for_agents,
        regexp_for_validation: field.regexp_for_validation.clone(),
        title_in_portal: field.title_in_portal.clone(),
        raw_title_in_portal: field.raw_title_in_portal.clone(),
        visible_in_portal: field.visible_in_portal,
        editable_in_portal: field.editable_in_portal,
        required_in_portal: field.required_in_portal,
        tag: field.tag.clone(),
        agent_description: field.agent_description.clone(),
        custom_field_options: field
            .custom_field_options
            .as_ref()
            .map(|options| options.iter().map(NewCustomFieldOption::from).collect()),
    }
}

/// Build the creation payload for a dynamic content item; variants ride
/// along with their server-assigned ids stripped.
pub fn dynamic_content_payload(item: &DynamicContent) -> NewDynamicContent {
    NewDynamicContent {
        name: item.name.clone(),
        default_locale_id: item.default_locale_id,
        variants: item
            .variants
            .iter()
            .map(|variant| NewDynamicContentVariant {
                content: variant.content.clone(),
                locale_id: variant.locale_id,
                active: variant.active,
                is_default: variant.is_default,
            })
            .collect(),
    }
}
