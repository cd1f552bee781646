//! Production-to-sandbox field identity resolution.
//!
//! Field ids are environment-scoped, so the only correlation key available
//! across environments is the field title. The mapper caches full snapshots
//! of both environments' fields plus a mapping table that grows as field
//! migrations succeed; a recorded mapping always wins over a title lookup.

use std::collections::HashMap;

use crate::api::TicketField;

/// Outcome of resolving a production field id against the sandbox.
///
/// Resolution never fails; absence and ambiguity are explicit variants the
/// caller must branch on before building a submission payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A migration in this run recorded the mapping.
    Mapped(i64),
    /// Exactly one sandbox field shares the production field's title.
    ByTitle(i64),
    /// More than one sandbox field shares the title; picking one silently
    /// would rewrite references arbitrarily, so nothing is chosen.
    AmbiguousTitle { title: String, candidates: Vec<i64> },
    /// No mapping recorded and no sandbox field with a matching title.
    Unknown,
}

impl Resolution {
    /// The sandbox id, when resolution produced exactly one.
    pub fn sandbox_id(&self) -> Option<i64> {
        match self {
            Resolution::Mapped(id) | Resolution::ByTitle(id) => Some(*id),
            Resolution::AmbiguousTitle { .. } | Resolution::Unknown => None,
        }
    }
}

/// Mapping table plus the field snapshots resolution reads from.
#[derive(Debug, Default)]
pub struct FieldMapper {
    production_fields: Vec<TicketField>,
    sandbox_fields: Vec<TicketField>,
    mapping: HashMap<i64, i64>,
}

impl FieldMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the production snapshot (full replacement, no diffing).
    pub fn set_production_fields(&mut self, fields: Vec<TicketField>) {
        self.production_fields = fields;
    }

    /// Replace the sandbox snapshot (full replacement, no diffing).
    pub fn set_sandbox_fields(&mut self, fields: Vec<TicketField>) {
        self.sandbox_fields = fields;
    }

    pub fn production_fields(&self) -> &[TicketField] {
        &self.production_fields
    }

    pub fn sandbox_fields(&self) -> &[TicketField] {
        &self.sandbox_fields
    }

    pub fn production_field(&self, id: i64) -> Option<&TicketField> {
        self.production_fields.iter().find(|f| f.id == id)
    }

    /// Resolve a production field id to its sandbox counterpart: mapping
    /// table first, then an exact title match against the sandbox snapshot.
    pub fn resolve(&self, production_id: i64) -> Resolution {
        if let Some(&sandbox_id) = self.mapping.get(&production_id) {
            return Resolution::Mapped(sandbox_id);
        }

        let Some(production_field) = self.production_field(production_id) else {
            return Resolution::Unknown;
        };

        let candidates: Vec<i64> = self
            .sandbox_fields
            .iter()
            .filter(|f| f.title == production_field.title)
            .map(|f| f.id)
            .collect();

        match candidates.as_slice() {
            [] => Resolution::Unknown,
            [only] => Resolution::ByTitle(*only),
            _ => Resolution::AmbiguousTitle {
                title: production_field.title.clone(),
                candidates,
            },
        }
    }

    /// Record a confirmed production-to-sandbox mapping. Entries accumulate
    /// for the process lifetime and are never removed.
    pub fn record_mapping(&mut self, production_id: i64, sandbox_id: i64) {
        self.mapping.insert(production_id, sandbox_id);
    }

    pub fn mapping_len(&self) -> usize {
        self.mapping.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(id: i64, title: &str) -> TicketField {
        TicketField {
            id,
            url: format!("https://example.zendesk.com/api/v2/ticket_fields/{id}.json"),
            kind: "text".to_string(),
            title: title.to_string(),
            raw_title: title.to_string(),
            description: String::new(),
            raw_description: String::new(),
            position: 0,
            active: true,
            required: false,
            collapsed_for_agents: false,
            regexp_for_validation: None,
            title_in_portal: title.to_string(),
            raw_title_in_portal: title.to_string(),
            visible_in_portal: true,
            editable_in_portal: true,
            required_in_portal: false,
            tag: None,
            agent_description: None,
            created_at: "2020-03-09T00:00:00Z".to_string(),
            updated_at: "2020-03-09T00:00:00Z".to_string(),
            custom_field_options: None,
        }
    }

    fn mapper() -> FieldMapper {
        let mut mapper = FieldMapper::new();
        mapper.set_production_fields(vec![field(10, "Priority"), field(20, "Category")]);
        mapper.set_sandbox_fields(vec![field(110, "Priority"), field(220, "Category")]);
        mapper
    }

    #[test]
    fn resolves_by_exact_title_match() {
        let mapper = mapper();
        assert_eq!(mapper.resolve(10), Resolution::ByTitle(110));
        assert_eq!(mapper.resolve(20), Resolution::ByTitle(220));
    }

    #[test]
    fn resolution_is_idempotent() {
        let mapper = mapper();
        assert_eq!(mapper.resolve(10), mapper.resolve(10));
    }

    #[test]
    fn unknown_when_no_title_matches() {
        let mut mapper = mapper();
        mapper.set_sandbox_fields(vec![field(300, "Something Else")]);
        assert_eq!(mapper.resolve(10), Resolution::Unknown);
        assert_eq!(mapper.resolve(10).sandbox_id(), None);
    }

    #[test]
    fn unknown_when_production_id_is_not_in_snapshot() {
        let mapper = mapper();
        assert_eq!(mapper.resolve(999), Resolution::Unknown);
    }

    #[test]
    fn recorded_mapping_beats_title_lookup() {
        let mut mapper = mapper();
        mapper.record_mapping(10, 5000);
        assert_eq!(mapper.resolve(10), Resolution::Mapped(5000));

        // Even a production id absent from the snapshot resolves once
        // recorded.
        mapper.record_mapping(999, 6000);
        assert_eq!(mapper.resolve(999), Resolution::Mapped(6000));
    }

    #[test]
    fn duplicate_titles_are_surfaced_not_picked() {
        let mut mapper = mapper();
        mapper.set_sandbox_fields(vec![field(110, "Priority"), field(111, "Priority")]);

        match mapper.resolve(10) {
            Resolution::AmbiguousTitle { title, candidates } => {
                assert_eq!(title, "Priority");
                assert_eq!(candidates, vec![110, 111]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_refresh_changes_title_resolution_but_not_mappings() {
        let mut mapper = mapper();
        mapper.record_mapping(20, 4000);

        mapper.set_sandbox_fields(vec![field(777, "Priority")]);
        assert_eq!(mapper.resolve(10), Resolution::ByTitle(777));
        assert_eq!(mapper.resolve(20), Resolution::Mapped(4000));
    }
}
