//! End-to-end migration flows against an in-memory API double.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use zentools_cli::api::{
    ApiError, Condition, ConditionChildField, CustomFieldOption, DynamicContent,
    DynamicContentVariant, Env, NewCustomFieldOption, NewDynamicContent, NewTicketField,
    NewTicketForm, ThrottleConfig, TicketField, TicketForm, ZendeskApi,
};
use zentools_cli::migrate::{LogSink, MigrationError, MigrationSession, Resolution};

#[derive(Default)]
struct MockState {
    production_fields: Vec<TicketField>,
    sandbox_fields: Vec<TicketField>,
    production_forms: Vec<TicketForm>,
    production_dynamic_content: Vec<DynamicContent>,
    created_forms: Vec<TicketForm>,
    created_dynamic_content: Vec<NewDynamicContent>,
    created_options: Vec<(i64, NewCustomFieldOption)>,
    deleted_field_ids: Vec<i64>,
    // Titles whose create call should fail with a validation error.
    fail_create_titles: Vec<String>,
    // Simulate the create endpoint acknowledging a field without echoing
    // its options back.
    strip_options_on_create: bool,
    next_id: i64,
}

struct MockZendesk {
    state: Mutex<MockState>,
}

impl MockZendesk {
    fn new(state: MockState) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MockState {
                next_id: 9000,
                ..state
            }),
        })
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl ZendeskApi for MockZendesk {
    async fn list_fields(&self, env: Env) -> Result<Vec<TicketField>, ApiError> {
        let state = self.state();
        Ok(match env {
            Env::Production => state.production_fields.clone(),
            Env::Sandbox => state.sandbox_fields.clone(),
        })
    }

    async fn create_field(
        &self,
        env: Env,
        field: &NewTicketField,
    ) -> Result<TicketField, ApiError> {
        assert_eq!(env, Env::Sandbox, "creates must target the sandbox");
        let mut state = self.state();
        if state.fail_create_titles.contains(&field.title) {
            return Err(ApiError::Remote {
                status: 422,
                message: "RecordInvalid: Record validation errors".to_string(),
            });
        }

        state.next_id += 1;
        let id = state.next_id;
        let options = field.custom_field_options.as_ref().map(|options| {
            options
                .iter()
                .enumerate()
                .map(|(i, o)| CustomFieldOption {
                    id: id * 100 + i as i64,
                    name: o.name.clone(),
                    raw_name: o.raw_name.clone(),
                    value: o.value.clone(),
                })
                .collect::<Vec<_>>()
        });

        let mut created = ticket_field(id, &field.title);
        created.kind = field.kind.clone();
        created.custom_field_options = options;
        state.sandbox_fields.push(created.clone());

        if state.strip_options_on_create {
            created.custom_field_options = None;
        }
        Ok(created)
    }

    async fn delete_field(&self, env: Env, id: i64) -> Result<(), ApiError> {
        assert_eq!(env, Env::Sandbox, "deletes must target the sandbox");
        let mut state = self.state();
        state.sandbox_fields.retain(|f| f.id != id);
        state.deleted_field_ids.push(id);
        Ok(())
    }

    async fn create_field_option(
        &self,
        env: Env,
        field_id: i64,
        option: &NewCustomFieldOption,
    ) -> Result<CustomFieldOption, ApiError> {
        assert_eq!(env, Env::Sandbox);
        let mut state = self.state();
        state.created_options.push((field_id, option.clone()));
        state.next_id += 1;
        Ok(CustomFieldOption {
            id: state.next_id,
            name: option.name.clone(),
            raw_name: option.raw_name.clone(),
            value: option.value.clone(),
        })
    }

    async fn list_forms(&self, env: Env) -> Result<Vec<TicketForm>, ApiError> {
        assert_eq!(env, Env::Production);
        Ok(self.state().production_forms.clone())
    }

    async fn create_form(&self, env: Env, form: &NewTicketForm) -> Result<TicketForm, ApiError> {
        assert_eq!(env, Env::Sandbox);
        let mut state = self.state();
        state.next_id += 1;
        let created = TicketForm {
            id: state.next_id,
            name: form.name.clone(),
            raw_name: form.raw_name.clone(),
            display_name: form.display_name.clone(),
            raw_display_name: form.raw_display_name.clone(),
            position: form.position,
            active: form.active,
            end_user_visible: form.end_user_visible,
            ticket_field_ids: form.ticket_field_ids.clone(),
            in_all_brands: form.in_all_brands,
            restricted_brand_ids: form.restricted_brand_ids.clone(),
            agent_conditions: form.agent_conditions.clone(),
            end_user_conditions: form.end_user_conditions.clone(),
        };
        state.created_forms.push(created.clone());
        Ok(created)
    }

    async fn list_dynamic_content(&self, env: Env) -> Result<Vec<DynamicContent>, ApiError> {
        assert_eq!(env, Env::Production);
        Ok(self.state().production_dynamic_content.clone())
    }

    async fn create_dynamic_content(
        &self,
        env: Env,
        item: &NewDynamicContent,
    ) -> Result<DynamicContent, ApiError> {
        assert_eq!(env, Env::Sandbox);
        let mut state = self.state();
        state.created_dynamic_content.push(item.clone());
        state.next_id += 1;
        Ok(DynamicContent {
            id: state.next_id,
            url: String::new(),
            name: item.name.clone(),
            placeholder: format!("{{{{dc.{}}}}}", item.name.to_lowercase()),
            default_locale_id: item.default_locale_id,
            outdated: false,
            variants: vec![],
            is_default: None,
        })
    }
}

fn ticket_field(id: i64, title: &str) -> TicketField {
    TicketField {
        id,
        url: String::new(),
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
        created_at: String::new(),
        updated_at: String::new(),
        custom_field_options: None,
    }
}

fn tagger_field(id: i64, title: &str, values: &[&str]) -> TicketField {
    let mut field = ticket_field(id, title);
    field.kind = "tagger".to_string();
    field.custom_field_options = Some(
        values
            .iter()
            .enumerate()
            .map(|(i, v)| CustomFieldOption {
                id: id * 10 + i as i64,
                name: v.to_string(),
                raw_name: v.to_string(),
                value: v.to_lowercase(),
            })
            .collect(),
    );
    field
}

fn ticket_form(id: i64, name: &str, field_ids: &[i64]) -> TicketForm {
    TicketForm {
        id,
        name: Some(name.to_string()),
        raw_name: Some(name.to_string()),
        display_name: Some(name.to_string()),
        raw_display_name: Some(name.to_string()),
        position: Some(1),
        active: Some(true),
        end_user_visible: Some(true),
        ticket_field_ids: Some(field_ids.to_vec()),
        in_all_brands: Some(true),
        restricted_brand_ids: None,
        agent_conditions: None,
        end_user_conditions: None,
    }
}

fn dynamic_content(id: i64, name: &str) -> DynamicContent {
    DynamicContent {
        id,
        url: String::new(),
        name: name.to_string(),
        placeholder: format!("{{{{dc.{}}}}}", name.to_lowercase()),
        default_locale_id: 1,
        outdated: false,
        variants: vec![DynamicContentVariant {
            url: String::new(),
            id: id * 10,
            content: format!("{name} content"),
            locale_id: 1,
            outdated: false,
            active: true,
            is_default: Some(true),
        }],
        is_default: None,
    }
}

fn session(client: Arc<MockZendesk>) -> MigrationSession {
    MigrationSession::new(
        client,
        LogSink::new(),
        ThrottleConfig {
            min_delay: Duration::ZERO,
            enabled: false,
        },
    )
}

#[tokio::test]
async fn migrate_all_fields_records_mappings_and_refreshes_sandbox() {
    let client = MockZendesk::new(MockState {
        production_fields: vec![ticket_field(1, "Priority"), ticket_field(2, "Category")],
        ..MockState::default()
    });
    let mut session = session(Arc::clone(&client));

    session.fetch_fields(Env::Production).await.unwrap();
    let report = session.migrate_all_fields().await.unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 0);
    assert!(matches!(
        session.mapper().resolve(1),
        Resolution::Mapped(_)
    ));
    assert!(matches!(
        session.mapper().resolve(2),
        Resolution::Mapped(_)
    ));
    // Sandbox snapshot was refreshed with the created fields.
    assert_eq!(session.mapper().sandbox_fields().len(), 2);
    assert!(session.log().entries().iter().any(|line| line
        .contains("Ticket field migration complete (2 succeeded, 0 failed)")));
}

#[tokio::test]
async fn bulk_field_failures_do_not_abort_siblings() {
    let client = MockZendesk::new(MockState {
        production_fields: vec![
            ticket_field(1, "Priority"),
            ticket_field(2, "Broken"),
            ticket_field(3, "Category"),
        ],
        fail_create_titles: vec!["Broken".to_string()],
        ..MockState::default()
    });
    let mut session = session(Arc::clone(&client));

    session.fetch_fields(Env::Production).await.unwrap();
    let report = session.migrate_all_fields().await.unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert!(matches!(
        session.mapper().resolve(1),
        Resolution::Mapped(_)
    ));
    assert!(session.mapper().resolve(2).sandbox_id().is_none());
    assert!(
        session
            .log()
            .entries()
            .iter()
            .any(|line| line.starts_with("ERROR:") && line.contains("field 2"))
    );
}

#[tokio::test]
async fn form_migration_rewrites_field_references() {
    let mut form = ticket_form(50, "Support", &[1, 2]);
    form.agent_conditions = Some(vec![Condition {
        parent_field_id: Some(1),
        value: Some("high".to_string()),
        child_fields: Some(vec![ConditionChildField {
            id: 2,
            is_required: Some(true),
            required_on_statuses: None,
        }]),
    }]);

    let client = MockZendesk::new(MockState {
        production_fields: vec![ticket_field(1, "Priority"), ticket_field(2, "Category")],
        sandbox_fields: vec![ticket_field(99, "Priority"), ticket_field(88, "Category")],
        production_forms: vec![form],
        ..MockState::default()
    });
    let mut session = session(Arc::clone(&client));

    session.fetch_fields(Env::Production).await.unwrap();
    session.fetch_fields(Env::Sandbox).await.unwrap();
    session.fetch_forms().await.unwrap();
    session.migrate_form(50).await.unwrap();

    let state = client.state();
    assert_eq!(state.created_forms.len(), 1);
    let created = &state.created_forms[0];
    assert_eq!(created.ticket_field_ids, Some(vec![99, 88]));
    let condition = &created.agent_conditions.as_ref().unwrap()[0];
    assert_eq!(condition.parent_field_id, Some(99));
    assert_eq!(condition.child_fields.as_ref().unwrap()[0].id, 88);
}

#[tokio::test]
async fn form_with_unresolved_reference_is_refused() {
    let client = MockZendesk::new(MockState {
        production_fields: vec![ticket_field(1, "Priority"), ticket_field(2, "Orphan")],
        sandbox_fields: vec![ticket_field(99, "Priority")],
        production_forms: vec![ticket_form(50, "Support", &[1, 2])],
        ..MockState::default()
    });
    let mut session = session(Arc::clone(&client));

    session.fetch_fields(Env::Production).await.unwrap();
    session.fetch_fields(Env::Sandbox).await.unwrap();
    session.fetch_forms().await.unwrap();

    let err = session.migrate_form(50).await.unwrap_err();
    assert!(matches!(
        err,
        MigrationError::UnresolvedReferences { ref refs, .. } if refs.len() == 1
    ));
    assert!(
        client.state().created_forms.is_empty(),
        "a broken form must never be submitted"
    );
}

#[tokio::test]
async fn ambiguous_title_match_is_refused() {
    let client = MockZendesk::new(MockState {
        production_fields: vec![ticket_field(1, "Priority")],
        sandbox_fields: vec![ticket_field(99, "Priority"), ticket_field(98, "Priority")],
        production_forms: vec![ticket_form(50, "Support", &[1])],
        ..MockState::default()
    });
    let mut session = session(Arc::clone(&client));

    session.fetch_fields(Env::Production).await.unwrap();
    session.fetch_fields(Env::Sandbox).await.unwrap();
    session.fetch_forms().await.unwrap();

    let err = session.migrate_form(50).await.unwrap_err();
    assert!(matches!(err, MigrationError::UnresolvedReferences { .. }));
    assert!(client.state().created_forms.is_empty());
}

#[tokio::test]
async fn migrate_field_backfills_options_when_create_omits_them() {
    let client = MockZendesk::new(MockState {
        production_fields: vec![tagger_field(1, "Priority", &["High", "Low"])],
        strip_options_on_create: true,
        ..MockState::default()
    });
    let mut session = session(Arc::clone(&client));

    session.fetch_fields(Env::Production).await.unwrap();
    let sandbox_id = session.migrate_field(1).await.unwrap();

    let state = client.state();
    assert_eq!(state.created_options.len(), 2);
    assert!(state.created_options.iter().all(|(id, _)| *id == sandbox_id));
    let values: Vec<&str> = state
        .created_options
        .iter()
        .map(|(_, o)| o.value.as_str())
        .collect();
    assert_eq!(values, vec!["high", "low"]);
}

#[tokio::test]
async fn migrate_unknown_field_id_fails_without_submitting() {
    let client = MockZendesk::new(MockState {
        production_fields: vec![ticket_field(1, "Priority")],
        ..MockState::default()
    });
    let mut session = session(Arc::clone(&client));

    session.fetch_fields(Env::Production).await.unwrap();
    let err = session.migrate_field(777).await.unwrap_err();
    assert!(matches!(err, MigrationError::UnknownId { id: 777, .. }));
    assert!(client.state().sandbox_fields.is_empty());
}

#[tokio::test]
async fn delete_sandbox_fields_works_from_a_fresh_snapshot() {
    let client = MockZendesk::new(MockState {
        sandbox_fields: vec![
            ticket_field(10, "A"),
            ticket_field(11, "B"),
            ticket_field(12, "C"),
        ],
        ..MockState::default()
    });
    let mut session = session(Arc::clone(&client));

    // No explicit fetch beforehand; deletion refreshes its own snapshot.
    let report = session.delete_sandbox_fields().await.unwrap();

    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failed, 0);
    let state = client.state();
    assert_eq!(state.deleted_field_ids, vec![10, 11, 12]);
    assert!(state.sandbox_fields.is_empty());
}

#[tokio::test]
async fn dynamic_content_migrates_name_and_variants() {
    let client = MockZendesk::new(MockState {
        production_dynamic_content: vec![dynamic_content(5, "Greeting"), dynamic_content(6, "Closing")],
        ..MockState::default()
    });
    let mut session = session(Arc::clone(&client));

    session.fetch_dynamic_content().await.unwrap();
    let report = session.migrate_all_dynamic_content().await.unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 0);
    let state = client.state();
    assert_eq!(state.created_dynamic_content.len(), 2);
    assert_eq!(state.created_dynamic_content[0].name, "Greeting");
    assert_eq!(state.created_dynamic_content[0].variants.len(), 1);
    assert_eq!(
        state.created_dynamic_content[0].variants[0].content,
        "Greeting content"
    );
}

#[tokio::test]
async fn operations_require_their_snapshots() {
    let client = MockZendesk::new(MockState::default());
    let mut session = session(client);

    assert!(matches!(
        session.migrate_all_fields().await.unwrap_err(),
        MigrationError::NotFetched(_)
    ));
    assert!(matches!(
        session.migrate_all_forms().await.unwrap_err(),
        MigrationError::NotFetched(_)
    ));
    assert!(matches!(
        session.migrate_all_dynamic_content().await.unwrap_err(),
        MigrationError::NotFetched(_)
    ));
}

#[tokio::test]
async fn log_feed_streams_to_subscribers() {
    let client = MockZendesk::new(MockState {
        production_fields: vec![ticket_field(1, "Priority")],
        ..MockState::default()
    });
    let mut session = session(client);
    let mut feed = session.log().subscribe();

    session.fetch_fields(Env::Production).await.unwrap();
    drop(session);

    let mut lines = Vec::new();
    while let Some(line) = feed.recv().await {
        lines.push(line);
    }
    assert!(lines.iter().any(|l| l.contains("Fetched 1 ticket fields")));
}
