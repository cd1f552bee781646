//! End-to-end migration flow per entity kind.
//!
//! The session owns the only mutable migration state (snapshots, mapping
//! table, log feed). Bulk field migration dispatches throttled submission
//! tasks and consumes their outcomes from a single queue, so the mapping
//! table has exactly one writer. Forms and dynamic content are low-volume
//! and submit sequentially without throttling.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::api::{
    ApiError, DynamicContent, Env, NewCustomFieldOption, ThrottleConfig, Throttler, TicketField,
    TicketForm, ZendeskApi,
};

use super::MigrationError;
use super::log::LogSink;
use super::resolver::FieldMapper;
use super::transform::{self, UnresolvedRef};

/// Per-kind snapshot lifecycle. `Ready -> Migrating` is re-entrant: single
/// migrations do not change the aggregate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotState {
    NotFetched,
    Fetching,
    Ready,
}

/// Aggregate outcome of a bulk operation. Item failures are reported through
/// the log feed; the counts let callers set an exit code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub succeeded: usize,
    pub failed: usize,
}

struct FieldOutcome {
    production_id: i64,
    result: Result<TicketField, ApiError>,
}

pub struct MigrationSession {
    client: Arc<dyn ZendeskApi>,
    mapper: FieldMapper,
    forms: Vec<TicketForm>,
    dynamic_content: Vec<DynamicContent>,
    production_fields_state: SnapshotState,
    sandbox_fields_state: SnapshotState,
    forms_state: SnapshotState,
    dynamic_content_state: SnapshotState,
    log: LogSink,
    throttle: ThrottleConfig,
}

impl MigrationSession {
    pub fn new(client: Arc<dyn ZendeskApi>, log: LogSink, throttle: ThrottleConfig) -> Self {
        Self {
            client,
            mapper: FieldMapper::new(),
            forms: Vec::new(),
            dynamic_content: Vec::new(),
            production_fields_state: SnapshotState::NotFetched,
            sandbox_fields_state: SnapshotState::NotFetched,
            forms_state: SnapshotState::NotFetched,
            dynamic_content_state: SnapshotState::NotFetched,
            log,
            throttle,
        }
    }

    pub fn log(&self) -> &LogSink {
        &self.log
    }

    pub fn mapper(&self) -> &FieldMapper {
        &self.mapper
    }

    pub fn forms(&self) -> &[TicketForm] {
        &self.forms
    }

    pub fn dynamic_content(&self) -> &[DynamicContent] {
        &self.dynamic_content
    }

    pub fn fields_state(&self, env: Env) -> SnapshotState {
        match env {
            Env::Production => self.production_fields_state,
            Env::Sandbox => self.sandbox_fields_state,
        }
    }

    /// Fetch the full ticket field snapshot for one environment.
    pub async fn fetch_fields(&mut self, env: Env) -> Result<usize, MigrationError> {
        match env {
            Env::Production => self.production_fields_state = SnapshotState::Fetching,
            Env::Sandbox => self.sandbox_fields_state = SnapshotState::Fetching,
        }
        self.log.info(format!("Fetching ticket fields from {env}"));

        let fields = match self.client.list_fields(env).await {
            Ok(fields) => fields,
            Err(e) => {
                self.log
                    .error(format!("Failed to fetch ticket fields from {env}: {e}"));
                match env {
                    Env::Production => self.production_fields_state = SnapshotState::NotFetched,
                    Env::Sandbox => self.sandbox_fields_state = SnapshotState::NotFetched,
                }
                return Err(e.into());
            }
        };

        let count = fields.len();
        self.log
            .info(format!("Fetched {count} ticket fields from {env}"));
        match env {
            Env::Production => {
                self.mapper.set_production_fields(fields);
                self.production_fields_state = SnapshotState::Ready;
            }
            Env::Sandbox => {
                self.mapper.set_sandbox_fields(fields);
                self.sandbox_fields_state = SnapshotState::Ready;
            }
        }
        Ok(count)
    }

    /// Fetch the production ticket form snapshot.
    pub async fn fetch_forms(&mut self) -> Result<usize, MigrationError> {
        self.forms_state = SnapshotState::Fetching;
        self.log.info("Fetching ticket forms from production");

        let forms = match self.client.list_forms(Env::Production).await {
            Ok(forms) => forms,
            Err(e) => {
                self.log.error(format!("Failed to fetch ticket forms: {e}"));
                self.forms_state = SnapshotState::NotFetched;
                return Err(e.into());
            }
        };

        let count = forms.len();
        self.log.info(format!("Fetched {count} ticket forms"));
        self.forms = forms;
        self.forms_state = SnapshotState::Ready;
        Ok(count)
    }

    /// Fetch the production dynamic content snapshot.
    pub async fn fetch_dynamic_content(&mut self) -> Result<usize, MigrationError> {
        self.dynamic_content_state = SnapshotState::Fetching;
        self.log.info("Fetching dynamic content from production");

        let items = match self.client.list_dynamic_content(Env::Production).await {
            Ok(items) => items,
            Err(e) => {
                self.log
                    .error(format!("Failed to fetch dynamic content: {e}"));
                self.dynamic_content_state = SnapshotState::NotFetched;
                return Err(e.into());
            }
        };

        let count = items.len();
        self.log.info(format!("Fetched {count} dynamic content items"));
        self.dynamic_content = items;
        self.dynamic_content_state = SnapshotState::Ready;
        Ok(count)
    }

    /// Migrate every production ticket field, pacing submissions through the
    /// throttler. Outcomes arrive on a single queue; this loop is the only
    /// writer of the mapping table. Finishes by refreshing the sandbox
    /// snapshot so title resolution sees the new fields.
    pub async fn migrate_all_fields(&mut self) -> Result<BulkReport, MigrationError> {
        if self.production_fields_state != SnapshotState::Ready {
            return Err(MigrationError::NotFetched("production ticket fields"));
        }

        let fields = self.mapper.production_fields().to_vec();
        self.log.info(format!(
            "Migrating {} ticket fields to sandbox",
            fields.len()
        ));

        let throttler = Throttler::new(self.throttle.clone());
        let (tx, mut rx) = mpsc::unbounded_channel::<FieldOutcome>();

        for field in fields {
            let client = Arc::clone(&self.client);
            let log = self.log.clone();
            let tx = tx.clone();
            throttler.schedule(async move {
                let production_id = field.id;
                let result = submit_field(client.as_ref(), &field, &log).await;
                // Receiver gone means the whole bulk operation was dropped.
                let _ = tx.send(FieldOutcome {
                    production_id,
                    result,
                });
            });
        }
        drop(tx);

        let mut report = BulkReport::default();
        while let Some(outcome) = rx.recv().await {
            match outcome.result {
                Ok(created) => {
                    self.mapper.record_mapping(outcome.production_id, created.id);
                    self.log.info(format!(
                        "Migrated ticket field {} -> {}",
                        outcome.production_id, created.id
                    ));
                    report.succeeded += 1;
                }
                Err(e) => {
                    self.log.error(format!(
                        "Failed to migrate ticket field {}: {e}",
                        outcome.production_id
                    ));
                    report.failed += 1;
                }
            }
        }

        // Refresh the sandbox snapshot so later form migrations resolve
        // against the fields just created. A failed refresh is logged but
        // does not undo the migration work.
        match self.client.list_fields(Env::Sandbox).await {
            Ok(fields) => {
                self.mapper.set_sandbox_fields(fields);
                self.sandbox_fields_state = SnapshotState::Ready;
            }
            Err(e) => self
                .log
                .error(format!("Failed to refresh sandbox ticket fields: {e}")),
        }

        self.log.info(format!(
            "Ticket field migration complete ({} succeeded, {} failed)",
            report.succeeded, report.failed
        ));
        Ok(report)
    }

    /// Migrate a single production ticket field. Duplicate calls create
    /// duplicate sandbox fields; the create endpoint is append-only.
    pub async fn migrate_field(&mut self, production_id: i64) -> Result<i64, MigrationError> {
        if self.production_fields_state != SnapshotState::Ready {
            return Err(MigrationError::NotFetched("production ticket fields"));
        }
        let Some(field) = self.mapper.production_field(production_id).cloned() else {
            let err = MigrationError::UnknownId {
                kind: "ticket field",
                id: production_id,
            };
            self.log.error(err.to_string());
            return Err(err);
        };

        match submit_field(self.client.as_ref(), &field, &self.log).await {
            Ok(created) => {
                self.mapper.record_mapping(production_id, created.id);
                self.log.info(format!(
                    "Migrated ticket field {production_id} -> {}",
                    created.id
                ));
                Ok(created.id)
            }
            Err(e) => {
                self.log
                    .error(format!("Failed to migrate ticket field {production_id}: {e}"));
                Err(e.into())
            }
        }
    }

    /// Migrate every production ticket form sequentially. Forms with
    /// unresolved field references are skipped, not submitted broken.
    pub async fn migrate_all_forms(&mut self) -> Result<BulkReport, MigrationError> {
        self.require_form_snapshots()?;

        let forms = self.forms.clone();
        self.log
            .info(format!("Migrating {} ticket forms to sandbox", forms.len()));

        let mut report = BulkReport::default();
        for form in &forms {
            match self.submit_form(form).await {
                Ok(_) => report.succeeded += 1,
                Err(_) => report.failed += 1,
            }
        }

        self.log.info(format!(
            "Ticket form migration complete ({} succeeded, {} failed)",
            report.succeeded, report.failed
        ));
        Ok(report)
    }

    /// Migrate a single production ticket form by id.
    pub async fn migrate_form(&mut self, form_id: i64) -> Result<i64, MigrationError> {
        self.require_form_snapshots()?;

        let Some(form) = self.forms.iter().find(|f| f.id == form_id).cloned() else {
            let err = MigrationError::UnknownId {
                kind: "ticket form",
                id: form_id,
            };
            self.log.error(err.to_string());
            return Err(err);
        };

        self.submit_form(&form).await
    }

    fn require_form_snapshots(&self) -> Result<(), MigrationError> {
        if self.forms_state != SnapshotState::Ready {
            return Err(MigrationError::NotFetched("ticket forms"));
        }
        // Reference rewriting needs both field snapshots; field migration
        // must run (or both environments be fetched) first.
        if self.production_fields_state != SnapshotState::Ready {
            return Err(MigrationError::NotFetched("production ticket fields"));
        }
        if self.sandbox_fields_state != SnapshotState::Ready {
            return Err(MigrationError::NotFetched("sandbox ticket fields"));
        }
        Ok(())
    }

    async fn submit_form(&self, form: &TicketForm) -> Result<i64, MigrationError> {
        let name = form.name.as_deref().unwrap_or("unnamed");
        self.log
            .info(format!("Migrating ticket form {} ({name})", form.id));

        let transformed = transform::form_payload(form, &self.mapper);
        if !transformed.unresolved.is_empty() {
            let err = MigrationError::UnresolvedReferences {
                entity: format!("ticket form {}", form.id),
                refs: transformed.unresolved,
            };
            self.log
                .error(format!("Skipping ticket form {}: {}", form.id, describe(&err)));
            return Err(err);
        }

        match self
            .client
            .create_form(Env::Sandbox, &transformed.payload)
            .await
        {
            Ok(created) => {
                self.log
                    .info(format!("Migrated ticket form {} -> {}", form.id, created.id));
                Ok(created.id)
            }
            Err(e) => {
                self.log
                    .error(format!("Failed to migrate ticket form {}: {e}", form.id));
                Err(e.into())
            }
        }
    }

    /// Migrate every production dynamic content item sequentially.
    pub async fn migrate_all_dynamic_content(&mut self) -> Result<BulkReport, MigrationError> {
        if self.dynamic_content_state != SnapshotState::Ready {
            return Err(MigrationError::NotFetched("dynamic content"));
        }

        let items = self.dynamic_content.clone();
        self.log.info(format!(
            "Migrating {} dynamic content items to sandbox",
            items.len()
        ));

        let mut report = BulkReport::default();
        for item in &items {
            match self.submit_dynamic_content(item).await {
                Ok(_) => report.succeeded += 1,
                Err(_) => report.failed += 1,
            }
        }

        self.log.info(format!(
            "Dynamic content migration complete ({} succeeded, {} failed)",
            report.succeeded, report.failed
        ));
        Ok(report)
    }

    /// Migrate a single production dynamic content item by id.
    pub async fn migrate_dynamic_content(&mut self, item_id: i64) -> Result<i64, MigrationError> {
        if self.dynamic_content_state != SnapshotState::Ready {
            return Err(MigrationError::NotFetched("dynamic content"));
        }

        let Some(item) = self.dynamic_content.iter().find(|i| i.id == item_id).cloned() else {
            let err = MigrationError::UnknownId {
                kind: "dynamic content item",
                id: item_id,
            };
            self.log.error(err.to_string());
            return Err(err);
        };

        self.submit_dynamic_content(&item).await
    }

    async fn submit_dynamic_content(&self, item: &DynamicContent) -> Result<i64, MigrationError> {
        self.log
            .info(format!("Migrating dynamic content {} ({})", item.id, item.name));

        let payload = transform::dynamic_content_payload(item);
        match self
            .client
            .create_dynamic_content(Env::Sandbox, &payload)
            .await
        {
            Ok(created) => {
                self.log.info(format!(
                    "Migrated dynamic content {} -> {}",
                    item.id, created.id
                ));
                Ok(created.id)
            }
            Err(e) => {
                self.log
                    .error(format!("Failed to migrate dynamic content {}: {e}", item.id));
                Err(e.into())
            }
        }
    }

    /// Delete every ticket field currently in the sandbox, working from a
    /// fresh snapshot.
    pub async fn delete_sandbox_fields(&mut self) -> Result<BulkReport, MigrationError> {
        self.fetch_fields(Env::Sandbox).await?;
        let fields = self.mapper.sandbox_fields().to_vec();

        self.log
            .info(format!("Deleting {} sandbox ticket fields", fields.len()));

        let mut report = BulkReport::default();
        for field in &fields {
            self.log
                .info(format!("Deleting sandbox ticket field {}", field.id));
            match self.client.delete_field(Env::Sandbox, field.id).await {
                Ok(()) => {
                    self.log
                        .info(format!("Deleted sandbox ticket field {}", field.id));
                    report.succeeded += 1;
                }
                Err(e) => {
                    self.log.error(format!(
                        "Failed to delete sandbox ticket field {}: {e}",
                        field.id
                    ));
                    report.failed += 1;
                }
            }
        }

        self.log.info(format!(
            "Sandbox ticket field deletion complete ({} succeeded, {} failed)",
            report.succeeded, report.failed
        ));
        Ok(report)
    }
}

/// Create one field in the sandbox, backfilling custom field options through
/// the per-option endpoint when the create response left them out. Option
/// backfill failures are logged but do not fail the field.
async fn submit_field(
    client: &dyn ZendeskApi,
    field: &TicketField,
    log: &LogSink,
) -> Result<TicketField, ApiError> {
    log.info(format!("Migrating ticket field {} ({})", field.id, field.title));

    let payload = transform::field_payload(field);
    let created = client.create_field(Env::Sandbox, &payload).await?;

    let source_options = field.custom_field_options.as_deref().unwrap_or_default();
    let created_has_options = created
        .custom_field_options
        .as_ref()
        .is_some_and(|options| !options.is_empty());

    if !source_options.is_empty() && !created_has_options {
        log.info(format!(
            "Backfilling {} options for ticket field {}",
            source_options.len(),
            created.id
        ));
        for option in source_options {
            let payload = NewCustomFieldOption::from(option);
            if let Err(e) = client
                .create_field_option(Env::Sandbox, created.id, &payload)
                .await
            {
                log.error(format!(
                    "Failed to create option '{}' on ticket field {}: {e}",
                    option.value, created.id
                ));
            }
        }
    }

    Ok(created)
}

fn describe(err: &MigrationError) -> String {
    match err {
        MigrationError::UnresolvedReferences { refs, .. } => {
            let listed: Vec<String> = refs.iter().map(UnresolvedRef::to_string).collect();
            format!("{err} ({})", listed.join(", "))
        }
        other => other.to_string(),
    }
}
