//! Zendesk REST API surface: entity models, the HTTP client, the error
//! taxonomy, and the write-pacing throttler.

pub mod client;
pub mod error;
pub mod models;
pub mod rate_limit;

pub use client::{HttpZendeskClient, ZendeskApi};
pub use error::ApiError;
pub use models::{
    Condition, ConditionChildField, CustomFieldOption, DynamicContent, DynamicContentVariant,
    Env, NewCustomFieldOption, NewDynamicContent, NewDynamicContentVariant, NewTicketField,
    NewTicketForm, StatusRequirement, TicketField, TicketForm,
};
pub use rate_limit::{ThrottleConfig, Throttler};
