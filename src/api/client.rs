//! HTTP client for the Zendesk v2 API.
//!
//! The orchestrator talks to the API through the [`ZendeskApi`] trait; the
//! concrete [`HttpZendeskClient`] carries credentials for both environments
//! and judges success by HTTP status plus the structured `error` field of the
//! response body.

use async_trait::async_trait;
use log::debug;
use reqwest::Url;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use super::error::ApiError;
use super::models::{
    CustomFieldOption, CustomFieldOptionRequest, CustomFieldOptionResponse, DynamicContent,
    DynamicContentItemResponse, DynamicContentListResponse, DynamicContentRequest, Env,
    NewCustomFieldOption, NewDynamicContent, NewTicketField, NewTicketForm, TicketField,
    TicketFieldRequest, TicketFieldResponse, TicketFieldsResponse, TicketForm, TicketFormRequest,
    TicketFormResponse, TicketFormsResponse,
};
use crate::config::Config;

/// The REST surface the migration engine depends on. One method per
/// endpoint, each scoped to an environment.
#[async_trait]
pub trait ZendeskApi: Send + Sync {
    async fn list_fields(&self, env: Env) -> Result<Vec<TicketField>, ApiError>;
    async fn create_field(&self, env: Env, field: &NewTicketField)
    -> Result<TicketField, ApiError>;
    async fn delete_field(&self, env: Env, id: i64) -> Result<(), ApiError>;
    async fn create_field_option(
        &self,
        env: Env,
        field_id: i64,
        option: &NewCustomFieldOption,
    ) -> Result<CustomFieldOption, ApiError>;
    async fn list_forms(&self, env: Env) -> Result<Vec<TicketForm>, ApiError>;
    async fn create_form(&self, env: Env, form: &NewTicketForm) -> Result<TicketForm, ApiError>;
    async fn list_dynamic_content(&self, env: Env) -> Result<Vec<DynamicContent>, ApiError>;
    async fn create_dynamic_content(
        &self,
        env: Env,
        item: &NewDynamicContent,
    ) -> Result<DynamicContent, ApiError>;
}

#[derive(Debug)]
struct HostCredentials {
    base: String,
    api_key: String,
}

impl HostCredentials {
    fn parse(host: &str, api_key: &str, env: Env) -> Result<Self, ApiError> {
        if host.is_empty() {
            return Err(ApiError::Config(format!("no {env} host configured")));
        }
        Url::parse(host)
            .map_err(|e| ApiError::Config(format!("invalid {env} host '{host}': {e}")))?;
        Ok(Self {
            base: host.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

/// Zendesk API client with connection pooling and per-request deadlines.
#[derive(Debug)]
pub struct HttpZendeskClient {
    http: reqwest::Client,
    email: String,
    production: HostCredentials,
    sandbox: HostCredentials,
    timeout: Duration,
}

impl HttpZendeskClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        if config.email.is_empty() {
            return Err(ApiError::Config("no account email configured".to_string()));
        }

        let timeout = config.settings.request_timeout();
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent("zentools-cli/0.1")
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            email: config.email.clone(),
            production: HostCredentials::parse(
                &config.production_host,
                &config.production_api_key,
                Env::Production,
            )?,
            sandbox: HostCredentials::parse(
                &config.sandbox_host,
                &config.sandbox_api_key,
                Env::Sandbox,
            )?,
            timeout,
        })
    }

    fn host(&self, env: Env) -> &HostCredentials {
        match env {
            Env::Production => &self.production,
            Env::Sandbox => &self.sandbox,
        }
    }

    /// Basic auth pair for an environment: `{email}/token` with the api key
    /// as the password.
    fn auth(&self, env: Env) -> Result<(String, &str), ApiError> {
        let host = self.host(env);
        if host.api_key.is_empty() {
            return Err(ApiError::Config(format!("no {env} API key configured")));
        }
        Ok((format!("{}/token", self.email), &host.api_key))
    }

    fn endpoint(&self, env: Env, path: &str) -> String {
        format!("{}/{}", self.host(env).base, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, env: Env, path: &str) -> Result<T, ApiError> {
        let (user, key) = self.auth(env)?;
        let url = self.endpoint(env, path);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .basic_auth(&user, Some(key))
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, self.timeout))?;

        self.decode_response(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        env: Env,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let (user, key) = self.auth(env)?;
        let url = self.endpoint(env, path);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .basic_auth(&user, Some(key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, self.timeout))?;

        self.decode_response(response).await
    }

    async fn delete(&self, env: Env, path: &str) -> Result<(), ApiError> {
        let (user, key) = self.auth(env)?;
        let url = self.endpoint(env, path);
        debug!("DELETE {}", url);

        let response = self
            .http
            .delete(&url)
            .basic_auth(&user, Some(key))
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response
                .text()
                .await
                .map_err(|e| ApiError::from_reqwest(e, self.timeout))?;
            Err(ApiError::Remote {
                status: status.as_u16(),
                message: error_message(&body),
            })
        }
    }

    async fn decode_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::from_reqwest(e, self.timeout))?;

        if !status.is_success() {
            return Err(ApiError::Remote {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        // Some endpoints report failures inside a 2xx body.
        let value: Value = serde_json::from_str(&body)?;
        if value.get("error").is_some() {
            return Err(ApiError::Remote {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl ZendeskApi for HttpZendeskClient {
    async fn list_fields(&self, env: Env) -> Result<Vec<TicketField>, ApiError> {
        let response: TicketFieldsResponse = self.get_json(env, "api/v2/ticket_fields.json").await?;
        Ok(response.ticket_fields)
    }

    async fn create_field(
        &self,
        env: Env,
        field: &NewTicketField,
    ) -> Result<TicketField, ApiError> {
        let response: TicketFieldResponse = self
            .post_json(
                env,
                "api/v2/ticket_fields.json",
                &TicketFieldRequest { ticket_field: field },
            )
            .await?;
        Ok(response.ticket_field)
    }

    async fn delete_field(&self, env: Env, id: i64) -> Result<(), ApiError> {
        self.delete(env, &format!("api/v2/ticket_fields/{id}.json"))
            .await
    }

    async fn create_field_option(
        &self,
        env: Env,
        field_id: i64,
        option: &NewCustomFieldOption,
    ) -> Result<CustomFieldOption, ApiError> {
        let response: CustomFieldOptionResponse = self
            .post_json(
                env,
                &format!("api/v2/ticket_fields/{field_id}/options.json"),
                &CustomFieldOptionRequest {
                    custom_field_option: option,
                },
            )
            .await?;
        Ok(response.custom_field_option)
    }

    async fn list_forms(&self, env: Env) -> Result<Vec<TicketForm>, ApiError> {
        let response: TicketFormsResponse = self.get_json(env, "api/v2/ticket_forms.json").await?;
        Ok(response.ticket_forms)
    }

    async fn create_form(&self, env: Env, form: &NewTicketForm) -> Result<TicketForm, ApiError> {
        let response: TicketFormResponse = self
            .post_json(
                env,
                "api/v2/ticket_forms.json",
                &TicketFormRequest { ticket_form: form },
            )
            .await?;
        Ok(response.ticket_form)
    }

    async fn list_dynamic_content(&self, env: Env) -> Result<Vec<DynamicContent>, ApiError> {
        let response: DynamicContentListResponse =
            self.get_json(env, "api/v2/dynamic_content/items.json").await?;
        Ok(response.items)
    }

    async fn create_dynamic_content(
        &self,
        env: Env,
        item: &NewDynamicContent,
    ) -> Result<DynamicContent, ApiError> {
        let response: DynamicContentItemResponse = self
            .post_json(
                env,
                "api/v2/dynamic_content/items.json",
                &DynamicContentRequest { item },
            )
            .await?;
        Ok(response.item)
    }
}

/// Pull a human-readable message out of a Zendesk error body.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return truncate(body);
    };

    let error = value.get("error").map(|e| match e {
        Value::String(s) => s.clone(),
        Value::Object(fields) => fields
            .get("title")
            .or_else(|| fields.get("message"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| e.to_string()),
        other => other.to_string(),
    });
    let description = value
        .get("description")
        .and_then(|d| d.as_str())
        .map(str::to_string);

    match (error, description) {
        (Some(error), Some(description)) => format!("{error}: {description}"),
        (Some(error), None) => error,
        (None, Some(description)) => description,
        (None, None) => truncate(body),
    }
}

fn truncate(body: &str) -> String {
    const LIMIT: usize = 200;
    let body = body.trim();
    if body.len() <= LIMIT {
        body.to_string()
    } else {
        let end = (0..=LIMIT).rev().find(|&i| body.is_char_boundary(i)).unwrap_or(0);
        format!("{}...", &body[..end])
    }
}
