//! Request builder and response parser for the stack service query API.
//!
//! # Design
//! `StackServiceClient` holds its configuration and diagnostic sink and carries
//! no mutable state between calls. Each API action is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that consumes
//! an `HttpResponse`. The un-prefixed method composes the two through a
//! `Transport` for callers that do not need the split.

use std::sync::Arc;

use serde_json::Value;

use crate::config::ClientConfig;
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::dispatch::{decode_json, decode_member_list};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Params};
use crate::params::{build_list_params, build_parameter_params, encode_bool, encode_timeout, insert_if_present};
use crate::transport::Transport;
use crate::types::{
    CreateStackInput, DescribeStackEventsInput, DescribeStackResourcesInput, ListStacksInput, Stack,
    ValidateTemplateInput,
};

const BOTH_TEMPLATES_WARNING: &str =
    "If both TemplateBody and TemplateURL are specified, only TemplateBody will be honored by the API";

/// Synchronous, stateless client for the stack service.
#[derive(Debug, Clone)]
pub struct StackServiceClient {
    config: ClientConfig,
    base_url: String,
    diagnostics: Arc<dyn Diagnostics>,
}

impl StackServiceClient {
    /// Client that reports diagnostics through `tracing`.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_diagnostics(config, Arc::new(TracingDiagnostics))
    }

    pub fn with_diagnostics(config: ClientConfig, diagnostics: Arc<dyn Diagnostics>) -> Self {
        let base_url = config.base_url();
        Self {
            config,
            base_url,
            diagnostics,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Build
    // -----------------------------------------------------------------------

    pub fn build_create_stack(&self, input: &CreateStackInput) -> Result<HttpRequest, ApiError> {
        let mut params = json_params();
        params.insert("StackName".into(), input.stack_name.clone());
        params.insert("DisableRollback".into(), encode_bool(input.disable_rollback).into());
        self.insert_templates(&mut params, input.template_body.as_deref(), input.template_url.as_deref());
        build_parameter_params(&mut params, &input.parameters);
        build_list_params(&mut params, &input.notification_arns, "NotificationARNs");
        if let Some(timeout) = &input.timeout_in_minutes {
            if let Some(minutes) = encode_timeout(timeout)? {
                params.insert("TimeoutInMinutes".into(), minutes.to_string());
            }
        }
        Ok(self.request("CreateStack", HttpMethod::Post, params))
    }

    pub fn build_delete_stack(&self, stack_name_or_id: &str) -> HttpRequest {
        let mut params = json_params();
        params.insert("StackName".into(), stack_name_or_id.to_string());
        self.request("DeleteStack", HttpMethod::Get, params)
    }

    pub fn build_describe_stack_events(&self, input: &DescribeStackEventsInput) -> HttpRequest {
        let mut params = json_params();
        insert_if_present(&mut params, "StackName", input.stack_name_or_id.as_deref());
        insert_if_present(&mut params, "NextToken", input.next_token.as_deref());
        self.request("DescribeStackEvents", HttpMethod::Get, params)
    }

    pub fn build_describe_stack_resource(&self, stack_name_or_id: &str, logical_resource_id: &str) -> HttpRequest {
        let mut params = json_params();
        params.insert("StackName".into(), stack_name_or_id.to_string());
        params.insert("LogicalResourceId".into(), logical_resource_id.to_string());
        self.request("DescribeStackResource", HttpMethod::Get, params)
    }

    pub fn build_describe_stack_resources(&self, input: &DescribeStackResourcesInput) -> HttpRequest {
        let mut params = json_params();
        insert_if_present(&mut params, "StackName", input.stack_name_or_id.as_deref());
        insert_if_present(&mut params, "LogicalResourceId", input.logical_resource_id.as_deref());
        insert_if_present(&mut params, "PhysicalResourceId", input.physical_resource_id.as_deref());
        self.request("DescribeStackResources", HttpMethod::Get, params)
    }

    /// The one XML operation, so no `ContentType` is sent.
    pub fn build_describe_stacks(&self, stack_name_or_id: Option<&str>) -> HttpRequest {
        let mut params = Params::new();
        insert_if_present(&mut params, "StackName", stack_name_or_id);
        self.request("DescribeStacks", HttpMethod::Get, params)
    }

    pub fn build_get_template(&self, stack_name_or_id: &str) -> HttpRequest {
        let mut params = json_params();
        params.insert("StackName".into(), stack_name_or_id.to_string());
        self.request("GetTemplate", HttpMethod::Get, params)
    }

    pub fn build_list_stack_resources(&self, stack_name_or_id: &str, next_token: Option<&str>) -> HttpRequest {
        let mut params = json_params();
        params.insert("StackName".into(), stack_name_or_id.to_string());
        insert_if_present(&mut params, "NextToken", next_token);
        self.request("ListStackResources", HttpMethod::Get, params)
    }

    pub fn build_list_stacks(&self, input: &ListStacksInput) -> HttpRequest {
        let mut params = json_params();
        insert_if_present(&mut params, "NextToken", input.next_token.as_deref());
        build_list_params(&mut params, &input.stack_status_filters, "StackStatusFilter");
        self.request("ListStacks", HttpMethod::Get, params)
    }

    pub fn build_validate_template(&self, input: &ValidateTemplateInput) -> HttpRequest {
        let mut params = json_params();
        self.insert_templates(&mut params, input.template_body.as_deref(), input.template_url.as_deref());
        self.request("ValidateTemplate", HttpMethod::Get, params)
    }

    // -----------------------------------------------------------------------
    // Parse
    // -----------------------------------------------------------------------

    pub fn parse_create_stack(&self, response: HttpResponse) -> Result<Value, ApiError> {
        decode_json(response, self.diagnostics.as_ref())
    }

    pub fn parse_delete_stack(&self, response: HttpResponse) -> Result<Value, ApiError> {
        decode_json(response, self.diagnostics.as_ref())
    }

    pub fn parse_describe_stack_events(&self, response: HttpResponse) -> Result<Value, ApiError> {
        decode_json(response, self.diagnostics.as_ref())
    }

    pub fn parse_describe_stack_resource(&self, response: HttpResponse) -> Result<Value, ApiError> {
        decode_json(response, self.diagnostics.as_ref())
    }

    pub fn parse_describe_stack_resources(&self, response: HttpResponse) -> Result<Value, ApiError> {
        decode_json(response, self.diagnostics.as_ref())
    }

    pub fn parse_describe_stacks(&self, response: HttpResponse) -> Result<Vec<Stack>, ApiError> {
        decode_member_list(response, self.diagnostics.as_ref())
    }

    pub fn parse_get_template(&self, response: HttpResponse) -> Result<Value, ApiError> {
        decode_json(response, self.diagnostics.as_ref())
    }

    pub fn parse_list_stack_resources(&self, response: HttpResponse) -> Result<Value, ApiError> {
        decode_json(response, self.diagnostics.as_ref())
    }

    pub fn parse_list_stacks(&self, response: HttpResponse) -> Result<Value, ApiError> {
        decode_json(response, self.diagnostics.as_ref())
    }

    pub fn parse_validate_template(&self, response: HttpResponse) -> Result<Value, ApiError> {
        decode_json(response, self.diagnostics.as_ref())
    }

    // -----------------------------------------------------------------------
    // Round trips
    // -----------------------------------------------------------------------

    pub fn create_stack(&self, transport: &dyn Transport, input: &CreateStackInput) -> Result<Value, ApiError> {
        let request = self.build_create_stack(input)?;
        self.parse_create_stack(transport.request(&request)?)
    }

    pub fn delete_stack(&self, transport: &dyn Transport, stack_name_or_id: &str) -> Result<Value, ApiError> {
        let request = self.build_delete_stack(stack_name_or_id);
        self.parse_delete_stack(transport.request(&request)?)
    }

    pub fn describe_stack_events(
        &self,
        transport: &dyn Transport,
        input: &DescribeStackEventsInput,
    ) -> Result<Value, ApiError> {
        let request = self.build_describe_stack_events(input);
        self.parse_describe_stack_events(transport.request(&request)?)
    }

    pub fn describe_stack_resource(
        &self,
        transport: &dyn Transport,
        stack_name_or_id: &str,
        logical_resource_id: &str,
    ) -> Result<Value, ApiError> {
        let request = self.build_describe_stack_resource(stack_name_or_id, logical_resource_id);
        self.parse_describe_stack_resource(transport.request(&request)?)
    }

    pub fn describe_stack_resources(
        &self,
        transport: &dyn Transport,
        input: &DescribeStackResourcesInput,
    ) -> Result<Value, ApiError> {
        let request = self.build_describe_stack_resources(input);
        self.parse_describe_stack_resources(transport.request(&request)?)
    }

    pub fn describe_stacks(
        &self,
        transport: &dyn Transport,
        stack_name_or_id: Option<&str>,
    ) -> Result<Vec<Stack>, ApiError> {
        let request = self.build_describe_stacks(stack_name_or_id);
        self.parse_describe_stacks(transport.request(&request)?)
    }

    pub fn get_template(&self, transport: &dyn Transport, stack_name_or_id: &str) -> Result<Value, ApiError> {
        let request = self.build_get_template(stack_name_or_id);
        self.parse_get_template(transport.request(&request)?)
    }

    pub fn list_stack_resources(
        &self,
        transport: &dyn Transport,
        stack_name_or_id: &str,
        next_token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let request = self.build_list_stack_resources(stack_name_or_id, next_token);
        self.parse_list_stack_resources(transport.request(&request)?)
    }

    pub fn list_stacks(&self, transport: &dyn Transport, input: &ListStacksInput) -> Result<Value, ApiError> {
        let request = self.build_list_stacks(input);
        self.parse_list_stacks(transport.request(&request)?)
    }

    pub fn validate_template(
        &self,
        transport: &dyn Transport,
        input: &ValidateTemplateInput,
    ) -> Result<Value, ApiError> {
        let request = self.build_validate_template(input);
        self.parse_validate_template(transport.request(&request)?)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn request(&self, action: &str, method: HttpMethod, mut params: Params) -> HttpRequest {
        params.insert("Action".into(), action.to_string());
        params.insert("Version".into(), self.config.api_version.clone());
        tracing::debug!(action, %method, params = params.len(), "built request");
        HttpRequest {
            method,
            url: self.base_url.clone(),
            action: action.to_string(),
            params,
        }
    }

    /// Both forms are sent when both are given; the service keeps the body.
    fn insert_templates(&self, params: &mut Params, body: Option<&str>, url: Option<&str>) {
        insert_if_present(params, "TemplateBody", body);
        insert_if_present(params, "TemplateURL", url);
        if params.contains_key("TemplateBody") && params.contains_key("TemplateURL") {
            self.diagnostics.warn(BOTH_TEMPLATES_WARNING);
        }
    }
}

fn json_params() -> Params {
    Params::from([("ContentType".to_string(), "JSON".to_string())])
}
