//! In-memory stack store backing the mock service.
//!
//! Stacks move straight to their final status: a create lands in
//! `CREATE_COMPLETE` and a delete in `DELETE_COMPLETE`. Deleted stacks stay in
//! the store so `ListStacks` can report them, but are invisible to lookups by
//! name.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

const ACCOUNT_ID: &str = "123456789012";

/// A service-side failure rendered as an `ErrorResponse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockError {
    pub code: &'static str,
    pub message: String,
}

impl MockError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            code: "ValidationError",
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StackResource {
    pub logical_id: String,
    pub physical_id: String,
    pub resource_type: String,
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct StackEvent {
    pub event_id: String,
    pub logical_id: String,
    pub physical_id: String,
    pub resource_type: String,
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct StoredStack {
    pub stack_id: String,
    pub stack_name: String,
    pub description: Option<String>,
    pub status: String,
    pub creation_time: String,
    pub deletion_time: Option<String>,
    pub disable_rollback: bool,
    pub timeout_in_minutes: Option<u32>,
    pub notification_arns: Vec<String>,
    pub parameters: Vec<(String, String)>,
    pub outputs: Vec<(String, String, Option<String>)>,
    pub template_body: String,
    pub resources: Vec<StackResource>,
    /// Oldest first.
    pub events: Vec<StackEvent>,
}

impl StoredStack {
    pub fn is_deleted(&self) -> bool {
        self.status == "DELETE_COMPLETE"
    }

    fn record(&mut self, logical_id: &str, physical_id: &str, resource_type: &str, status: &str) {
        self.events.push(StackEvent {
            event_id: Uuid::new_v4().to_string(),
            logical_id: logical_id.to_string(),
            physical_id: physical_id.to_string(),
            resource_type: resource_type.to_string(),
            status: status.to_string(),
            timestamp: now(),
        });
    }

    fn record_stack(&mut self, status: &str) {
        let (name, id) = (self.stack_name.clone(), self.stack_id.clone());
        self.record(&name, &id, "AWS::CloudFormation::Stack", status);
    }
}

/// Parsed request for `CreateStack`.
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    pub stack_name: String,
    pub template_body: Option<String>,
    pub template_url: Option<String>,
    pub parameters: Vec<(String, String)>,
    pub notification_arns: Vec<String>,
    pub disable_rollback: bool,
    pub timeout_in_minutes: Option<u32>,
}

/// Summary of a template returned by `ValidateTemplate`.
#[derive(Debug, Clone, Default)]
pub struct TemplateSummary {
    pub description: Option<String>,
    /// (key, default value, description)
    pub parameters: Vec<(String, Option<String>, Option<String>)>,
}

#[derive(Debug, Default)]
pub struct Store {
    stacks: Vec<StoredStack>,
}

impl Store {
    pub fn create_stack(&mut self, request: CreateRequest) -> Result<&StoredStack, MockError> {
        if request.stack_name.is_empty() {
            return Err(MockError::validation("StackName must not be empty"));
        }
        if self.find_active(&request.stack_name).is_some() {
            return Err(MockError {
                code: "AlreadyExistsException",
                message: format!("Stack [{}] already exists", request.stack_name),
            });
        }
        let template_body = required_template(request.template_body.as_deref(), request.template_url.as_deref())?;
        let template = parse_template(&template_body)?;
        let summary = summarize(&template);

        let mut parameters = request.parameters.clone();
        for (key, default, _) in &summary.parameters {
            if parameters.iter().any(|(k, _)| k == key) {
                continue;
            }
            match default {
                Some(default) => parameters.push((key.clone(), default.clone())),
                None => {
                    return Err(MockError::validation(format!("Parameters: [{key}] must have values")));
                }
            }
        }

        let stack_id = format!(
            "arn:aws:cloudformation:us-east-1:{ACCOUNT_ID}:stack/{}/{}",
            request.stack_name,
            Uuid::new_v4()
        );
        let mut stack = StoredStack {
            stack_id,
            stack_name: request.stack_name.clone(),
            description: summary.description,
            status: "CREATE_IN_PROGRESS".to_string(),
            creation_time: now(),
            deletion_time: None,
            disable_rollback: request.disable_rollback,
            timeout_in_minutes: request.timeout_in_minutes,
            notification_arns: request.notification_arns,
            parameters,
            outputs: Vec::new(),
            template_body,
            resources: Vec::new(),
            events: Vec::new(),
        };
        stack.record_stack("CREATE_IN_PROGRESS");

        let resources = template
            .get("Resources")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        for (logical_id, definition) in &resources {
            let resource_type = definition
                .get("Type")
                .and_then(Value::as_str)
                .unwrap_or("AWS::CloudFormation::CustomResource")
                .to_string();
            let physical_id = format!("{}-{logical_id}-{}", stack.stack_name, &Uuid::new_v4().simple().to_string()[..12]);
            stack.record(logical_id, "", &resource_type, "CREATE_IN_PROGRESS");
            stack.record(logical_id, &physical_id, &resource_type, "CREATE_COMPLETE");
            stack.resources.push(StackResource {
                logical_id: logical_id.clone(),
                physical_id,
                resource_type,
                status: "CREATE_COMPLETE".to_string(),
                timestamp: now(),
            });
        }
        stack.outputs = resolve_outputs(&template, &stack);
        stack.status = "CREATE_COMPLETE".to_string();
        stack.record_stack("CREATE_COMPLETE");

        self.stacks.push(stack);
        Ok(&self.stacks[self.stacks.len() - 1])
    }

    /// Deleting an unknown stack succeeds without effect.
    pub fn delete_stack(&mut self, name_or_id: &str) {
        let Some(index) = self.find_index(name_or_id) else {
            return;
        };
        let stack = &mut self.stacks[index];
        if stack.is_deleted() {
            return;
        }
        stack.status = "DELETE_IN_PROGRESS".to_string();
        stack.record_stack("DELETE_IN_PROGRESS");
        let resources = stack.resources.clone();
        for resource in resources.iter().rev() {
            stack.record(&resource.logical_id, &resource.physical_id, &resource.resource_type, "DELETE_COMPLETE");
        }
        for resource in &mut stack.resources {
            resource.status = "DELETE_COMPLETE".to_string();
        }
        stack.status = "DELETE_COMPLETE".to_string();
        stack.deletion_time = Some(now());
        stack.record_stack("DELETE_COMPLETE");
    }

    /// Active stack by name, or any stack by id.
    pub fn get(&self, name_or_id: &str) -> Result<&StoredStack, MockError> {
        self.find_index(name_or_id)
            .map(|i| &self.stacks[i])
            .ok_or_else(|| MockError::validation(format!("Stack with id {name_or_id} does not exist")))
    }

    pub fn active(&self) -> impl Iterator<Item = &StoredStack> {
        self.stacks.iter().filter(|s| !s.is_deleted())
    }

    pub fn all(&self) -> impl Iterator<Item = &StoredStack> {
        self.stacks.iter()
    }

    /// Find the stack owning a physical resource id.
    pub fn find_by_physical_id(&self, physical_id: &str) -> Result<&StoredStack, MockError> {
        self.active()
            .find(|s| s.resources.iter().any(|r| r.physical_id == physical_id))
            .ok_or_else(|| MockError::validation(format!("Stack for {physical_id} does not exist")))
    }

    fn find_active(&self, name: &str) -> Option<&StoredStack> {
        self.find_index(name).map(|i| &self.stacks[i])
    }

    fn find_index(&self, name_or_id: &str) -> Option<usize> {
        self.stacks.iter().position(|s| {
            (s.stack_name == name_or_id && !s.is_deleted()) || s.stack_id == name_or_id
        })
    }
}

pub fn validate_template(body: Option<&str>, url: Option<&str>) -> Result<TemplateSummary, MockError> {
    let body = required_template(body, url)?;
    Ok(summarize(&parse_template(&body)?))
}

fn required_template(body: Option<&str>, url: Option<&str>) -> Result<String, MockError> {
    match (body.filter(|b| !b.is_empty()), url.filter(|u| !u.is_empty())) {
        (Some(body), _) => Ok(body.to_string()),
        (None, Some(_)) => Err(MockError::validation("TemplateURL is not supported by the mock service")),
        (None, None) => Err(MockError::validation(
            "Either Template URL or Template Body must be specified.",
        )),
    }
}

fn parse_template(body: &str) -> Result<Map<String, Value>, MockError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|_| MockError::validation("Template format error: JSON not well-formed."))?;
    let Value::Object(template) = value else {
        return Err(MockError::validation("Template format error: JSON not well-formed."));
    };
    let has_resources = template
        .get("Resources")
        .and_then(Value::as_object)
        .is_some_and(|r| !r.is_empty());
    if !has_resources {
        return Err(MockError::validation(
            "Template format error: At least one Resources member must be defined.",
        ));
    }
    Ok(template)
}

fn summarize(template: &Map<String, Value>) -> TemplateSummary {
    let parameters = template
        .get("Parameters")
        .and_then(Value::as_object)
        .map(|params| {
            params
                .iter()
                .map(|(key, decl)| {
                    let default = decl.get("Default").map(|d| match d {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    });
                    let description = decl.get("Description").and_then(Value::as_str).map(str::to_string);
                    (key.clone(), default, description)
                })
                .collect()
        })
        .unwrap_or_default();
    TemplateSummary {
        description: template.get("Description").and_then(Value::as_str).map(str::to_string),
        parameters,
    }
}

/// Outputs may be plain strings or `{"Ref": ...}` to a parameter or resource.
fn resolve_outputs(template: &Map<String, Value>, stack: &StoredStack) -> Vec<(String, String, Option<String>)> {
    let Some(outputs) = template.get("Outputs").and_then(Value::as_object) else {
        return Vec::new();
    };
    outputs
        .iter()
        .map(|(key, decl)| {
            let value = match decl.get("Value") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Object(obj)) if obj.contains_key("Ref") => {
                    let target = obj.get("Ref").and_then(Value::as_str).unwrap_or_default();
                    stack
                        .parameters
                        .iter()
                        .find(|(k, _)| k == target)
                        .map(|(_, v)| v.clone())
                        .or_else(|| {
                            stack
                                .resources
                                .iter()
                                .find(|r| r.logical_id == target)
                                .map(|r| r.physical_id.clone())
                        })
                        .unwrap_or_default()
                }
                Some(other) => other.to_string(),
                None => String::new(),
            };
            let description = decl.get("Description").and_then(Value::as_str).map(str::to_string);
            (key.clone(), value, description)
        })
        .collect()
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
