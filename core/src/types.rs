//! Domain types for the stack service API.
//!
//! # Design
//! Input structs derive `Deserialize` and `Default` so test vectors can be
//! loaded straight from JSON and callers can fill only the fields they need
//! with `..Default::default()`. The `Stack` record is the one typed response;
//! every other operation hands back the decoded JSON tree.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status reported for a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StackStatus {
    CreateInProgress,
    CreateFailed,
    CreateComplete,
    RollbackInProgress,
    RollbackFailed,
    RollbackComplete,
    DeleteInProgress,
    DeleteFailed,
    DeleteComplete,
}

impl StackStatus {
    pub const ALL: [StackStatus; 9] = [
        StackStatus::CreateInProgress,
        StackStatus::CreateFailed,
        StackStatus::CreateComplete,
        StackStatus::RollbackInProgress,
        StackStatus::RollbackFailed,
        StackStatus::RollbackComplete,
        StackStatus::DeleteInProgress,
        StackStatus::DeleteFailed,
        StackStatus::DeleteComplete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StackStatus::CreateInProgress => "CREATE_IN_PROGRESS",
            StackStatus::CreateFailed => "CREATE_FAILED",
            StackStatus::CreateComplete => "CREATE_COMPLETE",
            StackStatus::RollbackInProgress => "ROLLBACK_IN_PROGRESS",
            StackStatus::RollbackFailed => "ROLLBACK_FAILED",
            StackStatus::RollbackComplete => "ROLLBACK_COMPLETE",
            StackStatus::DeleteInProgress => "DELETE_IN_PROGRESS",
            StackStatus::DeleteFailed => "DELETE_FAILED",
            StackStatus::DeleteComplete => "DELETE_COMPLETE",
        }
    }
}

impl AsRef<str> for StackStatus {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stack status: {0}")]
pub struct UnknownStackStatus(pub String);

impl FromStr for StackStatus {
    type Err = UnknownStackStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StackStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStackStatus(s.to_string()))
    }
}

/// A template parameter as a (key, value) pair.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "ParameterKey")]
    pub key: String,
    #[serde(rename = "ParameterValue")]
    pub value: String,
}

impl Parameter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for Parameter {
    fn from((key, value): (K, V)) -> Self {
        Parameter::new(key, value)
    }
}

/// A declared stack output.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Output {
    #[serde(rename = "OutputKey")]
    pub key: String,
    #[serde(rename = "OutputValue")]
    pub value: String,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One stack as returned by `DescribeStacks`.
///
/// Status is kept as the raw string so values outside the known vocabulary
/// survive decoding; use `status()` for the typed view.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stack {
    #[serde(default)]
    pub stack_id: Option<String>,
    #[serde(default)]
    pub stack_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stack_status: Option<String>,
    #[serde(default)]
    pub stack_status_reason: Option<String>,
    #[serde(default)]
    pub creation_time: Option<String>,
    #[serde(default)]
    pub last_updated_time: Option<String>,
    #[serde(default)]
    pub disable_rollback: Option<bool>,
    #[serde(default)]
    pub timeout_in_minutes: Option<u32>,
    #[serde(default, rename = "NotificationARNs")]
    pub notification_arns: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub outputs: Vec<Output>,
}

impl Stack {
    pub fn status(&self) -> Option<StackStatus> {
        self.stack_status.as_deref()?.parse().ok()
    }
}

/// Stack creation timeout, accepted as a number or as text to be coerced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeoutInMinutes {
    Minutes(u64),
    Text(String),
}

impl From<u32> for TimeoutInMinutes {
    fn from(minutes: u32) -> Self {
        TimeoutInMinutes::Minutes(u64::from(minutes))
    }
}

impl From<&str> for TimeoutInMinutes {
    fn from(text: &str) -> Self {
        TimeoutInMinutes::Text(text.to_string())
    }
}

/// Input for `CreateStack`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateStackInput {
    pub stack_name: String,
    pub template_body: Option<String>,
    pub template_url: Option<String>,
    pub parameters: Vec<Parameter>,
    pub notification_arns: Vec<String>,
    pub disable_rollback: bool,
    pub timeout_in_minutes: Option<TimeoutInMinutes>,
}

impl CreateStackInput {
    pub fn new(stack_name: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            ..Default::default()
        }
    }
}

/// Input for `DescribeStackEvents`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DescribeStackEventsInput {
    pub stack_name_or_id: Option<String>,
    pub next_token: Option<String>,
}

/// Input for `DescribeStackResources`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DescribeStackResourcesInput {
    pub stack_name_or_id: Option<String>,
    pub logical_resource_id: Option<String>,
    pub physical_resource_id: Option<String>,
}

/// Input for `ListStacks`. Filters are passed through without checking them
/// against `StackStatus`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListStacksInput {
    pub stack_status_filters: Vec<String>,
    pub next_token: Option<String>,
}

impl ListStacksInput {
    pub fn with_filters<S: AsRef<str>>(filters: &[S]) -> Self {
        Self {
            stack_status_filters: filters.iter().map(|f| f.as_ref().to_string()).collect(),
            next_token: None,
        }
    }
}

/// Input for `ValidateTemplate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateTemplateInput {
    pub template_body: Option<String>,
    pub template_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_status_round_trips_through_strings() {
        for status in StackStatus::ALL {
            assert_eq!(status.as_str().parse::<StackStatus>().unwrap(), status);
        }
        assert_eq!(StackStatus::RollbackFailed.to_string(), "ROLLBACK_FAILED");
    }

    #[test]
    fn unknown_stack_status_is_rejected() {
        let err = "UPDATE_COMPLETE".parse::<StackStatus>().unwrap_err();
        assert_eq!(err, UnknownStackStatus("UPDATE_COMPLETE".to_string()));
    }

    #[test]
    fn stack_status_serializes_screaming_snake() {
        let json = serde_json::to_value(StackStatus::DeleteInProgress).unwrap();
        assert_eq!(json, "DELETE_IN_PROGRESS");
    }

    #[test]
    fn create_stack_input_defaults_when_fields_missing() {
        let input: CreateStackInput = serde_json::from_str(r#"{"stack_name":"web"}"#).unwrap();
        assert_eq!(input.stack_name, "web");
        assert!(input.parameters.is_empty());
        assert!(input.notification_arns.is_empty());
        assert!(!input.disable_rollback);
        assert!(input.timeout_in_minutes.is_none());
    }

    #[test]
    fn timeout_accepts_number_or_text() {
        let input: CreateStackInput =
            serde_json::from_str(r#"{"stack_name":"a","timeout_in_minutes":30}"#).unwrap();
        assert_eq!(input.timeout_in_minutes, Some(TimeoutInMinutes::Minutes(30)));
        let input: CreateStackInput =
            serde_json::from_str(r#"{"stack_name":"a","timeout_in_minutes":"45"}"#).unwrap();
        assert_eq!(input.timeout_in_minutes, Some(TimeoutInMinutes::Text("45".into())));
    }

    #[test]
    fn parameter_from_tuple() {
        let p: Parameter = ("Key1", "Val1").into();
        assert_eq!(p, Parameter::new("Key1", "Val1"));
    }

    #[test]
    fn stack_typed_status() {
        let stack = Stack {
            stack_status: Some("CREATE_COMPLETE".into()),
            ..Default::default()
        };
        assert_eq!(stack.status(), Some(StackStatus::CreateComplete));
        assert_eq!(Stack::default().status(), None);
    }
}
