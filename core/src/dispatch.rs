//! Response dispatch: status check, then JSON or `<member>`-list decoding.

use serde_json::Value;

use crate::diagnostics::Diagnostics;
use crate::error::ApiError;
use crate::http::HttpResponse;
use crate::types::{Output, Parameter, Stack};

/// Fail with `ResponseError` for anything but 200, logging status and body.
pub fn check_status(response: &HttpResponse, diagnostics: &dyn Diagnostics) -> Result<(), ApiError> {
    if response.status == 200 {
        return Ok(());
    }
    diagnostics.error(&format!("{} {}", response.status, response.reason));
    diagnostics.error(&response.body);
    Err(ApiError::ResponseError {
        status: response.status,
        reason: response.reason.clone(),
        body: response.body.clone(),
    })
}

/// Decode a 200 body as an untyped JSON tree.
pub fn decode_json(response: HttpResponse, diagnostics: &dyn Diagnostics) -> Result<Value, ApiError> {
    check_status(&response, diagnostics)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Decode a 200 body as a list of records, one per outermost `<member>`.
pub fn decode_member_list<T: FromMember>(
    response: HttpResponse,
    diagnostics: &dyn Diagnostics,
) -> Result<Vec<T>, ApiError> {
    check_status(&response, diagnostics)?;
    let doc = roxmltree::Document::parse(&response.body)
        .map_err(|e| ApiError::DeserializationError(format!("invalid XML: {e}")))?;
    Ok(outer_members(doc.root_element())
        .into_iter()
        .map(T::from_member)
        .collect())
}

/// A record decodable from one `<member>` element.
pub trait FromMember: Sized {
    fn from_member(node: roxmltree::Node<'_, '_>) -> Self;
}

impl FromMember for Stack {
    fn from_member(node: roxmltree::Node<'_, '_>) -> Self {
        Stack {
            stack_id: child_text(node, "StackId"),
            stack_name: child_text(node, "StackName"),
            description: child_text(node, "Description"),
            stack_status: child_text(node, "StackStatus"),
            stack_status_reason: child_text(node, "StackStatusReason"),
            creation_time: child_text(node, "CreationTime"),
            last_updated_time: child_text(node, "LastUpdatedTime"),
            disable_rollback: child_text(node, "DisableRollback").map(|v| v.trim().eq_ignore_ascii_case("true")),
            timeout_in_minutes: child_text(node, "TimeoutInMinutes").and_then(|v| v.trim().parse().ok()),
            notification_arns: child_list(node, "NotificationARNs")
                .into_iter()
                .filter_map(|m| m.text().map(str::to_string))
                .collect(),
            parameters: child_list(node, "Parameters")
                .into_iter()
                .map(Parameter::from_member)
                .collect(),
            outputs: child_list(node, "Outputs")
                .into_iter()
                .map(Output::from_member)
                .collect(),
        }
    }
}

impl FromMember for Parameter {
    fn from_member(node: roxmltree::Node<'_, '_>) -> Self {
        Parameter {
            key: child_text(node, "ParameterKey").unwrap_or_default(),
            value: child_text(node, "ParameterValue").unwrap_or_default(),
        }
    }
}

impl FromMember for Output {
    fn from_member(node: roxmltree::Node<'_, '_>) -> Self {
        Output {
            key: child_text(node, "OutputKey").unwrap_or_default(),
            value: child_text(node, "OutputValue").unwrap_or_default(),
            description: child_text(node, "Description"),
        }
    }
}

/// Every `<member>` below `node` that is not itself nested in another member.
fn outer_members<'a, 'input>(node: roxmltree::Node<'a, 'input>) -> Vec<roxmltree::Node<'a, 'input>> {
    let mut members = Vec::new();
    for child in node.children().filter(|c| c.is_element()) {
        if child.has_tag_name("member") {
            members.push(child);
        } else {
            members.extend(outer_members(child));
        }
    }
    members
}

/// Element text as sent; scalar fields trim at their own parse site.
fn child_text(node: roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    node.children()
        .find(|c| c.has_tag_name(name))
        .and_then(|c| c.text())
        .map(str::to_string)
}

fn child_list<'a, 'input>(node: roxmltree::Node<'a, 'input>, name: &str) -> Vec<roxmltree::Node<'a, 'input>> {
    node.children()
        .find(|c| c.has_tag_name(name))
        .map(|list| list.children().filter(|c| c.has_tag_name("member")).collect())
        .unwrap_or_default()
}
