//! In-memory emulator of the stack service query API.
//!
//! Every request goes to `/`, with the operation named by the `Action`
//! parameter, sent as a query string (`GET`) or an urlencoded form (`POST`).
//! JSON operations answer with the `<Action>Response` / `<Action>Result`
//! envelope, `DescribeStacks` answers XML, and failures answer 400 with an
//! XML `ErrorResponse`.

pub mod store;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Form, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

use store::{CreateRequest, MockError, StoredStack, Store};

pub type Db = Arc<RwLock<Store>>;

type QueryParams = HashMap<String, String>;

const XMLNS: &str = "http://cloudformation.amazonaws.com/doc/2010-05-15/";

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/", get(query_get).post(query_post))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn query_get(State(db): State<Db>, Query(params): Query<QueryParams>) -> Response {
    dispatch(&db, &params).await
}

async fn query_post(State(db): State<Db>, Form(params): Form<QueryParams>) -> Response {
    dispatch(&db, &params).await
}

enum Reply {
    Json(Value),
    Xml(String),
}

async fn dispatch(db: &Db, params: &QueryParams) -> Response {
    let action = params.get("Action").map(String::as_str).unwrap_or_default();
    let mut store = db.write().await;
    let result = match action {
        "CreateStack" => create_stack(&mut store, params).map(Reply::Json),
        "DeleteStack" => delete_stack(&mut store, params).map(Reply::Json),
        "DescribeStackEvents" => describe_stack_events(&store, params).map(Reply::Json),
        "DescribeStackResource" => describe_stack_resource(&store, params).map(Reply::Json),
        "DescribeStackResources" => describe_stack_resources(&store, params).map(Reply::Json),
        "DescribeStacks" => describe_stacks(&store, params).map(Reply::Xml),
        "GetTemplate" => get_template(&store, params).map(Reply::Json),
        "ListStackResources" => list_stack_resources(&store, params).map(Reply::Json),
        "ListStacks" => Ok(Reply::Json(list_stacks(&store, params))),
        "ValidateTemplate" => validate_template(params).map(Reply::Json),
        "" => Err(MockError {
            code: "MissingAction",
            message: "The request must contain the parameter Action".to_string(),
        }),
        other => Err(MockError {
            code: "InvalidAction",
            message: format!("Could not find operation {other}"),
        }),
    };
    drop(store);

    match result {
        Ok(Reply::Json(result)) => {
            tracing::info!(action, "ok");
            Json(envelope(action, result)).into_response()
        }
        Ok(Reply::Xml(body)) => {
            tracing::info!(action, "ok");
            (StatusCode::OK, [(header::CONTENT_TYPE, "text/xml")], body).into_response()
        }
        Err(err) => {
            tracing::warn!(action, code = err.code, message = %err.message, "rejected");
            (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, "text/xml")],
                error_xml(&err),
            )
                .into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

fn create_stack(store: &mut Store, params: &QueryParams) -> Result<Value, MockError> {
    let timeout_in_minutes = opt(params, "TimeoutInMinutes")
        .map(|t| {
            t.parse::<u32>()
                .map_err(|_| MockError::validation(format!("Invalid TimeoutInMinutes: {t}")))
        })
        .transpose()?;
    let request = CreateRequest {
        stack_name: required(params, "StackName")?.to_string(),
        template_body: opt(params, "TemplateBody").map(str::to_string),
        template_url: opt(params, "TemplateURL").map(str::to_string),
        parameters: parameter_members(params),
        notification_arns: members(params, "NotificationARNs"),
        disable_rollback: opt(params, "DisableRollback") == Some("true"),
        timeout_in_minutes,
    };
    let stack = store.create_stack(request)?;
    Ok(json!({ "StackId": stack.stack_id }))
}

fn delete_stack(store: &mut Store, params: &QueryParams) -> Result<Value, MockError> {
    store.delete_stack(required(params, "StackName")?);
    Ok(Value::Object(Map::new()))
}

fn describe_stack_events(store: &Store, params: &QueryParams) -> Result<Value, MockError> {
    let stacks: Vec<&StoredStack> = match opt(params, "StackName") {
        Some(name) => vec![store.get(name)?],
        None => store.active().collect(),
    };
    let events: Vec<Value> = stacks
        .iter()
        .flat_map(|stack| {
            stack.events.iter().rev().map(move |event| {
                json!({
                    "EventId": event.event_id,
                    "StackId": stack.stack_id,
                    "StackName": stack.stack_name,
                    "LogicalResourceId": event.logical_id,
                    "PhysicalResourceId": event.physical_id,
                    "ResourceType": event.resource_type,
                    "ResourceStatus": event.status,
                    "Timestamp": event.timestamp,
                })
            })
        })
        .collect();
    Ok(json!({ "StackEvents": events }))
}

fn describe_stack_resource(store: &Store, params: &QueryParams) -> Result<Value, MockError> {
    let stack = store.get(required(params, "StackName")?)?;
    let logical_id = required(params, "LogicalResourceId")?;
    let resource = stack
        .resources
        .iter()
        .find(|r| r.logical_id == logical_id)
        .ok_or_else(|| {
            MockError::validation(format!(
                "Resource {logical_id} does not exist for stack {}",
                stack.stack_name
            ))
        })?;
    Ok(json!({
        "StackResourceDetail": {
            "StackId": stack.stack_id,
            "StackName": stack.stack_name,
            "LogicalResourceId": resource.logical_id,
            "PhysicalResourceId": resource.physical_id,
            "ResourceType": resource.resource_type,
            "ResourceStatus": resource.status,
            "LastUpdatedTimestamp": resource.timestamp,
        }
    }))
}

fn describe_stack_resources(store: &Store, params: &QueryParams) -> Result<Value, MockError> {
    let physical_id = opt(params, "PhysicalResourceId");
    let stack = match (opt(params, "StackName"), physical_id) {
        (Some(name), _) => store.get(name)?,
        (None, Some(physical_id)) => store.find_by_physical_id(physical_id)?,
        (None, None) => {
            return Err(MockError::validation(
                "Either StackName or PhysicalResourceId must be specified",
            ))
        }
    };
    let logical_id = opt(params, "LogicalResourceId");
    let resources: Vec<Value> = stack
        .resources
        .iter()
        .filter(|r| logical_id.is_none_or(|id| r.logical_id == id))
        .filter(|r| physical_id.is_none_or(|id| r.physical_id == id))
        .map(|r| {
            json!({
                "StackId": stack.stack_id,
                "StackName": stack.stack_name,
                "LogicalResourceId": r.logical_id,
                "PhysicalResourceId": r.physical_id,
                "ResourceType": r.resource_type,
                "ResourceStatus": r.status,
                "Timestamp": r.timestamp,
            })
        })
        .collect();
    Ok(json!({ "StackResources": resources }))
}

fn describe_stacks(store: &Store, params: &QueryParams) -> Result<String, MockError> {
    let stacks: Vec<&StoredStack> = match opt(params, "StackName") {
        Some(name) => vec![store.get(name)?],
        None => store.active().collect(),
    };
    let mut xml = format!("<DescribeStacksResponse xmlns=\"{XMLNS}\"><DescribeStacksResult><Stacks>");
    for stack in stacks {
        xml.push_str(&stack_xml(stack));
    }
    xml.push_str("</Stacks></DescribeStacksResult>");
    xml.push_str(&format!(
        "<ResponseMetadata><RequestId>{}</RequestId></ResponseMetadata></DescribeStacksResponse>",
        Uuid::new_v4()
    ));
    Ok(xml)
}

fn get_template(store: &Store, params: &QueryParams) -> Result<Value, MockError> {
    let stack = store.get(required(params, "StackName")?)?;
    Ok(json!({ "TemplateBody": stack.template_body }))
}

fn list_stack_resources(store: &Store, params: &QueryParams) -> Result<Value, MockError> {
    let stack = store.get(required(params, "StackName")?)?;
    let summaries: Vec<Value> = stack
        .resources
        .iter()
        .map(|r| {
            json!({
                "LogicalResourceId": r.logical_id,
                "PhysicalResourceId": r.physical_id,
                "ResourceType": r.resource_type,
                "ResourceStatus": r.status,
                "LastUpdatedTimestamp": r.timestamp,
            })
        })
        .collect();
    Ok(json!({ "StackResourceSummaries": summaries }))
}

fn list_stacks(store: &Store, params: &QueryParams) -> Value {
    let filters = members(params, "StackStatusFilter");
    let summaries: Vec<Value> = store
        .all()
        .filter(|s| filters.is_empty() || filters.contains(&s.status))
        .map(|s| {
            let mut summary = json!({
                "StackId": s.stack_id,
                "StackName": s.stack_name,
                "StackStatus": s.status,
                "CreationTime": s.creation_time,
            });
            if let Some(deleted) = &s.deletion_time {
                summary["DeletionTime"] = json!(deleted);
            }
            if let Some(description) = &s.description {
                summary["TemplateDescription"] = json!(description);
            }
            summary
        })
        .collect();
    json!({ "StackSummaries": summaries })
}

fn validate_template(params: &QueryParams) -> Result<Value, MockError> {
    let summary = store::validate_template(opt(params, "TemplateBody"), opt(params, "TemplateURL"))?;
    let parameters: Vec<Value> = summary
        .parameters
        .iter()
        .map(|(key, default, description)| {
            json!({
                "ParameterKey": key,
                "DefaultValue": default,
                "NoEcho": false,
                "Description": description,
            })
        })
        .collect();
    Ok(json!({
        "Description": summary.description,
        "Parameters": parameters,
    }))
}

// ---------------------------------------------------------------------------
// Parameter decoding
// ---------------------------------------------------------------------------

fn opt<'a>(params: &'a QueryParams, key: &str) -> Option<&'a str> {
    params.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

fn required<'a>(params: &'a QueryParams, key: &str) -> Result<&'a str, MockError> {
    opt(params, key).ok_or_else(|| MockError {
        code: "MissingParameter",
        message: format!("The request must contain the parameter {key}"),
    })
}

/// `<prefix>.member.1`, `<prefix>.member.2`, ... up to the first gap.
fn members(params: &QueryParams, prefix: &str) -> Vec<String> {
    (1..)
        .map_while(|i| params.get(&format!("{prefix}.member.{i}")).cloned())
        .collect()
}

fn parameter_members(params: &QueryParams) -> Vec<(String, String)> {
    (1..)
        .map_while(|i| {
            let key = params.get(&format!("Parameters.member.{i}.ParameterKey"))?;
            let value = params
                .get(&format!("Parameters.member.{i}.ParameterValue"))
                .cloned()
                .unwrap_or_default();
            Some((key.clone(), value))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn envelope(action: &str, result: Value) -> Value {
    let mut response = Map::new();
    response.insert(format!("{action}Result"), result);
    response.insert(
        "ResponseMetadata".to_string(),
        json!({ "RequestId": Uuid::new_v4().to_string() }),
    );
    let mut outer = Map::new();
    outer.insert(format!("{action}Response"), Value::Object(response));
    Value::Object(outer)
}

fn stack_xml(stack: &StoredStack) -> String {
    let mut xml = String::from("<member>");
    push_element(&mut xml, "StackId", &stack.stack_id);
    push_element(&mut xml, "StackName", &stack.stack_name);
    if let Some(description) = &stack.description {
        push_element(&mut xml, "Description", description);
    }
    push_element(&mut xml, "StackStatus", &stack.status);
    push_element(&mut xml, "CreationTime", &stack.creation_time);
    push_element(
        &mut xml,
        "DisableRollback",
        if stack.disable_rollback { "true" } else { "false" },
    );
    if let Some(timeout) = stack.timeout_in_minutes {
        push_element(&mut xml, "TimeoutInMinutes", &timeout.to_string());
    }
    xml.push_str("<NotificationARNs>");
    for arn in &stack.notification_arns {
        push_element(&mut xml, "member", arn);
    }
    xml.push_str("</NotificationARNs><Parameters>");
    for (key, value) in &stack.parameters {
        xml.push_str("<member>");
        push_element(&mut xml, "ParameterKey", key);
        push_element(&mut xml, "ParameterValue", value);
        xml.push_str("</member>");
    }
    xml.push_str("</Parameters><Outputs>");
    for (key, value, description) in &stack.outputs {
        xml.push_str("<member>");
        push_element(&mut xml, "OutputKey", key);
        push_element(&mut xml, "OutputValue", value);
        if let Some(description) = description {
            push_element(&mut xml, "Description", description);
        }
        xml.push_str("</member>");
    }
    xml.push_str("</Outputs></member>");
    xml
}

fn error_xml(err: &MockError) -> String {
    let mut xml = format!("<ErrorResponse xmlns=\"{XMLNS}\"><Error><Type>Sender</Type>");
    push_element(&mut xml, "Code", err.code);
    push_element(&mut xml, "Message", &err.message);
    xml.push_str(&format!("</Error><RequestId>{}</RequestId></ErrorResponse>", Uuid::new_v4()));
    xml
}

fn push_element(xml: &mut String, name: &str, text: &str) {
    xml.push('<');
    xml.push_str(name);
    xml.push('>');
    for c in text.chars() {
        match c {
            '&' => xml.push_str("&amp;"),
            '<' => xml.push_str("&lt;"),
            '>' => xml.push_str("&gt;"),
            '"' => xml.push_str("&quot;"),
            '\'' => xml.push_str("&apos;"),
            c => xml.push(c),
        }
    }
    xml.push_str("</");
    xml.push_str(name);
    xml.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn members_stop_at_first_gap() {
        let p = params(&[
            ("StackStatusFilter.member.1", "CREATE_COMPLETE"),
            ("StackStatusFilter.member.2", "DELETE_COMPLETE"),
            ("StackStatusFilter.member.4", "ROLLBACK_FAILED"),
        ]);
        assert_eq!(members(&p, "StackStatusFilter"), vec!["CREATE_COMPLETE", "DELETE_COMPLETE"]);
        assert!(members(&p, "NotificationARNs").is_empty());
    }

    #[test]
    fn parameter_members_pair_keys_and_values() {
        let p = params(&[
            ("Parameters.member.1.ParameterKey", "Env"),
            ("Parameters.member.1.ParameterValue", "prod"),
            ("Parameters.member.2.ParameterKey", "Size"),
        ]);
        assert_eq!(
            parameter_members(&p),
            vec![
                ("Env".to_string(), "prod".to_string()),
                ("Size".to_string(), String::new())
            ]
        );
    }

    #[test]
    fn envelope_wraps_result() {
        let value = envelope("GetTemplate", json!({"TemplateBody": "{}"}));
        assert_eq!(value["GetTemplateResponse"]["GetTemplateResult"]["TemplateBody"], "{}");
        assert!(value["GetTemplateResponse"]["ResponseMetadata"]["RequestId"].is_string());
    }

    #[test]
    fn element_text_is_escaped() {
        let mut xml = String::new();
        push_element(&mut xml, "Message", "a < b & \"c\"");
        assert_eq!(xml, "<Message>a &lt; b &amp; &quot;c&quot;</Message>");
    }

    #[test]
    fn error_xml_carries_code_and_message() {
        let xml = error_xml(&MockError::validation("Stack with id web does not exist"));
        assert!(xml.contains("<Code>ValidationError</Code>"));
        assert!(xml.contains("<Message>Stack with id web does not exist</Message>"));
    }
}
