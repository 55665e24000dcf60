//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, the exact parameter map the request
//! must carry, a simulated response, and the expected parse result. Parsed
//! JSON is compared as values, not strings.

use cfn_core::{
    ApiError, ClientConfig, CreateStackInput, HttpMethod, HttpResponse, ListStacksInput, Params, Stack,
    StackServiceClient,
};

fn client() -> StackServiceClient {
    StackServiceClient::new(ClientConfig::default())
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        other => panic!("unknown method: {other}"),
    }
}

fn expected_params(expected_req: &serde_json::Value) -> Params {
    serde_json::from_value(expected_req["params"].clone()).unwrap()
}

fn simulated(sim: &serde_json::Value) -> HttpResponse {
    HttpResponse::new(
        sim["status"].as_u64().unwrap() as u16,
        sim["reason"].as_str().unwrap(),
        sim["body"].as_str().unwrap(),
    )
}

// ---------------------------------------------------------------------------
// CreateStack
// ---------------------------------------------------------------------------

#[test]
fn create_stack_test_vectors() {
    let raw = include_str!("../../test-vectors/create_stack.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input: CreateStackInput = serde_json::from_value(case["input"].clone()).unwrap();
        let expected_req = &case["expected_request"];

        // Verify build
        let req = c.build_create_stack(&input).unwrap();
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.params, expected_params(expected_req), "{name}: params");

        // Verify parse
        let value = c.parse_create_stack(simulated(&case["simulated_response"])).unwrap();
        assert_eq!(value, case["expected_result"], "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// ListStacks
// ---------------------------------------------------------------------------

#[test]
fn list_stacks_test_vectors() {
    let raw = include_str!("../../test-vectors/list_stacks.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input: ListStacksInput = serde_json::from_value(case["input"].clone()).unwrap();
        let expected_req = &case["expected_request"];

        let req = c.build_list_stacks(&input);
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.params, expected_params(expected_req), "{name}: params");

        let value = c.parse_list_stacks(simulated(&case["simulated_response"])).unwrap();
        assert_eq!(value, case["expected_result"], "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// DescribeStacks
// ---------------------------------------------------------------------------

#[test]
fn describe_stacks_test_vectors() {
    let raw = include_str!("../../test-vectors/describe_stacks.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let expected_req = &case["expected_request"];

        let req = c.build_describe_stacks(case["input_stack"].as_str());
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.params, expected_params(expected_req), "{name}: params");

        let stacks = c.parse_describe_stacks(simulated(&case["simulated_response"])).unwrap();
        let expected: Vec<Stack> = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(stacks, expected, "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn error_test_vectors() {
    let raw = include_str!("../../test-vectors/errors.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let sim = &case["response"];
        let response = simulated(sim);

        let err = match case["action"].as_str().unwrap() {
            "DeleteStack" => c.parse_delete_stack(response).unwrap_err(),
            "DescribeStacks" => c.parse_describe_stacks(response).unwrap_err(),
            "ListStacks" => c.parse_list_stacks(response).unwrap_err(),
            "GetTemplate" => c.parse_get_template(response).unwrap_err(),
            "ValidateTemplate" => c.parse_validate_template(response).unwrap_err(),
            other => panic!("{name}: unknown action: {other}"),
        };

        match &err {
            ApiError::ResponseError { status, reason, body } => {
                assert_eq!(u64::from(*status), sim["status"].as_u64().unwrap(), "{name}: status");
                assert_eq!(reason, sim["reason"].as_str().unwrap(), "{name}: reason");
                assert_eq!(body, sim["body"].as_str().unwrap(), "{name}: body");
            }
            other => panic!("{name}: unexpected error: {other:?}"),
        }
        assert_eq!(err.error_code().as_deref(), case["expected_code"].as_str(), "{name}: code");
    }
}
