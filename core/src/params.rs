//! Query-API parameter encoding.
//!
//! Structured inputs are flattened into the provider's indexed naming
//! convention: list entries become `<Prefix>.member.<i>` with `i` starting at
//! 1 and following input order.

use crate::error::ApiError;
use crate::http::Params;
use crate::types::{Parameter, TimeoutInMinutes};

/// Encode a boolean the way the query API expects it.
pub fn encode_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Insert `key` only when `value` is present and non-empty.
pub fn insert_if_present(params: &mut Params, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        params.insert(key.to_string(), value.to_string());
    }
}

/// Encode scalar list entries as `<prefix>.member.<i>`.
pub fn build_list_params<S: AsRef<str>>(params: &mut Params, items: &[S], prefix: &str) {
    for (i, item) in items.iter().enumerate() {
        params.insert(format!("{prefix}.member.{}", i + 1), item.as_ref().to_string());
    }
}

/// Encode template parameters as `Parameters.member.<i>.ParameterKey` /
/// `Parameters.member.<i>.ParameterValue`.
pub fn build_parameter_params(params: &mut Params, parameters: &[Parameter]) {
    for (i, parameter) in parameters.iter().enumerate() {
        let index = i + 1;
        params.insert(
            format!("Parameters.member.{index}.ParameterKey"),
            parameter.key.clone(),
        );
        params.insert(
            format!("Parameters.member.{index}.ParameterValue"),
            parameter.value.clone(),
        );
    }
}

/// Coerce a timeout to whole minutes. `Ok(None)` means zero, which is
/// encoded as absent.
pub fn encode_timeout(timeout: &TimeoutInMinutes) -> Result<Option<u64>, ApiError> {
    let minutes = match timeout {
        TimeoutInMinutes::Minutes(minutes) => *minutes,
        TimeoutInMinutes::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            let parsed: i64 = text.parse().map_err(|_| {
                ApiError::encoding("TimeoutInMinutes", format!("{text:?} is not an integer"))
            })?;
            u64::try_from(parsed).map_err(|_| {
                ApiError::encoding("TimeoutInMinutes", format!("{parsed} is negative"))
            })?
        }
    };
    Ok((minutes != 0).then_some(minutes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_encodes_as_words() {
        assert_eq!(encode_bool(true), "true");
        assert_eq!(encode_bool(false), "false");
    }

    #[test]
    fn insert_if_present_skips_none_and_empty() {
        let mut params = Params::new();
        insert_if_present(&mut params, "NextToken", None);
        insert_if_present(&mut params, "StackName", Some(""));
        assert!(params.is_empty());
        insert_if_present(&mut params, "StackName", Some("web"));
        assert_eq!(params.get("StackName").map(String::as_str), Some("web"));
    }

    #[test]
    fn list_params_are_one_indexed_in_order() {
        let mut params = Params::new();
        build_list_params(
            &mut params,
            &["CREATE_COMPLETE", "DELETE_COMPLETE"],
            "StackStatusFilter",
        );
        assert_eq!(params.len(), 2);
        assert_eq!(params["StackStatusFilter.member.1"], "CREATE_COMPLETE");
        assert_eq!(params["StackStatusFilter.member.2"], "DELETE_COMPLETE");
    }

    #[test]
    fn empty_list_adds_nothing() {
        let mut params = Params::new();
        build_list_params::<&str>(&mut params, &[], "NotificationARNs");
        build_parameter_params(&mut params, &[]);
        assert!(params.is_empty());
    }

    #[test]
    fn parameter_pairs_keep_caller_order() {
        let parameters: Vec<Parameter> = (1..=12)
            .map(|i| Parameter::new(format!("Key{i}"), format!("Val{i}")))
            .collect();
        let mut params = Params::new();
        build_parameter_params(&mut params, &parameters);

        assert_eq!(params.len(), 24);
        for i in 1..=12 {
            assert_eq!(params[&format!("Parameters.member.{i}.ParameterKey")], format!("Key{i}"));
            assert_eq!(params[&format!("Parameters.member.{i}.ParameterValue")], format!("Val{i}"));
        }
    }

    #[test]
    fn timeout_coercion() {
        assert_eq!(encode_timeout(&TimeoutInMinutes::Minutes(30)).unwrap(), Some(30));
        assert_eq!(encode_timeout(&TimeoutInMinutes::Minutes(0)).unwrap(), None);
        assert_eq!(encode_timeout(&" 15 ".into()).unwrap(), Some(15));
        assert_eq!(encode_timeout(&"0".into()).unwrap(), None);
    }

    #[test]
    fn non_numeric_timeout_is_an_encoding_error() {
        let err = encode_timeout(&"soon".into()).unwrap_err();
        assert!(matches!(
            err,
            ApiError::EncodingError { field: "TimeoutInMinutes", .. }
        ));
        let err = encode_timeout(&"-5".into()).unwrap_err();
        assert!(matches!(err, ApiError::EncodingError { .. }));
    }
}
