//! Synchronous client core for the CloudFormation-style stack service.
//!
//! # Overview
//! Builds query-API `HttpRequest` values and parses `HttpResponse` values
//! without touching the network itself (host-does-IO pattern). A `Transport`
//! executes the round trip; signing belongs to that layer.
//!
//! # Design
//! - `StackServiceClient` is immutable after construction. It holds only its
//!   `ClientConfig` and an injected `Diagnostics` sink.
//! - Each action is split into `build_*` (request) and `parse_*` (response),
//!   plus a composed method that drives both through a `Transport`.
//! - Parameters follow the provider's indexed `Prefix.member.N` convention,
//!   see `params`.
//! - Success bodies are returned as untyped JSON, except `DescribeStacks`,
//!   which decodes its XML `<member>` list into typed `Stack` records.

pub mod client;
pub mod config;
pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod params;
pub mod transport;
pub mod types;

pub use client::StackServiceClient;
pub use config::{ClientConfig, ProxyConfig};
pub use diagnostics::{Diagnostics, TracingDiagnostics};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Params};
pub use transport::{Transport, UreqTransport};
pub use types::{
    CreateStackInput, DescribeStackEventsInput, DescribeStackResourcesInput, ListStacksInput, Output,
    Parameter, Stack, StackStatus, TimeoutInMinutes, ValidateTemplateInput,
};
