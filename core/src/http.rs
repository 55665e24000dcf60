//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe query-API requests and responses as plain data. The
//! core crate builds `HttpRequest` values and parses `HttpResponse` values;
//! executing the round trip (and signing it) belongs to a `Transport`.
//!
//! Parameters are kept in a `BTreeMap` so the encoded order is stable, which
//! is also the canonical order request signers expect.

use std::collections::BTreeMap;
use std::fmt;

/// Flat, string-keyed parameter mapping sent with every request.
pub type Params = BTreeMap<String, String>;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A query-API request described as plain data.
///
/// `params` already contains the `Action` and `Version` envelope entries. For
/// `GET` the transport sends them as a query string, for `POST` as an
/// urlencoded form body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub action: String,
    pub params: Params,
}

impl HttpRequest {
    /// Look up a single encoded parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Build a response with no headers, the shape most tests need.
    pub fn new(status: u16, reason: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            headers: Vec::new(),
            body: body.into(),
        }
    }
}
