//! Outbound request descriptors and raw responses.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Name of the authorization header.
pub const AUTHORIZATION: &str = "Authorization";

/// HTTP verbs used against the tracking API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Returns the verb as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound call plus its single-use retry marker.
///
/// Only the authenticated client sets the marker, by consuming the descriptor
/// into its retry copy. Callers build descriptors with the marker unset.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: HttpMethod,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    headers: BTreeMap<String, String>,
    retried: bool,
}

impl RequestDescriptor {
    /// Creates a descriptor for a path relative to the API base URL.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: BTreeMap::new(),
            retried: false,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes a value as the JSON body.
    ///
    /// # Errors
    /// Returns error if the value cannot be represented as JSON.
    pub fn with_json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self, serde_json::Error> {
        Ok(self.with_body(serde_json::to_value(body)?))
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Sets a header. Names are matched case-insensitively.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers
            .retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
        self
    }

    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Looks up a header case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns whether the path stays under the API base URL.
    ///
    /// Paths naming their own scheme and host are never joined onto the base.
    #[must_use]
    pub fn is_relative(&self) -> bool {
        !self.path.contains("://") && !self.path.starts_with("//")
    }

    /// Returns whether this descriptor already used its retry.
    #[must_use]
    pub const fn is_retried(&self) -> bool {
        self.retried
    }

    /// Consumes the descriptor and returns the copy used for the one retry.
    #[must_use]
    pub(crate) fn into_retry(mut self) -> Self {
        self.retried = true;
        self
    }
}

/// Raw response handed back by a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed body; `Null` when empty.
    pub body: Value,
}

impl ApiResponse {
    #[must_use]
    pub const fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Returns whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns whether the status is 401.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_descriptor_is_not_retried() {
        let descriptor = RequestDescriptor::get("/batches/");
        assert!(!descriptor.is_retried());
        assert!(descriptor.into_retry().is_retried());
    }

    #[test]
    fn test_relative_paths() {
        assert!(RequestDescriptor::get("/batches/").is_relative());
        assert!(RequestDescriptor::get("me/").is_relative());
        assert!(!RequestDescriptor::get("https://evil.example/x/").is_relative());
        assert!(!RequestDescriptor::get("//evil.example/x/").is_relative());
    }

    #[test]
    fn test_header_replaced_case_insensitively() {
        let descriptor = RequestDescriptor::get("/me/")
            .with_header("authorization", "Bearer A")
            .with_header(AUTHORIZATION, "Bearer B");

        assert_eq!(descriptor.headers().len(), 1);
        assert_eq!(descriptor.header("AUTHORIZATION"), Some("Bearer B"));
    }

    #[test]
    fn test_with_json_body() {
        let descriptor = RequestDescriptor::post("/bags/")
            .with_json(&json!({"state": "sealed"}))
            .unwrap();
        assert_eq!(descriptor.body(), Some(&json!({"state": "sealed"})));
        assert_eq!(descriptor.method(), HttpMethod::Post);
    }

    #[test]
    fn test_response_classification() {
        assert!(ApiResponse::new(204, Value::Null).is_success());
        assert!(ApiResponse::new(401, Value::Null).is_unauthorized());
        assert!(!ApiResponse::new(403, Value::Null).is_success());
    }
}
