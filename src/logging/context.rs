//! Execution context supplying ambient values to log records
//!
//! Builders read the request correlation id and the current time from an
//! explicit context object instead of hidden global state, so tests can pin
//! both.

use chrono::Utc;
use uuid::Uuid;

/// Supplies the ambient request id and clock
pub trait ExecutionContext: Send + Sync {
    /// Current request correlation id, if one exists
    fn request_id(&self) -> Option<String>;

    /// Current time as epoch milliseconds
    fn now_millis(&self) -> i64;
}

/// Wall-clock context with a fixed request id for the lifetime of the value
#[derive(Debug, Clone)]
pub struct SystemContext {
    request_id: Option<String>,
}

impl SystemContext {
    /// Creates a context with a freshly generated request id
    pub fn new() -> Self {
        Self {
            request_id: Some(Uuid::new_v4().to_string()),
        }
    }

    /// Creates a context that correlates with an existing request id
    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
        }
    }

    /// Creates a context without a request id
    pub fn anonymous() -> Self {
        Self { request_id: None }
    }
}

impl Default for SystemContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContext for SystemContext {
    fn request_id(&self) -> Option<String> {
        self.request_id.clone()
    }

    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Context with a pinned clock, for deterministic records
#[derive(Debug, Clone)]
pub struct FixedContext {
    pub request_id: Option<String>,
    pub now_millis: i64,
}

impl FixedContext {
    pub fn new(request_id: Option<&str>, now_millis: i64) -> Self {
        Self {
            request_id: request_id.map(str::to_string),
            now_millis,
        }
    }
}

impl ExecutionContext for FixedContext {
    fn request_id(&self) -> Option<String> {
        self.request_id.clone()
    }

    fn now_millis(&self) -> i64 {
        self.now_millis
    }
}
