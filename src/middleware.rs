//! Middleware support for the gateway

use crate::error::Result;
use axum::http::HeaderMap;

/// Context passed to middleware
///
/// Built once per HTTP request. Middlewares share data through `extensions`;
/// the operation name also labels the span the request executes in.
#[derive(Debug, Default)]
pub struct Context {
    /// Request headers
    pub headers: HeaderMap,

    /// Operation name sent by the client, if any
    pub operation_name: Option<String>,

    /// Additional context data
    pub extensions: std::collections::HashMap<String, serde_json::Value>,
}

impl Context {
    pub fn new(headers: HeaderMap, operation_name: Option<String>) -> Self {
        Self {
            headers,
            operation_name,
            extensions: std::collections::HashMap::new(),
        }
    }

    /// Insert extension data
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.extensions.insert(key.into(), value);
    }

    /// Get extension data
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.extensions.get(key)
    }
}

/// Middleware trait for processing requests
///
/// Middleware runs before the GraphQL engine sees an HTTP request. Returning
/// an error short-circuits the request into a GraphQL error response.
///
/// # Example
///
/// ```rust
/// use pokedex_gateway::middleware::{Context, Middleware};
/// use pokedex_gateway::Result;
///
/// struct Stamp;
///
/// #[async_trait::async_trait]
/// impl Middleware for Stamp {
///     async fn call(&self, ctx: &mut Context) -> Result<()> {
///         ctx.insert("stamped", serde_json::json!(true));
///         Ok(())
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait Middleware: Send + Sync {
    /// Process the request context
    async fn call(&self, ctx: &mut Context) -> Result<()>;
}

/// Logging middleware
///
/// Logs incoming GraphQL requests using the `tracing` crate.
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware;

#[async_trait::async_trait]
impl Middleware for LoggingMiddleware {
    async fn call(&self, ctx: &mut Context) -> Result<()> {
        let user_agent = ctx
            .headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::debug!(
            operation = ctx.operation_name.as_deref().unwrap_or("-"),
            user_agent,
            "processing GraphQL request"
        );
        Ok(())
    }
}
