//! Runtime support for the gateway - HTTP and WebSocket integration.

use crate::error::{GraphQLError, Result};
use crate::middleware::{Context, Middleware};
use crate::schema::GatewaySchema;
use async_graphql::ServerError;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse, GraphQLSubscription};
use axum::{
    extract::State,
    http::HeaderMap,
    response::{Html, IntoResponse},
    routing::{get_service, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::Instrument;
use tower_http::trace::TraceLayer;

/// ServeMux - main gateway handler
///
/// The `ServeMux` routes GraphQL requests, runs middlewares and executes the
/// schema. Subscriptions are served over WebSocket at `/graphql/ws`; when a
/// client disconnects or completes a subscription its stream is dropped,
/// which removes it from the event bus.
pub struct ServeMux {
    schema: GatewaySchema,
    middlewares: Vec<Arc<dyn Middleware>>,
    error_handler: Option<Arc<dyn Fn(Vec<GraphQLError>) + Send + Sync>>,
    cors: bool,
}

impl ServeMux {
    /// Create a new ServeMux with an already built schema
    pub fn new(schema: GatewaySchema) -> Self {
        Self {
            schema,
            middlewares: Vec::new(),
            error_handler: None,
            cors: false,
        }
    }

    /// Add middleware to the execution pipeline
    ///
    /// Middlewares are executed in the order they are added.
    pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    /// Use middleware (builder pattern)
    pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.add_middleware(middleware);
        self
    }

    /// Set error handler from an `Arc` for cases where the caller already shares ownership.
    pub fn set_error_handler_arc(&mut self, handler: Arc<dyn Fn(Vec<GraphQLError>) + Send + Sync>) {
        self.error_handler = Some(handler);
    }

    /// Set error handler
    pub fn set_error_handler<F>(&mut self, handler: F)
    where
        F: Fn(Vec<GraphQLError>) + Send + Sync + 'static,
    {
        self.set_error_handler_arc(Arc::new(handler));
    }

    /// Answer cross-origin requests permissively.
    pub fn set_cors(&mut self, enabled: bool) {
        self.cors = enabled;
    }

    async fn execute_with_middlewares(
        &self,
        headers: HeaderMap,
        request: GraphQLRequest,
    ) -> Result<async_graphql::Response> {
        let gql_request = request.into_inner();
        let mut ctx = Context::new(headers, gql_request.operation_name.clone());

        for middleware in &self.middlewares {
            middleware.call(&mut ctx).await?;
        }

        // Resolver and downstream logs are attributed to the client's operation.
        let span = tracing::info_span!(
            "graphql",
            operation = ctx.operation_name.as_deref().unwrap_or("-")
        );
        Ok(self.schema.execute(gql_request).instrument(span).await)
    }

    /// Handle GraphQL HTTP request
    ///
    /// 1. Creates a context from headers and the operation name
    /// 2. Runs all middlewares
    /// 3. Executes the GraphQL request inside a span named after the operation
    /// 4. Handles any middleware errors
    pub async fn handle_http(
        &self,
        headers: HeaderMap,
        request: GraphQLRequest,
    ) -> GraphQLResponse {
        match self.execute_with_middlewares(headers, request).await {
            Ok(resp) => resp.into(),
            Err(err) => {
                let gql_err: GraphQLError = err.into();
                if let Some(handler) = &self.error_handler {
                    handler(vec![gql_err.clone()]);
                }
                let server_err = ServerError::new(gql_err.message.clone(), None);
                async_graphql::Response::from_errors(vec![server_err]).into()
            }
        }
    }

    /// Convert to Axum router
    pub fn into_router(self) -> Router {
        let cors = self.cors;
        let state = Arc::new(self);
        let subscription = GraphQLSubscription::new(state.schema.executor());

        let router = Router::new()
            .route(
                "/graphql",
                post(handle_graphql_post).get(graphql_playground),
            )
            .route_service("/graphql/ws", get_service(subscription))
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        if cors {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }
}

impl Clone for ServeMux {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            middlewares: self.middlewares.clone(),
            error_handler: self.error_handler.clone(),
            cors: self.cors,
        }
    }
}

/// Handler for POST requests to /graphql
async fn handle_graphql_post(
    State(mux): State<Arc<ServeMux>>,
    headers: HeaderMap,
    request: GraphQLRequest,
) -> impl IntoResponse {
    mux.handle_http(headers, request).await
}

/// Serve the GraphQL Playground UI for ad-hoc exploration.
async fn graphql_playground() -> impl IntoResponse {
    Html(async_graphql::http::playground_source(
        async_graphql::http::GraphQLPlaygroundConfig::new("/graphql")
            .subscription_endpoint("/graphql/ws"),
    ))
}
