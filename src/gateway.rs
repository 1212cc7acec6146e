//! Gateway builder and main orchestration

use crate::bus::EventBus;
use crate::config::GatewayConfig;
use crate::downstream::{HttpPokemonClient, PokemonBackend};
use crate::error::{Error, GraphQLError, Result};
use crate::middleware::Middleware;
use crate::orchestrator::{DeleteConfirmation, Orchestrator};
use crate::runtime::ServeMux;
use crate::schema::{GatewaySchema, SchemaBuilder};
use crate::types::Pokemon;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;

/// Main Gateway struct - entry point for the library
pub struct Gateway {
    mux: ServeMux,
    schema: GatewaySchema,
    bus: EventBus<Pokemon>,
}

impl Gateway {
    /// Create a new gateway builder
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    /// Get the ServeMux
    pub fn mux(&self) -> &ServeMux {
        &self.mux
    }

    /// Access the built GraphQL schema
    pub fn schema(&self) -> &GatewaySchema {
        &self.schema
    }

    /// The bus connecting `addPokemon` to `pokemonCreated` subscribers
    pub fn event_bus(&self) -> &EventBus<Pokemon> {
        &self.bus
    }

    /// Convert gateway into Axum router
    pub fn into_router(self) -> Router {
        self.mux.into_router()
    }
}

/// Builder for creating a Gateway
pub struct GatewayBuilder {
    backend: Option<Arc<dyn PokemonBackend>>,
    downstream_url: Option<String>,
    connect_timeout: Option<Duration>,
    bus: Option<EventBus<Pokemon>>,
    delete_confirmation: DeleteConfirmation,
    middlewares: Vec<Arc<dyn Middleware>>,
    error_handler: Option<Arc<dyn Fn(Vec<GraphQLError>) + Send + Sync>>,
    depth_limit: Option<usize>,
    complexity_limit: Option<usize>,
    introspection: bool,
    cors: bool,
}

impl GatewayBuilder {
    /// Create a new gateway builder
    pub fn new() -> Self {
        Self {
            backend: None,
            downstream_url: None,
            connect_timeout: None,
            bus: None,
            delete_confirmation: DeleteConfirmation::default(),
            middlewares: Vec::new(),
            error_handler: None,
            depth_limit: None,
            complexity_limit: None,
            introspection: true,
            cors: false,
        }
    }

    /// Apply settings loaded from configuration.
    pub fn with_config(mut self, config: &GatewayConfig) -> Self {
        self.downstream_url = Some(config.downstream_url.clone());
        self.connect_timeout = config.connect_timeout();
        self.delete_confirmation = config.delete_confirmation;
        self.cors = config.cors;
        self
    }

    /// Talk to the downstream service over HTTP at `url`.
    pub fn with_downstream_url(mut self, url: impl Into<String>) -> Self {
        self.downstream_url = Some(url.into());
        self
    }

    /// Use a custom backend instead of the HTTP client.
    pub fn with_backend(mut self, backend: Arc<dyn PokemonBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Share an existing event bus instead of creating a fresh one.
    pub fn with_event_bus(mut self, bus: EventBus<Pokemon>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn with_delete_confirmation(mut self, mode: DeleteConfirmation) -> Self {
        self.delete_confirmation = mode;
        self
    }

    /// Add middleware
    pub fn add_middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Provide a handler to inspect GraphQL errors raised before execution.
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(Vec<GraphQLError>) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    pub fn limit_depth(mut self, depth: usize) -> Self {
        self.depth_limit = Some(depth);
        self
    }

    pub fn limit_complexity(mut self, complexity: usize) -> Self {
        self.complexity_limit = Some(complexity);
        self
    }

    /// Hide `__schema` / `__type` from clients.
    pub fn disable_introspection(mut self) -> Self {
        self.introspection = false;
        self
    }

    pub fn enable_cors(mut self) -> Self {
        self.cors = true;
        self
    }

    /// Build the gateway
    pub fn build(self) -> Result<Gateway> {
        let backend = match (self.backend, self.downstream_url) {
            (Some(backend), _) => backend,
            (None, Some(url)) => {
                let mut client = HttpPokemonClient::builder(url);
                if let Some(timeout) = self.connect_timeout {
                    client = client.connect_timeout(timeout);
                }
                Arc::new(client.build()?) as Arc<dyn PokemonBackend>
            }
            (None, None) => {
                return Err(Error::Config(
                    "a downstream url or backend is required".into(),
                ))
            }
        };

        let bus = self.bus.unwrap_or_default();
        let orchestrator = Orchestrator::new(backend, bus.clone())
            .with_delete_confirmation(self.delete_confirmation);

        let mut schema_builder = SchemaBuilder::new(orchestrator);
        if let Some(depth) = self.depth_limit {
            schema_builder = schema_builder.limit_depth(depth);
        }
        if let Some(complexity) = self.complexity_limit {
            schema_builder = schema_builder.limit_complexity(complexity);
        }
        if !self.introspection {
            schema_builder = schema_builder.disable_introspection();
        }
        let schema = schema_builder.build();

        let mut mux = ServeMux::new(schema.clone());

        // Add middlewares
        for middleware in self.middlewares {
            mux.add_middleware(middleware);
        }

        if let Some(handler) = self.error_handler {
            mux.set_error_handler_arc(handler);
        }
        mux.set_cors(self.cors);

        Ok(Gateway { mux, schema, bus })
    }

    /// Build and start the gateway server
    pub async fn serve(self, addr: impl Into<String>) -> Result<()> {
        let gateway = self.build()?;
        let addr = addr.into();
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!("Gateway server listening on {}", addr);

        let app = gateway.into_router();
        axum::serve(listener, app).await?;

        Ok(())
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
