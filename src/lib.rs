//! # pokedex-gateway
//!
//! A GraphQL gateway in front of a REST Pokemon service, with live
//! subscriptions for newly created Pokemon.
//!
//! ## Features
//!
//! - **Queries** answered with a uniform `{meta, data, errors}` envelope
//! - **Mutations** proxied to the downstream service, returning the raw entity
//! - **Subscriptions**: `pokemonCreated` over WebSocket, fed by an in-process [`EventBus`]
//! - **Lazy fields**: `Pokemon.generation` fetched from the downstream on access
//! - **Middleware**: Extensible pre-execution hook for request logging
//!
//! ## Main Components
//!
//! - [`Gateway`]: The main entry point for creating and running the gateway.
//! - [`GatewayBuilder`]: Configuration builder for the gateway.
//! - [`EventBus`]: Topic-keyed broadcast connecting mutations to subscriptions.
//! - [`Orchestrator`]: Binds every API operation to the client, bus and envelope.
//! - [`HttpPokemonClient`]: Talks to the downstream service.
//!
//! ## Example
//!
//! ```rust,no_run
//! use pokedex_gateway::{Gateway, LoggingMiddleware};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = Gateway::builder()
//!         .with_downstream_url("http://localhost:3002")
//!         .add_middleware(LoggingMiddleware)
//!         .build()?;
//!
//!     let app = gateway.into_router();
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:4000").await?;
//!     axum::serve(listener, app).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod bus;
pub mod config;
pub mod downstream;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod orchestrator;
pub mod runtime;
pub mod schema;
pub mod types;

#[cfg(test)]
mod test_support;

pub use bus::{EventBus, Subscriber, POKEMON_CREATED};
pub use config::GatewayConfig;
pub use downstream::{HttpPokemonClient, PokemonBackend};
pub use envelope::{Envelope, PayloadError, PokemonList, PokemonPayload, PokemonsPayload};
pub use error::{Error, Result};
pub use gateway::{Gateway, GatewayBuilder};
pub use middleware::{Context, LoggingMiddleware, Middleware};
pub use orchestrator::{DeleteConfirmation, Orchestrator};
pub use runtime::ServeMux;
pub use schema::{GatewaySchema, SchemaBuilder};
pub use types::{DeleteReceipt, Generation, Meta, Pokemon, PokemonInput};
