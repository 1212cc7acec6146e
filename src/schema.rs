//! GraphQL schema for the Pokedex gateway.
//!
//! The roots are thin: they pull the [`Orchestrator`] out of the schema data
//! and delegate. Query operations answer with envelopes, mutations with the
//! raw entity, and failures on the mutation path become GraphQL errors carrying
//! `extensions.code`.

use crate::envelope::{PokemonPayload, PokemonsPayload};
use crate::error::Result;
use crate::orchestrator::Orchestrator;
use crate::types::{Generation, Meta, Pokemon, PokemonInput};
use async_graphql::{
    ComplexObject, Context, ErrorExtensions, Object, Schema as AsyncSchema, Subscription,
};
use futures::Stream;

/// Query root
#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// All Pokemon known to the downstream service.
    async fn get_pokemon(&self, ctx: &Context<'_>) -> async_graphql::Result<PokemonsPayload> {
        Ok(orchestrator(ctx)?.get_pokemon().await)
    }

    /// A single Pokemon; a missing id is reported in `errors`.
    async fn get_pokemon_by_id(
        &self,
        ctx: &Context<'_>,
        id: String,
    ) -> async_graphql::Result<PokemonPayload> {
        Ok(orchestrator(ctx)?.get_pokemon_by_id(&id).await)
    }
}

/// Mutation root
#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Create a Pokemon and notify `pokemonCreated` subscribers.
    async fn add_pokemon(
        &self,
        ctx: &Context<'_>,
        input: PokemonInput,
    ) -> async_graphql::Result<Pokemon> {
        extend(orchestrator(ctx)?.add_pokemon(input).await)
    }

    async fn edit_pokemon(
        &self,
        ctx: &Context<'_>,
        input: PokemonInput,
    ) -> async_graphql::Result<Pokemon> {
        extend(orchestrator(ctx)?.edit_pokemon(input).await)
    }

    async fn delete_pokemon(&self, ctx: &Context<'_>, id: String) -> async_graphql::Result<Meta> {
        extend(orchestrator(ctx)?.delete_pokemon(&id).await)
    }
}

/// Subscription root
#[derive(Default)]
pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Every Pokemon created after the subscription starts.
    async fn pokemon_created(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<impl Stream<Item = Pokemon>> {
        Ok(orchestrator(ctx)?.pokemon_created())
    }
}

#[ComplexObject]
impl Pokemon {
    /// Looked up on every access; sibling Pokemon sharing a generation each
    /// trigger their own fetch.
    async fn generation(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<Generation>> {
        extend(orchestrator(ctx)?.generation(self).await)
    }
}

fn orchestrator<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Orchestrator> {
    ctx.data::<Orchestrator>()
}

fn extend<T>(result: Result<T>) -> async_graphql::Result<T> {
    result.map_err(|e| e.extend())
}

/// The concrete async-graphql schema type.
pub type PokedexSchema = AsyncSchema<QueryRoot, MutationRoot, SubscriptionRoot>;

/// Schema wrapper
#[derive(Clone)]
pub struct GatewaySchema {
    inner: PokedexSchema,
}

impl GatewaySchema {
    /// Execute a GraphQL request
    pub async fn execute(
        &self,
        request: impl Into<async_graphql::Request>,
    ) -> async_graphql::Response {
        self.inner.execute(request).await
    }

    /// Start a subscription (or run a query) as a response stream
    pub fn execute_stream(
        &self,
        request: impl Into<async_graphql::Request>,
    ) -> impl Stream<Item = async_graphql::Response> + Send + Unpin {
        self.inner.execute_stream(request)
    }

    /// Access the executor (used for HTTP/WS integration)
    pub fn executor(&self) -> PokedexSchema {
        self.inner.clone()
    }

    /// SDL of the exposed API
    pub fn sdl(&self) -> String {
        self.inner.sdl()
    }
}

/// Schema builder for the gateway
pub struct SchemaBuilder {
    orchestrator: Orchestrator,
    depth_limit: Option<usize>,
    complexity_limit: Option<usize>,
    introspection: bool,
}

impl SchemaBuilder {
    /// Create a new schema builder around the resolver orchestrator
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            depth_limit: None,
            complexity_limit: None,
            introspection: true,
        }
    }

    /// Reject queries nested deeper than `depth`.
    pub fn limit_depth(mut self, depth: usize) -> Self {
        self.depth_limit = Some(depth);
        self
    }

    /// Reject queries whose complexity exceeds `complexity`.
    pub fn limit_complexity(mut self, complexity: usize) -> Self {
        self.complexity_limit = Some(complexity);
        self
    }

    pub fn disable_introspection(mut self) -> Self {
        self.introspection = false;
        self
    }

    pub fn build(self) -> GatewaySchema {
        let mut builder = AsyncSchema::build(QueryRoot, MutationRoot, SubscriptionRoot)
            .data(self.orchestrator);

        if let Some(depth) = self.depth_limit {
            builder = builder.limit_depth(depth);
        }
        if let Some(complexity) = self.complexity_limit {
            builder = builder.limit_complexity(complexity);
        }
        if !self.introspection {
            builder = builder.disable_introspection();
        }

        GatewaySchema {
            inner: builder.finish(),
        }
    }
}
