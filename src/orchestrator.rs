//! Resolver orchestration
//!
//! Binds each API operation to the downstream client, the event bus and the
//! envelope normalizer. The GraphQL roots in [`crate::schema`] are thin
//! wrappers around these methods.
//!
//! | Operation            | Steps                                     | Result                 |
//! |----------------------|-------------------------------------------|------------------------|
//! | `getPokemon`         | fetch all, normalize                      | [`PokemonsPayload`]    |
//! | `getPokemonById`     | fetch one, normalize                      | [`PokemonPayload`]     |
//! | `addPokemon`         | create, publish on [`POKEMON_CREATED`]    | raw [`Pokemon`]        |
//! | `editPokemon`        | update                                    | raw [`Pokemon`]        |
//! | `deletePokemon`      | delete                                    | [`Meta`] confirmation  |
//! | `pokemonCreated`     | subscribe to [`POKEMON_CREATED`]          | [`Subscriber`] stream  |
//! | `Pokemon.generation` | fetch generation of the parent            | [`Generation`]         |
//!
//! Queries are wrapped in an [`Envelope`](crate::envelope::Envelope); mutations
//! return the raw entity and surface failures as operation errors.

use crate::bus::{EventBus, Subscriber, POKEMON_CREATED};
use crate::downstream::PokemonBackend;
use crate::envelope::{Envelope, PokemonPayload, PokemonsPayload};
use crate::error::{Error, Result};
use crate::types::{Generation, Meta, Pokemon, PokemonInput};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

/// How `deletePokemon` reports a successful downstream delete.
///
/// Parsed case-insensitively, whether it comes from a config file or the
/// environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum DeleteConfirmation {
    /// Always `{status: 200, message: "success"}`, whatever 2xx the
    /// downstream answered with. Existing clients rely on this reply.
    #[default]
    Fixed,
    /// Echo the downstream status code.
    Reported,
}

impl FromStr for DeleteConfirmation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "reported" => Ok(Self::Reported),
            other => Err(Error::Config(format!(
                "unknown delete confirmation mode {other:?}, expected \"fixed\" or \"reported\""
            ))),
        }
    }
}

impl TryFrom<String> for DeleteConfirmation {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Dispatches API operations. Cheap to clone.
#[derive(Clone)]
pub struct Orchestrator {
    backend: Arc<dyn PokemonBackend>,
    bus: EventBus<Pokemon>,
    delete_confirmation: DeleteConfirmation,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn PokemonBackend>, bus: EventBus<Pokemon>) -> Self {
        Self {
            backend,
            bus,
            delete_confirmation: DeleteConfirmation::default(),
        }
    }

    pub fn with_delete_confirmation(mut self, mode: DeleteConfirmation) -> Self {
        self.delete_confirmation = mode;
        self
    }

    pub fn event_bus(&self) -> &EventBus<Pokemon> {
        &self.bus
    }

    pub async fn get_pokemon(&self) -> PokemonsPayload {
        normalize("getPokemon", self.backend.fetch_all().await)
    }

    pub async fn get_pokemon_by_id(&self, id: &str) -> PokemonPayload {
        normalize("getPokemonById", self.backend.fetch_by_id(id).await)
    }

    /// Create downstream, then announce the created entity to subscribers.
    pub async fn add_pokemon(&self, input: PokemonInput) -> Result<Pokemon> {
        let created = self.backend.create(&input).await?;
        let delivered = self.bus.publish(POKEMON_CREATED, created.clone());
        tracing::debug!(id = %created.id, delivered, "pokemon created");
        Ok(created)
    }

    pub async fn edit_pokemon(&self, input: PokemonInput) -> Result<Pokemon> {
        self.backend.update(&input.id, &input).await
    }

    pub async fn delete_pokemon(&self, id: &str) -> Result<Meta> {
        let receipt = self.backend.delete(id).await?;
        Ok(match self.delete_confirmation {
            DeleteConfirmation::Fixed => Meta::ok().with_message("success"),
            DeleteConfirmation::Reported => Meta::with_status(receipt.status).with_message("deleted"),
        })
    }

    pub fn pokemon_created(&self) -> Subscriber<Pokemon> {
        self.bus.subscribe(POKEMON_CREATED)
    }

    /// Resolve the generation of `pokemon`. Not memoized: every call is a
    /// downstream round trip. A missing generation resolves to `None`.
    pub async fn generation(&self, pokemon: &Pokemon) -> Result<Option<Generation>> {
        match self.backend.fetch_generation(pokemon.generation_id).await {
            Ok(generation) => Ok(Some(generation)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("bus", &self.bus)
            .field("delete_confirmation", &self.delete_confirmation)
            .finish()
    }
}

fn normalize<T: async_graphql::OutputType>(operation: &str, result: Result<T>) -> Envelope<T> {
    if let Err(err) = &result {
        tracing::warn!(operation, error = %err, "downstream failure reported in envelope");
    }
    Envelope::normalize(result)
}
