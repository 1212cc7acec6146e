//! Domain types exchanged with the downstream service and exposed over GraphQL

use async_graphql::{InputObject, SimpleObject};
use serde::{Deserialize, Deserializer, Serialize};

/// A Pokemon as stored by the downstream service.
///
/// Only transient copies live in the gateway; they exist for the duration of
/// a single resolver invocation. The `generation` field is resolved lazily in
/// [`crate::schema`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
#[graphql(complex)]
pub struct Pokemon {
    pub id: String,
    pub name: String,

    /// Localized (Japanese) name
    #[serde(rename = "nameJP")]
    #[graphql(name = "nameJP")]
    pub name_jp: String,

    /// Ordered type tags, e.g. `["grass", "poison"]`. Absent or `null` on
    /// the wire reads as empty.
    #[serde(rename = "type", default, deserialize_with = "null_as_empty")]
    #[graphql(name = "type")]
    pub types: Vec<String>,

    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,

    #[serde(rename = "generationId")]
    pub generation_id: i32,
}

/// Input for `addPokemon` / `editPokemon`; mirrors [`Pokemon`] without the
/// derived `generation` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, InputObject)]
pub struct PokemonInput {
    pub id: String,
    pub name: String,

    #[serde(rename = "nameJP")]
    #[graphql(name = "nameJP")]
    pub name_jp: String,

    #[serde(rename = "type", default, deserialize_with = "null_as_empty")]
    #[graphql(name = "type", default)]
    pub types: Vec<String>,

    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,

    #[serde(rename = "generationId")]
    pub generation_id: i32,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl From<PokemonInput> for Pokemon {
    fn from(input: PokemonInput) -> Self {
        Self {
            id: input.id,
            name: input.name,
            name_jp: input.name_jp,
            types: input.types,
            species: input.species,
            height: input.height,
            weight: input.weight,
            generation_id: input.generation_id,
        }
    }
}

/// A Pokemon generation, looked up by id on every `Pokemon.generation` access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
pub struct Generation {
    pub id: i32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

/// Outcome metadata: the `meta` part of envelopes and the `deletePokemon` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
pub struct Meta {
    pub status: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Meta {
    pub fn ok() -> Self {
        Self::with_status(200)
    }

    pub fn with_status(status: u16) -> Self {
        Self {
            status: i32::from(status),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// What the downstream reported for a successful delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteReceipt {
    pub status: u16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pokemon_uses_downstream_wire_names() {
        let pokemon: Pokemon = serde_json::from_value(json!({
            "id": "p1",
            "name": "Bulbasaur",
            "nameJP": "フシギダネ",
            "type": ["grass", "poison"],
            "species": "Seed",
            "height": 0.7,
            "weight": 6.9,
            "generationId": 1
        }))
        .expect("valid pokemon");

        assert_eq!(pokemon.name_jp, "フシギダネ");
        assert_eq!(pokemon.types, vec!["grass", "poison"]);
        assert_eq!(pokemon.generation_id, 1);

        let back = serde_json::to_value(&pokemon).expect("serializes");
        assert_eq!(back["nameJP"], json!("フシギダネ"));
        assert_eq!(back["generationId"], json!(1));
    }

    #[test]
    fn optional_attributes_default_when_absent() {
        let pokemon: Pokemon = serde_json::from_value(json!({
            "id": "p25",
            "name": "Pikachu",
            "nameJP": "ピカチュウ",
            "generationId": 1
        }))
        .expect("valid pokemon");

        assert!(pokemon.types.is_empty());
        assert_eq!(pokemon.species, None);
        assert_eq!(pokemon.height, None);
    }

    #[test]
    fn null_type_reads_as_empty() {
        let pokemon: Pokemon = serde_json::from_value(json!({
            "id": "p132",
            "name": "Ditto",
            "nameJP": "メタモン",
            "type": null,
            "generationId": 1
        }))
        .expect("null type is accepted");
        assert!(pokemon.types.is_empty());

        let input: PokemonInput = serde_json::from_value(json!({
            "id": "p132",
            "name": "Ditto",
            "nameJP": "メタモン",
            "type": null,
            "generationId": 1
        }))
        .expect("null type is accepted");
        assert!(input.types.is_empty());
    }

    #[test]
    fn generation_ignores_unknown_attributes() {
        let generation: Generation =
            serde_json::from_value(json!({ "id": 1, "name": "generation-i", "games": 3 }))
                .expect("valid generation");

        assert_eq!(generation.id, 1);
        assert_eq!(generation.name.as_deref(), Some("generation-i"));
        assert_eq!(generation.region, None);
    }
}
