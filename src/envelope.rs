//! `{meta, data, errors}` result envelope used by the query operations.

use crate::error::{Error, Result};
use crate::types::{Meta, Pokemon};
use async_graphql::{OutputType, SimpleObject};

/// One entry of an envelope's `errors` list.
#[derive(Debug, Clone, PartialEq, Eq, SimpleObject)]
#[graphql(name = "Error")]
pub struct PayloadError {
    pub code: String,
    pub message: String,
}

impl From<&Error> for PayloadError {
    fn from(err: &Error) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Result list of `getPokemon`, named so it can parameterize [`Envelope`].
pub type PokemonList = Vec<Pokemon>;

/// Normalized query result.
///
/// `errors` is always present. On success it is empty and `meta.status` is
/// 200; on failure `data` is null and `meta.status` carries the failure's
/// status code.
#[derive(Debug, Clone, SimpleObject)]
#[graphql(
    concrete(name = "PokemonPayload", params(Pokemon)),
    concrete(name = "PokemonsPayload", params(PokemonList))
)]
pub struct Envelope<T: OutputType> {
    pub meta: Meta,
    pub data: Option<T>,
    pub errors: Vec<PayloadError>,
}

pub type PokemonPayload = Envelope<Pokemon>;
pub type PokemonsPayload = Envelope<PokemonList>;

impl<T: OutputType> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            meta: Meta::ok(),
            data: Some(data),
            errors: Vec::new(),
        }
    }

    pub fn failure(err: &Error) -> Self {
        Self {
            meta: Meta::with_status(err.status_code()),
            data: None,
            errors: vec![PayloadError::from(err)],
        }
    }

    /// Wrap a downstream result.
    pub fn normalize(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => Self::failure(&err),
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}
