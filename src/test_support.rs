//! In-memory backend and fixtures for unit tests.

use crate::downstream::PokemonBackend;
use crate::error::{Error, Result};
use crate::types::{DeleteReceipt, Generation, Pokemon, PokemonInput};
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::Mutex;

pub(crate) fn bulbasaur_input() -> PokemonInput {
    PokemonInput {
        id: "p1".into(),
        name: "Bulbasaur".into(),
        name_jp: "フシギダネ".into(),
        types: vec!["grass".into(), "poison".into()],
        species: Some("Seed".into()),
        height: Some(0.7),
        weight: Some(6.9),
        generation_id: 1,
    }
}

pub(crate) fn bulbasaur() -> Pokemon {
    bulbasaur_input().into()
}

pub(crate) fn pikachu() -> Pokemon {
    Pokemon {
        id: "p25".into(),
        name: "Pikachu".into(),
        name_jp: "ピカチュウ".into(),
        types: vec!["electric".into()],
        species: Some("Mouse".into()),
        height: Some(0.4),
        weight: Some(6.0),
        generation_id: 1,
    }
}

/// Stand-in for the downstream service. Knows generation 1 only.
pub(crate) struct MockBackend {
    pokemon: Mutex<Vec<Pokemon>>,
    generation_fetches: AtomicUsize,
    unavailable: AtomicBool,
    delete_status: AtomicU16,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            pokemon: Mutex::new(Vec::new()),
            generation_fetches: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
            delete_status: AtomicU16::new(200),
        }
    }
}

impl MockBackend {
    pub(crate) fn with_pokemon(pokemon: impl IntoIterator<Item = Pokemon>) -> Self {
        let backend = Self::default();
        backend.pokemon.lock().unwrap().extend(pokemon);
        backend
    }

    pub(crate) fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub(crate) fn set_delete_status(&self, status: u16) {
        self.delete_status.store(status, Ordering::SeqCst);
    }

    pub(crate) fn generation_fetches(&self) -> usize {
        self.generation_fetches.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::DownstreamUnavailable {
                status: Some(503),
                reason: "mock backend is down".into(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl PokemonBackend for MockBackend {
    async fn fetch_all(&self) -> Result<Vec<Pokemon>> {
        self.check()?;
        Ok(self.pokemon.lock().unwrap().clone())
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Pokemon> {
        self.check()?;
        self.pokemon
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("pokemon {id}")))
    }

    async fn create(&self, input: &PokemonInput) -> Result<Pokemon> {
        self.check()?;
        let created = Pokemon::from(input.clone());
        self.pokemon.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: &str, input: &PokemonInput) -> Result<Pokemon> {
        self.check()?;
        let mut pokemon = self.pokemon.lock().unwrap();
        let slot = pokemon
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::NotFound(format!("pokemon {id}")))?;
        *slot = Pokemon::from(input.clone());
        Ok(slot.clone())
    }

    async fn delete(&self, id: &str) -> Result<DeleteReceipt> {
        self.check()?;
        let mut pokemon = self.pokemon.lock().unwrap();
        let before = pokemon.len();
        pokemon.retain(|p| p.id != id);
        if pokemon.len() == before {
            return Err(Error::NotFound(format!("pokemon {id}")));
        }
        Ok(DeleteReceipt {
            status: self.delete_status.load(Ordering::SeqCst),
        })
    }

    async fn fetch_generation(&self, id: i32) -> Result<Generation> {
        self.check()?;
        self.generation_fetches.fetch_add(1, Ordering::SeqCst);
        if id != 1 {
            return Err(Error::NotFound(format!("generation {id}")));
        }
        Ok(Generation {
            id,
            name: Some("generation-i".into()),
            region: Some("kanto".into()),
        })
    }
}
