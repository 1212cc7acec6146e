//! Client for the downstream Pokemon service
//!
//! The gateway owns no data. Every read and write is a single HTTP round trip
//! to the service of record, behind the [`PokemonBackend`] trait so resolvers
//! can be exercised against other implementations.

use crate::error::{Error, Result};
use crate::types::{DeleteReceipt, Generation, Pokemon, PokemonInput};
use http::StatusCode;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Operations the gateway needs from the service of record.
///
/// Implementations must not cache: each call reflects the downstream state at
/// the time it is made.
#[async_trait::async_trait]
pub trait PokemonBackend: Send + Sync {
    /// `GET /pokemon`
    async fn fetch_all(&self) -> Result<Vec<Pokemon>>;

    /// `GET /pokemon/{id}`
    async fn fetch_by_id(&self, id: &str) -> Result<Pokemon>;

    /// `POST /pokemon`
    async fn create(&self, input: &PokemonInput) -> Result<Pokemon>;

    /// `PATCH /pokemon/{id}`
    async fn update(&self, id: &str, input: &PokemonInput) -> Result<Pokemon>;

    /// `DELETE /pokemon/{id}`
    async fn delete(&self, id: &str) -> Result<DeleteReceipt>;

    /// `GET /generation/{id}`
    async fn fetch_generation(&self, id: i32) -> Result<Generation>;
}

/// HTTP client for the downstream Pokemon service
///
/// # Example
///
/// ```rust,no_run
/// use pokedex_gateway::HttpPokemonClient;
///
/// # fn example() -> pokedex_gateway::Result<()> {
/// let client = HttpPokemonClient::builder("http://localhost:3002")
///     .connect_timeout(std::time::Duration::from_secs(2))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HttpPokemonClient {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpPokemonClient {
    /// Start building a client with custom transport settings.
    pub fn builder(base_url: impl Into<String>) -> HttpPokemonClientBuilder {
        HttpPokemonClientBuilder::new(base_url)
    }

    /// Create a client with default transport settings.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::builder(base_url).build()
    }

    /// Base URL of the downstream service, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Append `segments` to the base path, percent-encoding each one so an id
    /// can never address a different resource.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Config(format!("{} cannot be a base url", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// URL of a single pokemon. Dot segments would be dropped from the path
    /// and hit the collection instead, so no such entity can exist.
    fn pokemon_url(&self, id: &str) -> Result<Url> {
        if matches!(id, "" | "." | "..") {
            return Err(Error::NotFound(format!("pokemon {id}")));
        }
        self.url(&["pokemon", id])
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T> {
        let response = checked(request, what).await?;
        let status = response.status();
        // An undecodable 2xx body is reported as a bad gateway (502).
        response.json::<T>().await.map_err(|e| {
            tracing::debug!(%status, what, error = %e, "undecodable downstream body");
            Error::unreachable(format!("invalid response body for {what}: {e}"))
        })
    }
}

/// Send the request and map transport failures and error statuses.
async fn checked(request: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::unreachable(format!("{what}: {e}")))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!(%status, what, body = %body, "downstream request failed");

    Err(match status {
        StatusCode::NOT_FOUND => Error::NotFound(what.to_string()),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            Error::MalformedInput(if body.is_empty() {
                format!("{what} rejected with {status}")
            } else {
                body
            })
        }
        _ => Error::DownstreamUnavailable {
            status: Some(status.as_u16()),
            reason: format!("{what} returned {status}"),
        },
    })
}

#[async_trait::async_trait]
impl PokemonBackend for HttpPokemonClient {
    async fn fetch_all(&self) -> Result<Vec<Pokemon>> {
        self.send(self.http.get(self.url(&["pokemon"])?), "pokemon list")
            .await
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Pokemon> {
        let what = format!("pokemon {id}");
        let found: Option<Pokemon> = self
            .send(self.http.get(self.pokemon_url(id)?), &what)
            .await?;
        found.ok_or(Error::NotFound(what))
    }

    async fn create(&self, input: &PokemonInput) -> Result<Pokemon> {
        self.send(
            self.http.post(self.url(&["pokemon"])?).json(input),
            &format!("create pokemon {}", input.id),
        )
        .await
    }

    async fn update(&self, id: &str, input: &PokemonInput) -> Result<Pokemon> {
        self.send(
            self.http.patch(self.pokemon_url(id)?).json(input),
            &format!("pokemon {id}"),
        )
        .await
    }

    async fn delete(&self, id: &str) -> Result<DeleteReceipt> {
        let response = checked(
            self.http.delete(self.pokemon_url(id)?),
            &format!("pokemon {id}"),
        )
        .await?;
        Ok(DeleteReceipt {
            status: response.status().as_u16(),
        })
    }

    async fn fetch_generation(&self, id: i32) -> Result<Generation> {
        let segment = id.to_string();
        self.send(
            self.http.get(self.url(&["generation", segment.as_str()])?),
            &format!("generation {id}"),
        )
        .await
    }
}

impl std::fmt::Debug for HttpPokemonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPokemonClient")
            .field("base_url", &self.base_url())
            .finish()
    }
}

/// Builder for configuring the downstream HTTP client.
pub struct HttpPokemonClientBuilder {
    base_url: String,
    connect_timeout: Option<Duration>,
}

impl HttpPokemonClientBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout: None,
        }
    }

    /// Bound the time spent establishing a TCP connection.
    ///
    /// No overall request timeout is applied; a slow downstream response keeps
    /// the resolver suspended until the transport gives up.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<HttpPokemonClient> {
        let base_url = Url::parse(self.base_url.trim()).map_err(|e| {
            Error::Config(format!("invalid downstream url {:?}: {e}", self.base_url))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "downstream url must be http(s), got {:?}",
                self.base_url
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {e}")))?;

        Ok(HttpPokemonClient { base_url, http })
    }
}
