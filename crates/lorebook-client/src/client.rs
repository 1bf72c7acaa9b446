//! HTTP implementation of the fetch boundary

use std::time::Duration;

use async_trait::async_trait;
use lorebook_core::{CharacterSummary, SearchParams};
use lorebook_search::{FetchError, FetchPort};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{ClientError, Result};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Path of the character listing, relative to the base URL
const SEARCH_PATH: &str = "character/";

/// Client for the remote character directory
///
/// One search is an HTTPS GET against `<base>/character/` with `name`,
/// `status`, `species` and `type` query parameters, each omitted when the
/// corresponding input is at its default. The directory answers a query that
/// matches nothing with HTTP 404; that is decoded as an empty result list,
/// not a failure.
pub struct CharacterClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CharacterClient {
    /// Build a client for the given directory base URL
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Build a client with an explicit per-request timeout
    pub fn with_timeout(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let mut base_url: Url = base_url
            .as_ref()
            .parse()
            .map_err(|e| ClientError::InvalidBaseUrl(format!("{}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }
        // Joining relative paths drops the last segment without this
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Http(e.to_string()))?;

        debug!("Character directory client for {}", base_url);

        Ok(Self { http, base_url })
    }

    /// The directory base URL
    pub fn url(&self) -> &Url {
        &self.base_url
    }

    fn search_url(&self, params: &SearchParams) -> std::result::Result<Url, url::ParseError> {
        let mut url = self.base_url.join(SEARCH_PATH)?;

        let mut pairs: Vec<(&str, String)> = Vec::new();
        if !params.query().is_empty() {
            pairs.push(("name", params.query().to_string()));
        }
        if let Some(status) = params.filters().status.query_value() {
            pairs.push(("status", status.to_string()));
        }
        if let Some(species) = &params.filters().species {
            pairs.push(("species", species.clone()));
        }
        if let Some(kind) = &params.filters().kind {
            pairs.push(("type", kind.clone()));
        }
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        Ok(url)
    }
}

#[async_trait]
impl FetchPort for CharacterClient {
    async fn search(
        &self,
        params: &SearchParams,
    ) -> std::result::Result<Vec<CharacterSummary>, FetchError> {
        let url = self
            .search_url(params)
            .map_err(|e| FetchError::Transport(format!("Invalid request URL: {}", e)))?;
        debug!(%url, "searching character directory");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(format!("Network error: {}", e)))?;

        // "Nothing matched" is signaled as 404 with an error body
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(FetchError::RemoteStatus(response.status().as_u16()));
        }

        let page: PageEnvelope = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(page
            .results
            .into_iter()
            .map(CharacterRecord::into_summary)
            .collect())
    }
}

/// One page of the directory's paginated listing
#[derive(Debug, Deserialize)]
struct PageEnvelope {
    results: Vec<CharacterRecord>,
}

/// Wire shape of one character entry
#[derive(Debug, Deserialize)]
struct CharacterRecord {
    id: u64,
    name: String,
    species: String,
    status: String,
    origin: LocationRef,
    image: String,
    /// The directory sends an empty string when there is no sub-type
    #[serde(rename = "type", default)]
    kind: String,
    created: String,
}

#[derive(Debug, Deserialize)]
struct LocationRef {
    name: String,
}

impl CharacterRecord {
    fn into_summary(self) -> CharacterSummary {
        CharacterSummary {
            id: self.id,
            name: self.name,
            species: self.species,
            status: self.status,
            origin: self.origin.name,
            image: self.image,
            kind: if self.kind.is_empty() {
                None
            } else {
                Some(self.kind)
            },
            created: self.created,
        }
    }
}
