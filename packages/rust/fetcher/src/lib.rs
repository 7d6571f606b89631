//! Resource fetcher: reads the five backend collections over HTTP.
//!
//! The fetcher never joins anything. It hands back a [`RawSnapshot`] that is
//! either complete or absent: if any collection fails, the whole fetch fails
//! and nothing partial escapes.

use std::collections::HashSet;
use std::time::Duration;

use expertdesk_shared::{
    CareerRecord, ExpertDeskError, ExpertRecord, FetchConfig, MembershipRecord, ProjectRecord,
    RawSnapshot, Resource, Result,
};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};
use url::Url;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Upper bound on followed `next` links per collection.
const MAX_PAGES: usize = 1_000;

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("ExpertDesk/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Listing envelope
// ---------------------------------------------------------------------------

/// A collection response: either a bare array or a paginated envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Paged {
        results: Vec<T>,
        #[serde(default)]
        next: Option<String>,
    },
    Plain(Vec<T>),
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

/// HTTP client for the backend's read endpoints.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: Url,
}

impl HttpFetcher {
    /// Create a fetcher for the given configuration.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.auth_token {
            let mut value = HeaderValue::from_str(token).map_err(|e| {
                ExpertDeskError::config(format!("session token is not a valid header value: {e}"))
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExpertDeskError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Fetch all five collections concurrently.
    ///
    /// Resolves once every request has succeeded, or with the first failure.
    /// Requests still in flight when one fails are dropped.
    #[instrument(skip_all, fields(base_url = %self.base_url))]
    pub async fn fetch_all(&self) -> Result<RawSnapshot> {
        let (experts, careers, projects, pipeline, published) = tokio::try_join!(
            self.fetch_collection::<ExpertRecord>(Resource::Experts),
            self.fetch_collection::<CareerRecord>(Resource::Careers),
            self.fetch_collection::<ProjectRecord>(Resource::Projects),
            self.fetch_collection::<MembershipRecord>(Resource::Pipeline),
            self.fetch_collection::<MembershipRecord>(Resource::Published),
        )?;

        info!(
            experts = experts.len(),
            careers = careers.len(),
            projects = projects.len(),
            pipeline = pipeline.len(),
            published = published.len(),
            "snapshot fetched"
        );

        Ok(RawSnapshot {
            experts,
            careers,
            projects,
            pipeline,
            published,
        })
    }

    /// Fetch one collection, following `next` links until exhausted.
    pub async fn fetch_collection<T: DeserializeOwned>(&self, resource: Resource) -> Result<Vec<T>> {
        let mut url = self
            .base_url
            .join(resource.path())
            .map_err(|e| ExpertDeskError::fetch(resource, format!("bad endpoint URL: {e}")))?;
        let mut seen = HashSet::new();
        let mut rows = Vec::new();

        loop {
            if !seen.insert(url.to_string()) || seen.len() > MAX_PAGES {
                return Err(ExpertDeskError::fetch(
                    resource,
                    format!("pagination does not terminate at {url}"),
                ));
            }

            match self.get_listing::<T>(resource, &url).await? {
                Listing::Plain(items) => {
                    rows.extend(items);
                    break;
                }
                Listing::Paged { results, next } => {
                    rows.extend(results);
                    match next {
                        Some(next) => {
                            url = url.join(&next).map_err(|e| {
                                ExpertDeskError::fetch(resource, format!("bad next link '{next}': {e}"))
                            })?;
                        }
                        None => break,
                    }
                }
            }
        }

        debug!(%resource, count = rows.len(), "collection fetched");
        Ok(rows)
    }

    async fn get_listing<T: DeserializeOwned>(
        &self,
        resource: Resource,
        url: &Url,
    ) -> Result<Listing<T>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ExpertDeskError::fetch(resource, format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExpertDeskError::fetch(resource, format!("{url}: HTTP {status}")));
        }

        response
            .json::<Listing<T>>()
            .await
            .map_err(|e| ExpertDeskError::fetch(resource, format!("{url}: undecodable body: {e}")))
    }
}
