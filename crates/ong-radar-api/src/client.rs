use std::{future::Future, sync::Arc};

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::{ApiConfig, ApiError, OrganizationSummary, QueryDescriptor, Result};

/// Anything able to run an organization search.
///
/// Implementations must honour `cancel`: once it fires, the returned future
/// settles with [`ApiError::Cancelled`] and does nothing else. They must not
/// retry on their own.
pub trait OrganizationSearch: Send + Sync + 'static {
    fn search(
        &self,
        query: &QueryDescriptor,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<Vec<OrganizationSummary>>> + Send;
}

impl<T: OrganizationSearch> OrganizationSearch for Arc<T> {
    fn search(
        &self,
        query: &QueryDescriptor,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<Vec<OrganizationSummary>>> + Send {
        (**self).search(query, cancel)
    }
}

/// [`OrganizationSearch`] over HTTP against `GET {base_url}/ongs/search`.
///
/// No timeout is applied: a request that hangs stays pending until it is
/// cancelled.
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    client: Client,
    config: ApiConfig,
}

impl HttpSearchClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder().user_agent(&config.user_agent).build()?;
        Ok(Self { client, config })
    }

    /// Reuse an existing `reqwest` client, e.g. one shared with other services.
    pub const fn with_client(client: Client, config: ApiConfig) -> Self {
        Self { client, config }
    }

    pub const fn config(&self) -> &ApiConfig {
        &self.config
    }

    async fn fetch(&self, query: &QueryDescriptor) -> Result<Vec<OrganizationSummary>> {
        let response = self
            .client
            .get(self.config.search_url())
            .query(&query.query_pairs())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Search endpoint returned an error status");
            return Err(ApiError::Status(status));
        }

        let organizations: Vec<OrganizationSummary> = response.json().await?;
        debug!(count = organizations.len(), "Search page received");
        Ok(organizations)
    }
}

impl OrganizationSearch for HttpSearchClient {
    #[instrument(
        name = "Search organizations",
        skip_all,
        fields(query = %query.to_query_string()),
        level = "debug"
    )]
    async fn search(
        &self,
        query: &QueryDescriptor,
        cancel: CancellationToken,
    ) -> Result<Vec<OrganizationSummary>> {
        // Dropping the fetch future aborts the underlying connection.
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("Search request aborted");
                Err(ApiError::Cancelled)
            }
            result = self.fetch(query) => result,
        }
    }
}
