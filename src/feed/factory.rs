//! Factory for creating feed clients from configured sources.

use std::sync::Arc;

use log::debug;

use super::{FeedClient, LocalFeed, NuGetV3Feed};
use crate::config::FeedSource;
use crate::http::HttpClient;
use crate::runtime::Runtime;

/// Creates one [`FeedClient`] per configured source.
///
/// `http(s)://` locations are NuGet V3 service indexes; anything else is a
/// local folder.
pub struct FeedClientFactory {
    http_client: HttpClient,
    runtime: Arc<dyn Runtime>,
}

impl FeedClientFactory {
    pub fn new(http_client: HttpClient, runtime: Arc<dyn Runtime>) -> Self {
        Self {
            http_client,
            runtime,
        }
    }

    pub fn create(&self, source: &FeedSource) -> Arc<dyn FeedClient> {
        if source.is_http() {
            if let Some(version) = source.protocol_version
                && version != 3
            {
                debug!(
                    "Source '{}' declares protocolVersion {}, treating it as V3",
                    source.name, version
                );
            }
            let http = match &source.credentials {
                Some(creds) => self
                    .http_client
                    .clone()
                    .with_basic_auth(&creds.username, &creds.password),
                None => self.http_client.clone(),
            };
            Arc::new(NuGetV3Feed::new(&source.name, &source.location, http))
        } else {
            Arc::new(LocalFeed::new(
                &source.name,
                &source.location,
                self.runtime.clone(),
            ))
        }
    }

    /// Clients for every source, preserving order.
    pub fn create_all(&self, sources: &[FeedSource]) -> Vec<Arc<dyn FeedClient>> {
        sources.iter().map(|s| self.create(s)).collect()
    }
}
