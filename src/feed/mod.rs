//! Feed client abstraction.
//!
//! A feed answers two questions for the resolution engine: which versions of
//! a package it has, and the archive bytes of one of them. NuGet V3 HTTP
//! feeds and local folder feeds both implement [`FeedClient`].

mod factory;
mod local;
mod nuget_v3;

use async_trait::async_trait;
use thiserror::Error;

use crate::version::NuGetVersion;

pub use factory::FeedClientFactory;
pub use local::LocalFeed;
pub use nuget_v3::NuGetV3Feed;

/// Failure reported by a feed client.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The requested item does not exist on this feed.
    #[error("{0} was not found")]
    NotFound(String),

    /// Credentials were missing or rejected.
    #[error("{0}")]
    Unauthorized(String),

    /// Network, protocol or storage failure.
    #[error("{0}")]
    Protocol(String),
}

/// One package feed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Configured source name, used in error messages.
    fn name(&self) -> &str;

    /// All versions the feed publishes for `id`. Unknown ids yield an empty list.
    async fn list_versions(&self, id: &str) -> Result<Vec<NuGetVersion>, FeedError>;

    /// Raw `.nupkg` bytes for one version.
    async fn fetch_archive(&self, id: &str, version: &NuGetVersion)
    -> Result<Vec<u8>, FeedError>;
}
