//! Package resolution across an ordered list of feeds.
//!
//! Sources are scanned one at a time in configured order and the first
//! source that lists the requested version and serves its archive wins.
//! Later sources are never contacted once a winner is found. A source that
//! fails for any reason other than "not here" ends the scan.

use std::future::Future;
use std::sync::Arc;

use log::{debug, info};
use tokio_util::sync::CancellationToken;

use crate::error::InspectError;
use crate::feed::{FeedClient, FeedError};
use crate::nuspec::DescriptorReader;
use crate::package::{PackageIdentity, PackageMetadata, normalize};
use crate::version::NuGetVersion;

/// Await `fut` unless `cancel` fires first.
async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, InspectError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(InspectError::Cancelled),
        out = fut => Ok(out),
    }
}

/// Classify a hard failure of a named source.
fn source_failure(feed: &str, err: FeedError) -> InspectError {
    match err {
        FeedError::Unauthorized(detail) => InspectError::authentication(feed, detail),
        other => InspectError::feed_access(feed, other),
    }
}

/// Resolves `(id, version)` to normalized package metadata.
pub struct Inspector<D: DescriptorReader> {
    reader: D,
}

impl<D: DescriptorReader> Inspector<D> {
    pub fn new(reader: D) -> Self {
        Self { reader }
    }

    /// Find the first source that has the requested package version and
    /// return its metadata.
    ///
    /// `include_prerelease` only affects logging; an exact version lookup
    /// finds prerelease versions either way.
    #[tracing::instrument(
        skip(self, request, sources, cancel),
        fields(package = %request, sources = sources.len())
    )]
    pub async fn resolve(
        &self,
        request: &PackageIdentity,
        sources: &[Arc<dyn FeedClient>],
        include_prerelease: bool,
        cancel: &CancellationToken,
    ) -> Result<PackageMetadata, InspectError> {
        let (id, version) = (request.id.as_str(), request.version.as_str());
        if sources.is_empty() {
            return Err(InspectError::FeedAccess {
                feed: None,
                message: "No enabled package sources found.".to_string(),
            });
        }

        let target = NuGetVersion::try_parse(version).ok_or_else(|| {
            InspectError::invalid_argument(format!("Invalid version '{}'.", version))
        })?;
        if target.is_prerelease() && !include_prerelease {
            debug!("{} is a prerelease version, resolving it as requested", target);
        }

        for source in sources {
            let name = source.name();
            debug!("Looking for {} {} on {}", id, target, name);

            let versions = match cancellable(cancel, source.list_versions(id)).await? {
                Ok(versions) => versions,
                Err(FeedError::NotFound(_)) => Vec::new(),
                Err(e) => return Err(source_failure(name, e)),
            };
            if !versions.contains(&target) {
                debug!("{} does not list {} {}", name, id, target);
                continue;
            }

            let archive = match cancellable(cancel, source.fetch_archive(id, &target)).await? {
                Ok(bytes) => bytes,
                Err(FeedError::NotFound(detail)) => {
                    debug!("{} listed {} but has no archive: {}", name, target, detail);
                    continue;
                }
                Err(e) => return Err(source_failure(name, e)),
            };

            info!("Resolved {} {} from {}", id, target, name);
            return self.describe(id, &target, &archive);
        }

        Err(self.classify_miss(id, version, sources, cancel).await?)
    }

    /// Parse the archive and check that it describes the requested package.
    ///
    /// Flat feed file names are ambiguous (`Foo.2.0.0.1.nupkg` may be
    /// `Foo.2` 0.0.1), so the manifest identity is authoritative.
    fn describe(
        &self,
        id: &str,
        version: &NuGetVersion,
        archive: &[u8],
    ) -> Result<PackageMetadata, InspectError> {
        let parse_error = |detail: String| {
            InspectError::DescriptorParse(format!(
                "Failed to parse nuspec for {} {}: {}",
                id, version, detail
            ))
        };
        let nuspec = self
            .reader
            .read(archive)
            .map_err(|e| parse_error(e.to_string()))?;
        let metadata = normalize(&nuspec).map_err(|e| parse_error(e.to_string()))?;

        let described = metadata.identity();
        let same_version = NuGetVersion::try_parse(&described.version).as_ref() == Some(version);
        if !described.id.eq_ignore_ascii_case(id) || !same_version {
            return Err(parse_error(format!("manifest describes {}", described)));
        }
        Ok(metadata)
    }

    /// After a full miss, decide between "no such package" and "no such version".
    ///
    /// Errors while listing count as "no versions on that source".
    async fn classify_miss(
        &self,
        id: &str,
        version: &str,
        sources: &[Arc<dyn FeedClient>],
        cancel: &CancellationToken,
    ) -> Result<InspectError, InspectError> {
        let mut found_anywhere = false;
        for source in sources {
            match cancellable(cancel, source.list_versions(id)).await? {
                Ok(versions) if !versions.is_empty() => found_anywhere = true,
                Ok(_) => {}
                Err(e) => debug!("Ignoring {} while re-listing {}: {}", source.name(), id, e),
            }
        }

        Ok(if found_anywhere {
            InspectError::VersionNotFound {
                id: id.to_string(),
                version: version.trim().to_string(),
            }
        } else {
            InspectError::PackageNotFound { id: id.to_string() }
        })
    }
}
