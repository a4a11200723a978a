use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use super::{FeedClient, FeedError};
use crate::runtime::Runtime;
use crate::version::NuGetVersion;

/// A directory of `.nupkg` files.
///
/// Two layouts are recognised, and may be mixed:
/// - flat: `<root>/<id>.<version>.nupkg`
/// - hierarchical: `<root>/<id>/<version>/<id>.<version>.nupkg`
///
/// Package ids match case-insensitively.
pub struct LocalFeed {
    name: String,
    root: PathBuf,
    runtime: Arc<dyn Runtime>,
}

fn file_name_lower(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_lowercase)
}

/// Version part of a flat archive name, `foo.1.0.0.nupkg` -> `1.0.0`.
fn flat_version(path: &Path, id_lower: &str) -> Option<NuGetVersion> {
    let name = file_name_lower(path)?;
    let rest = name.strip_prefix(id_lower)?.strip_prefix('.')?;
    let version = rest.strip_suffix(".nupkg")?;
    NuGetVersion::try_parse(version)
}

impl LocalFeed {
    pub fn new(
        name: impl Into<String>,
        root: impl Into<PathBuf>,
        runtime: Arc<dyn Runtime>,
    ) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            runtime,
        }
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, FeedError> {
        self.runtime
            .read_dir(dir)
            .map_err(|e| FeedError::Protocol(format!("{:#}", e)))
    }

    fn ensure_root(&self) -> Result<(), FeedError> {
        if self.runtime.is_dir(&self.root) {
            Ok(())
        } else {
            Err(FeedError::Protocol(format!(
                "Local source directory '{}' does not exist",
                self.root.display()
            )))
        }
    }

    /// `<root>/<id>` for the hierarchical layout, matched case-insensitively.
    fn package_dir(&self, entries: &[PathBuf], id_lower: &str) -> Option<PathBuf> {
        entries
            .iter()
            .find(|p| {
                file_name_lower(p).as_deref() == Some(id_lower) && self.runtime.is_dir(p)
            })
            .cloned()
    }

    /// Archives available for `id`, paired with their versions.
    fn archives(&self, id: &str) -> Result<Vec<(NuGetVersion, PathBuf)>, FeedError> {
        self.ensure_root()?;
        let id_lower = id.to_lowercase();
        let entries = self.read_dir(&self.root)?;

        let mut found: Vec<(NuGetVersion, PathBuf)> = entries
            .iter()
            .filter(|p| !self.runtime.is_dir(p))
            .filter_map(|p| flat_version(p, &id_lower).map(|v| (v, p.clone())))
            .collect();

        if let Some(package_dir) = self.package_dir(&entries, &id_lower) {
            for version_dir in self.read_dir(&package_dir)? {
                let Some(version) = version_dir
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(NuGetVersion::try_parse)
                else {
                    continue;
                };
                if !self.runtime.is_dir(&version_dir) {
                    continue;
                }
                let archive = self
                    .read_dir(&version_dir)?
                    .into_iter()
                    .find(|p| flat_version(p, &id_lower).is_some());
                if let Some(archive) = archive {
                    found.push((version, archive));
                }
            }
        }

        Ok(found)
    }
}

#[async_trait]
impl FeedClient for LocalFeed {
    fn name(&self) -> &str {
        &self.name
    }

    #[tracing::instrument(skip(self), fields(feed = %self.name))]
    async fn list_versions(&self, id: &str) -> Result<Vec<NuGetVersion>, FeedError> {
        let mut versions: Vec<NuGetVersion> = Vec::new();
        for (version, _) in self.archives(id)? {
            if !versions.contains(&version) {
                versions.push(version);
            }
        }
        versions.sort();
        debug!(
            "{} has {} version(s) of {}",
            self.name,
            versions.len(),
            id
        );
        Ok(versions)
    }

    #[tracing::instrument(skip(self), fields(feed = %self.name, version = %version))]
    async fn fetch_archive(&self, id: &str, version: &NuGetVersion) -> Result<Vec<u8>, FeedError> {
        let path = self
            .archives(id)?
            .into_iter()
            .find(|(v, _)| v == version)
            .map(|(_, p)| p)
            .ok_or_else(|| FeedError::NotFound(format!("{} {}", id, version)))?;

        debug!("Reading {}", path.display());
        self.runtime
            .read(&path)
            .map_err(|e| FeedError::Protocol(format!("{:#}", e)))
    }
}
