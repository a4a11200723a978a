//! Package descriptor (`.nuspec`) extraction.
//!
//! A `.nupkg` is a zip archive with a single `.nuspec` manifest at its root.
//! [`DescriptorReader`] turns archive bytes into the raw [`Nuspec`] fields;
//! mapping those into the output record is the job of
//! [`crate::package::normalize`].

mod archive;
mod parse;

use thiserror::Error;

pub use archive::NupkgReader;
pub use parse::parse_nuspec;

/// Raw manifest fields as written in the nuspec, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Nuspec {
    pub id: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub authors: Option<String>,
    pub owners: Option<String>,
    /// `<license>` text; an SPDX expression or a file path inside the package.
    pub license: Option<String>,
    pub license_url: Option<String>,
    pub project_url: Option<String>,
    pub icon_url: Option<String>,
    pub copyright: Option<String>,
    pub tags: Option<String>,
    pub release_notes: Option<String>,
    pub repository: Option<NuspecRepository>,
    pub require_license_acceptance: bool,
    pub dependency_groups: Vec<NuspecDependencyGroup>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NuspecRepository {
    pub url: Option<String>,
    pub repo_type: Option<String>,
    pub commit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NuspecDependencyGroup {
    /// Framework label as written; `None` for the ungrouped legacy list.
    pub target_framework: Option<String>,
    pub dependencies: Vec<NuspecDependency>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NuspecDependency {
    pub id: String,
    pub version: Option<String>,
}

/// Reasons a descriptor could not be extracted from archive bytes.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("Invalid package archive: {0}")]
    InvalidArchive(String),

    #[error("Package archive does not contain a .nuspec manifest")]
    MissingManifest,

    #[error("Package archive contains more than one .nuspec manifest")]
    MultipleManifests,

    #[error("Invalid nuspec XML: {0}")]
    InvalidXml(String),

    #[error("Nuspec is missing required element '{0}'")]
    MissingField(&'static str),

    #[error("Invalid nuspec: {0}")]
    Invalid(String),
}

/// Extracts the manifest from raw package archive bytes.
#[cfg_attr(test, mockall::automock)]
pub trait DescriptorReader: Send + Sync {
    fn read(&self, archive: &[u8]) -> Result<Nuspec, DescriptorError>;
}
