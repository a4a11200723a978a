//! Package identity and the normalized metadata record.
//!
//! [`PackageMetadata`] is the stable output of an inspection. Renderers are
//! pure projections of it.

mod normalize;

use std::fmt;

pub use normalize::normalize;

/// A requested lookup: package id plus version string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageIdentity {
    pub id: String,
    pub version: String,
}

impl PackageIdentity {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}

/// Normalized package metadata.
///
/// Optional fields are `None` both when the manifest omits them and when it
/// provides an empty value.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageMetadata {
    pub id: String,
    pub version: String,
    pub description: Option<String>,
    pub authors: Option<String>,
    pub owners: Option<String>,
    pub license_expression: Option<String>,
    pub license_url: Option<String>,
    pub project_url: Option<String>,
    pub icon_url: Option<String>,
    pub copyright: Option<String>,
    pub tags: Option<String>,
    pub release_notes: Option<String>,
    pub repository_url: Option<String>,
    pub repository_type: Option<String>,
    pub repository_commit: Option<String>,
    pub require_license_acceptance: bool,
    pub dependency_groups: Vec<DependencyGroup>,
}

impl PackageMetadata {
    pub fn identity(&self) -> PackageIdentity {
        PackageIdentity::new(&self.id, &self.version)
    }

    /// Preferred license text: the expression, falling back to the URL.
    pub fn license(&self) -> Option<&str> {
        self.license_expression
            .as_deref()
            .or(self.license_url.as_deref())
    }

    pub fn has_repository(&self) -> bool {
        self.repository_url.is_some()
            || self.repository_type.is_some()
            || self.repository_commit.is_some()
    }

    /// Whether any group lists at least one dependency.
    pub fn has_dependencies(&self) -> bool {
        self.dependency_groups
            .iter()
            .any(|g| !g.dependencies.is_empty())
    }
}

/// Dependencies for one target framework.
///
/// An empty group is meaningful: the package has no dependencies on that
/// framework.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyGroup {
    /// Short folder name (`netstandard2.0`); `None` means any framework.
    pub target_framework: Option<String>,
    pub dependencies: Vec<PackageDependency>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageDependency {
    pub id: String,
    /// Normalized range (`[1.0.0, )`); `None` means any version.
    pub version_range: Option<String>,
}
