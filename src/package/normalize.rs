//! Mapping raw manifest fields into [`PackageMetadata`].

use crate::framework::short_folder_name;
use crate::nuspec::{DescriptorError, Nuspec, NuspecDependencyGroup};
use crate::version::{NuGetVersion, VersionRange};

use super::{DependencyGroup, PackageDependency, PackageMetadata};

/// Empty and whitespace-only values collapse to `None`.
fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn normalize_group(group: &NuspecDependencyGroup) -> DependencyGroup {
    DependencyGroup {
        target_framework: group
            .target_framework
            .as_deref()
            .and_then(short_folder_name),
        dependencies: group
            .dependencies
            .iter()
            .map(|dep| PackageDependency {
                id: dep.id.clone(),
                version_range: dep.version.as_deref().and_then(VersionRange::normalize),
            })
            .collect(),
    }
}

/// Build the output record from a parsed manifest.
///
/// Pure: the same manifest always yields the same record. A manifest without
/// an id or a valid version is rejected.
pub fn normalize(nuspec: &Nuspec) -> Result<PackageMetadata, DescriptorError> {
    let id = non_empty(&nuspec.id).ok_or(DescriptorError::MissingField("id"))?;
    let raw_version = non_empty(&nuspec.version).ok_or(DescriptorError::MissingField("version"))?;
    let version = NuGetVersion::try_parse(&raw_version).ok_or_else(|| {
        DescriptorError::Invalid(format!("'{}' is not a valid package version", raw_version))
    })?;

    let repository = nuspec.repository.clone().unwrap_or_default();

    Ok(PackageMetadata {
        id,
        version: version.to_string(),
        description: non_empty(&nuspec.description),
        authors: non_empty(&nuspec.authors),
        owners: non_empty(&nuspec.owners),
        license_expression: non_empty(&nuspec.license),
        license_url: non_empty(&nuspec.license_url),
        project_url: non_empty(&nuspec.project_url),
        icon_url: non_empty(&nuspec.icon_url),
        copyright: non_empty(&nuspec.copyright),
        tags: non_empty(&nuspec.tags),
        release_notes: non_empty(&nuspec.release_notes),
        repository_url: non_empty(&repository.url),
        repository_type: non_empty(&repository.repo_type),
        repository_commit: non_empty(&repository.commit),
        require_license_acceptance: nuspec.require_license_acceptance,
        dependency_groups: nuspec.dependency_groups.iter().map(normalize_group).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nuspec::{NuspecDependency, NuspecRepository};

    fn nuspec() -> Nuspec {
        Nuspec {
            id: Some("Foo".into()),
            version: Some("1.0".into()),
            ..Default::default()
        }
    }

    fn dep(id: &str, version: Option<&str>) -> NuspecDependency {
        NuspecDependency {
            id: id.into(),
            version: version.map(String::from),
        }
    }

    #[test]
    fn test_identity_fields() {
        let metadata = normalize(&nuspec()).unwrap();
        assert_eq!(metadata.id, "Foo");
        assert_eq!(metadata.version, "1.0.0");
    }

    #[test]
    fn test_missing_or_empty_id_is_rejected() {
        let mut n = nuspec();
        n.id = None;
        assert!(matches!(
            normalize(&n),
            Err(DescriptorError::MissingField("id"))
        ));

        n.id = Some("  ".into());
        assert!(matches!(
            normalize(&n),
            Err(DescriptorError::MissingField("id"))
        ));
    }

    #[test]
    fn test_missing_or_invalid_version_is_rejected() {
        let mut n = nuspec();
        n.version = Some(String::new());
        assert!(matches!(
            normalize(&n),
            Err(DescriptorError::MissingField("version"))
        ));

        n.version = Some("banana".into());
        assert!(matches!(normalize(&n), Err(DescriptorError::Invalid(_))));
    }

    #[test]
    fn test_empty_and_absent_are_identical() {
        let absent = normalize(&nuspec()).unwrap();

        let mut n = nuspec();
        n.description = Some(String::new());
        n.authors = Some("".into());
        n.owners = Some(" ".into());
        n.license_url = Some(String::new());
        n.project_url = Some(String::new());
        n.icon_url = Some(String::new());
        n.copyright = Some(String::new());
        n.tags = Some(String::new());
        n.release_notes = Some(String::new());
        n.license = Some(String::new());
        n.repository = Some(NuspecRepository {
            url: Some(String::new()),
            repo_type: Some(String::new()),
            commit: Some(String::new()),
        });
        let empty = normalize(&n).unwrap();

        assert_eq!(absent, empty);
        assert!(!empty.has_repository());
    }

    #[test]
    fn test_repository_fields_are_independent() {
        let mut n = nuspec();
        n.repository = Some(NuspecRepository {
            url: Some("https://github.com/foo/foo".into()),
            repo_type: Some(String::new()),
            commit: None,
        });
        let metadata = normalize(&n).unwrap();
        assert_eq!(
            metadata.repository_url.as_deref(),
            Some("https://github.com/foo/foo")
        );
        assert_eq!(metadata.repository_type, None);
        assert_eq!(metadata.repository_commit, None);
    }

    #[test]
    fn test_license_fields() {
        let mut n = nuspec();
        n.license = Some("Apache-2.0".into());
        n.license_url = Some("https://licenses.nuget.org/Apache-2.0".into());
        let metadata = normalize(&n).unwrap();
        assert_eq!(metadata.license_expression.as_deref(), Some("Apache-2.0"));
        assert_eq!(metadata.license(), Some("Apache-2.0"));

        let mut n = nuspec();
        n.license_url = Some("https://example.com/LICENSE".into());
        let metadata = normalize(&n).unwrap();
        assert_eq!(metadata.license_expression, None);
        assert_eq!(metadata.license(), Some("https://example.com/LICENSE"));
    }

    #[test]
    fn test_dependency_groups_preserve_order() {
        let mut n = nuspec();
        n.dependency_groups = vec![
            NuspecDependencyGroup {
                target_framework: Some(".NETStandard2.0".into()),
                dependencies: vec![dep("Zeta", Some("1.0")), dep("Alpha", None)],
            },
            NuspecDependencyGroup {
                target_framework: Some(".NETFramework4.5".into()),
                dependencies: vec![],
            },
            NuspecDependencyGroup {
                target_framework: None,
                dependencies: vec![dep("Mid", Some("[2.0,3.0)"))],
            },
        ];

        let metadata = normalize(&n).unwrap();
        let groups = &metadata.dependency_groups;
        assert_eq!(groups.len(), 3);

        assert_eq!(groups[0].target_framework.as_deref(), Some("netstandard2.0"));
        assert_eq!(groups[0].dependencies[0].id, "Zeta");
        assert_eq!(
            groups[0].dependencies[0].version_range.as_deref(),
            Some("[1.0.0, )")
        );
        assert_eq!(groups[0].dependencies[1].id, "Alpha");
        assert_eq!(groups[0].dependencies[1].version_range, None);

        assert_eq!(groups[1].target_framework.as_deref(), Some("net45"));
        assert!(groups[1].dependencies.is_empty());

        assert_eq!(groups[2].target_framework, None);
        assert_eq!(
            groups[2].dependencies[0].version_range.as_deref(),
            Some("[2.0.0, 3.0.0)")
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut n = nuspec();
        n.description = Some("desc".into());
        n.dependency_groups = vec![NuspecDependencyGroup {
            target_framework: Some("net6.0".into()),
            dependencies: vec![dep("A", Some("1.0"))],
        }];
        assert_eq!(normalize(&n).unwrap(), normalize(&n).unwrap());
    }
}
