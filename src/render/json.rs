use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::package::{DependencyGroup, PackageDependency, PackageMetadata};

#[derive(Serialize)]
struct JsonOutput<'a> {
    id: &'a str,
    version: &'a str,
    nuspec: NuspecJson<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NuspecJson<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authors: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    owners: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_expression: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    copyright: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    release_notes: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repository_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repository_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repository_commit: Option<&'a str>,
    require_license_acceptance: bool,
    dependency_groups: Vec<DependencyGroupJson<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DependencyGroupJson<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    target_framework: Option<&'a str>,
    dependencies: Vec<DependencyJson<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DependencyJson<'a> {
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_range: Option<&'a str>,
}

impl<'a> From<&'a PackageDependency> for DependencyJson<'a> {
    fn from(dep: &'a PackageDependency) -> Self {
        Self {
            id: &dep.id,
            version_range: dep.version_range.as_deref(),
        }
    }
}

impl<'a> From<&'a DependencyGroup> for DependencyGroupJson<'a> {
    fn from(group: &'a DependencyGroup) -> Self {
        Self {
            target_framework: group.target_framework.as_deref(),
            dependencies: group.dependencies.iter().map(Into::into).collect(),
        }
    }
}

impl<'a> From<&'a PackageMetadata> for JsonOutput<'a> {
    fn from(m: &'a PackageMetadata) -> Self {
        Self {
            id: &m.id,
            version: &m.version,
            nuspec: NuspecJson {
                description: m.description.as_deref(),
                authors: m.authors.as_deref(),
                owners: m.owners.as_deref(),
                license_expression: m.license_expression.as_deref(),
                license_url: m.license_url.as_deref(),
                project_url: m.project_url.as_deref(),
                icon_url: m.icon_url.as_deref(),
                copyright: m.copyright.as_deref(),
                tags: m.tags.as_deref(),
                release_notes: m.release_notes.as_deref(),
                repository_url: m.repository_url.as_deref(),
                repository_type: m.repository_type.as_deref(),
                repository_commit: m.repository_commit.as_deref(),
                require_license_acceptance: m.require_license_acceptance,
                dependency_groups: m.dependency_groups.iter().map(Into::into).collect(),
            },
        }
    }
}

/// Pretty-printed one-element array, absent fields omitted.
pub fn render_json<W: Write>(out: &mut W, metadata: &PackageMetadata) -> Result<()> {
    let output = [JsonOutput::from(metadata)];
    serde_json::to_writer_pretty(&mut *out, &output).context("Failed to serialize metadata")?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fixtures;
    use serde_json::{Value, json};

    fn render_value(metadata: &PackageMetadata) -> Value {
        let mut out = Vec::new();
        render_json(&mut out, metadata).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn test_minimal_output_omits_absent_fields() {
        let value = render_value(&fixtures::minimal());
        assert_eq!(
            value,
            json!([{
                "id": "Foo",
                "version": "1.0.0",
                "nuspec": {
                    "requireLicenseAcceptance": false,
                    "dependencyGroups": []
                }
            }])
        );
    }

    #[test]
    fn test_full_output() {
        let value = render_value(&fixtures::full());
        let nuspec = &value[0]["nuspec"];

        assert_eq!(value[0]["id"], "Newtonsoft.Json");
        assert_eq!(nuspec["licenseExpression"], "MIT");
        assert_eq!(nuspec["licenseUrl"], "https://licenses.nuget.org/MIT");
        assert_eq!(nuspec["repositoryType"], "git");
        assert!(nuspec.get("repositoryCommit").is_none());
        assert!(nuspec.get("iconUrl").is_none());

        assert_eq!(
            nuspec["dependencyGroups"],
            json!([
                { "targetFramework": "net45", "dependencies": [] },
                {
                    "targetFramework": "netstandard1.0",
                    "dependencies": [
                        { "id": "Microsoft.CSharp", "versionRange": "[4.3.0, )" },
                        { "id": "NETStandard.Library" }
                    ]
                },
                { "dependencies": [ { "id": "Any.Dep", "versionRange": "[1.0.0]" } ] }
            ])
        );
    }

    #[test]
    fn test_output_is_pretty_printed() {
        let mut out = Vec::new();
        render_json(&mut out, &fixtures::minimal()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("[\n  {\n    \"id\": \"Foo\""));
        assert!(text.ends_with("]\n"));
    }
}
