//! Nuspec XML parsing.
//!
//! Element names are matched by local name so every published nuspec
//! schema namespace is accepted.

use roxmltree::{Document, Node};

use super::{
    DescriptorError, Nuspec, NuspecDependency, NuspecDependencyGroup, NuspecRepository,
};

fn child_elements<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn element_text(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

fn attribute(node: Node, name: &str) -> Option<String> {
    node.attribute(name).map(|v| v.trim().to_string())
}

/// `<license type="expression|file">`; any other type is rejected.
fn parse_license(node: Node) -> Result<String, DescriptorError> {
    match node.attribute("type").map(str::trim) {
        Some(t) if t.eq_ignore_ascii_case("expression") || t.eq_ignore_ascii_case("file") => {
            Ok(element_text(node))
        }
        Some(other) => Err(DescriptorError::Invalid(format!(
            "unsupported license type '{}'",
            other
        ))),
        None => Err(DescriptorError::Invalid(
            "license element is missing its type attribute".to_string(),
        )),
    }
}

fn parse_dependency(node: Node) -> Result<NuspecDependency, DescriptorError> {
    let id = attribute(node, "id")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| DescriptorError::Invalid("dependency is missing its id".to_string()))?;
    Ok(NuspecDependency {
        id,
        version: attribute(node, "version"),
    })
}

fn parse_dependencies(node: Node) -> Result<Vec<NuspecDependencyGroup>, DescriptorError> {
    let groups: Vec<Node> = child_elements(node, "group").collect();

    // Grouped form takes precedence over the legacy flat list
    if !groups.is_empty() {
        return groups
            .into_iter()
            .map(|group| {
                Ok(NuspecDependencyGroup {
                    target_framework: attribute(group, "targetFramework"),
                    dependencies: child_elements(group, "dependency")
                        .map(parse_dependency)
                        .collect::<Result<_, _>>()?,
                })
            })
            .collect();
    }

    let flat: Vec<NuspecDependency> = child_elements(node, "dependency")
        .map(parse_dependency)
        .collect::<Result<_, _>>()?;

    if flat.is_empty() {
        Ok(Vec::new())
    } else {
        Ok(vec![NuspecDependencyGroup {
            target_framework: None,
            dependencies: flat,
        }])
    }
}

/// Parse nuspec XML into raw manifest fields.
///
/// Structural problems (not XML, wrong root, no `<metadata>`) are errors.
/// Missing id or version is left for the normalizer to reject.
pub fn parse_nuspec(xml: &str) -> Result<Nuspec, DescriptorError> {
    let doc = Document::parse(xml).map_err(|e| DescriptorError::InvalidXml(e.to_string()))?;

    let root = doc.root_element();
    if root.tag_name().name() != "package" {
        return Err(DescriptorError::Invalid(format!(
            "unexpected root element '{}'",
            root.tag_name().name()
        )));
    }

    let metadata = child_elements(root, "metadata")
        .next()
        .ok_or(DescriptorError::MissingField("metadata"))?;

    let mut nuspec = Nuspec::default();

    for node in metadata.children().filter(|n| n.is_element()) {
        match node.tag_name().name() {
            "id" => nuspec.id = Some(element_text(node)),
            "version" => nuspec.version = Some(element_text(node)),
            "description" => nuspec.description = Some(element_text(node)),
            "authors" => nuspec.authors = Some(element_text(node)),
            "owners" => nuspec.owners = Some(element_text(node)),
            "license" => nuspec.license = Some(parse_license(node)?),
            "licenseUrl" => nuspec.license_url = Some(element_text(node)),
            "projectUrl" => nuspec.project_url = Some(element_text(node)),
            "iconUrl" => nuspec.icon_url = Some(element_text(node)),
            "copyright" => nuspec.copyright = Some(element_text(node)),
            "tags" => nuspec.tags = Some(element_text(node)),
            "releaseNotes" => nuspec.release_notes = Some(element_text(node)),
            "requireLicenseAcceptance" => {
                nuspec.require_license_acceptance =
                    element_text(node).eq_ignore_ascii_case("true");
            }
            "repository" => {
                nuspec.repository = Some(NuspecRepository {
                    url: attribute(node, "url"),
                    repo_type: attribute(node, "type"),
                    commit: attribute(node, "commit"),
                });
            }
            "dependencies" => nuspec.dependency_groups = parse_dependencies(node)?,
            _ => {}
        }
    }

    Ok(nuspec)
}
