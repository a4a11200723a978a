use std::io::Write;

use anyhow::Result;

use crate::package::PackageMetadata;

const DESCRIPTION_LIMIT: usize = 100;
const ANY: &str = "(any)";

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let head: String = text.chars().take(limit).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Titled table with left-aligned columns.
fn write_table<W: Write>(
    out: &mut W,
    title: &str,
    headers: &[&str],
    rows: &[Vec<String>],
) -> Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        format!("  {}", padded.join("  ")).trim_end().to_string()
    };

    writeln!(out, "{}", title)?;
    let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    writeln!(out, "{}", line(&header))?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(out, "{}", line(&rule))?;
    for row in rows {
        writeln!(out, "{}", line(row))?;
    }
    Ok(())
}

fn property(rows: &mut Vec<Vec<String>>, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        rows.push(vec![name.to_string(), value.to_string()]);
    }
}

/// Human-readable rendering: metadata, optional repository, dependencies.
pub fn render_table<W: Write>(out: &mut W, metadata: &PackageMetadata) -> Result<()> {
    let mut rows = Vec::new();
    property(&mut rows, "ID", Some(&metadata.id));
    property(&mut rows, "Version", Some(&metadata.version));
    let description = metadata
        .description
        .as_deref()
        .map(|d| truncate(d, DESCRIPTION_LIMIT));
    property(&mut rows, "Description", description.as_deref());
    property(&mut rows, "Authors", metadata.authors.as_deref());
    property(&mut rows, "Owners", metadata.owners.as_deref());
    property(&mut rows, "License", Some(metadata.license().unwrap_or("N/A")));
    property(&mut rows, "Project URL", metadata.project_url.as_deref());
    property(&mut rows, "Tags", metadata.tags.as_deref());
    property(&mut rows, "Copyright", metadata.copyright.as_deref());
    write_table(out, "Metadata", &["Property", "Value"], &rows)?;
    writeln!(out)?;

    if metadata.has_repository() {
        let mut rows = Vec::new();
        property(&mut rows, "URL", metadata.repository_url.as_deref());
        property(&mut rows, "Type", metadata.repository_type.as_deref());
        property(&mut rows, "Commit", metadata.repository_commit.as_deref());
        write_table(out, "Repository", &["Property", "Value"], &rows)?;
        writeln!(out)?;
    }

    if !metadata.has_dependencies() {
        writeln!(out, "No dependencies")?;
        return Ok(());
    }

    let rows: Vec<Vec<String>> = metadata
        .dependency_groups
        .iter()
        .flat_map(|group| {
            let framework = group.target_framework.as_deref().unwrap_or(ANY);
            group.dependencies.iter().map(move |dep| {
                vec![
                    framework.to_string(),
                    dep.id.clone(),
                    dep.version_range.as_deref().unwrap_or(ANY).to_string(),
                ]
            })
        })
        .collect();
    write_table(
        out,
        "Dependencies",
        &["Target Framework", "Package", "Version"],
        &rows,
    )
}
