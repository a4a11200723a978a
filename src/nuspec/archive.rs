use std::io::{Cursor, Read};

use log::debug;
use zip::ZipArchive;

use super::{DescriptorError, DescriptorReader, Nuspec, parse_nuspec};

/// Reads the root `.nuspec` out of a `.nupkg` zip archive.
#[derive(Debug, Default, Clone, Copy)]
pub struct NupkgReader;

impl NupkgReader {
    /// Locate and read the manifest text.
    fn manifest_text(&self, archive: &[u8]) -> Result<String, DescriptorError> {
        let mut zip = ZipArchive::new(Cursor::new(archive))
            .map_err(|e| DescriptorError::InvalidArchive(e.to_string()))?;

        let mut manifest_index = None;
        for i in 0..zip.len() {
            let entry = zip
                .by_index(i)
                .map_err(|e| DescriptorError::InvalidArchive(e.to_string()))?;
            let name = entry.name();
            // Only the package root counts; nested .nuspec files are content
            if !name.contains('/') && name.to_lowercase().ends_with(".nuspec") {
                if manifest_index.is_some() {
                    return Err(DescriptorError::MultipleManifests);
                }
                debug!("Found manifest {} at index {}", name, i);
                manifest_index = Some(i);
            }
        }

        let index = manifest_index.ok_or(DescriptorError::MissingManifest)?;
        let mut entry = zip
            .by_index(index)
            .map_err(|e| DescriptorError::InvalidArchive(e.to_string()))?;

        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| DescriptorError::InvalidArchive(e.to_string()))?;

        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes[..]);
        String::from_utf8(bytes.to_vec())
            .map_err(|e| DescriptorError::InvalidXml(format!("manifest is not UTF-8: {}", e)))
    }
}

impl DescriptorReader for NupkgReader {
    #[tracing::instrument(skip(self, archive), fields(bytes = archive.len()))]
    fn read(&self, archive: &[u8]) -> Result<Nuspec, DescriptorError> {
        let text = self.manifest_text(archive)?;
        parse_nuspec(&text)
    }
}
