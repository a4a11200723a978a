//! `nuget.config` discovery and merging.
//!
//! Files are applied from most general to most specific: the user config
//! first, then every config from the filesystem root down to the current
//! directory. A later file can `<clear/>` or redefine what earlier ones set.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{debug, warn};
use roxmltree::{Document, Node};

use super::{Credentials, FeedSource, SourceList};
use crate::error::InspectError;
use crate::runtime::Runtime;

pub const DEFAULT_SOURCE_NAME: &str = "nuget.org";
pub const DEFAULT_SOURCE_URL: &str = "https://api.nuget.org/v3/index.json";

/// File names checked in each directory, first match wins.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["nuget.config", "NuGet.Config", "NuGet.config"];

/// `NuGetPackageSourceCredentials_<name>=Username=...;Password=...`
pub const CREDENTIALS_ENV_PREFIX: &str = "NuGetPackageSourceCredentials_";

fn key_of(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Decode `XmlConvert`-style escapes (`_x0020_`) used for source names in
/// element position.
fn decode_element_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut rest = name;
    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = candidate
            .get(2..6)
            .filter(|_| candidate.get(6..7) == Some("_"))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &candidate[7..];
            }
            None => {
                out.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Relative local feed paths are relative to the config file that declares them.
fn resolve_location(value: &str, base_dir: &Path) -> String {
    let source = FeedSource::new("", value);
    if source.is_http() || Path::new(value).is_absolute() {
        value.to_string()
    } else {
        base_dir.join(value).to_string_lossy().into_owned()
    }
}

fn parse_env_credentials(value: &str) -> Option<Credentials> {
    let mut username = None;
    let mut password = None;
    for pair in value.split(';') {
        let Some((key, val)) = pair.split_once('=') else {
            continue;
        };
        match key.trim().to_lowercase().as_str() {
            "username" => username = Some(val.to_string()),
            "password" => password = Some(val.to_string()),
            _ => {}
        }
    }
    Some(Credentials {
        username: username?,
        password: password?,
    })
}

#[derive(Default)]
struct SourceListBuilder {
    sources: Vec<FeedSource>,
    disabled: HashSet<String>,
    credentials: HashMap<String, Credentials>,
}

impl SourceListBuilder {
    fn apply(&mut self, path: &Path, xml: &str) -> Result<(), InspectError> {
        let invalid = |detail: String| {
            InspectError::invalid_argument(format!(
                "Failed to parse NuGet config '{}': {}",
                path.display(),
                detail
            ))
        };

        let doc = Document::parse(xml).map_err(|e| invalid(e.to_string()))?;
        let root = doc.root_element();
        if root.tag_name().name() != "configuration" {
            return Err(invalid(format!(
                "unexpected root element '{}'",
                root.tag_name().name()
            )));
        }

        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        for section in root.children().filter(Node::is_element) {
            match section.tag_name().name() {
                "packageSources" => self.apply_sources(section, base_dir),
                "disabledPackageSources" => self.apply_disabled(section),
                "packageSourceCredentials" => self.apply_credentials(section),
                _ => {}
            }
        }
        Ok(())
    }

    fn apply_sources(&mut self, section: Node, base_dir: &Path) {
        for item in section.children().filter(Node::is_element) {
            match item.tag_name().name() {
                "clear" => self.sources.clear(),
                "add" => {
                    let (Some(key), Some(value)) = (item.attribute("key"), item.attribute("value"))
                    else {
                        warn!("Ignoring package source entry without key or value");
                        continue;
                    };
                    let location = resolve_location(value.trim(), base_dir);
                    let protocol_version = item
                        .attribute("protocolVersion")
                        .and_then(|v| v.trim().parse().ok());

                    match self
                        .sources
                        .iter_mut()
                        .find(|s| s.name.eq_ignore_ascii_case(key.trim()))
                    {
                        Some(existing) => {
                            existing.location = location;
                            existing.protocol_version = protocol_version;
                        }
                        None => {
                            let mut source = FeedSource::new(key.trim(), location);
                            source.protocol_version = protocol_version;
                            self.sources.push(source);
                        }
                    }
                }
                "remove" => {
                    if let Some(key) = item.attribute("key") {
                        self.sources
                            .retain(|s| !s.name.eq_ignore_ascii_case(key.trim()));
                    }
                }
                _ => {}
            }
        }
    }

    fn apply_disabled(&mut self, section: Node) {
        for item in section.children().filter(Node::is_element) {
            match item.tag_name().name() {
                "clear" => self.disabled.clear(),
                "add" => {
                    let key = item.attribute("key");
                    if let (Some(key), Some(value)) = (key, item.attribute("value")) {
                        if value.trim().eq_ignore_ascii_case("true") {
                            self.disabled.insert(key_of(key));
                        } else {
                            self.disabled.remove(&key_of(key));
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn apply_credentials(&mut self, section: Node) {
        for source in section.children().filter(Node::is_element) {
            let name = decode_element_name(source.tag_name().name());
            let mut username = None;
            let mut password = None;

            for item in source
                .children()
                .filter(|n| n.is_element() && n.tag_name().name() == "add")
            {
                let (Some(key), Some(value)) = (item.attribute("key"), item.attribute("value"))
                else {
                    continue;
                };
                if key.eq_ignore_ascii_case("Username") {
                    username = Some(value.to_string());
                } else if key.eq_ignore_ascii_case("ClearTextPassword") {
                    password = Some(value.to_string());
                } else if key.eq_ignore_ascii_case("Password") {
                    warn!(
                        "Encrypted password for source '{}' is not supported; \
                         use ClearTextPassword",
                        name
                    );
                }
            }

            if let (Some(username), Some(password)) = (username, password) {
                self.credentials
                    .insert(key_of(&name), Credentials { username, password });
            }
        }
    }

    fn build<R: Runtime + ?Sized>(self, runtime: &R) -> SourceList {
        let SourceListBuilder {
            sources,
            disabled,
            mut credentials,
        } = self;

        let sources = sources
            .into_iter()
            .map(|mut source| {
                let key = key_of(&source.name);
                source.enabled = !disabled.contains(&key);
                let env_credentials = runtime
                    .env_var(&format!("{}{}", CREDENTIALS_ENV_PREFIX, source.name))
                    .ok()
                    .and_then(|value| parse_env_credentials(&value));
                if env_credentials.is_some() {
                    debug!("Using credentials from environment for source '{}'", source.name);
                }
                source.credentials = env_credentials.or_else(|| credentials.remove(&key));
                source
            })
            .collect();

        SourceList::new(sources)
    }
}

fn user_config_path<R: Runtime + ?Sized>(runtime: &R) -> Option<PathBuf> {
    let candidates = [
        runtime
            .home_dir()
            .map(|home| home.join(".nuget").join("NuGet").join("NuGet.Config")),
        runtime
            .config_dir()
            .map(|dir| dir.join("NuGet").join("NuGet.Config")),
    ];
    candidates.into_iter().flatten().find(|p| runtime.exists(p))
}

/// Config files in application order (most general first).
fn discover_config_files<R: Runtime + ?Sized>(runtime: &R) -> Result<Vec<PathBuf>> {
    let cwd = runtime.current_dir()?;

    // closest first
    let mut found: Vec<PathBuf> = Vec::new();
    for dir in cwd.ancestors() {
        if let Some(path) = CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| runtime.exists(p))
        {
            found.push(path);
        }
    }

    let mut ordered = Vec::new();
    if let Some(user) = user_config_path(runtime).filter(|p| !found.contains(p)) {
        ordered.push(user);
    }
    ordered.extend(found.into_iter().rev());
    Ok(ordered)
}

/// Load the configured feed sources.
///
/// With `config_path`, only that file is read and it must exist. Otherwise
/// config files are discovered from the current directory upwards plus the
/// user config; when none exists the default nuget.org source is used.
#[tracing::instrument(skip(runtime))]
pub fn load_sources<R: Runtime + ?Sized>(
    runtime: &R,
    config_path: Option<&Path>,
) -> Result<SourceList, InspectError> {
    let files = match config_path {
        Some(path) => {
            if !runtime.exists(path) {
                return Err(InspectError::invalid_argument(format!(
                    "Config file not found: '{}'",
                    path.display()
                )));
            }
            vec![path.to_path_buf()]
        }
        None => discover_config_files(runtime)?,
    };

    let mut builder = SourceListBuilder::default();

    if files.is_empty() {
        debug!("No NuGet config found, using {}", DEFAULT_SOURCE_URL);
        builder
            .sources
            .push(FeedSource::new(DEFAULT_SOURCE_NAME, DEFAULT_SOURCE_URL));
    }

    for file in &files {
        debug!("Loading NuGet config {}", file.display());
        let xml = runtime.read_to_string(file).map_err(|e| {
            InspectError::invalid_argument(format!(
                "Failed to read NuGet config '{}': {:#}",
                file.display(),
                e
            ))
        })?;
        builder.apply(file, &xml)?;
    }

    let list = builder.build(runtime);
    debug!(
        "Configured sources: {:?}",
        list.all().iter().map(|s| &s.name).collect::<Vec<_>>()
    );
    Ok(list)
}
