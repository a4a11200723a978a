//! Feed source configuration.
//!
//! Sources come from `nuget.config` files (see [`load_sources`]). The rest of
//! the crate only consumes the ordered list of enabled sources.

mod loader;

use std::fmt;

pub use loader::{
    CONFIG_FILE_NAMES, CREDENTIALS_ENV_PREFIX, DEFAULT_SOURCE_NAME, DEFAULT_SOURCE_URL,
    load_sources,
};

/// Credentials for one source.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"*********")
            .finish()
    }
}

/// One configured package feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    /// Service index URL or local directory path.
    pub location: String,
    pub enabled: bool,
    pub protocol_version: Option<u32>,
    pub credentials: Option<Credentials>,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            enabled: true,
            protocol_version: None,
            credentials: None,
        }
    }

    pub fn is_http(&self) -> bool {
        let lower = self.location.to_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }
}

/// Ordered list of configured sources, enabled or not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceList {
    sources: Vec<FeedSource>,
}

impl SourceList {
    pub fn new(sources: Vec<FeedSource>) -> Self {
        Self { sources }
    }

    pub fn all(&self) -> &[FeedSource] {
        &self.sources
    }

    /// Enabled sources in configured priority order.
    pub fn enabled_sources(&self) -> Vec<FeedSource> {
        self.sources.iter().filter(|s| s.enabled).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_http() {
        assert!(FeedSource::new("a", "https://api.nuget.org/v3/index.json").is_http());
        assert!(FeedSource::new("a", "HTTP://localhost:5000/v3/index.json").is_http());
        assert!(!FeedSource::new("a", "/srv/packages").is_http());
        assert!(!FeedSource::new("a", r"C:\packages").is_http());
    }

    #[test]
    fn test_enabled_sources_keeps_order() {
        let mut disabled = FeedSource::new("b", "/b");
        disabled.enabled = false;
        let list = SourceList::new(vec![
            FeedSource::new("a", "/a"),
            disabled,
            FeedSource::new("c", "/c"),
        ]);

        let names: Vec<String> = list.enabled_sources().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(list.all().len(), 3);
    }

    #[test]
    fn test_credentials_debug_masks_password() {
        let creds = Credentials {
            username: "me".into(),
            password: "hunter2".into(),
        };
        let debug = format!("{:?}", creds);
        assert!(debug.contains("me"));
        assert!(!debug.contains("hunter2"));
    }
}
