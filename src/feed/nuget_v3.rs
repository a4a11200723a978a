use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use tokio::sync::OnceCell;

use super::{FeedClient, FeedError};
use crate::http::{HttpClient, NonRetryableError};
use crate::version::NuGetVersion;

const PACKAGE_BASE_ADDRESS: &str = "PackageBaseAddress/3.0.0";

#[derive(Debug, Deserialize)]
struct ServiceIndex {
    #[serde(default)]
    resources: Vec<ServiceResource>,
}

#[derive(Debug, Deserialize)]
struct ServiceResource {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@type")]
    resource_type: ResourceType,
}

/// `@type` is usually a string but may be a list of aliases.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResourceType {
    One(String),
    Many(Vec<String>),
}

impl ResourceType {
    fn matches(&self, wanted: &str) -> bool {
        match self {
            ResourceType::One(t) => t == wanted,
            ResourceType::Many(types) => types.iter().any(|t| t == wanted),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VersionIndex {
    #[serde(default)]
    versions: Vec<String>,
}

fn to_feed_error(err: anyhow::Error) -> FeedError {
    match err.downcast_ref::<NonRetryableError>() {
        Some(NonRetryableError::NotFound(url)) => FeedError::NotFound(url.clone()),
        Some(e) if e.is_auth_failure() => FeedError::Unauthorized(e.to_string()),
        _ => FeedError::Protocol(format!("{:#}", err)),
    }
}

/// A NuGet V3 HTTP feed, addressed by its service index URL.
pub struct NuGetV3Feed {
    name: String,
    index_url: String,
    http: HttpClient,
    base_address: OnceCell<String>,
}

impl NuGetV3Feed {
    pub fn new(name: impl Into<String>, index_url: impl Into<String>, http: HttpClient) -> Self {
        Self {
            name: name.into(),
            index_url: index_url.into(),
            http,
            base_address: OnceCell::new(),
        }
    }

    /// Flat container base URL, resolved from the service index on first use.
    async fn base_address(&self) -> Result<&str, FeedError> {
        self.base_address
            .get_or_try_init(|| self.load_base_address())
            .await
            .map(String::as_str)
    }

    async fn load_base_address(&self) -> Result<String, FeedError> {
        debug!("Loading service index for {} from {}", self.name, self.index_url);
        let index: ServiceIndex = self
            .http
            .get_json(&self.index_url)
            .await
            .map_err(|e| match to_feed_error(e) {
                FeedError::NotFound(url) => {
                    FeedError::Protocol(format!("Service index not found at {}", url))
                }
                other => other,
            })?;

        let resource = index
            .resources
            .iter()
            .find(|r| r.resource_type.matches(PACKAGE_BASE_ADDRESS))
            .ok_or_else(|| {
                FeedError::Protocol(format!(
                    "Service index {} has no {} resource",
                    self.index_url, PACKAGE_BASE_ADDRESS
                ))
            })?;

        let mut base = resource.id.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        debug!("Package base address for {}: {}", self.name, base);
        Ok(base)
    }
}

#[async_trait]
impl FeedClient for NuGetV3Feed {
    fn name(&self) -> &str {
        &self.name
    }

    #[tracing::instrument(skip(self), fields(feed = %self.name))]
    async fn list_versions(&self, id: &str) -> Result<Vec<NuGetVersion>, FeedError> {
        let base = self.base_address().await?;
        let url = format!("{}{}/index.json", base, id.to_lowercase());

        let index: VersionIndex = match self.http.get_json(&url).await.map_err(to_feed_error) {
            Ok(index) => index,
            Err(FeedError::NotFound(_)) => {
                debug!("{} has no package {}", self.name, id);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        Ok(index
            .versions
            .iter()
            .filter_map(|v| {
                let parsed = NuGetVersion::try_parse(v);
                if parsed.is_none() {
                    debug!("Skipping unparseable version '{}' from {}", v, self.name);
                }
                parsed
            })
            .collect())
    }

    #[tracing::instrument(skip(self), fields(feed = %self.name, version = %version))]
    async fn fetch_archive(&self, id: &str, version: &NuGetVersion) -> Result<Vec<u8>, FeedError> {
        let base = self.base_address().await?;
        let id_lower = id.to_lowercase();
        let version_lower = version.to_lower_normalized();
        let url = format!(
            "{}{}/{}/{}.{}.nupkg",
            base, id_lower, version_lower, id_lower, version_lower
        );
        self.http.get_bytes(&url).await.map_err(to_feed_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn http() -> HttpClient {
        HttpClient::new(reqwest::Client::new()).with_retry_delay(Duration::from_millis(1))
    }

    async fn mock_index(server: &mut mockito::ServerGuard) -> mockito::Mock {
        let body = format!(
            r#"{{"version":"3.0.0","resources":[
                {{"@id":"{0}/query","@type":"SearchQueryService"}},
                {{"@id":"{0}/flat","@type":"PackageBaseAddress/3.0.0"}}
            ]}}"#,
            server.url()
        );
        server
            .mock("GET", "/v3/index.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(1)
            .create_async()
            .await
    }

    fn feed(server: &mockito::ServerGuard) -> NuGetV3Feed {
        NuGetV3Feed::new("test", format!("{}/v3/index.json", server.url()), http())
    }

    #[tokio::test]
    async fn test_list_versions_uses_lowercase_id_and_caches_index() {
        let mut server = mockito::Server::new_async().await;
        let index = mock_index(&mut server).await;
        let versions = server
            .mock("GET", "/flat/newtonsoft.json/index.json")
            .with_status(200)
            .with_body(r#"{"versions":["12.0.1","13.0.3","not a version","14.0.0-beta1"]}"#)
            .expect(2)
            .create_async()
            .await;

        let feed = feed(&server);
        let listed = feed.list_versions("Newtonsoft.Json").await.unwrap();
        feed.list_versions("Newtonsoft.Json").await.unwrap();

        index.assert_async().await;
        versions.assert_async().await;
        let listed: Vec<String> = listed.iter().map(ToString::to_string).collect();
        assert_eq!(listed, vec!["12.0.1", "13.0.3", "14.0.0-beta1"]);
    }

    #[tokio::test]
    async fn test_list_versions_unknown_package_is_empty() {
        let mut server = mockito::Server::new_async().await;
        let _index = mock_index(&mut server).await;
        let _versions = server
            .mock("GET", "/flat/bar/index.json")
            .with_status(404)
            .create_async()
            .await;

        assert!(feed(&server).list_versions("Bar").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_versions_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let _index = server
            .mock("GET", "/v3/index.json")
            .with_status(401)
            .create_async()
            .await;

        let err = feed(&server).list_versions("Foo").await.unwrap_err();
        assert!(matches!(err, FeedError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_missing_service_index_is_protocol_error() {
        let mut server = mockito::Server::new_async().await;
        let _index = server
            .mock("GET", "/v3/index.json")
            .with_status(404)
            .create_async()
            .await;

        let err = feed(&server).list_versions("Foo").await.unwrap_err();
        assert!(matches!(err, FeedError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_index_without_base_address() {
        let mut server = mockito::Server::new_async().await;
        let _index = server
            .mock("GET", "/v3/index.json")
            .with_status(200)
            .with_body(r#"{"version":"3.0.0","resources":[]}"#)
            .create_async()
            .await;

        let err = feed(&server).list_versions("Foo").await.unwrap_err();
        assert!(err.to_string().contains("PackageBaseAddress/3.0.0"));
    }

    #[tokio::test]
    async fn test_fetch_archive() {
        let mut server = mockito::Server::new_async().await;
        let _index = mock_index(&mut server).await;
        let archive = server
            .mock("GET", "/flat/foo/1.0.0-beta/foo.1.0.0-beta.nupkg")
            .with_status(200)
            .with_body(b"nupkg-bytes")
            .create_async()
            .await;

        let version: NuGetVersion = "1.0-Beta".parse().unwrap();
        let bytes = feed(&server).fetch_archive("Foo", &version).await.unwrap();

        archive.assert_async().await;
        assert_eq!(bytes, b"nupkg-bytes");
    }

    #[tokio::test]
    async fn test_fetch_archive_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _index = mock_index(&mut server).await;
        let _archive = server
            .mock("GET", "/flat/foo/1.0.0/foo.1.0.0.nupkg")
            .with_status(404)
            .create_async()
            .await;

        let version: NuGetVersion = "1.0.0".parse().unwrap();
        let err = feed(&server).fetch_archive("Foo", &version).await.unwrap_err();
        assert!(matches!(err, FeedError::NotFound(_)));
    }

    #[test]
    fn test_resource_type_list() {
        let resource: ServiceResource = serde_json::from_str(
            r#"{"@id":"https://x/flat/","@type":["PackageBaseAddress/3.0.0","Other"]}"#,
        )
        .unwrap();
        assert!(resource.resource_type.matches(PACKAGE_BASE_ADDRESS));
    }
}
