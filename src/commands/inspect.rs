use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use log::{debug, error};
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::config::load_sources;
use crate::error::InspectError;
use crate::feed::FeedClientFactory;
use crate::http::HttpClient;
use crate::inspect::Inspector;
use crate::nuspec::NupkgReader;
use crate::package::{PackageIdentity, PackageMetadata};
use crate::render::{OutputFormat, render, render_error};
use crate::runtime::Runtime;

/// Per-request timeout for feed HTTP calls.
const REQUEST_TIMEOUT_SECS: u64 = 100;

/// Arguments of one inspection, as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct InspectArgs {
    pub package: String,
    pub version: Option<String>,
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
    pub include_prerelease: bool,
}

fn user_agent() -> String {
    format!("nuget-inspect/{}", env!("NUGET_INSPECT_VERSION"))
}

#[tracing::instrument(skip(runtime, cancel))]
async fn resolve(
    runtime: Arc<dyn Runtime>,
    args: &InspectArgs,
    cancel: &CancellationToken,
) -> Result<PackageMetadata, InspectError> {
    let package = args.package.trim();
    if package.is_empty() {
        return Err(InspectError::invalid_argument("Package ID is required."));
    }
    let version = args
        .version
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| InspectError::invalid_argument("Version is required."))?;

    let sources = load_sources(runtime.as_ref(), args.config.as_deref())?.enabled_sources();
    debug!("Using {} enabled source(s)", sources.len());

    let client = Client::builder()
        .user_agent(user_agent())
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .context("Failed to build HTTP client")?;
    let factory = FeedClientFactory::new(HttpClient::new(client), runtime);
    let clients = factory.create_all(&sources);

    let request = PackageIdentity::new(package, version);
    Inspector::new(NupkgReader)
        .resolve(&request, &clients, args.include_prerelease, cancel)
        .await
}

/// Run one inspection and report the outcome.
///
/// Metadata goes to `out`, failures to `err` as `Error: <message>`.
/// Returns the process exit status.
pub async fn inspect<W: Write, E: Write>(
    runtime: Arc<dyn Runtime>,
    args: &InspectArgs,
    cancel: &CancellationToken,
    out: &mut W,
    err: &mut E,
) -> i32 {
    let outcome = match resolve(runtime, args, cancel).await {
        Ok(metadata) => render(out, &metadata, args.format)
            .map_err(|e| InspectError::from(e.context("Failed to write output"))),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => 0,
        Err(e) => {
            debug!("Inspection failed ({}): {}", e.kind(), e);
            if let Err(write_err) = render_error(err, &e.to_string()) {
                error!("Failed to report error: {:#}", write_err);
            }
            e.exit_code()
        }
    }
}
