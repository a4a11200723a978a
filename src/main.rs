use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use nuget_inspect::commands::{InspectArgs, inspect};
use nuget_inspect::render::OutputFormat;
use nuget_inspect::runtime::{RealRuntime, Runtime};
use tokio_util::sync::CancellationToken;

/// nuget-inspect - NuGet package metadata inspector
///
/// Resolve one exact package version against the configured NuGet feeds and
/// print its manifest metadata.
///
/// Feeds come from nuget.config files discovered from the current directory
/// upwards, or from the file given with --config. Without any config file
/// the nuget.org feed is used.
///
/// Examples:
///   nuget-inspect Newtonsoft.Json --version 13.0.3
///   nuget-inspect Serilog -v 3.1.1 --format json
#[derive(Parser, Debug)]
#[command(
    author,
    version = env!("NUGET_INSPECT_VERSION"),
    about,
    disable_version_flag = true
)]
struct Cli {
    /// The NuGet package ID to inspect
    #[arg(value_name = "PACKAGE")]
    package: String,

    /// The exact package version to inspect (required)
    #[arg(long, short = 'v', value_name = "VERSION")]
    version: Option<String>,

    /// Path to a nuget.config file (also via NUGET_INSPECT_CONFIG)
    #[arg(long, short = 'c', env = "NUGET_INSPECT_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Include prerelease versions when resolving
    #[arg(long)]
    include_prerelease: bool,
}

impl From<Cli> for InspectArgs {
    fn from(cli: Cli) -> Self {
        InspectArgs {
            package: cli.package,
            version: cli.version,
            config: cli.config,
            format: cli.format,
            include_prerelease: cli.include_prerelease,
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Usage errors are invalid arguments (exit 1); clap's own status 2 would
    // read as package-not-found.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let ctrl_c_handler = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, cancelling...");
            trigger.cancel();
        }
    });

    let runtime: Arc<dyn Runtime> = Arc::new(RealRuntime);
    let args = InspectArgs::from(cli);
    let code = inspect(runtime, &args, &cancel, &mut io::stdout(), &mut io::stderr()).await;

    ctrl_c_handler.abort();
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["nuget-inspect", "Newtonsoft.Json", "--version", "13.0.3"])
            .unwrap();
        assert_eq!(cli.package, "Newtonsoft.Json");
        assert_eq!(cli.version.as_deref(), Some("13.0.3"));
        assert_eq!(cli.format, OutputFormat::Table);
        assert!(!cli.include_prerelease);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::try_parse_from([
            "nuget-inspect",
            "Foo",
            "-v",
            "1.0.0-beta",
            "-c",
            "/tmp/nuget.config",
            "-f",
            "json",
            "--include-prerelease",
        ])
        .unwrap();
        assert_eq!(cli.version.as_deref(), Some("1.0.0-beta"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/nuget.config")));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.include_prerelease);
    }

    #[test]
    fn test_cli_version_is_optional_at_parse_time() {
        let cli = Cli::try_parse_from(["nuget-inspect", "Foo"]).unwrap();
        assert_eq!(cli.version, None);
    }

    #[test]
    fn test_cli_missing_package_fails() {
        assert!(Cli::try_parse_from(["nuget-inspect"]).is_err());
    }

    #[test]
    fn test_cli_unknown_format_fails() {
        assert!(Cli::try_parse_from(["nuget-inspect", "Foo", "-v", "1.0", "-f", "xml"]).is_err());
    }

    #[test]
    fn test_into_inspect_args() {
        let cli = Cli::try_parse_from(["nuget-inspect", "Foo", "-v", "2.0"]).unwrap();
        let args = InspectArgs::from(cli);
        assert_eq!(args.package, "Foo");
        assert_eq!(args.version.as_deref(), Some("2.0"));
    }
}
