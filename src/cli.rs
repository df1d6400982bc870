//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use apilink_core::{ClientConfig, TransportKind};

/// Call JSON APIs and download files.
///
/// Every API call prints one result envelope as JSON; downloads print the
/// metadata of the saved file.
#[derive(Parser, Debug)]
#[command(name = "apilink")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Transport used for API calls (per-call, pooled, classifying, reactive)
    #[arg(short, long, global = true)]
    pub transport: Option<TransportKind>,

    /// API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Resource path under the base URL
    #[arg(long, global = true)]
    pub resource: Option<String>,

    /// Directory downloads are written to
    #[arg(long, global = true)]
    pub storage_dir: Option<PathBuf>,

    /// Connect timeout in seconds (1-300)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..=300))]
    pub connect_timeout: Option<u64>,

    /// Whole-request timeout for blocking transports in seconds (1-3600)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: Option<u64>,

    /// Response timeout for the reactive transport and downloads in seconds (1-3600)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub response_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Operations offered by the binary.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    #[command(flatten)]
    Api(ApiCommand),
    /// Stream a remote file into the storage directory
    Download {
        /// Base URL of the file server
        base: String,
        /// Path of the file on the server
        path: String,
    },
}

/// Calls against the configured resource; each prints one envelope.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ApiCommand {
    /// List the resource collection
    List {
        /// Query parameter as key=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Fetch one item
    Get {
        /// Item identifier
        id: String,
    },
    /// Create an item from a JSON body
    Create {
        /// Request body as JSON text
        #[arg(long)]
        json: String,
    },
    /// Replace an item with a JSON body
    Replace {
        /// Item identifier
        id: String,
        /// Request body as JSON text
        #[arg(long)]
        json: String,
    },
    /// Partially update an item with a JSON body
    Update {
        /// Item identifier
        id: String,
        /// Request body as JSON text
        #[arg(long)]
        json: String,
    },
    /// Delete an item
    Delete {
        /// Item identifier
        id: String,
    },
}

impl Args {
    /// Applies flags on top of a configuration resolved from the environment.
    pub fn apply_to(&self, config: &mut ClientConfig) {
        if let Some(transport) = self.transport {
            config.transport = transport;
        }
        if let Some(base_url) = &self.base_url {
            config.base_url.clone_from(base_url);
        }
        if let Some(resource) = &self.resource {
            config.resource.clone_from(resource);
        }
        if let Some(dir) = &self.storage_dir {
            config.storage_root.clone_from(dir);
        }
        if let Some(secs) = self.connect_timeout {
            config.http.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.read_timeout {
            config.http.read_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.response_timeout {
            config.http.response_timeout = Duration::from_secs(secs);
        }
    }
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_get_parses_id_with_defaults() {
        let args = Args::try_parse_from(["apilink", "get", "1"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(args.transport.is_none());
        assert_eq!(
            args.command,
            Command::Api(ApiCommand::Get { id: "1".to_string() })
        );
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["apilink", "-v", "get", "1"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["apilink", "get", "1", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["apilink", "--quiet", "delete", "3"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_transport_flag_parses_every_kind() {
        for kind in TransportKind::ALL {
            let args =
                Args::try_parse_from(["apilink", "--transport", kind.as_str(), "get", "1"]).unwrap();
            assert_eq!(args.transport, Some(kind));
        }
    }

    #[test]
    fn test_cli_unknown_transport_rejected() {
        let result = Args::try_parse_from(["apilink", "-t", "telegraph", "get", "1"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_list_collects_params_in_order() {
        let args =
            Args::try_parse_from(["apilink", "list", "-p", "userId=1", "--param", "q=a=b"]).unwrap();
        assert_eq!(
            args.command,
            Command::Api(ApiCommand::List {
                params: vec![
                    ("userId".to_string(), "1".to_string()),
                    ("q".to_string(), "a=b".to_string()),
                ]
            })
        );
    }

    #[test]
    fn test_cli_list_rejects_param_without_key() {
        let result = Args::try_parse_from(["apilink", "list", "-p", "=1"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_update_requires_json() {
        let result = Args::try_parse_from(["apilink", "update", "1"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_download_takes_base_and_path() {
        let args =
            Args::try_parse_from(["apilink", "download", "https://files.test", "/a/b.png"]).unwrap();
        assert_eq!(
            args.command,
            Command::Download {
                base: "https://files.test".to_string(),
                path: "/a/b.png".to_string(),
            }
        );
    }

    #[test]
    fn test_cli_timeout_zero_rejected() {
        let result = Args::try_parse_from(["apilink", "--connect-timeout", "0", "get", "1"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_missing_subcommand_is_error() {
        assert!(Args::try_parse_from(["apilink"]).is_err());
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["apilink", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_apply_to_overrides_only_given_flags() {
        let args = Args::try_parse_from([
            "apilink",
            "--base-url",
            "http://localhost:8080",
            "--read-timeout",
            "30",
            "--storage-dir",
            "/srv/incoming",
            "get",
            "1",
        ])
        .unwrap();
        let mut config = ClientConfig::default();
        args.apply_to(&mut config);

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.http.read_timeout, Duration::from_secs(30));
        assert_eq!(config.storage_root, PathBuf::from("/srv/incoming"));
        assert_eq!(config.resource, ClientConfig::default().resource);
        assert_eq!(config.transport, TransportKind::Reactive);
    }
}
