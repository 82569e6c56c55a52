//! CLI configuration and argument parsing.

use crate::error::UpdaterError;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Default per-call timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Talos node updater.
///
/// Compares a node's running Talos version and extension schematic with the
/// desired tag and submits an upgrade when they differ.
#[derive(Parser, Debug, Clone)]
#[command(name = "tnu")]
#[command(about = "Upgrade a Talos node to the desired version when it has drifted")]
#[command(version)]
pub struct Args {
    /// Address of the node to reconcile
    #[arg(long, env = "TNU_NODE")]
    pub node: String,

    /// Desired Talos version tag (e.g. v1.8.0)
    #[arg(long, env = "TNU_TAG")]
    pub tag: String,

    /// Power cycle the node instead of the default reboot
    #[arg(long, default_value = "false")]
    pub powercycle: bool,

    /// Stage the upgrade to be applied on the next reboot
    #[arg(long, default_value = "false")]
    pub staged: bool,

    /// Path to the talosconfig file [default: ~/.talos/config]
    #[arg(long, env = "TALOSCONFIG")]
    pub talosconfig: Option<PathBuf>,

    /// talosconfig context to use [default: current context]
    #[arg(long)]
    pub talos_context: Option<String>,

    /// Kubernetes context to use
    #[arg(long, env = "KUBECONFIG_CONTEXT")]
    pub kube_context: Option<String>,

    /// Timeout for each API call, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "TNU_LOG_LEVEL")]
    pub log_level: String,
}

/// Application configuration derived from CLI args.
#[derive(Debug, Clone)]
pub struct Config {
    pub node: String,
    pub tag: String,
    pub powercycle: bool,
    pub staged: bool,
    pub talosconfig: Option<PathBuf>,
    pub talos_context: Option<String>,
    pub kube_context: Option<String>,
    pub timeout: Duration,
    pub log_level: String,
}

impl Config {
    /// Create a validated config from CLI arguments.
    pub fn from_args(args: Args) -> Result<Self, UpdaterError> {
        let node = args.node.trim().to_string();
        if node.is_empty() {
            return Err(UpdaterError::InvalidConfig("--node must not be empty".to_string()));
        }

        let tag = args.tag.trim().to_string();
        if tag.is_empty() {
            return Err(UpdaterError::InvalidConfig("--tag must not be empty".to_string()));
        }

        if args.timeout == 0 {
            return Err(UpdaterError::InvalidConfig(
                "--timeout must be at least 1 second".to_string(),
            ));
        }

        Ok(Self {
            node,
            tag,
            powercycle: args.powercycle,
            staged: args.staged,
            talosconfig: args.talosconfig,
            talos_context: args.talos_context,
            kube_context: args.kube_context,
            timeout: Duration::from_secs(args.timeout),
            log_level: args.log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["tnu", "--node", "10.0.0.11", "--tag", "v1.8.0"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_args(parse(&[])).unwrap();

        assert_eq!(config.node, "10.0.0.11");
        assert_eq!(config.tag, "v1.8.0");
        assert!(!config.powercycle);
        assert!(!config.staged);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_flags() {
        let config = Config::from_args(parse(&[
            "--powercycle",
            "--staged",
            "--timeout",
            "5",
            "--talos-context",
            "homelab",
        ]))
        .unwrap();

        assert!(config.powercycle);
        assert!(config.staged);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.talos_context.as_deref(), Some("homelab"));
    }

    #[test]
    fn test_empty_tag_rejected() {
        let args = Args::try_parse_from(["tnu", "--node", "10.0.0.11", "--tag", " "]).unwrap();
        assert!(matches!(
            Config::from_args(args),
            Err(UpdaterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(matches!(
            Config::from_args(parse(&["--timeout", "0"])),
            Err(UpdaterError::InvalidConfig(_))
        ));
    }
}
