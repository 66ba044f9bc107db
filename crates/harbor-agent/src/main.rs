//! Harbor agent configuration front end.
//!
//! Runs the configuration pipeline over the agent command line and prints
//! the resolved runtime configuration. Everything after the front end's own
//! options is handed to the agent flag parser untouched.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use harbor_config::{ConfigError, FlagSet, ShowFormat};
use harbor_telemetry::{LogConfig, LogFormat, setup_logging};
use tracing::debug;

const PROGRAM: &str = "harbor-agent";

/// Resolve and print the Harbor agent runtime configuration
#[derive(Parser, Debug)]
#[command(name = PROGRAM)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level filter for diagnostics (e.g. "info", "harbor_config=debug")
    #[arg(long, env = "HARBOR_LOG", default_value = "warn")]
    log_level: String,

    /// Diagnostic log format: pretty, compact, json or full
    #[arg(long, default_value = "compact")]
    log_format: LogFormat,

    /// Output format for the resolved configuration
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Agent flags, e.g. `-config-dir /etc/harbor.d -server`. Put them
    /// after `--` when one of them collides with an option above.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    agent_args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Toml,
}

impl From<OutputFormat> for ShowFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => Self::Json,
            OutputFormat::Toml => Self::Toml,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::new(&cli.log_level).with_format(cli.log_format);
    setup_logging(&log_config).context("failed to initialize logging")?;
    debug!(args = ?cli.agent_args, "resolving agent configuration");

    let resolved = match harbor_config::load(&cli.agent_args) {
        Ok(resolved) => resolved,
        Err(ConfigError::HelpRequested) => {
            print!("{}", FlagSet::agent().usage(PROGRAM));
            return Ok(());
        },
        Err(e) => return Err(e).context("invalid agent configuration"),
    };

    let output = resolved
        .show(cli.format.into())
        .context("failed to render configuration")?;
    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_agent_args_pass_through() {
        let cli = Cli::try_parse_from([
            PROGRAM,
            "--format",
            "toml",
            "--",
            "-bind",
            "0.0.0.0",
            "-server",
            "--datacenter=east",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Toml);
        assert_eq!(
            cli.agent_args,
            vec!["-bind", "0.0.0.0", "-server", "--datacenter=east"]
        );
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from([PROGRAM]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Compact);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.agent_args.is_empty());
    }

    #[test]
    fn test_bad_log_format_rejected() {
        assert!(Cli::try_parse_from([PROGRAM, "--log-format", "xml"]).is_err());
    }
}
