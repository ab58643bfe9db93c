//! transitctl - Transitline demo CLI
//!
//! Wires the reporter and observer pipelines against the in-memory
//! store for demonstration and manual testing. The `demo` subcommand
//! pairs a synthetic driver with a rider over one store, which is the
//! closest a single process gets to two clients sharing a backend.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "transitctl")]
#[command(about = "Transitline demo CLI - Run tracking pipelines against an in-memory store")]
#[command(version)]
struct Cli {
    /// Output snapshots as JSON lines for machine parsing
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report a synthetic position under a bus identifier
    Report {
        /// Bus identifier to report under
        bus_id: String,

        /// How long to keep reporting, in seconds
        #[arg(long, default_value_t = 30)]
        duration_secs: u64,

        /// Synthetic fix cadence in milliseconds
        #[arg(long, default_value_t = 5000)]
        cadence_ms: u64,
    },

    /// Watch a bus identifier and print what a rider would see
    Watch {
        /// Bus identifier to watch
        bus_id: String,

        /// How long to keep watching, in seconds
        #[arg(long, default_value_t = 30)]
        duration_secs: u64,

        /// Remote poll cadence in milliseconds
        #[arg(long, default_value_t = 5000)]
        poll_ms: u64,
    },

    /// Run a driver and a rider side by side over one store
    Demo {
        /// Bus identifier shared by the driver and the rider
        #[arg(default_value = "BUS1")]
        bus_id: String,

        /// How long to run the demo, in seconds
        #[arg(long, default_value_t = 15)]
        duration_secs: u64,

        /// Synthetic fix cadence in milliseconds
        #[arg(long, default_value_t = 1000)]
        cadence_ms: u64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match &cli.command {
        Commands::Report {
            bus_id,
            duration_secs,
            cadence_ms,
        } => commands::report::execute(bus_id, *duration_secs, *cadence_ms, cli.json).await,
        Commands::Watch {
            bus_id,
            duration_secs,
            poll_ms,
        } => commands::watch::execute(bus_id, *duration_secs, *poll_ms, cli.json).await,
        Commands::Demo {
            bus_id,
            duration_secs,
            cadence_ms,
        } => commands::demo::execute(bus_id, *duration_secs, *cadence_ms, cli.json).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_report_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["transitctl", "report", "BUS1"])?;
        assert!(!cli.json);
        assert_eq!(cli.verbose, 0);
        match &cli.command {
            Commands::Report {
                bus_id,
                duration_secs,
                cadence_ms,
            } => {
                assert_eq!(bus_id, "BUS1");
                assert_eq!(*duration_secs, 30);
                assert_eq!(*cadence_ms, 5000);
            }
            _ => return Err("expected Report command".into()),
        }
        Ok(())
    }

    #[test]
    fn parse_report_custom_cadence() -> TestResult {
        let cli =
            Cli::try_parse_from(["transitctl", "report", "BUS1", "--cadence-ms", "200"])?;
        match &cli.command {
            Commands::Report { cadence_ms, .. } => assert_eq!(*cadence_ms, 200),
            _ => return Err("expected Report command".into()),
        }
        Ok(())
    }

    #[test]
    fn parse_watch_with_poll_interval() -> TestResult {
        let cli = Cli::try_parse_from([
            "transitctl",
            "watch",
            "BUS2",
            "--poll-ms",
            "1000",
            "--duration-secs",
            "5",
        ])?;
        match &cli.command {
            Commands::Watch {
                bus_id,
                duration_secs,
                poll_ms,
            } => {
                assert_eq!(bus_id, "BUS2");
                assert_eq!(*duration_secs, 5);
                assert_eq!(*poll_ms, 1000);
            }
            _ => return Err("expected Watch command".into()),
        }
        Ok(())
    }

    #[test]
    fn parse_demo_default_identifier() -> TestResult {
        let cli = Cli::try_parse_from(["transitctl", "demo"])?;
        match &cli.command {
            Commands::Demo { bus_id, .. } => assert_eq!(bus_id, "BUS1"),
            _ => return Err("expected Demo command".into()),
        }
        Ok(())
    }

    #[test]
    fn parse_global_json_flag_after_subcommand() -> TestResult {
        let cli = Cli::try_parse_from(["transitctl", "demo", "--json"])?;
        assert!(cli.json);
        Ok(())
    }

    #[test]
    fn parse_verbose_levels() -> TestResult {
        let cli1 = Cli::try_parse_from(["transitctl", "-v", "demo"])?;
        assert_eq!(cli1.verbose, 1);

        let cli3 = Cli::try_parse_from(["transitctl", "-vvv", "demo"])?;
        assert_eq!(cli3.verbose, 3);
        Ok(())
    }

    #[test]
    fn reject_no_subcommand() {
        assert!(Cli::try_parse_from(["transitctl"]).is_err());
    }

    #[test]
    fn reject_missing_bus_id() {
        assert!(Cli::try_parse_from(["transitctl", "report"]).is_err());
        assert!(Cli::try_parse_from(["transitctl", "watch"]).is_err());
    }

    #[test]
    fn reject_non_numeric_duration() {
        let result =
            Cli::try_parse_from(["transitctl", "report", "BUS1", "--duration-secs", "soon"]);
        assert!(result.is_err());
    }
}
