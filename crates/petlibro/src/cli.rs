//! Clap derive structures for the `petlibro` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// petlibro -- monitor and control PETLIBRO feeders and fountains
#[derive(Debug, Parser)]
#[command(
    name = "petlibro",
    version,
    about = "Monitor and control PETLIBRO feeders and fountains",
    long_about = "Talks to the PETLIBRO cloud API on behalf of your account.\n\n\
        Discovers registered devices, shows their state, dispenses food,\n\
        and toggles feeding plans.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "PETLIBRO_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Account email
    #[arg(long, short = 'e', env = "PETLIBRO_EMAIL", global = true)]
    pub email: Option<String>,

    /// Account password (read from the environment only)
    #[arg(long, env = "PETLIBRO_PASSWORD", hide = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Session token from an earlier login (read from the environment only)
    #[arg(long, env = "PETLIBRO_TOKEN", hide = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Account region
    #[arg(long, env = "PETLIBRO_REGION", global = true)]
    pub region: Option<String>,

    /// IANA time zone reported to the API
    #[arg(long, env = "PETLIBRO_TIMEZONE", global = true)]
    pub timezone: Option<String>,

    /// Poll interval in seconds for `watch`
    #[arg(long, global = true)]
    pub interval: Option<u64>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

// ── Value Enums ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default)
    Table,
    /// Pretty-printed JSON
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(self) -> bool {
        self == Self::On
    }
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the account's devices
    #[command(alias = "ls")]
    Devices,

    /// Show one device in detail
    Device {
        /// Device serial number
        serial: String,
    },

    /// Dispense food now
    Feed {
        /// Device serial number
        serial: String,

        /// Portions to dispense (defaults to the configured amount)
        #[arg(long, short = 'n')]
        portions: Option<u32>,
    },

    /// Turn the scheduled feeding plan on or off
    FeedingPlan {
        /// Device serial number
        serial: String,
        state: Toggle,
    },

    /// Enable or skip every plan entry for today
    TodayPlans {
        /// Device serial number
        serial: String,
        state: Toggle,
    },

    /// Poll devices and print a line per update until interrupted
    Watch,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_feed_with_portions() {
        let cli = Cli::try_parse_from(["petlibro", "feed", "AF0301", "-n", "2"])
            .unwrap_or_else(|e| panic!("{e}"));
        match cli.command {
            Command::Feed { serial, portions } => {
                assert_eq!(serial, "AF0301");
                assert_eq!(portions, Some(2));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_feeding_plan_toggle() {
        let cli = Cli::try_parse_from(["petlibro", "-o", "json", "feeding-plan", "AF0301", "off"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(cli.global.output, OutputFormat::Json);
        assert!(matches!(
            cli.command,
            Command::FeedingPlan { state: Toggle::Off, .. }
        ));
    }
}
