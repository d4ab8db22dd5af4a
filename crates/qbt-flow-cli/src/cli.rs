//! Argument parsing and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use qbt_flow_config::LogFormat;
use qbt_flow_telemetry::{init_logging, run_span};
use tracing::Instrument;
use uuid::Uuid;

use crate::commands::{handle_check_config, handle_disk, handle_plan};
use crate::context::{AppContext, CliResult};

const DEFAULT_CLIENT: &str = "local";

/// Parses CLI arguments, executes the requested command, and returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let ctx = match AppContext::from_cli(&cli) {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            return err.exit_code();
        }
    };

    if let Err(err) = init_logging(&ctx.settings) {
        eprintln!("warning: {err}");
    }

    let run_id = Uuid::new_v4().to_string();
    let span = run_span(command_label(&cli.command), &run_id);
    let result = async {
        let outcome = dispatch(cli.command, &ctx).await;
        let flushed = ctx.flush_metrics().await;
        outcome.and(flushed)
    }
    .instrument(span)
    .await;

    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

pub(crate) async fn dispatch(command: Command, ctx: &AppContext) -> CliResult<()> {
    match command {
        Command::CheckConfig => handle_check_config(ctx),
        Command::Plan(args) => handle_plan(ctx, args).await,
        Command::Disk(args) => handle_disk(ctx, args).await,
    }
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::CheckConfig => "check-config",
        Command::Plan(_) => "plan",
        Command::Disk(_) => "disk",
    }
}

#[derive(Parser)]
#[command(
    name = "qbt-flow",
    about = "Classify qBittorrent torrents and plan tag changes"
)]
pub(crate) struct Cli {
    #[arg(long, global = true, env = "QFU_CONFIG_FOLDER")]
    pub(crate) config_folder: Option<PathBuf>,
    #[arg(long, global = true, env = "QFU_DOWNLOAD_FOLDER")]
    pub(crate) download_folder: Option<PathBuf>,
    #[arg(long, global = true, env = "QFU_LOG_LEVEL")]
    pub(crate) log_level: Option<String>,
    #[arg(long, global = true, value_enum)]
    pub(crate) log_format: Option<LogFormatArg>,
    #[arg(long, global = true, help = "Skip the hard-link check for this run")]
    pub(crate) no_hard_links: bool,
    #[arg(long, global = true, help = "Skip the cross-seed check for this run")]
    pub(crate) no_cross_seed: bool,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[arg(
        long,
        global = true,
        help = "Write Prometheus metrics for the run to this file"
    )]
    pub(crate) metrics: Option<PathBuf>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Load and validate the policy directory.
    CheckConfig,
    /// Classify a torrent dump and print the tag plan.
    Plan(PlanArgs),
    /// Report disk pressure for a client.
    Disk(DiskArgs),
}

#[derive(Args)]
pub(crate) struct PlanArgs {
    #[arg(long, help = "Saved /torrents/info dump to classify")]
    pub(crate) dump: PathBuf,
    #[arg(long, default_value = DEFAULT_CLIENT)]
    pub(crate) client: String,
    #[arg(long, help = "Classify on the rayon pool; record order is not preserved")]
    pub(crate) parallel: bool,
}

#[derive(Args)]
pub(crate) struct DiskArgs {
    #[arg(long, default_value = DEFAULT_CLIENT)]
    pub(crate) client: String,
    #[arg(long, conflicts_with = "free_bytes", help = "Dump carrying free_space_on_disk")]
    pub(crate) dump: Option<PathBuf>,
    #[arg(long, help = "Free bytes reported by the client")]
    pub(crate) free_bytes: Option<u64>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogFormatArg {
    Json,
    Pretty,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Json => Self::Json,
            LogFormatArg::Pretty => Self::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn plan_arguments_parse() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from([
            "qbt-flow",
            "--output",
            "json",
            "--no-hard-links",
            "plan",
            "--dump",
            "/tmp/dump.json",
            "--parallel",
        ])?;
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(cli.no_hard_links);
        match cli.command {
            Command::Plan(args) => {
                assert_eq!(args.client, "local");
                assert!(args.parallel);
                assert_eq!(args.dump, PathBuf::from("/tmp/dump.json"));
            }
            _ => panic!("expected plan command"),
        }
        Ok(())
    }

    #[test]
    fn disk_sources_are_exclusive() {
        let parsed = Cli::try_parse_from([
            "qbt-flow",
            "disk",
            "--dump",
            "/tmp/dump.json",
            "--free-bytes",
            "10",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn command_labels_match_subcommands() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from(["qbt-flow", "check-config"])?;
        assert_eq!(command_label(&cli.command), "check-config");
        Ok(())
    }
}
