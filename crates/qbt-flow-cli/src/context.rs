//! Run context, error types, and telemetry wiring for the CLI.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use qbt_flow_classify::ClassifyError;
use qbt_flow_config::{ConfigError, Policy, RunSettings, load_policy_dir};
use qbt_flow_telemetry::Metrics;

use crate::cli::{Cli, OutputFormat};

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
    NoQualifyingTorrents(String),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
            Self::NoQualifyingTorrents(_) => 4,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::NoQualifyingTorrents(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let detail = describe_config_error(&err);
        match err {
            ConfigError::Io { .. } | ConfigError::Pattern { .. } => {
                Self::Failure(anyhow::Error::new(err).context(detail))
            }
            _ => Self::Validation(detail),
        }
    }
}

impl From<ClassifyError> for CliError {
    fn from(err: ClassifyError) -> Self {
        match err {
            ClassifyError::NoQualifyingTorrents {
                received,
                invalid,
                excluded,
            } => Self::NoQualifyingTorrents(format!(
                "{err}: {received} received, {invalid} invalid, {excluded} outside the seeding phase"
            )),
        }
    }
}

/// Render the structured fields of a configuration error for operators.
pub(crate) fn describe_config_error(err: &ConfigError) -> String {
    match err {
        ConfigError::InvalidField {
            section,
            field,
            value,
            reason,
        } => value.as_ref().map_or_else(
            || format!("{err}: {section}.{field} {reason}"),
            |value| format!("{err}: {section}.{field} = {value:?} {reason}"),
        ),
        ConfigError::Duplicate {
            section,
            field,
            value,
        }
        | ConfigError::UnknownReference {
            section,
            field,
            value,
        } => format!("{err}: {section}.{field} = {value:?}"),
        ConfigError::MissingClient { name } => format!("{err}: {name}"),
        ConfigError::EmptyDirectory { path }
        | ConfigError::Document { path, .. }
        | ConfigError::YamlDocument { path, .. } => {
            format!("{err}: {}", path.display())
        }
        ConfigError::InvalidEnv { name, value } => format!("{err}: {name}={value:?}"),
        ConfigError::Pattern { pattern, .. } => format!("{err}: {pattern}"),
        ConfigError::Io {
            operation, path, ..
        } => format!("{err}: {operation} {}", path.display()),
    }
}

/// Application context passed to command handlers.
pub(crate) struct AppContext {
    pub(crate) settings: RunSettings,
    pub(crate) output: OutputFormat,
    pub(crate) metrics: Metrics,
    pub(crate) metrics_path: Option<PathBuf>,
}

impl AppContext {
    /// Resolve settings from `QFU_*` variables, then apply command-line overrides.
    pub(crate) fn from_cli(cli: &Cli) -> CliResult<Self> {
        let settings = RunSettings::from_env()?;
        Self::with_settings(cli, settings)
    }

    pub(crate) fn with_settings(cli: &Cli, mut settings: RunSettings) -> CliResult<Self> {
        if let Some(folder) = &cli.config_folder {
            settings.config_folder.clone_from(folder);
        }
        if let Some(folder) = &cli.download_folder {
            settings.download_folder.clone_from(folder);
        }
        if let Some(level) = &cli.log_level {
            settings.log_level = level.to_lowercase();
        }
        if let Some(format) = cli.log_format {
            settings.log_format = format.into();
        }
        if cli.no_hard_links {
            settings.checks.hard_links = false;
        }
        if cli.no_cross_seed {
            settings.checks.cross_seed = false;
        }

        let metrics = Metrics::new().map_err(CliError::failure)?;
        Ok(Self {
            settings,
            output: cli.output,
            metrics,
            metrics_path: cli.metrics.clone(),
        })
    }

    /// Load and validate the policy directory.
    pub(crate) fn load_policy(&self) -> CliResult<Policy> {
        Ok(load_policy_dir(&self.settings.config_folder, &self.settings)?)
    }

    /// Write the Prometheus exposition to `--metrics`, when requested.
    pub(crate) async fn flush_metrics(&self) -> CliResult<()> {
        let Some(path) = &self.metrics_path else {
            return Ok(());
        };
        let rendered = self.metrics.render().map_err(CliError::failure)?;
        tokio::fs::write(path, rendered).await.map_err(|err| {
            CliError::failure(
                anyhow::Error::new(err)
                    .context(format!("failed to write metrics to {}", path.display())),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_distinguish_error_kinds() {
        assert_eq!(CliError::validation("bad").exit_code(), 2);
        assert_eq!(CliError::failure(anyhow::anyhow!("io")).exit_code(), 3);
        let none: CliError = ClassifyError::NoQualifyingTorrents {
            received: 2,
            invalid: 0,
            excluded: 2,
        }
        .into();
        assert_eq!(none.exit_code(), 4);
        assert!(none.display_message().contains("2 outside the seeding phase"));
    }

    #[test]
    fn config_errors_keep_their_fields() {
        let err: CliError = ConfigError::Duplicate {
            section: "trackers".into(),
            field: "tracker_tag".into(),
            value: "Alpha".into(),
        }
        .into();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.display_message(),
            "duplicate configuration value: trackers.tracker_tag = \"Alpha\""
        );

        let missing: CliError = ConfigError::MissingClient {
            name: "local".into(),
        }
        .into();
        assert!(missing.display_message().ends_with(": local"));
    }

    #[test]
    fn io_config_errors_are_failures() {
        let err: CliError = ConfigError::Io {
            operation: "config.read_dir",
            path: PathBuf::from("/config/trackers"),
            source: std::io::Error::other("denied"),
        }
        .into();
        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().contains("/config/trackers"));
    }

    #[test]
    fn command_line_overrides_logging_settings() -> anyhow::Result<()> {
        use clap::Parser;
        use qbt_flow_config::LogFormat;

        let cli = Cli::try_parse_from([
            "qbt-flow",
            "--log-level",
            "DEBUG",
            "--log-format",
            "json",
            "check-config",
        ])?;
        let ctx = AppContext::with_settings(&cli, RunSettings::default())
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;
        assert_eq!(ctx.settings.log_level, "debug");
        assert_eq!(ctx.settings.log_format, LogFormat::Json);

        let plain = Cli::try_parse_from(["qbt-flow", "check-config"])?;
        let ctx = AppContext::with_settings(&plain, RunSettings::default())
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;
        assert_eq!(ctx.settings.log_format, LogFormat::Pretty);
        Ok(())
    }

    mod policy_log {
        use std::fmt;
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        use tracing::field::{Field, Visit};
        use tracing::{Event, Subscriber};
        use tracing_subscriber::layer::{Context, Layer};

        /// Counts events whose message is `policy loaded`.
        #[derive(Clone, Default)]
        pub(super) struct PolicyLoadedCounter(pub(super) Arc<AtomicUsize>);

        struct MessageMatch(bool);

        impl Visit for MessageMatch {
            fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
                if field.name() == "message" && format!("{value:?}") == "policy loaded" {
                    self.0 = true;
                }
            }
        }

        impl<S: Subscriber> Layer<S> for PolicyLoadedCounter {
            fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
                let mut matched = MessageMatch(false);
                event.record(&mut matched);
                if matched.0 {
                    self.0.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        impl PolicyLoadedCounter {
            pub(super) fn count(&self) -> usize {
                self.0.load(Ordering::SeqCst)
            }
        }
    }

    #[test]
    fn loading_policy_logs_once() -> anyhow::Result<()> {
        use clap::Parser;
        use qbt_flow_test_support::fixtures::write_config_dir;
        use tracing_subscriber::layer::SubscriberExt;

        let temp = tempfile::TempDir::new()?;
        write_config_dir(temp.path())?;
        let cli = Cli::try_parse_from(["qbt-flow", "check-config"])?;
        let settings = RunSettings {
            config_folder: temp.path().to_path_buf(),
            ..RunSettings::default()
        };
        let ctx = AppContext::with_settings(&cli, settings)
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;

        let counter = policy_log::PolicyLoadedCounter::default();
        let subscriber = tracing_subscriber::registry().with(counter.clone());
        let loaded = tracing::subscriber::with_default(subscriber, || ctx.load_policy());
        loaded.map_err(|err| anyhow::anyhow!(err.display_message()))?;
        assert_eq!(counter.count(), 1);
        Ok(())
    }
}
