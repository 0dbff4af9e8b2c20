use std::{path::PathBuf, process::ExitCode};

use thiserror::Error;
use tracing::{error, info};

use crate::{
    config::{path::PathContext, sources::Environment, Config, ConfigError},
    hubstaff::{Credentials, HubstaffApi, HubstaffError},
    report::{aggregate, html::render, ReportData, ReportWindow},
    utils::clock::Clock,
};

/// Builds an API client out of the resolved credentials.
pub type ClientFactory =
    Box<dyn FnMut(Credentials) -> Result<Box<dyn HubstaffApi>, HubstaffError>>;

/// Steps of a report run. Every step can end in [CommandState::Failed].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Init,
    ConfigLoaded,
    Authenticated,
    ConfigSaved,
    ReportBuilt,
    Failed,
}

/// Result of [Command::handle], mapped to the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    Failure,
}

impl From<CommandOutcome> for ExitCode {
    fn from(value: CommandOutcome) -> Self {
        match value {
            CommandOutcome::Success => ExitCode::SUCCESS,
            CommandOutcome::Failure => ExitCode::FAILURE,
        }
    }
}

#[derive(Debug, Error)]
enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Authentication(HubstaffError),
    #[error("Hubstaff request failed: {0}")]
    Api(HubstaffError),
    #[error("no report file configured")]
    MissingReportFile,
    #[error("failed to write report {path:?}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<HubstaffError> for CommandError {
    fn from(value: HubstaffError) -> Self {
        match value {
            HubstaffError::Authentication(_) => CommandError::Authentication(value),
            _ => CommandError::Api(value),
        }
    }
}

/// Runs a single report: loads config, authenticates, saves config, then fetches, aggregates,
/// renders and writes the report.
pub struct Command {
    config: Config,
    environment: Environment,
    paths: PathContext,
    clock: Box<dyn Clock>,
    client_factory: ClientFactory,
    state: CommandState,
}

impl Command {
    pub fn new(
        config: Config,
        environment: Environment,
        paths: PathContext,
        clock: Box<dyn Clock>,
        client_factory: ClientFactory,
    ) -> Self {
        Self {
            config,
            environment,
            paths,
            clock,
            client_factory,
            state: CommandState::Init,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> CommandState {
        self.state
    }

    /// Never fails: errors are logged and the command ends in [CommandState::Failed].
    pub async fn handle(&mut self) -> CommandOutcome {
        if let Err(e) = self.run().await {
            match &e {
                CommandError::Config(ConfigError::Invalid(errors)) => {
                    let fields = errors.iter().map(|v| v.field.name()).collect::<Vec<_>>();
                    error!(?fields, "{e}")
                }
                CommandError::Authentication(_) => error!("Couldn't authenticate in Hubstaff: {e}"),
                _ => error!("Report failed: {e}"),
            }
            self.state = CommandState::Failed;
            return CommandOutcome::Failure;
        }
        CommandOutcome::Success
    }

    async fn run(&mut self) -> Result<(), CommandError> {
        self.load_config()?;
        self.state = CommandState::ConfigLoaded;

        let client = self.init_client().await?;
        self.state = CommandState::Authenticated;

        self.save_config()?;
        self.state = CommandState::ConfigSaved;

        self.build_report(client.as_ref()).await?;
        self.state = CommandState::ReportBuilt;
        Ok(())
    }

    fn load_config(&mut self) -> Result<(), CommandError> {
        self.config.load(&self.environment, &self.paths)?;
        Ok(())
    }

    async fn init_client(&mut self) -> Result<Box<dyn HubstaffApi>, CommandError> {
        let mut client = (self.client_factory)(self.config.credentials())?;
        let auth_token = client.authenticate().await?;
        self.config.hubstaff_auth_token = Some(auth_token);
        Ok(client)
    }

    fn save_config(&self) -> Result<(), CommandError> {
        self.config.save()?;
        Ok(())
    }

    async fn get_report_data(
        &self,
        client: &dyn HubstaffApi,
        window: ReportWindow,
    ) -> Result<ReportData, CommandError> {
        let users = client.get_users_list(true).await?;
        let activities = client
            .get_activities_list(window.date_from, window.date_to)
            .await?;
        info!(
            users = users.len(),
            activities = activities.len(),
            "Fetched report data"
        );
        Ok(aggregate(
            &users,
            &activities,
            window.date_from,
            window.date_to,
        ))
    }

    async fn build_report(&self, client: &dyn HubstaffApi) -> Result<(), CommandError> {
        let path = self
            .config
            .report_filename
            .clone()
            .ok_or(CommandError::MissingReportFile)?;
        let window = self.config.report_window(self.clock.today());

        let report = self.get_report_data(client, window).await?;
        let html = render(&report);

        if let Err(source) = tokio::fs::write(&path, html).await {
            return Err(CommandError::Output { path, source });
        }
        info!("Saved report into {path:?}");
        Ok(())
    }
}
