pub mod command;

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use command::{ClientFactory, Command};
use tracing::{info, level_filters::LevelFilter};

use crate::{
    config::{
        path::{normalize_path, PathContext},
        schema::Field,
        sources::{Environment, RawValues},
        Config, DEFAULT_CONFIG_FILENAME,
    },
    hubstaff::{client::HubstaffClient, client::DEFAULT_BASE_URL, HubstaffApi},
    utils::{clock::DefaultClock, logging::enable_logging},
};

#[derive(Parser, Debug)]
#[command(name = "rtbot34", version, long_about = None)]
#[command(about = "Builds an HTML report of time tracked in Hubstaff", long_about = None)]
struct Args {
    #[arg(
        long,
        help = "Config file. Values given on the command line are saved into it after a successful login",
        default_value = DEFAULT_CONFIG_FILENAME
    )]
    config_file: String,
    #[arg(long, help = "Hubstaff application token")]
    app_token: Option<String>,
    #[arg(long, help = "Hubstaff auth token. Obtained with username and password when missing")]
    auth_token: Option<String>,
    #[arg(long, help = "Hubstaff account e-mail")]
    username: Option<String>,
    #[arg(long, help = "Ask for the Hubstaff account password")]
    password: bool,
    #[arg(long, help = "Where to save the report. Defaults to ~/rtbot34.html")]
    html_file: Option<String>,
    #[arg(long, help = "Report date, YYYY-MM-DD. Takes precedence over --days-ago")]
    date: Option<String>,
    #[arg(long, help = "Report on the day this many days before today, 1 by default")]
    days_ago: Option<String>,
    #[arg(long, hide = true)]
    api_url: Option<String>,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(long, help = "Also write logs into daily rotated files in this directory")]
    log_dir: Option<PathBuf>,
}

impl Args {
    /// Values given on the command line, unvalidated.
    fn overrides(&self, password: Option<String>) -> RawValues {
        [
            (Field::HubstaffAppToken, self.app_token.clone()),
            (Field::HubstaffAuthToken, self.auth_token.clone()),
            (Field::HubstaffUsername, self.username.clone()),
            (Field::HubstaffPassword, password),
            (Field::ReportFilename, self.html_file.clone()),
            (Field::ReportDate, self.date.clone()),
            (Field::ReportDaysAgo, self.days_ago.clone()),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .collect()
    }
}

fn client_factory(base_url: String) -> ClientFactory {
    Box::new(move |credentials| {
        let client = HubstaffClient::with_base_url(base_url.clone(), credentials)?;
        Ok(Box::new(client) as Box<dyn HubstaffApi>)
    })
}

pub async fn run_cli() -> Result<ExitCode> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(args.log_dir.as_deref(), logging_level)?;

    let password = if args.password {
        Some(rpassword::prompt_password("Hubstaff password: ").context("Couldn't read password")?)
    } else {
        None
    };

    let paths = PathContext::from_process()?;
    let config_path = normalize_path(
        Some(args.config_file.as_str()),
        Some(DEFAULT_CONFIG_FILENAME),
        &paths,
    )
    .context("Couldn't resolve config file path")?;
    info!("Using config file {config_path:?}");

    let base_url = args
        .api_url
        .clone()
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let mut command = Command::new(
        Config::with_overrides(config_path, args.overrides(password)),
        Environment::from_process(),
        paths,
        Box::new(DefaultClock),
        client_factory(base_url),
    );
    Ok(command.handle().await.into())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::config::{schema::Field, DEFAULT_CONFIG_FILENAME};

    use super::Args;

    #[test]
    fn test_flags_become_raw_overrides() -> anyhow::Result<()> {
        let args = Args::try_parse_from([
            "rtbot34",
            "--app-token",
            "app",
            "--username",
            "test@hubstaff.com",
            "--password",
            "--days-ago",
            "not a number",
        ])?;
        assert_eq!(args.config_file, DEFAULT_CONFIG_FILENAME);
        assert!(args.password);

        let overrides = args.overrides(Some("secret".into()));
        assert_eq!(overrides.len(), 4);
        assert_eq!(overrides[&Field::HubstaffAppToken], "app");
        assert_eq!(overrides[&Field::HubstaffPassword], "secret");
        assert_eq!(overrides[&Field::ReportDaysAgo], "not a number");
        assert!(!overrides.contains_key(&Field::ReportDate));
        Ok(())
    }

    #[test]
    fn test_no_flags_leave_everything_to_other_sources() -> anyhow::Result<()> {
        let args = Args::try_parse_from(["rtbot34", "--config-file", "/tmp/rc", "--log"])?;
        assert_eq!(args.config_file, "/tmp/rc");
        assert!(args.log);
        assert!(args.overrides(None).is_empty());
        Ok(())
    }
}
