//! Layered configuration. Every field is resolved from, in priority order, an explicit value, an
//! environment variable and the INI config file, falling back to the schema default.
//! See [schema::Field] for the list of fields.

pub mod ini;
pub mod path;
pub mod schema;
pub mod sources;

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::{Duration, NaiveDate};
use ini::IniDocument;
use path::PathContext;
use schema::{Field, FieldError, Value, DEFAULT_DAYS_AGO};
use sources::{Environment, RawValues, Sources};
use thiserror::Error;
use tracing::{debug, info};

use crate::{hubstaff::Credentials, report::ReportWindow};

pub const DEFAULT_CONFIG_FILENAME: &str = "~/.rtbot34rc";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {}", join_errors(.0))]
    Invalid(Vec<FieldError>),
    #[error("failed to write config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Configuration of a single run. Fields that are already set count as explicit values during
/// [Config::load].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    path: PathBuf,
    overrides: RawValues,
    pub hubstaff_app_token: Option<String>,
    pub hubstaff_auth_token: Option<String>,
    pub hubstaff_username: Option<String>,
    pub hubstaff_password: Option<String>,
    pub report_filename: Option<PathBuf>,
    pub report_date: Option<NaiveDate>,
    pub report_days_ago: Option<i64>,
}

impl Config {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_overrides(path, RawValues::new())
    }

    /// `overrides` are raw, unvalidated values. They are validated together with everything else
    /// during [Config::load].
    pub fn with_overrides(path: impl Into<PathBuf>, overrides: RawValues) -> Self {
        Self {
            path: path.into(),
            overrides,
            hubstaff_app_token: None,
            hubstaff_auth_token: None,
            hubstaff_username: None,
            hubstaff_password: None,
            report_filename: None,
            report_date: None,
            report_days_ago: None,
        }
    }

    pub fn value(&self, field: Field) -> Option<Value> {
        match field {
            Field::HubstaffAppToken => self.hubstaff_app_token.clone().map(Value::Text),
            Field::HubstaffAuthToken => self.hubstaff_auth_token.clone().map(Value::Text),
            Field::HubstaffUsername => self.hubstaff_username.clone().map(Value::Text),
            Field::HubstaffPassword => self.hubstaff_password.clone().map(Value::Text),
            Field::ReportFilename => self.report_filename.clone().map(Value::Path),
            Field::ReportDate => self.report_date.map(Value::Date),
            Field::ReportDaysAgo => self.report_days_ago.map(Value::Integer),
        }
    }

    fn apply(&mut self, field: Field, value: Option<Value>) {
        let text = |value: Option<Value>| value.map(|v| v.to_raw());
        match (field, value) {
            (Field::HubstaffAppToken, v) => self.hubstaff_app_token = text(v),
            (Field::HubstaffAuthToken, v) => self.hubstaff_auth_token = text(v),
            (Field::HubstaffUsername, v) => self.hubstaff_username = text(v),
            (Field::HubstaffPassword, v) => self.hubstaff_password = text(v),
            (Field::ReportFilename, Some(Value::Path(v))) => self.report_filename = Some(v),
            (Field::ReportDate, Some(Value::Date(v))) => self.report_date = Some(v),
            (Field::ReportDaysAgo, Some(Value::Integer(v))) => self.report_days_ago = Some(v),
            (Field::ReportFilename, _) => self.report_filename = None,
            (Field::ReportDate, _) => self.report_date = None,
            (Field::ReportDaysAgo, _) => self.report_days_ago = None,
        }
    }

    /// Fills every field from the configured sources. On failure all offending fields are
    /// reported and the config is left untouched.
    pub fn load(
        &mut self,
        environment: &Environment,
        paths: &PathContext,
    ) -> Result<(), ConfigError> {
        let file = read_config_file(&self.path);

        let mut explicit = self.overrides.clone();
        for field in Field::ALL {
            if let Some(value) = self.value(field) {
                explicit.entry(field).or_insert_with(|| value.to_raw());
            }
        }

        let sources = Sources {
            explicit: &explicit,
            environment,
            file: &file,
        };

        let mut resolved = vec![];
        let mut errors = vec![];
        for field in Field::ALL {
            let raw = sources.resolve(field);
            match raw {
                Some((origin, _)) => debug!("Resolved {field} from {origin:?}"),
                None => debug!("No value for {field}, using default"),
            }
            match field.coerce(raw.map(|(_, v)| v), paths) {
                Ok(value) => resolved.push((field, value)),
                Err(e) => errors.push(e),
            }
        }

        if !errors.is_empty() {
            return Err(ConfigError::Invalid(errors));
        }
        for (field, value) in resolved {
            self.apply(field, value);
        }
        Ok(())
    }

    /// Writes every field into the config file. Unset fields are saved as empty values, entries
    /// not managed by [Config] are kept as they are.
    pub fn save(&self) -> Result<(), ConfigError> {
        let mut document = read_config_file(&self.path);
        for field in Field::ALL {
            let descriptor = field.descriptor();
            let value = self.value(field).map(|v| v.to_raw()).unwrap_or_default();
            document.set(descriptor.section, descriptor.key, value);
        }

        let io_error = |source| ConfigError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|v| !v.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        std::fs::write(&self.path, document.to_string()).map_err(io_error)?;
        info!("Saved config into {:?}", self.path);
        Ok(())
    }

    /// The explicit report date wins; otherwise the report covers the day `days_ago` days before
    /// `today`.
    pub fn report_window(&self, today: NaiveDate) -> ReportWindow {
        let date = self.report_date.unwrap_or_else(|| {
            today - Duration::days(self.report_days_ago.unwrap_or(DEFAULT_DAYS_AGO))
        });
        ReportWindow::for_day(date)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            app_token: self.hubstaff_app_token.clone().unwrap_or_default(),
            auth_token: self.hubstaff_auth_token.clone(),
            username: self.hubstaff_username.clone(),
            password: self.hubstaff_password.clone(),
        }
    }
}

/// Reads the config file, treating a missing, unreadable or malformed file as empty.
fn read_config_file(path: &Path) -> IniDocument {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Config file {path:?} doesn't exist yet");
            return IniDocument::default();
        }
        Err(e) => {
            debug!("Couldn't read config file {path:?}: {e}");
            return IniDocument::default();
        }
    };
    IniDocument::parse(&text).unwrap_or_else(|e| {
        debug!("Ignoring malformed config file {path:?}: {e}");
        IniDocument::default()
    })
}
