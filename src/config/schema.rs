//! Declarative description of every recognized configuration field. The same table drives
//! resolution, validation and saving, so key names are declared only once.

use std::{fmt::Display, path::PathBuf, sync::LazyLock};

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

use crate::utils::time::{format_date, parse_date};

use super::path::{normalize_path, PathContext};

pub const HUBSTAFF_SECTION: &str = "hubstaff";
pub const REPORT_SECTION: &str = "report";

/// Length of Hubstaff application and authentication tokens.
pub const TOKEN_LENGTH: usize = 43;
pub const DEFAULT_REPORT_FILENAME: &str = "~/rtbot34.html";
pub const DEFAULT_DAYS_AGO: i64 = 1;
const DEFAULT_DAYS_AGO_RAW: &str = "1";
pub const MAX_DAYS_AGO: i64 = 7;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid e-mail regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    HubstaffAppToken,
    HubstaffAuthToken,
    HubstaffUsername,
    HubstaffPassword,
    ReportFilename,
    ReportDate,
    ReportDaysAgo,
}

impl Field {
    /// Resolution and save order.
    pub const ALL: [Field; 7] = [
        Field::HubstaffAppToken,
        Field::HubstaffAuthToken,
        Field::HubstaffUsername,
        Field::HubstaffPassword,
        Field::ReportFilename,
        Field::ReportDate,
        Field::ReportDaysAgo,
    ];

    pub fn descriptor(self) -> &'static FieldDescriptor {
        match self {
            Field::HubstaffAppToken => &APP_TOKEN,
            Field::HubstaffAuthToken => &AUTH_TOKEN,
            Field::HubstaffUsername => &USERNAME,
            Field::HubstaffPassword => &PASSWORD,
            Field::ReportFilename => &REPORT_FILENAME,
            Field::ReportDate => &REPORT_DATE,
            Field::ReportDaysAgo => &REPORT_DAYS_AGO,
        }
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// Name of the environment variable overriding the field.
    pub fn env_var(self) -> String {
        self.name().to_ascii_uppercase()
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text { min_len: usize, max_len: usize },
    Email,
    Path,
    Date,
    Integer { min: i64, max: i64 },
}

#[derive(Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub section: &'static str,
    pub key: &'static str,
    pub required: bool,
    pub default: Option<&'static str>,
    pub kind: FieldKind,
}

static APP_TOKEN: FieldDescriptor = FieldDescriptor {
    name: "hubstaff_app_token",
    section: HUBSTAFF_SECTION,
    key: "app_token",
    required: true,
    default: None,
    kind: FieldKind::Text {
        min_len: TOKEN_LENGTH,
        max_len: TOKEN_LENGTH,
    },
};

static AUTH_TOKEN: FieldDescriptor = FieldDescriptor {
    name: "hubstaff_auth_token",
    section: HUBSTAFF_SECTION,
    key: "auth_token",
    required: false,
    default: None,
    kind: FieldKind::Text {
        min_len: TOKEN_LENGTH,
        max_len: TOKEN_LENGTH,
    },
};

static USERNAME: FieldDescriptor = FieldDescriptor {
    name: "hubstaff_username",
    section: HUBSTAFF_SECTION,
    key: "username",
    required: false,
    default: None,
    kind: FieldKind::Email,
};

static PASSWORD: FieldDescriptor = FieldDescriptor {
    name: "hubstaff_password",
    section: HUBSTAFF_SECTION,
    key: "password",
    required: false,
    default: None,
    kind: FieldKind::Text {
        min_len: 1,
        max_len: 128,
    },
};

static REPORT_FILENAME: FieldDescriptor = FieldDescriptor {
    name: "report_filename",
    section: REPORT_SECTION,
    key: "html_file",
    required: true,
    default: Some(DEFAULT_REPORT_FILENAME),
    kind: FieldKind::Path,
};

static REPORT_DATE: FieldDescriptor = FieldDescriptor {
    name: "report_date",
    section: REPORT_SECTION,
    key: "date",
    required: false,
    default: None,
    kind: FieldKind::Date,
};

static REPORT_DAYS_AGO: FieldDescriptor = FieldDescriptor {
    name: "report_days_ago",
    section: REPORT_SECTION,
    key: "days_ago",
    required: true,
    default: Some(DEFAULT_DAYS_AGO_RAW),
    kind: FieldKind::Integer {
        min: 0,
        max: MAX_DAYS_AGO,
    },
};

/// A coerced and validated field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Path(PathBuf),
    Date(NaiveDate),
    Integer(i64),
}

impl Value {
    /// Representation used for the config file and for re-validating explicit values.
    pub fn to_raw(&self) -> String {
        match self {
            Value::Text(v) => v.clone(),
            Value::Path(v) => v.to_string_lossy().into_owned(),
            Value::Date(v) => format_date(*v),
            Value::Integer(v) => v.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldErrorKind {
    #[error("value is required")]
    Missing,
    #[error("length must be between {min} and {max} characters, got {actual}")]
    Length {
        min: usize,
        max: usize,
        actual: usize,
    },
    #[error("`{0}` is not an e-mail address")]
    Email(String),
    #[error("`{0}` is not a date in YYYY-MM-DD format")]
    Date(String),
    #[error("`{0}` is not an integer")]
    Integer(String),
    #[error("{value} is outside of range {min}..={max}")]
    Range { value: i64, min: i64, max: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {kind}")]
pub struct FieldError {
    pub field: Field,
    pub kind: FieldErrorKind,
}

impl Field {
    /// Turns the selected raw value into a typed one. `raw` is `None` when no source had a value,
    /// in which case the default applies.
    pub fn coerce(self, raw: Option<&str>, paths: &PathContext) -> Result<Option<Value>, FieldError> {
        let descriptor = self.descriptor();
        let error = |kind| FieldError { field: self, kind };

        if descriptor.kind == FieldKind::Path {
            // paths always get normalized, the default takes part in that as a fallback
            return match normalize_path(raw, descriptor.default, paths) {
                Some(path) => Ok(Some(Value::Path(path))),
                None if descriptor.required => Err(error(FieldErrorKind::Missing)),
                None => Ok(None),
            };
        }

        let Some(raw) = raw.or(descriptor.default) else {
            return if descriptor.required {
                Err(error(FieldErrorKind::Missing))
            } else {
                Ok(None)
            };
        };

        let value = match descriptor.kind {
            FieldKind::Text { min_len, max_len } => {
                let actual = raw.chars().count();
                if actual < min_len || actual > max_len {
                    return Err(error(FieldErrorKind::Length {
                        min: min_len,
                        max: max_len,
                        actual,
                    }));
                }
                Value::Text(raw.to_string())
            }
            FieldKind::Email => {
                if !EMAIL.is_match(raw) {
                    return Err(error(FieldErrorKind::Email(raw.to_string())));
                }
                Value::Text(raw.to_string())
            }
            FieldKind::Date => parse_date(raw)
                .map(Value::Date)
                .ok_or_else(|| error(FieldErrorKind::Date(raw.to_string())))?,
            FieldKind::Integer { min, max } => {
                let value = raw
                    .parse::<i64>()
                    .map_err(|_| error(FieldErrorKind::Integer(raw.to_string())))?;
                if value < min || value > max {
                    return Err(error(FieldErrorKind::Range { value, min, max }));
                }
                Value::Integer(value)
            }
            FieldKind::Path => unreachable!("paths are handled above"),
        };
        Ok(Some(value))
    }
}
