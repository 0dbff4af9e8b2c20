use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::{ini::IniDocument, schema::Field};

/// Snapshot of environment variables. Resolution reads from the snapshot only, which keeps it
/// free of process globals.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Variables whose name or value is not valid unicode are skipped.
    pub fn from_process() -> Self {
        std::env::vars_os()
            .filter_map(|(name, value)| match (name.into_string(), value.into_string()) {
                (Ok(name), Ok(value)) => Some((name, value)),
                (name, _) => {
                    debug!("Skipping non unicode environment variable {name:?}");
                    None
                }
            })
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Raw values given explicitly, usually from the command line.
pub type RawValues = BTreeMap<Field, String>;

/// Where a resolved value came from, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Explicit,
    Environment,
    File,
}

impl Origin {
    pub const PRIORITY: [Origin; 3] = [Origin::Explicit, Origin::Environment, Origin::File];
}

/// All sources consulted during a single `load`.
pub struct Sources<'a> {
    pub explicit: &'a RawValues,
    pub environment: &'a Environment,
    pub file: &'a IniDocument,
}

impl Sources<'_> {
    fn lookup(&self, origin: Origin, field: Field) -> Option<&str> {
        let descriptor = field.descriptor();
        match origin {
            Origin::Explicit => self.explicit.get(&field).map(String::as_str),
            Origin::Environment => self.environment.get(&field.env_var()),
            Origin::File => self.file.get(descriptor.section, descriptor.key),
        }
    }

    /// Returns the first non-empty raw value in priority order.
    pub fn resolve(&self, field: Field) -> Option<(Origin, &str)> {
        Origin::PRIORITY.into_iter().find_map(|origin| {
            self.lookup(origin, field)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (origin, v))
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ini::IniDocument, schema::Field};

    use super::{Environment, Origin, RawValues, Sources};

    #[test]
    fn test_priority_is_explicit_env_file() {
        let explicit = RawValues::from([(Field::ReportDate, "2000-01-02".to_string())]);
        let environment = Environment::from_iter([
            ("REPORT_DATE", "2001-02-03"),
            ("REPORT_DAYS_AGO", "3"),
        ]);
        let file = IniDocument::parse(
            "[report]\ndate = 2012-03-04\ndays_ago = 2\nhtml_file = /tmp/.report.html\n",
        )
        .unwrap();
        let sources = Sources {
            explicit: &explicit,
            environment: &environment,
            file: &file,
        };

        assert_eq!(
            sources.resolve(Field::ReportDate),
            Some((Origin::Explicit, "2000-01-02"))
        );
        assert_eq!(
            sources.resolve(Field::ReportDaysAgo),
            Some((Origin::Environment, "3"))
        );
        assert_eq!(
            sources.resolve(Field::ReportFilename),
            Some((Origin::File, "/tmp/.report.html"))
        );
        assert_eq!(sources.resolve(Field::HubstaffAppToken), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_unicode_variables_are_skipped() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        std::env::set_var("RTBOT34_NON_UNICODE", OsStr::from_bytes(b"\xff\xfe"));
        std::env::set_var("RTBOT34_UNICODE", "2001-02-03");
        let environment = Environment::from_process();
        std::env::remove_var("RTBOT34_NON_UNICODE");
        std::env::remove_var("RTBOT34_UNICODE");

        assert_eq!(environment.get("RTBOT34_NON_UNICODE"), None);
        assert_eq!(environment.get("RTBOT34_UNICODE"), Some("2001-02-03"));
    }

    #[test]
    fn test_empty_values_fall_through() {
        let explicit = RawValues::from([(Field::HubstaffUsername, "  ".to_string())]);
        let environment = Environment::from_iter([("HUBSTAFF_USERNAME", "")]);
        let file = IniDocument::parse("[hubstaff]\nusername = conf@hubstaff.com\n").unwrap();
        let sources = Sources {
            explicit: &explicit,
            environment: &environment,
            file: &file,
        };

        assert_eq!(
            sources.resolve(Field::HubstaffUsername),
            Some((Origin::File, "conf@hubstaff.com"))
        );
    }
}
