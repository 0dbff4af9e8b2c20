//! Minimal INI codec for the config file. Keeps section and key order so that a saved file stays
//! readable and unmanaged entries survive a rewrite.

use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IniError {
    #[error("line {line}: entry found before any section header")]
    MissingSectionHeader { line: usize },
    #[error("line {line}: malformed section header")]
    MalformedSectionHeader { line: usize },
    #[error("line {line}: expected `key = value`")]
    MalformedEntry { line: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: Vec<IniSection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct IniSection {
    name: String,
    entries: Vec<(String, String)>,
}

impl IniSection {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: vec![],
        }
    }
}

impl IniDocument {
    pub fn parse(text: &str) -> Result<Self, IniError> {
        let mut document = IniDocument::default();
        let mut current: Option<usize> = None;
        // Entry that continuation lines get appended to, with the indentation of its key.
        let mut last_entry: Option<(usize, usize)> = None;

        for (index, line) in text.lines().enumerate() {
            let number = index + 1;
            let trimmed = line.trim();

            if trimmed.is_empty() {
                last_entry = None;
                continue;
            }
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            let indent = line.len() - line.trim_start().len();
            if let (Some(section), Some((entry, key_indent))) = (current, last_entry) {
                if indent > key_indent {
                    let value = &mut document.sections[section].entries[entry].1;
                    value.push('\n');
                    value.push_str(trimmed);
                    continue;
                }
            }

            if let Some(header) = trimmed.strip_prefix('[') {
                let name = header
                    .strip_suffix(']')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .ok_or(IniError::MalformedSectionHeader { line: number })?;
                // duplicated headers keep appending into the original section
                current = Some(match document.position(name) {
                    Some(position) => position,
                    None => {
                        document.sections.push(IniSection::new(name));
                        document.sections.len() - 1
                    }
                });
                last_entry = None;
                continue;
            }

            let Some(section) = current.map(|v| &mut document.sections[v]) else {
                return Err(IniError::MissingSectionHeader { line: number });
            };
            let Some(split) = trimmed.find(['=', ':']) else {
                return Err(IniError::MalformedEntry { line: number });
            };
            let key = trimmed[..split].trim().to_ascii_lowercase();
            if key.is_empty() {
                return Err(IniError::MalformedEntry { line: number });
            }
            let value = trimmed[split + 1..].trim().to_string();

            match section.entries.iter().position(|(k, _)| *k == key) {
                Some(existing) => {
                    section.entries[existing].1 = value;
                    last_entry = Some((existing, indent));
                }
                None => {
                    section.entries.push((key, value));
                    last_entry = Some((section.entries.len() - 1, indent));
                }
            }
        }

        Ok(document)
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        let key = key.to_ascii_lowercase();
        self.section(section)?
            .entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets a value, creating the section when it doesn't exist yet.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        let key = key.to_ascii_lowercase();
        let value = value.into();
        let position = match self.position(section) {
            Some(position) => position,
            None => {
                self.sections.push(IniSection::new(section));
                self.sections.len() - 1
            }
        };
        let entries = &mut self.sections[position].entries;
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
    }

    fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.iter().find(|v| v.name == name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|v| v.name == name)
    }
}

impl Display for IniDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for section in &self.sections {
            writeln!(f, "[{}]", section.name)?;
            for (key, value) in &section.entries {
                // continuation lines have to stay indented to be read back as one value
                let value = value.replace('\n', "\n\t");
                writeln!(f, "{key} = {value}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{IniDocument, IniError};

    const SAMPLE: &str = "
[hubstaff]
app_token=MMMM
Username : conf@hubstaff.com
# comment
; another comment

[report]
days_ago = 2
            ";

    #[test]
    fn test_parse_sections_and_entries() {
        let document = IniDocument::parse(SAMPLE).unwrap();
        assert_eq!(document.get("hubstaff", "app_token"), Some("MMMM"));
        assert_eq!(document.get("hubstaff", "username"), Some("conf@hubstaff.com"));
        assert_eq!(document.get("report", "days_ago"), Some("2"));
        assert_eq!(document.get("report", "date"), None);
        assert_eq!(document.get("missing", "date"), None);
    }

    #[test]
    fn test_parse_errors_name_the_line() {
        assert_eq!(
            IniDocument::parse("key = value\n"),
            Err(IniError::MissingSectionHeader { line: 1 })
        );
        assert_eq!(
            IniDocument::parse("\n[report\n"),
            Err(IniError::MalformedSectionHeader { line: 2 })
        );
        assert_eq!(
            IniDocument::parse("[report]\njust words\n"),
            Err(IniError::MalformedEntry { line: 2 })
        );
    }

    #[test]
    fn test_continuation_lines() {
        let document = IniDocument::parse("[notes]\ntext = first\n  second\n").unwrap();
        assert_eq!(document.get("notes", "text"), Some("first\nsecond"));

        let reparsed = IniDocument::parse(&document.to_string()).unwrap();
        assert_eq!(reparsed, document);
    }

    #[test]
    fn test_indented_keys_are_separate_entries() {
        let document = IniDocument::parse(
            "[hubstaff]\n    app_token = MMMM\n    username = conf@hubstaff.com\n      continued\n\t[report]\n\tdays_ago = 2\n",
        )
        .unwrap();
        assert_eq!(document.get("hubstaff", "app_token"), Some("MMMM"));
        assert_eq!(
            document.get("hubstaff", "username"),
            Some("conf@hubstaff.com\ncontinued")
        );
        assert_eq!(document.get("report", "days_ago"), Some("2"));
    }

    #[test]
    fn test_set_creates_sections_and_keeps_unmanaged_keys() {
        let mut document = IniDocument::parse("[other]\nkeep = me\n[report]\ndate = 2001-01-01\n")
            .unwrap();
        document.set("report", "date", "2001-02-03");
        document.set("hubstaff", "app_token", "");

        assert_eq!(
            document.to_string(),
            "[other]\nkeep = me\n\n[report]\ndate = 2001-02-03\n\n[hubstaff]\napp_token = \n\n"
        );
    }
}
