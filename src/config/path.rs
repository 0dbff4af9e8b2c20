use std::{
    env,
    path::{Component, Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};

/// Directories user supplied paths are resolved against. Captured once per run, so that path
/// normalization itself stays a pure function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathContext {
    pub home_dir: PathBuf,
    /// Directory of the running executable. Relative paths are resolved against it instead of
    /// the working directory, so the tool behaves the same when started from cron.
    pub base_dir: PathBuf,
}

impl PathContext {
    pub fn new(home_dir: impl Into<PathBuf>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            home_dir: home_dir.into(),
            base_dir: base_dir.into(),
        }
    }

    pub fn from_process() -> Result<Self> {
        let home_dir = dirs::home_dir().ok_or_else(|| anyhow!("Couldn't find home directory"))?;
        let executable = env::current_exe().context("Couldn't locate the running executable")?;
        let base_dir = executable
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| anyhow!("Executable {executable:?} has no parent directory"))?;
        Ok(Self::new(home_dir, base_dir))
    }
}

/// Resolves `path` (or `default` when `path` is empty) into an absolute, lexically normalized
/// path. `~` expands to the home directory. Returns `None` when neither value is given.
pub fn normalize_path(
    path: Option<&str>,
    default: Option<&str>,
    context: &PathContext,
) -> Option<PathBuf> {
    let raw = path
        .filter(|v| !v.is_empty())
        .or(default.filter(|v| !v.is_empty()))?;

    let resolved = if raw == "~" {
        context.home_dir.clone()
    } else if let Some(rest) = raw.strip_prefix("~/") {
        context.home_dir.join(rest)
    } else {
        let raw = Path::new(raw);
        if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            context.base_dir.join(raw)
        }
    };

    Some(lexical_normalize(&resolved))
}

/// Removes `.` and `..` segments without touching the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                // popping the root is a no-op, so `/..` stays `/`
                normalized.pop();
            }
            Component::Normal(segment) => normalized.push(segment),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{normalize_path, PathContext};

    fn context() -> PathContext {
        PathContext::new("/home/tester", "/opt/rtbot34/bin")
    }

    fn normalize_twice(path: Option<&str>, default: Option<&str>) -> Option<PathBuf> {
        let context = context();
        let once = normalize_path(path, default, &context)?;
        let twice = normalize_path(once.to_str(), None, &context);
        assert_eq!(twice.as_ref(), Some(&once));
        twice
    }

    #[test]
    fn test_normalize_none_path() {
        assert_eq!(normalize_path(None, None, &context()), None);
        assert_eq!(normalize_path(Some(""), Some(""), &context()), None);
    }

    #[test]
    fn test_normalize_abs_path() {
        assert_eq!(
            normalize_twice(Some("/tmp/test.txt"), None),
            Some(PathBuf::from("/tmp/test.txt"))
        );
        assert_eq!(
            normalize_twice(Some("/tmp/test.txt"), Some("/tmp/default.txt")),
            Some(PathBuf::from("/tmp/test.txt"))
        );
        assert_eq!(
            normalize_twice(None, Some("/tmp/default.txt")),
            Some(PathBuf::from("/tmp/default.txt"))
        );
    }

    #[test]
    fn test_normalize_relative_path() {
        assert_eq!(
            normalize_twice(Some("test.txt"), None),
            Some(PathBuf::from("/opt/rtbot34/bin/test.txt"))
        );
        assert_eq!(
            normalize_twice(Some("./test.txt"), None),
            Some(PathBuf::from("/opt/rtbot34/bin/test.txt"))
        );
        assert_eq!(
            normalize_twice(Some("../test.txt"), None),
            Some(PathBuf::from("/opt/rtbot34/test.txt"))
        );
        assert_eq!(
            normalize_twice(Some("test.txt"), Some("default.txt")),
            Some(PathBuf::from("/opt/rtbot34/bin/test.txt"))
        );
        assert_eq!(
            normalize_twice(Some(""), Some("default.txt")),
            Some(PathBuf::from("/opt/rtbot34/bin/default.txt"))
        );
    }

    #[test]
    fn test_normalize_home_path() {
        assert_eq!(
            normalize_twice(Some("~/test.txt"), None),
            Some(PathBuf::from("/home/tester/test.txt"))
        );
        assert_eq!(
            normalize_twice(Some("~/test.txt"), Some("~/default.txt")),
            Some(PathBuf::from("/home/tester/test.txt"))
        );
        assert_eq!(
            normalize_twice(None, Some("~/default.txt")),
            Some(PathBuf::from("/home/tester/default.txt"))
        );
        assert_eq!(normalize_twice(Some("~"), None), Some(PathBuf::from("/home/tester")));
    }

    #[test]
    fn test_parent_dir_does_not_escape_root() {
        assert_eq!(
            normalize_twice(Some("/../../tmp/./a/../b.txt"), None),
            Some(PathBuf::from("/tmp/b.txt"))
        );
    }
}
