use std::{path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

pub const LOG_PREFIX: &str = "rtbot34";

/// Level used when neither `--log` nor `RUST_LOG` asks for something else.
const DEFAULT_LEVEL: &str = "warn";

/// Logs always go to stderr so the report run stays quiet on stdout. When `log_dir` is given the
/// same output is also written into daily rotated files.
pub fn enable_logging(log_dir: Option<&Path>, log_level: Option<LevelFilter>) -> Result<()> {
    let writer = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::Builder::new()
                .rotation(Rotation::DAILY)
                .max_log_files(5)
                .filename_prefix(LOG_PREFIX)
                .build(dir)?;
            BoxMakeWriter::new(std::io::stderr.and(appender))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter_directives(
            log_level,
            rust_log.as_deref(),
        )))
        .with_writer(writer)
        .compact()
        .init();
    Ok(())
}

/// A bare level applies to this crate only, full directives such as `rtbot34=debug,reqwest=info`
/// are used as they are.
fn filter_directives(log_level: Option<LevelFilter>, rust_log: Option<&str>) -> String {
    let target = env!("CARGO_PKG_NAME").replace("-", "_");
    match (log_level, rust_log.map(str::trim)) {
        (Some(level), _) => format!("{target}={level}"),
        (None, Some(directives)) if directives.contains('=') => directives.to_string(),
        (None, Some(level)) if !level.is_empty() => format!("{target}={level}"),
        _ => format!("{target}={DEFAULT_LEVEL}"),
    }
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .init()
});
