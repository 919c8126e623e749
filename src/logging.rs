use std::fs::{self, OpenOptions};
use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::error::{IoResultExt, Result};

/// name of the log file kept in the destination root
pub const LOG_FILE_NAME: &str = "projpack.log";

/// install a tracing subscriber appending plain lines to `log_path`
///
/// debug mode lowers the level to DEBUG; RUST_LOG directives still apply
/// on top. calling this twice is harmless, the second install is ignored.
pub fn init_file_logging(log_path: &Path, debug: bool) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).with_path(parent)?;
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_path(log_path)?;

    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let _ = tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .try_init();

    Ok(())
}

/// keep only the last `max_lines` lines of the log file
///
/// zero disables trimming. a missing file is not an error.
pub fn trim_log(log_path: &Path, max_lines: usize) -> Result<()> {
    if max_lines == 0 || !log_path.is_file() {
        return Ok(());
    }

    let content = fs::read_to_string(log_path).with_path(log_path)?;
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() <= max_lines {
        return Ok(());
    }

    let mut kept = lines[lines.len() - max_lines..].join("\n");
    kept.push('\n');
    fs::write(log_path, kept).with_path(log_path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_trim_keeps_tail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        let content: String = (1..=10).map(|i| format!("line {}\n", i)).collect();
        fs::write(&path, content).unwrap();

        trim_log(&path, 3).unwrap();

        let trimmed = fs::read_to_string(&path).unwrap();
        assert_eq!(trimmed, "line 8\nline 9\nline 10\n");
    }

    #[test]
    fn test_trim_short_log_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        fs::write(&path, "a\nb\n").unwrap();

        trim_log(&path, 5).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\n");
    }

    #[test]
    fn test_trim_zero_and_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        trim_log(&path, 3).unwrap();

        fs::write(&path, "a\nb\nc\n").unwrap();
        trim_log(&path, 0).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\nc\n");
    }
}
