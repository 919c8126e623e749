use std::path::PathBuf;

/// error type for projpack operations
///
/// only conditions that abort a run live here. skipped groups, unreadable
/// files and oversized files are logged and recorded in stage reports.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("project root not found: {0}")]
    NoProjectRoot(PathBuf),

    #[error("config file already exists at {0}")]
    ConfigExists(PathBuf),

    #[error("build not found: {0}")]
    BuildNotFound(String),

    #[error("invalid mask {mask:?}: {message}")]
    InvalidMask { mask: String, message: String },

    #[error("invalid size setting: {0}")]
    InvalidSize(String),

    #[error("malformed toc at line {line}: {message}")]
    TocParse { line: usize, message: String },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_path_wraps_io_error() {
        let res: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        let err = res.with_path("/tmp/missing").unwrap_err();
        match err {
            Error::Io { path, source } => {
                assert_eq!(path, PathBuf::from("/tmp/missing"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_toc_parse_display() {
        let err = Error::TocParse {
            line: 3,
            message: "bad offset".to_string(),
        };
        assert_eq!(err.to_string(), "malformed toc at line 3: bad offset");
    }
}
