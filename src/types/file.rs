use std::path::{Path, PathBuf};

/// a file discovered during traversal
///
/// relative paths use '/' separators regardless of platform; the root
/// directory's relative path is the empty string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRecord {
    /// name of the containing directory
    pub dir_name: String,
    /// containing directory relative to the project root
    pub dir_path: String,
    /// containing directory on disk
    pub dir_location: PathBuf,
    pub name: String,
    pub stem: String,
    /// extension without the dot, empty when absent
    pub extension: String,
    /// file path relative to the project root
    pub path: String,
    /// file location on disk
    pub location: PathBuf,
    pub size: u64,
    pub is_symlink: bool,
}

impl FileRecord {
    /// build a record for `name` inside the directory `dir_path`
    pub fn new(
        dir_location: &Path,
        dir_path: &str,
        name: &str,
        size: u64,
        is_symlink: bool,
    ) -> Self {
        let as_path = Path::new(name);
        let stem = as_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        let extension = as_path
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir_name = dir_location
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            dir_name,
            dir_path: dir_path.to_string(),
            dir_location: dir_location.to_path_buf(),
            name: name.to_string(),
            stem,
            extension,
            path: join_rel(dir_path, name),
            location: dir_location.join(name),
            size,
            is_symlink,
        }
    }

    /// path as written into the toc and framing markers: "/" + relative path
    pub fn toc_path(&self) -> String {
        format!("/{}", self.path)
    }
}

/// join a relative directory path and a name with '/'
pub fn join_rel(dir_path: &str, name: &str) -> String {
    if dir_path.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir_path, name)
    }
}
