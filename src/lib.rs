//! projpack - pack project sources into text containers
//!
//! walks a project tree, selects text files by allow/deny masks (plus
//! `.gitignore` rules), splits them into named groups bounded by a
//! container size, and writes each group as a flat TXT container with a
//! hashed table of contents. successive builds are diffed group by group.
//!
//! # Core concepts
//!
//! - **Group**: files sharing a declared path prefix; unmatched files land
//!   in the default group `.`
//! - **Chunk**: a size-bounded slice of a group
//! - **Container**: one TXT file holding the framed content of a chunk
//! - **TOC**: the manifest listing every container and every packed file
//!   with its byte offset, byte size and content hash
//! - **Build**: one run's containers plus its TOC, named by a timestamp
//!
//! # Container format
//!
//! ```text
//! [## BEGIN FILE: "/src/main.py" ##]
//! <content, line endings normalized to \n>
//! [## END FILE: "/src/main.py" ##]
//! ```
//!
//! # Example usage
//!
//! ```no_run
//! use projpack::{ops, Config, RunContext};
//! use std::path::Path;
//!
//! let root = Path::new("/path/to/project");
//! let settings = Config::load_or_default(root).unwrap().into_settings(root).unwrap();
//! let summary = ops::build(&settings, &RunContext::default()).unwrap();
//! println!("{} containers in {}", summary.containers.len(), summary.build_dir.display());
//! ```

mod config;
mod context;
mod error;
mod hash;

pub mod logging;
pub mod ops;
pub mod scan;
pub mod types;

pub use config::{
    Config, GeneratorSection, ProjectSection, SecretRule, Settings, TraversalSection,
    CONFIG_FILE_NAME,
};
pub use context::RunContext;
pub use error::{Error, Result};
pub use hash::{combine_hashes, ContentHash, SHORT_HASH_LEN};
pub use types::{Chunk, FileRecord, Group, GroupKey, GroupMap, GroupToc, Toc, TocEntry};
