//! high-level operations: packing, writing, diffing and build management

mod build;
mod diff;
mod instructions;
mod pack;
mod retention;
mod write;

pub use build::{build, build_with_id, diff_builds, load_toc, BuildSummary, DIFF_FILE_NAME};
pub use diff::{diff, digest, BuildDiff, ChangeKind, GroupChange, GroupDigest, NO_DIFFERENCES};
pub use instructions::{render as render_instructions, write_instructions, INSTRUCTIONS_FILE_NAME};
pub use pack::{framed_size, pack, DroppedFile, PackReport};
pub use retention::{
    builds_to_remove, is_build_id, list_builds, new_build_id, remove_builds, BUILD_ID_FORMAT,
};
pub use write::{
    frame, normalize_line_endings, write, WriteOptions, WriteReport, DECODE_ERROR_MARKER,
    EMPTY_MARKER, IO_ERROR_MARKER, RESERVED_NAMES, TOC_FILE_NAME,
};
