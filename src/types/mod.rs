mod file;
mod group;
mod toc;

pub use file::{join_rel, FileRecord};
pub use group::{Chunk, Group, GroupKey, GroupMap};
pub use toc::{GroupToc, Toc, TocEntry};
