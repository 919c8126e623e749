//! project traversal: mask matching, group resolution and the tree walk

pub mod matcher;
mod resolver;
mod walker;

pub use matcher::{gitignore_masks, mask_matches, matches, read_gitignore, MaskSet, GITIGNORE};
pub use resolver::{natural_cmp, resolve, ResolveReport};
pub use walker::{walk, WalkReport, WalkRules};
