use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use crate::context::RunContext;
use crate::error::{IoResultExt, Result};
use crate::scan::matcher::{read_gitignore, MaskSet};
use crate::types::{join_rel, FileRecord, GroupMap};

/// filter rules for one traversal
#[derive(Clone, Debug)]
pub struct WalkRules {
    /// files must match one of these (empty = every file)
    pub allow: MaskSet,
    /// files and directories matching one of these are skipped
    pub deny: MaskSet,
    pub use_gitignore: bool,
}

impl WalkRules {
    pub fn new(allow: MaskSet, deny: MaskSet, use_gitignore: bool) -> Self {
        Self {
            allow,
            deny,
            use_gitignore,
        }
    }
}

/// traversal statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WalkReport {
    pub files_added: usize,
    pub files_not_allowed: usize,
    pub files_ignored: usize,
    pub dirs_visited: usize,
    pub dirs_ignored: usize,
    pub symlinked_dirs_skipped: usize,
    /// directories whose listing failed; their subtrees are missing
    pub unreadable_dirs: Vec<PathBuf>,
}

/// walk `root` depth-first, appending every accepted file to its group
///
/// within a directory, files are handled before sub-directories and both
/// are visited in case-insensitive name order. symlinks to files are
/// recorded; symlinks to directories are never followed. only a failure
/// to list the root itself is an error.
pub fn walk(
    root: &Path,
    rules: &WalkRules,
    groups: &mut GroupMap,
    ctx: &RunContext,
) -> Result<WalkReport> {
    let mut report = WalkReport::default();

    // the root listing must succeed, deeper failures only skip a subtree
    fs::read_dir(root).with_path(root)?;

    walk_dir(
        root,
        "",
        &MaskSet::default(),
        rules,
        groups,
        &mut report,
        ctx,
    );

    ctx.note(
        false,
        format!(
            "traversal done: {} file(s) added, {} not allowed, {} ignored, {} dir(s) visited, {} ignored",
            report.files_added,
            report.files_not_allowed,
            report.files_ignored,
            report.dirs_visited,
            report.dirs_ignored
        ),
    );
    Ok(report)
}

/// sorted listing of a directory split into files and sub-directories
struct Listing {
    /// (name, size, is_symlink)
    files: Vec<(String, u64, bool)>,
    dirs: Vec<String>,
}

fn walk_dir(
    dir: &Path,
    dir_path: &str,
    inherited: &MaskSet,
    rules: &WalkRules,
    groups: &mut GroupMap,
    report: &mut WalkReport,
    ctx: &RunContext,
) {
    report.dirs_visited += 1;

    let listing = match list_dir(dir, report, ctx) {
        Ok(l) => l,
        Err(e) => {
            ctx.fail(true, format!("skipping directory: {}", e));
            report.unreadable_dirs.push(dir.to_path_buf());
            return;
        }
    };

    // own gitignore applies here and below
    let ignored = if rules.use_gitignore {
        inherited.with(read_gitignore(dir, dir_path, ctx))
    } else {
        inherited.clone()
    };

    for (name, size, is_symlink) in listing.files {
        let rel = join_rel(dir_path, &name);

        if rules.deny.hits(&name, &rel) || ignored.hits(&name, &rel) {
            ctx.trace(format!("ignored file /{}", rel));
            report.files_ignored += 1;
            continue;
        }
        if !rules.allow.is_empty() && !rules.allow.hits(&name, &rel) {
            report.files_not_allowed += 1;
            continue;
        }

        let record = FileRecord::new(dir, dir_path, &name, size, is_symlink);
        let key = groups.push(record);
        ctx.trace(format!("added /{} to group {}", rel, key));
        report.files_added += 1;
    }

    for name in listing.dirs {
        let rel = join_rel(dir_path, &name);

        if rules.deny.hits(&name, &rel) || ignored.hits(&name, &rel) {
            ctx.trace(format!("ignored directory /{}", rel));
            report.dirs_ignored += 1;
            continue;
        }

        walk_dir(&dir.join(&name), &rel, &ignored, rules, groups, report, ctx);
    }
}

fn list_dir(dir: &Path, report: &mut WalkReport, ctx: &RunContext) -> Result<Listing> {
    let mut listing = Listing {
        files: vec![],
        dirs: vec![],
    };

    for entry in fs::read_dir(dir).with_path(dir)? {
        let entry = entry.with_path(dir)?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let file_type = entry.file_type().with_path(&path)?;

        if file_type.is_symlink() {
            // classify by target, never recurse through it
            match fs::metadata(&path) {
                Ok(meta) if meta.is_dir() => {
                    ctx.trace(format!("not following symlinked directory {}", path.display()));
                    report.symlinked_dirs_skipped += 1;
                }
                Ok(meta) if meta.is_file() => listing.files.push((name, meta.len(), true)),
                Ok(_) => {}
                Err(e) => ctx.trace(format!("dangling symlink {}: {}", path.display(), e)),
            }
        } else if file_type.is_dir() {
            listing.dirs.push(name);
        } else if file_type.is_file() {
            let size = entry.metadata().with_path(&path)?.len();
            listing.files.push((name, size, false));
        }
    }

    listing.files.sort_by(|a, b| name_order(&a.0, &b.0));
    listing.dirs.sort_by(|a, b| name_order(a, b));
    Ok(listing)
}

/// case-insensitive name order with a byte-wise tie-break
fn name_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GroupKey;
    use tempfile::tempdir;

    fn masks(list: &[&str]) -> MaskSet {
        let owned: Vec<String> = list.iter().map(|s| s.to_string()).collect();
        MaskSet::compile(&owned).unwrap()
    }

    fn paths(groups: &GroupMap, key: &str) -> Vec<String> {
        groups
            .get(&GroupKey::new(key))
            .unwrap()
            .files
            .iter()
            .map(|f| f.path.clone())
            .collect()
    }

    #[test]
    fn test_walk_allow_and_default_deny() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.py"), "x").unwrap();
        fs::write(root.join("b.md"), "").unwrap();
        fs::write(root.join("c.rs"), "fn main() {}").unwrap();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join(".git/config"), "[core]").unwrap();

        let rules = WalkRules::new(masks(&["*.py", "*.md"]), masks(&[".git"]), true);
        let mut groups = GroupMap::default();
        let report = walk(root, &rules, &mut groups, &RunContext::quiet()).unwrap();

        assert_eq!(paths(&groups, "."), vec!["a.py", "b.md"]);
        assert_eq!(report.files_added, 2);
        assert_eq!(report.files_not_allowed, 1);
        assert_eq!(report.dirs_ignored, 1);
    }

    #[test]
    fn test_walk_order_files_then_dirs_case_insensitive() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("Beta")).unwrap();
        fs::create_dir_all(root.join("alpha")).unwrap();
        fs::write(root.join("Beta/z.txt"), "z").unwrap();
        fs::write(root.join("alpha/y.txt"), "y").unwrap();
        fs::write(root.join("B.txt"), "b").unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();

        let rules = WalkRules::new(masks(&["*.txt"]), MaskSet::default(), false);
        let mut groups = GroupMap::default();
        walk(root, &rules, &mut groups, &RunContext::quiet()).unwrap();

        assert_eq!(
            paths(&groups, "."),
            vec!["a.txt", "B.txt", "alpha/y.txt", "Beta/z.txt"]
        );
    }

    #[test]
    fn test_walk_assigns_groups_by_longest_prefix() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/core")).unwrap();
        fs::write(root.join("src/a.py"), "a").unwrap();
        fs::write(root.join("src/core/b.py"), "b").unwrap();
        fs::write(root.join("top.py"), "t").unwrap();

        let rules = WalkRules::new(masks(&["*.py"]), MaskSet::default(), false);
        let mut groups = GroupMap::new([GroupKey::new("src"), GroupKey::new("src/core")]);
        walk(root, &rules, &mut groups, &RunContext::quiet()).unwrap();

        assert_eq!(paths(&groups, "."), vec!["top.py"]);
        assert_eq!(paths(&groups, "src"), vec!["src/a.py"]);
        assert_eq!(paths(&groups, "src/core"), vec!["src/core/b.py"]);
    }

    #[test]
    fn test_walk_gitignore_accumulates() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("app/dist")).unwrap();
        fs::create_dir_all(root.join("app/sub/dist")).unwrap();
        fs::write(root.join(".gitignore"), "*.log\n").unwrap();
        fs::write(root.join("app/.gitignore"), "/dist\n").unwrap();
        fs::write(root.join("app/main.txt"), "m").unwrap();
        fs::write(root.join("app/debug.log"), "d").unwrap();
        fs::write(root.join("app/dist/out.txt"), "o").unwrap();
        fs::write(root.join("app/sub/dist/kept.txt"), "k").unwrap();
        fs::write(root.join("app/sub/trace.log"), "t").unwrap();

        let rules = WalkRules::new(masks(&["*.txt", "*.log"]), MaskSet::default(), true);
        let mut groups = GroupMap::default();
        walk(root, &rules, &mut groups, &RunContext::quiet()).unwrap();

        // "/dist" is anchored to app/, "*.log" from the root applies everywhere
        assert_eq!(
            paths(&groups, "."),
            vec!["app/main.txt", "app/sub/dist/kept.txt"]
        );
    }

    #[test]
    fn test_walk_gitignore_disabled() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join(".gitignore"), "*.txt\n").unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();

        let rules = WalkRules::new(masks(&["*.txt"]), MaskSet::default(), false);
        let mut groups = GroupMap::default();
        walk(root, &rules, &mut groups, &RunContext::quiet()).unwrap();

        assert_eq!(paths(&groups, "."), vec!["a.txt"]);
    }

    #[test]
    fn test_walk_deny_wins_over_allow() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("keep.py"), "k").unwrap();
        fs::write(root.join("secret.py"), "s").unwrap();

        let rules = WalkRules::new(masks(&["*.py"]), masks(&["secret.py"]), false);
        let mut groups = GroupMap::default();
        let report = walk(root, &rules, &mut groups, &RunContext::quiet()).unwrap();

        assert_eq!(paths(&groups, "."), vec!["keep.py"]);
        assert_eq!(report.files_ignored, 1);
    }

    #[test]
    fn test_walk_empty_allow_accepts_all() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("x.bin"), "x").unwrap();

        let rules = WalkRules::new(MaskSet::default(), MaskSet::default(), false);
        let mut groups = GroupMap::default();
        walk(dir.path(), &rules, &mut groups, &RunContext::quiet()).unwrap();

        assert_eq!(paths(&groups, "."), vec!["x.bin"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_symlinks() {
        use std::os::unix::fs::symlink;

        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("real")).unwrap();
        fs::write(root.join("real/inner.txt"), "i").unwrap();
        fs::write(root.join("target.txt"), "t").unwrap();
        symlink(root.join("real"), root.join("linkdir")).unwrap();
        symlink(root.join("target.txt"), root.join("link.txt")).unwrap();

        let rules = WalkRules::new(masks(&["*.txt"]), MaskSet::default(), false);
        let mut groups = GroupMap::default();
        let report = walk(root, &rules, &mut groups, &RunContext::quiet()).unwrap();

        let files = &groups.get(&GroupKey::default_group()).unwrap().files;
        let listed: Vec<(&str, bool)> = files
            .iter()
            .map(|f| (f.path.as_str(), f.is_symlink))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("link.txt", true),
                ("target.txt", false),
                ("real/inner.txt", false)
            ]
        );
        assert_eq!(report.symlinked_dirs_skipped, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_skips_unreadable_directory() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("locked")).unwrap();
        fs::create_dir(root.join("open")).unwrap();
        fs::write(root.join("locked/hidden.txt"), "h").unwrap();
        fs::write(root.join("open/seen.txt"), "s").unwrap();
        fs::write(root.join("top.txt"), "t").unwrap();

        let locked = root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // permission bits do not bind root
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let rules = WalkRules::new(masks(&["*.txt"]), MaskSet::default(), false);
        let mut groups = GroupMap::default();
        let result = walk(root, &rules, &mut groups, &RunContext::quiet());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let report = result.unwrap();
        assert_eq!(paths(&groups, "."), vec!["top.txt", "open/seen.txt"]);
        assert_eq!(report.unreadable_dirs, vec![locked]);
    }

    #[test]
    fn test_walk_missing_root_fails() {
        let dir = tempdir().unwrap();
        let rules = WalkRules::new(MaskSet::default(), MaskSet::default(), false);
        let mut groups = GroupMap::default();
        assert!(walk(
            &dir.path().join("missing"),
            &rules,
            &mut groups,
            &RunContext::quiet()
        )
        .is_err());
    }
}
