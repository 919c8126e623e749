use std::collections::HashMap;
use std::fmt;

use crate::hash::{combine_hashes, ContentHash};
use crate::types::Toc;

/// line emitted when two builds carry the same content
pub const NO_DIFFERENCES: &str = "No differences found.";

/// per-group summary of one build
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupDigest {
    pub key: String,
    /// containers the group was packed into, in toc order
    pub containers: Vec<String>,
    pub files: usize,
    /// order-insensitive hash over every file hash of the group
    pub hash: ContentHash,
}

/// group-level change kind
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Changed,
}

/// one group that differs between two builds
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupChange {
    pub key: String,
    pub kind: ChangeKind,
    /// containers holding the group in the newer build (older, for removals)
    pub containers: Vec<String>,
}

impl fmt::Display for GroupChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            ChangeKind::Added => "New group",
            ChangeKind::Removed => "Removed group",
            ChangeKind::Changed => "Changed group",
        };
        write!(f, "{}: \"{}\"", label, self.key)?;
        if !self.containers.is_empty() {
            write!(f, " ({})", self.containers.join(", "))?;
        }
        Ok(())
    }
}

/// result of comparing two builds
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildDiff {
    pub previous: String,
    pub current: String,
    /// additions, then removals, then changes, each in toc order
    pub changes: Vec<GroupChange>,
}

impl BuildDiff {
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// human-readable change lines; a single line when nothing changed
    pub fn lines(&self) -> Vec<String> {
        if self.changes.is_empty() {
            vec![NO_DIFFERENCES.to_string()]
        } else {
            self.changes.iter().map(|c| c.to_string()).collect()
        }
    }

    /// text of the diff report file
    pub fn render(&self) -> String {
        let mut out = format!("DIFF: {} -> {}\n", self.previous, self.current);
        for line in self.lines() {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

/// fold a toc into one digest per group key, merging split containers
pub fn digest(toc: &Toc) -> Vec<GroupDigest> {
    let mut order: Vec<String> = Vec::new();
    let mut by_key: HashMap<&str, (Vec<String>, Vec<&ContentHash>)> = HashMap::new();

    for group in &toc.groups {
        let slot = by_key.entry(group.group_key.as_str()).or_insert_with(|| {
            order.push(group.group_key.clone());
            (vec![], vec![])
        });
        slot.0.push(group.container.clone());
        slot.1.extend(group.entries.iter().map(|e| &e.hash));
    }

    order
        .into_iter()
        .map(|key| {
            let (containers, hashes) = &by_key[key.as_str()];
            GroupDigest {
                containers: containers.clone(),
                files: hashes.len(),
                hash: combine_hashes(hashes.iter().copied()),
                key,
            }
        })
        .collect()
}

/// compare two builds group by group
///
/// groups are matched by key and compared by their combined hash, so
/// reordering or re-chunking files does not count as a change while any
/// content edit, addition or removal of a file does.
pub fn diff(previous: &Toc, current: &Toc) -> BuildDiff {
    let old = digest(previous);
    let new = digest(current);

    let old_map: HashMap<&str, &GroupDigest> = old.iter().map(|d| (d.key.as_str(), d)).collect();
    let new_map: HashMap<&str, &GroupDigest> = new.iter().map(|d| (d.key.as_str(), d)).collect();

    let mut added = Vec::new();
    let mut changed = Vec::new();
    for d in &new {
        match old_map.get(d.key.as_str()) {
            None => added.push(GroupChange {
                key: d.key.clone(),
                kind: ChangeKind::Added,
                containers: d.containers.clone(),
            }),
            Some(prev) if prev.hash != d.hash => changed.push(GroupChange {
                key: d.key.clone(),
                kind: ChangeKind::Changed,
                containers: d.containers.clone(),
            }),
            Some(_) => {}
        }
    }

    let removed = old
        .iter()
        .filter(|d| !new_map.contains_key(d.key.as_str()))
        .map(|d| GroupChange {
            key: d.key.clone(),
            kind: ChangeKind::Removed,
            containers: d.containers.clone(),
        });

    let mut changes = added;
    changes.extend(removed);
    changes.extend(changed);

    BuildDiff {
        previous: previous.build_id.clone(),
        current: current.build_id.clone(),
        changes,
    }
}
