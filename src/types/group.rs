use std::collections::HashMap;
use std::fmt;

use crate::types::FileRecord;

/// normalized group identity: a '/'-separated project-relative directory
///
/// the default group, which collects every file outside a declared group,
/// uses the reserved key ".".
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(String);

impl GroupKey {
    pub const DEFAULT: &'static str = ".";

    /// key of the default group
    pub fn default_group() -> Self {
        Self(Self::DEFAULT.to_string())
    }

    /// normalize a declared path: backslashes become '/', and leading,
    /// trailing and repeated separators and "." segments are dropped
    pub fn new(path: &str) -> Self {
        let normalized: Vec<&str> = path
            .split(['/', '\\'])
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();
        if normalized.is_empty() {
            Self::default_group()
        } else {
            Self(normalized.join("/"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == Self::DEFAULT
    }

    /// file system friendly name derived from the key
    pub fn display_name(&self) -> String {
        if self.is_default() {
            "root".to_string()
        } else {
            self.0.replace('/', "-")
        }
    }

    /// length of the prefix this key matches in `dir_path`, if any
    ///
    /// the default key matches everything with length zero so that any
    /// declared group wins over it.
    pub fn match_len(&self, dir_path: &str) -> Option<usize> {
        if self.is_default() {
            return Some(0);
        }
        let key = self.0.as_str();
        if dir_path == key
            || (dir_path.starts_with(key) && dir_path.as_bytes().get(key.len()) == Some(&b'/'))
        {
            Some(key.len())
        } else {
            None
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupKey({})", self.0)
    }
}

/// a named bucket of files sharing a path prefix
#[derive(Clone, Debug)]
pub struct Group {
    pub key: GroupKey,
    pub name: String,
    /// files in traversal order
    pub files: Vec<FileRecord>,
}

impl Group {
    pub fn new(key: GroupKey) -> Self {
        let name = key.display_name();
        Self {
            key,
            name,
            files: vec![],
        }
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

/// groups in declaration order, addressable by key
///
/// the default group is always present and always first.
#[derive(Clone, Debug)]
pub struct GroupMap {
    groups: Vec<Group>,
    index: HashMap<GroupKey, usize>,
}

impl GroupMap {
    /// create empty groups for the given keys plus the default group
    ///
    /// duplicate keys are ignored; order of first appearance is kept.
    pub fn new<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = GroupKey>,
    {
        let mut map = Self {
            groups: vec![],
            index: HashMap::new(),
        };
        map.insert(GroupKey::default_group());
        for key in keys {
            map.insert(key);
        }
        map
    }

    fn insert(&mut self, key: GroupKey) {
        if self.index.contains_key(&key) {
            return;
        }
        self.index.insert(key.clone(), self.groups.len());
        self.groups.push(Group::new(key));
    }

    /// key with the longest prefix match for a directory path
    pub fn assign(&self, dir_path: &str) -> &GroupKey {
        let mut best = &self.groups[0].key;
        let mut best_len = 0;
        for group in &self.groups {
            if let Some(len) = group.key.match_len(dir_path) {
                if len > best_len {
                    best = &group.key;
                    best_len = len;
                }
            }
        }
        best
    }

    /// append a file to the group owning its directory; returns that group's key
    pub fn push(&mut self, file: FileRecord) -> GroupKey {
        let key = self.assign(&file.dir_path).clone();
        let idx = self.index[&key];
        self.groups[idx].files.push(file);
        key
    }

    pub fn get(&self, key: &GroupKey) -> Option<&Group> {
        self.index.get(key).map(|&i| &self.groups[i])
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.groups.iter().map(|g| &g.key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn into_groups(self) -> Vec<Group> {
        self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// number of files across all groups
    pub fn file_count(&self) -> usize {
        self.groups.iter().map(|g| g.files.len()).sum()
    }
}

impl Default for GroupMap {
    /// only the default group
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// a size-bounded slice of a group
///
/// ordinal 0 marks an unsplit group; split groups number their chunks
/// from 1.
#[derive(Clone, Debug)]
pub struct Chunk {
    pub key: GroupKey,
    pub ordinal: u32,
    pub files: Vec<FileRecord>,
}

impl Chunk {
    /// display label: the group key, plus "#n" for split chunks
    pub fn label(&self) -> String {
        if self.ordinal == 0 {
            self.key.to_string()
        } else {
            format!("{}#{}", self.key, self.ordinal)
        }
    }

    /// file system name: the group name, plus "-n" for split chunks
    pub fn name(&self) -> String {
        let base = self.key.display_name();
        if self.ordinal == 0 {
            base
        } else {
            format!("{}-{}", base, self.ordinal)
        }
    }

    pub fn container_name(&self) -> String {
        format!("{}.txt", self.name())
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn record(dir_path: &str, name: &str) -> FileRecord {
        FileRecord::new(Path::new("/proj").join(dir_path).as_path(), dir_path, name, 1, false)
    }

    #[test]
    fn test_key_normalization() {
        assert_eq!(GroupKey::new("src/core/").as_str(), "src/core");
        assert_eq!(GroupKey::new("/src//core").as_str(), "src/core");
        assert_eq!(GroupKey::new("src\\core").as_str(), "src/core");
        assert_eq!(GroupKey::new("./src").as_str(), "src");
        assert!(GroupKey::new("").is_default());
        assert!(GroupKey::new("/").is_default());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(GroupKey::default_group().display_name(), "root");
        assert_eq!(GroupKey::new("src/core").display_name(), "src-core");
    }

    #[test]
    fn test_match_len_respects_segments() {
        let key = GroupKey::new("src/core");
        assert_eq!(key.match_len("src/core"), Some(8));
        assert_eq!(key.match_len("src/core/util"), Some(8));
        assert_eq!(key.match_len("src/corelib"), None);
        assert_eq!(key.match_len("src"), None);
        assert_eq!(GroupKey::default_group().match_len("anything"), Some(0));
    }

    #[test]
    fn test_assign_longest_prefix() {
        let map = GroupMap::new([GroupKey::new("src"), GroupKey::new("src/core")]);
        assert_eq!(map.assign("src/core/x").as_str(), "src/core");
        assert_eq!(map.assign("src/other").as_str(), "src");
        assert_eq!(map.assign("docs").as_str(), ".");
        assert_eq!(map.assign("").as_str(), ".");
    }

    #[test]
    fn test_group_map_dedup_and_default_first() {
        let map = GroupMap::new([
            GroupKey::new("a"),
            GroupKey::new("a/"),
            GroupKey::new("."),
            GroupKey::new("b"),
        ]);
        let keys: Vec<&str> = map.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec![".", "a", "b"]);
    }

    #[test]
    fn test_push_keeps_order() {
        let mut map = GroupMap::new([GroupKey::new("lib")]);
        map.push(record("", "a.py"));
        map.push(record("lib", "b.py"));
        map.push(record("", "c.py"));

        let root = map.get(&GroupKey::default_group()).unwrap();
        let names: Vec<&str> = root.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.py", "c.py"]);
        assert_eq!(map.get(&GroupKey::new("lib")).unwrap().files.len(), 1);
        assert_eq!(map.file_count(), 3);
    }

    #[test]
    fn test_chunk_naming() {
        let unsplit = Chunk {
            key: GroupKey::new("src/core"),
            ordinal: 0,
            files: vec![],
        };
        assert_eq!(unsplit.label(), "src/core");
        assert_eq!(unsplit.container_name(), "src-core.txt");

        let split = Chunk {
            key: GroupKey::new("src/core"),
            ordinal: 2,
            files: vec![],
        };
        assert_eq!(split.label(), "src/core#2");
        assert_eq!(split.container_name(), "src-core-2.txt");
    }
}
