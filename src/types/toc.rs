use std::fmt;

use crate::error::{Error, Result};
use crate::hash::ContentHash;

const BUILD_PREFIX: &str = "TOC BUILD: ";
const GROUP_PREFIX: &str = "GROUP ORIG_PATH: \"";
const GROUP_SEP: &str = "\"; CONTAINER: \"";
const FILE_PREFIX: &str = "FILE PATH: \"";
const FILE_SEP: &str = "\"; OFFSET: ";

/// one packed file inside a container
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    /// absolute-style path ("/" + project-relative path)
    pub path: String,
    /// byte offset of the framed block within its container
    pub offset: u64,
    /// byte size of the framed block
    pub size: u64,
    pub hash: ContentHash,
}

impl fmt::Display for TocEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FILE PATH: \"{}\"; OFFSET: {}; SIZE: {}; HASH: {}",
            self.path, self.offset, self.size, self.hash
        )
    }
}

/// header plus entries for one container
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupToc {
    /// key of the group the container was cut from
    pub group_key: String,
    /// container file name
    pub container: String,
    pub entries: Vec<TocEntry>,
}

impl GroupToc {
    pub fn new(group_key: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            group_key: group_key.into(),
            container: container.into(),
            entries: vec![],
        }
    }

    /// offset the next entry would start at
    pub fn next_offset(&self) -> u64 {
        self.entries.last().map(|e| e.offset + e.size).unwrap_or(0)
    }
}

impl fmt::Display for GroupToc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GROUP ORIG_PATH: \"{}\"; CONTAINER: \"{}\"",
            self.group_key, self.container
        )?;
        for entry in &self.entries {
            write!(f, "\n{}", entry)?;
        }
        Ok(())
    }
}

/// the manifest of one build
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Toc {
    pub build_id: String,
    /// containers in group declaration order
    pub groups: Vec<GroupToc>,
}

impl Toc {
    pub fn new(build_id: impl Into<String>) -> Self {
        Self {
            build_id: build_id.into(),
            groups: vec![],
        }
    }

    /// total number of file entries
    pub fn entry_count(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }

    /// render the toc file text
    pub fn render(&self) -> String {
        let mut out = format!("{}{}\n", BUILD_PREFIX, self.build_id);
        for group in &self.groups {
            out.push_str(&group.to_string());
            out.push('\n');
        }
        out
    }

    /// parse toc file text
    ///
    /// blank lines are skipped; a file entry before any group header, or
    /// any unrecognized line, is an error.
    pub fn parse(text: &str) -> Result<Self> {
        let mut toc = Toc::default();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            if let Some(id) = line.strip_prefix(BUILD_PREFIX) {
                toc.build_id = id.trim().to_string();
            } else if let Some(rest) = line.strip_prefix(GROUP_PREFIX) {
                toc.groups.push(parse_group_header(rest, line_no)?);
            } else if let Some(rest) = line.strip_prefix(FILE_PREFIX) {
                let entry = parse_entry(rest, line_no)?;
                let group = toc.groups.last_mut().ok_or_else(|| Error::TocParse {
                    line: line_no,
                    message: "file entry before any group header".to_string(),
                })?;
                group.entries.push(entry);
            } else {
                return Err(Error::TocParse {
                    line: line_no,
                    message: format!("unrecognized line: {}", line),
                });
            }
        }

        Ok(toc)
    }
}

fn parse_group_header(rest: &str, line: usize) -> Result<GroupToc> {
    let malformed = || Error::TocParse {
        line,
        message: "malformed group header".to_string(),
    };

    let body = rest.strip_suffix('"').ok_or_else(malformed)?;
    let (key, container) = body.rsplit_once(GROUP_SEP).ok_or_else(malformed)?;
    Ok(GroupToc::new(key, container))
}

fn parse_entry(rest: &str, line: usize) -> Result<TocEntry> {
    let malformed = |what: &str| Error::TocParse {
        line,
        message: format!("malformed file entry: {}", what),
    };

    let (path, fields) = rest.rsplit_once(FILE_SEP).ok_or_else(|| malformed("path"))?;

    // fields: "<offset>; SIZE: <size>; HASH: <hash>"
    let (offset, fields) = fields.split_once("; SIZE: ").ok_or_else(|| malformed("size"))?;
    let (size, hash) = fields.split_once("; HASH: ").ok_or_else(|| malformed("hash"))?;

    let offset = offset.trim().parse::<u64>().map_err(|_| malformed("offset"))?;
    let size = size.trim().parse::<u64>().map_err(|_| malformed("size"))?;
    let hash = ContentHash::from_hex(hash.trim()).map_err(|_| malformed("hash"))?;

    Ok(TocEntry {
        path: path.to_string(),
        offset,
        size,
        hash,
    })
}
