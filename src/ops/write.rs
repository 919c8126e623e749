use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;

use crate::config::SecretRule;
use crate::context::RunContext;
use crate::error::{IoResultExt, Result};
use crate::hash::ContentHash;
use crate::ops::build::DIFF_FILE_NAME;
use crate::ops::instructions::INSTRUCTIONS_FILE_NAME;
use crate::types::{Chunk, FileRecord, GroupKey, GroupToc, Toc, TocEntry};

/// name of the aggregate toc inside a build directory
pub const TOC_FILE_NAME: &str = "TOC.txt";

pub const EMPTY_MARKER: &str = "[## NOTE: EMPTY FILE ##]";
pub const IO_ERROR_MARKER: &str = "[## ERROR: FILE CANNOT BE READ DUE TO I/O ERROR! ##]";
pub const DECODE_ERROR_MARKER: &str =
    "[## ERROR: FILE CANNOT BE READ DUE TO UNICODE DECODING ERROR! ##]";

/// content options for the writer
#[derive(Clone, Debug, Default)]
pub struct WriteOptions {
    /// pack `<stem>.<stub_extension>` instead of the file when it exists
    pub auto_redact: bool,
    pub stub_extension: String,
    pub secrets: Vec<SecretRule>,
}

/// writer statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub containers: usize,
    pub files: usize,
    /// bytes written across all containers
    pub bytes: u64,
    pub redacted: usize,
    pub io_errors: usize,
    pub decode_errors: usize,
}

/// frame one file's content between begin and end markers
pub fn frame(path: &str, content: &str) -> String {
    format!(
        "[## BEGIN FILE: \"{path}\" ##]\n{content}\n[## END FILE: \"{path}\" ##]\n",
        path = path,
        content = content
    )
}

/// convert CRLF and lone CR line endings to LF
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// file names inside a build directory that no container may take
pub const RESERVED_NAMES: [&str; 3] = [TOC_FILE_NAME, INSTRUCTIONS_FILE_NAME, DIFF_FILE_NAME];

/// `wanted`, or `<stem>_<n>.txt` with the lowest free n >= 2
///
/// names compare case-insensitively so builds stay intact on
/// case-insensitive file systems. the chosen name is marked as taken.
fn claim_name(wanted: &str, taken: &mut HashSet<String>) -> String {
    let stem = wanted.strip_suffix(".txt").unwrap_or(wanted);
    let mut name = wanted.to_string();
    let mut n = 2;
    while taken.contains(&name.to_lowercase()) {
        name = format!("{}_{}.txt", stem, n);
        n += 1;
    }
    taken.insert(name.to_lowercase());
    name
}

/// write one container per chunk plus the aggregate toc into `dest`
///
/// container names are made unique within the build and never shadow
/// the toc, instructions or diff files. unreadable or undecodable files
/// are packed as error markers so the toc stays complete. failing to
/// create or write a container or the toc aborts the run.
pub fn write(
    chunks: &[Chunk],
    dest: &Path,
    build_id: &str,
    opts: &WriteOptions,
    ctx: &RunContext,
) -> Result<(Toc, WriteReport)> {
    let mut toc = Toc::new(build_id);
    let mut report = WriteReport::default();
    let mut taken: HashSet<String> = RESERVED_NAMES.iter().map(|n| n.to_lowercase()).collect();

    for chunk in chunks {
        let wanted = chunk.container_name();
        let container = claim_name(&wanted, &mut taken);
        if container != wanted {
            ctx.note(
                false,
                format!("container {} for {} renamed to {}", wanted, chunk.label(), container),
            );
        }
        let group_toc = write_container(chunk, &container, dest, opts, &mut report, ctx)?;
        ctx.note(
            false,
            format!(
                "container {} written: {} file(s), {} bytes",
                group_toc.container,
                group_toc.entries.len(),
                group_toc.next_offset()
            ),
        );
        toc.groups.push(group_toc);
    }

    let toc_path = dest.join(TOC_FILE_NAME);
    fs::write(&toc_path, toc.render()).with_path(&toc_path)?;

    Ok((toc, report))
}

fn write_container(
    chunk: &Chunk,
    container: &str,
    dest: &Path,
    opts: &WriteOptions,
    report: &mut WriteReport,
    ctx: &RunContext,
) -> Result<GroupToc> {
    let path = dest.join(container);
    let mut out = BufWriter::new(File::create(&path).with_path(&path)?);
    let mut group_toc = GroupToc::new(chunk.key.as_str(), container);
    let mut offset: u64 = 0;

    for file in &chunk.files {
        let content = load_content(file, opts, report, ctx);
        let hash = ContentHash::of(&content);
        let toc_path = file.toc_path();
        let block = frame(&toc_path, &content);
        let size = block.len() as u64;

        out.write_all(block.as_bytes()).with_path(&path)?;
        group_toc.entries.push(TocEntry {
            path: toc_path,
            offset,
            size,
            hash,
        });

        offset += size;
        report.files += 1;
    }

    out.flush().with_path(&path)?;
    report.containers += 1;
    report.bytes += offset;
    Ok(group_toc)
}

/// text placed between the framing markers for `file`
fn load_content(
    file: &FileRecord,
    opts: &WriteOptions,
    report: &mut WriteReport,
    ctx: &RunContext,
) -> String {
    let text = match read_stub(file, opts, ctx) {
        Some(stub) => {
            report.redacted += 1;
            stub
        }
        None => match read_text(&file.location) {
            Ok(text) => text,
            Err(ReadFailure::Io(e)) => {
                ctx.fail(true, format!("cannot read /{}: {}", file.path, e));
                report.io_errors += 1;
                return IO_ERROR_MARKER.to_string();
            }
            Err(ReadFailure::Decode) => {
                ctx.fail(true, format!("cannot decode /{} as utf-8", file.path));
                report.decode_errors += 1;
                return DECODE_ERROR_MARKER.to_string();
            }
        },
    };

    let text = apply_secrets(file, text, &opts.secrets);
    let text = normalize_line_endings(&text);
    if text.is_empty() {
        EMPTY_MARKER.to_string()
    } else {
        text
    }
}

enum ReadFailure {
    Io(std::io::Error),
    Decode,
}

fn read_text(path: &Path) -> std::result::Result<String, ReadFailure> {
    let bytes = fs::read(path).map_err(ReadFailure::Io)?;
    String::from_utf8(bytes).map_err(|_| ReadFailure::Decode)
}

/// content of the redaction stub beside `file`, when enabled and readable
fn read_stub(file: &FileRecord, opts: &WriteOptions, ctx: &RunContext) -> Option<String> {
    if !opts.auto_redact || opts.stub_extension.is_empty() || file.extension == opts.stub_extension
    {
        return None;
    }

    let stub = file
        .dir_location
        .join(format!("{}.{}", file.stem, opts.stub_extension));
    match read_text(&stub) {
        Ok(text) => {
            ctx.note(false, format!("/{} replaced by stub {}", file.path, stub.display()));
            Some(text)
        }
        Err(ReadFailure::Io(e)) if e.kind() == ErrorKind::NotFound => None,
        Err(ReadFailure::Io(e)) => {
            ctx.fail(false, format!("cannot read stub {}: {}", stub.display(), e));
            None
        }
        Err(ReadFailure::Decode) => {
            ctx.fail(false, format!("cannot decode stub {} as utf-8", stub.display()));
            None
        }
    }
}

fn apply_secrets(file: &FileRecord, mut text: String, rules: &[SecretRule]) -> String {
    for rule in rules {
        if rule.original.is_empty() {
            continue;
        }
        if GroupKey::new(&rule.base).match_len(&file.path).is_some() {
            text = text.replace(&rule.original, &rule.replacement);
        }
    }
    text
}
