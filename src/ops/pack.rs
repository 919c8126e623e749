use crate::context::RunContext;
use crate::ops::write::{frame, DECODE_ERROR_MARKER, EMPTY_MARKER, IO_ERROR_MARKER};
use crate::types::{Chunk, FileRecord, Group};

/// a file left out of every container because of its size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedFile {
    pub path: String,
    pub size: u64,
    /// the ceiling it exceeded
    pub limit: u64,
}

/// packing statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PackReport {
    pub dropped: Vec<DroppedFile>,
    /// groups that needed more than one container
    pub split_groups: usize,
    pub empty_groups: usize,
}

/// upper bound of the bytes `file` will occupy in a container
///
/// the framing markers are exact; the content is counted as the larger of
/// the on-disk size and the longest placeholder marker, since an empty or
/// unreadable file is packed as a marker. line ending normalization only
/// shrinks content.
pub fn framed_size(file: &FileRecord) -> u64 {
    let overhead = frame(&file.toc_path(), "").len() as u64;
    let marker = EMPTY_MARKER
        .len()
        .max(IO_ERROR_MARKER.len())
        .max(DECODE_ERROR_MARKER.len()) as u64;
    overhead + file.size.max(marker)
}

/// split groups into size-bounded chunks
///
/// file order is preserved. a file over `max_file_size`, or whose framed
/// block alone would not fit a container, is dropped. a chunk is closed
/// when it already holds a file and the next framed block would push it
/// past `max_container_size`. an unsplit group yields one chunk
/// with ordinal 0; a split group yields chunks numbered from 1. empty
/// groups yield nothing.
pub fn pack(
    groups: Vec<Group>,
    max_file_size: u64,
    max_container_size: u64,
    ctx: &RunContext,
) -> (Vec<Chunk>, PackReport) {
    let mut report = PackReport::default();
    let mut chunks = Vec::new();

    for group in groups {
        if group.files.is_empty() {
            report.empty_groups += 1;
            ctx.trace(format!("group {} is empty", group.key));
            continue;
        }

        let mut parts: Vec<Vec<FileRecord>> = Vec::new();
        let mut current: Vec<FileRecord> = Vec::new();
        let mut accumulated: u64 = 0;

        for file in group.files {
            let framed = framed_size(&file);
            let limit = if file.size > max_file_size {
                Some(max_file_size)
            } else if framed > max_container_size {
                Some(max_container_size)
            } else {
                None
            };
            if let Some(limit) = limit {
                ctx.fail(
                    true,
                    format!(
                        "file /{} is too big ({} bytes, {} framed, limit {}), skipped",
                        file.path, file.size, framed, limit
                    ),
                );
                report.dropped.push(DroppedFile {
                    path: file.path,
                    size: file.size,
                    limit,
                });
                continue;
            }

            if !current.is_empty() && accumulated + framed > max_container_size {
                parts.push(std::mem::take(&mut current));
                accumulated = 0;
            }

            accumulated += framed;
            current.push(file);
        }

        if !current.is_empty() {
            parts.push(current);
        }

        if parts.is_empty() {
            report.empty_groups += 1;
            continue;
        }

        let split = parts.len() > 1;
        if split {
            report.split_groups += 1;
            ctx.note(
                false,
                format!("group {} split into {} containers", group.key, parts.len()),
            );
        }

        for (i, files) in parts.into_iter().enumerate() {
            let ordinal = if split { i as u32 + 1 } else { 0 };
            chunks.push(Chunk {
                key: group.key.clone(),
                ordinal,
                files,
            });
        }
    }

    (chunks, report)
}
