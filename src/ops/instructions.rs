use std::fs;
use std::path::Path;

use crate::error::{IoResultExt, Result};

/// name of the reader-facing notes written into each build
pub const INSTRUCTIONS_FILE_NAME: &str = "README.txt";

const TEMPLATE: &str = "\
PROJECT: {title}
{description}

BUILD: {build}

The project sources are packed into the following TXT containers:
{containers}

Each file inside a container is framed like this:

[## BEGIN FILE: \"/path/to/file\" ##]
<file content>
[## END FILE: \"/path/to/file\" ##]

Empty files contain the line [## NOTE: EMPTY FILE ##]. Files that could
not be read contain an [## ERROR: ... ##] line instead of their content.

TOC.txt lists every container and every file in it:

GROUP ORIG_PATH: \"<group>\"; CONTAINER: \"<container>\"
FILE PATH: \"<path>\"; OFFSET: <byte offset>; SIZE: <byte size>; HASH: <content hash>

OFFSET and SIZE address the framed block in UTF-8 bytes. HASH is the
first 10 hex characters of the SHA-256 of the text between the markers.
";

/// fill the template
pub fn render(title: &str, description: &str, build_id: &str, containers: &[String]) -> String {
    let list = if containers.is_empty() {
        "  (none)".to_string()
    } else {
        containers
            .iter()
            .map(|c| format!("  - {}", c))
            .collect::<Vec<_>>()
            .join("\n")
    };

    fill(
        TEMPLATE,
        &[
            ("title", title),
            ("description", description),
            ("build", build_id),
            ("containers", list.as_str()),
        ],
    )
}

/// replace `{name}` placeholders in one pass; substituted text is never
/// scanned again and unknown placeholders are kept as written
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let value = tail.find('}').and_then(|end| {
            let name = &tail[1..end];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end))
        });
        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// render and write the notes file into `build_dir`
pub fn write_instructions(
    build_dir: &Path,
    title: &str,
    description: &str,
    build_id: &str,
    containers: &[String],
) -> Result<()> {
    let path = build_dir.join(INSTRUCTIONS_FILE_NAME);
    let text = render(title, description, build_id, containers);
    fs::write(&path, text).with_path(&path)?;
    Ok(())
}
