use std::cmp::Ordering;
use std::fs;
use std::path::{Component, Path};

use crate::context::RunContext;
use crate::types::{join_rel, GroupKey};

/// declarations dropped while resolving groups
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolveReport {
    /// group paths that are not directories under the project root
    pub missing_paths: Vec<String>,
    /// group roots that could not be listed
    pub failed_roots: Vec<String>,
}

impl ResolveReport {
    pub fn is_clean(&self) -> bool {
        self.missing_paths.is_empty() && self.failed_roots.is_empty()
    }
}

/// turn declared group paths and roots into a naturally sorted key list
///
/// every path must be an existing directory under `project_root`. every
/// root contributes one key per immediate, non-symlinked subdirectory.
/// bad declarations are logged and skipped; duplicates collapse.
pub fn resolve(
    group_paths: &[String],
    group_roots: &[String],
    project_root: &Path,
    ctx: &RunContext,
) -> (Vec<GroupKey>, ResolveReport) {
    let mut report = ResolveReport::default();
    let mut keys: Vec<GroupKey> = Vec::new();

    for declared in group_paths {
        let key = GroupKey::new(declared);
        if key.is_default() {
            continue;
        }
        if !is_inside(&key) || !project_root.join(key.as_str()).is_dir() {
            ctx.fail(true, format!("group path does not exist: {}", declared));
            report.missing_paths.push(declared.clone());
            continue;
        }
        keys.push(key);
    }

    for declared in group_roots {
        let root_key = GroupKey::new(declared);
        let base = if root_key.is_default() { "" } else { root_key.as_str() };

        if !is_inside(&root_key) {
            ctx.fail(true, format!("group root is outside the project: {}", declared));
            report.failed_roots.push(declared.clone());
            continue;
        }

        match list_subdirs(&project_root.join(base)) {
            Ok(names) => {
                for name in names {
                    keys.push(GroupKey::new(&join_rel(base, &name)));
                }
            }
            Err(e) => {
                ctx.fail(true, format!("cannot read group root {}: {}", declared, e));
                report.failed_roots.push(declared.clone());
            }
        }
    }

    keys.sort_by(|a, b| natural_cmp(a.as_str(), b.as_str()));
    keys.dedup();

    ctx.trace(format!(
        "resolved {} group(s): {}",
        keys.len(),
        keys.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", ")
    ));
    (keys, report)
}

/// reject keys that climb out of the project root
fn is_inside(key: &GroupKey) -> bool {
    Path::new(key.as_str())
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// immediate real subdirectories of `dir`
fn list_subdirs(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() && !file_type.is_symlink() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

/// natural order: digit runs compare as integers, text runs compare
/// case- and accent-insensitively; exact byte order breaks ties
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let ta = tokenize(a);
    let tb = tokenize(b);

    for (x, y) in ta.iter().zip(tb.iter()) {
        let ord = match (x, y) {
            (Token::Num(x), Token::Num(y)) => cmp_digits(x, y),
            (Token::Text(x), Token::Text(y)) => fold(x).cmp(&fold(y)),
            (Token::Num(_), Token::Text(_)) => Ordering::Less,
            (Token::Text(_), Token::Num(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    ta.len().cmp(&tb.len()).then_with(|| a.cmp(b))
}

#[derive(Debug)]
enum Token<'a> {
    Num(&'a str),
    Text(&'a str),
}

fn tokenize(s: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_digits: Option<bool> = None;

    for (i, c) in s.char_indices() {
        let digit = c.is_ascii_digit();
        match in_digits {
            Some(d) if d != digit => {
                tokens.push(make_token(&s[start..i], d));
                start = i;
            }
            _ => {}
        }
        in_digits = Some(digit);
    }
    if let Some(d) = in_digits {
        tokens.push(make_token(&s[start..], d));
    }
    tokens
}

fn make_token(s: &str, digits: bool) -> Token<'_> {
    if digits {
        Token::Num(s)
    } else {
        Token::Text(s)
    }
}

/// compare digit strings by value without overflow
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn fold(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).map(strip_accent).collect()
}

fn strip_accent(c: char) -> char {
    match c {
        'à'..='å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'ď' | 'đ' => 'd',
        'è'..='ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'ĥ' | 'ħ' => 'h',
        'ì'..='ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
        'ĵ' => 'j',
        'ķ' => 'k',
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => 'l',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'ò'..='ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => 'o',
        'ŕ' | 'ŗ' | 'ř' => 'r',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'ţ' | 'ť' | 'ŧ' => 't',
        'ù'..='ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ŵ' => 'w',
        'ý' | 'ÿ' | 'ŷ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}
