//! Frontmatter codec for document files.
//!
//! A document file is a `---` delimited block of `key: value` lines followed by
//! a blank line and the body:
//!
//! ```text
//! ---
//! id: 4f1c...
//! name: RFC-1
//! parent_folder_id: drafts
//! created_time: 2024-01-01T00:00:00.000000000Z
//! modified_time: 2024-01-01T00:00:00.000000000Z
//! owner: alice@example.com
//! trashed: false
//! status: WIP
//! ---
//!
//! Body text.
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use ws_core::{MetadataMap, WorkspaceError};

const DELIMITER: &str = "---";

/// Keys mapped to [`DocumentMetadata`] fields, in emission order.
const RESERVED_KEYS: [&str; 8] = [
    "id",
    "name",
    "parent_folder_id",
    "created_time",
    "modified_time",
    "owner",
    "thumbnail_url",
    "trashed",
];

/// Frontmatter decoding errors.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("missing opening frontmatter delimiter")]
    MissingOpening,

    #[error("missing closing frontmatter delimiter")]
    MissingClosing,

    #[error("invalid value for {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },
}

impl From<FrontmatterError> for WorkspaceError {
    fn from(err: FrontmatterError) -> Self {
        WorkspaceError::malformed("frontmatter").with_source(err)
    }
}

/// Metadata stored in a document's frontmatter.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct DocumentMetadata {
    pub id: String,
    pub name: String,
    pub parent_folder_id: String,
    pub created_time: DateTime<Utc>,
    pub modified_time: DateTime<Utc>,
    pub owner: String,
    pub thumbnail_url: String,
    pub trashed: bool,
    pub metadata: MetadataMap,
}

/// Split a document file into metadata and body.
pub(crate) fn parse(text: &str) -> Result<(DocumentMetadata, String), FrontmatterError> {
    let mut lines = LineCursor::new(text);

    match lines.next() {
        Some(first) if first == DELIMITER => {}
        _ => return Err(FrontmatterError::MissingOpening),
    }

    let mut meta = DocumentMetadata::default();
    let mut closed = false;
    while let Some(line) = lines.next() {
        if line == DELIMITER {
            closed = true;
            break;
        }
        let Some((key, raw)) = line.split_once(':') else {
            continue;
        };
        apply_field(&mut meta, key.trim(), raw.trim())?;
    }
    if !closed {
        return Err(FrontmatterError::MissingClosing);
    }

    let mut rest = lines.rest();
    if let Some(after_blank) = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')) {
        rest = after_blank;
    }

    Ok((meta, rest.to_owned()))
}

/// Render metadata and body as a document file.
///
/// Reserved keys come first in a fixed order, then custom keys. Custom keys that
/// would not survive a round trip (reserved names, `:` or newlines) are skipped.
pub(crate) fn serialize(meta: &DocumentMetadata, content: &str) -> String {
    let mut out = String::with_capacity(content.len() + 256);
    out.push_str(DELIMITER);
    out.push('\n');

    push_line(&mut out, "id", &encode_str(&meta.id));
    push_line(&mut out, "name", &encode_str(&meta.name));
    push_line(
        &mut out,
        "parent_folder_id",
        &encode_str(&meta.parent_folder_id),
    );
    push_line(&mut out, "created_time", &format_time(meta.created_time));
    push_line(&mut out, "modified_time", &format_time(meta.modified_time));
    push_line(&mut out, "owner", &encode_str(&meta.owner));
    if !meta.thumbnail_url.is_empty() {
        push_line(&mut out, "thumbnail_url", &encode_str(&meta.thumbnail_url));
    }
    push_line(&mut out, "trashed", if meta.trashed { "true" } else { "false" });

    for (key, value) in &meta.metadata {
        if !is_storable_key(key) {
            tracing::warn!(
                key = %key,
                id = %meta.id,
                "Skipping metadata key that cannot be stored in frontmatter"
            );
            continue;
        }
        push_line(&mut out, key, &encode_value(value));
    }

    out.push_str(DELIMITER);
    out.push_str("\n\n");
    out.push_str(content);
    out
}

pub(crate) fn is_storable_key(key: &str) -> bool {
    !key.is_empty()
        && !RESERVED_KEYS.contains(&key)
        && !key.contains([':', '\n', '\r'])
        && key.trim() == key
}

/// RFC 3339 with nanosecond precision, always UTC.
pub(crate) fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn push_line(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str(": ");
    out.push_str(value);
    out.push('\n');
}

fn apply_field(meta: &mut DocumentMetadata, key: &str, raw: &str) -> Result<(), FrontmatterError> {
    match key {
        "id" => meta.id = decode_str(raw),
        "name" => meta.name = decode_str(raw),
        "parent_folder_id" => meta.parent_folder_id = decode_str(raw),
        "created_time" => meta.created_time = parse_time("created_time", raw)?,
        "modified_time" => meta.modified_time = parse_time("modified_time", raw)?,
        "owner" => meta.owner = decode_str(raw),
        "thumbnail_url" => meta.thumbnail_url = decode_str(raw),
        "trashed" => {
            meta.trashed = match raw {
                "true" => true,
                "false" => false,
                _ => {
                    return Err(FrontmatterError::InvalidField {
                        field: "trashed",
                        value: raw.to_owned(),
                    });
                }
            }
        }
        "" => {}
        _ => {
            meta.metadata.insert(key.to_owned(), decode_value(raw));
        }
    }
    Ok(())
}

fn parse_time(field: &'static str, raw: &str) -> Result<DateTime<Utc>, FrontmatterError> {
    let raw = decode_str(raw);
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| FrontmatterError::InvalidField { field, value: raw })
}

/// Whether a string must be JSON-quoted to read back unchanged.
fn needs_quoting(s: &str) -> bool {
    s.contains(['\n', '\r'])
        || s.trim() != s
        || s.starts_with(['"', '\''])
        || s.ends_with(['"', '\''])
        || is_bare_scalar(s)
}

/// Unquoted text that decodes to a non-string JSON scalar.
fn is_bare_scalar(s: &str) -> bool {
    matches!(
        serde_json::from_str::<serde_json::Value>(s),
        Ok(serde_json::Value::Bool(_) | serde_json::Value::Null | serde_json::Value::Number(_))
    )
}

fn encode_str(s: &str) -> String {
    if needs_quoting(s) {
        serde_json::Value::from(s).to_string()
    } else {
        s.to_owned()
    }
}

fn encode_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => encode_str(s),
        other => other.to_string(),
    }
}

/// Strip quoting from a raw value.
fn decode_str(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        if let Ok(s) = serde_json::from_str::<String>(raw) {
            return s;
        }
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return raw[1..raw.len() - 1].to_owned();
    }
    raw.to_owned()
}

/// Decode a custom value: bare booleans, numbers and `null` keep their type,
/// everything else is a string.
fn decode_value(raw: &str) -> serde_json::Value {
    if is_bare_scalar(raw) {
        if let Ok(value) = serde_json::from_str(raw) {
            return value;
        }
    }
    serde_json::Value::String(decode_str(raw))
}

/// Line iterator that remembers its byte offset so the body can be sliced verbatim.
struct LineCursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> LineCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }
}

impl<'a> Iterator for LineCursor<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        if rest.is_empty() {
            return None;
        }
        let (line, consumed) = match rest.find('\n') {
            Some(idx) => (&rest[..idx], idx + 1),
            None => (rest, rest.len()),
        };
        self.pos += consumed;
        Some(line.strip_suffix('\r').unwrap_or(line))
    }
}
