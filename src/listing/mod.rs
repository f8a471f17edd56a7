//! # Listing Parser
//!
//! Turns the technical listing printed by `7z l <archive>` into segment chains for the
//! tree builder. A listing row looks like
//!
//! ```text
//! 2018-06-20 18:50:00 .....         5188         5188  pool\main\a\foo_1.0_amd64.deb
//! 2018-06-20 20:52:22 D....                            boot\grub\i386-efi
//! ```
//!
//! Every other line (banner, column headers, `-----` rules, the totals footer, blank lines)
//! is rejected and the caller simply moves on. Rejection is not an error.

use std::ops::Range;

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::common::Segment;

/// Format of the `<date> <time>` pair in a listing row.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Path printed by 7-Zip for the top entry of a TAR archive.
const TAR_ROOT_MARKER: &str = ".";

/// Byte offset where 7-Zip's technical listing starts the `Name` column.
const NAME_COLUMN: usize = 53;
/// `Size` and `Compressed`, each a right-aligned 12-character field after one space.
const SIZE_FIELD: Range<usize> = 25..38;
const COMPRESSED_FIELD: Range<usize> = 38..51;

/// The named fields of one accepted listing row, borrowed from the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow<'a> {
    pub date: &'a str,
    pub time: &'a str,
    /// Five-character attribute column, e.g. `D....` or `.....`.
    pub attr: &'a str,
    /// Uncompressed size, the first numeric column.
    pub size: Option<&'a str>,
    /// Stored size, padded to the sector size on ISO images.
    pub compressed: Option<&'a str>,
    pub path: &'a str,
}

impl ListingRow<'_> {
    pub fn is_dir(&self) -> bool {
        self.attr.starts_with('D')
    }
}

/// Splits the next whitespace-delimited token off `rest`.
fn next_token<'a>(rest: &mut &'a str) -> Option<&'a str> {
    let trimmed = rest.trim_start();
    if trimmed.is_empty() {
        *rest = trimmed;
        return None;
    }
    let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
    let (token, tail) = trimmed.split_at(end);
    *rest = tail;
    Some(token)
}

/// `digits SEP digits SEP digits`
fn is_triple(token: &str, sep: char) -> bool {
    let parts: Vec<&str> = token.split(sep).collect();
    parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

fn is_attr(token: &str) -> bool {
    let mut chars = token.chars();
    chars.next().is_some() && chars.as_str() == "...."
}

fn is_number(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// A blank or numeric fixed-width field.
fn size_field(field: &str) -> Option<Option<&str>> {
    match field.trim() {
        "" => Some(None),
        n if is_number(n) => Some(Some(n)),
        _ => None,
    }
}

/// Reads the size and name columns by position, the way 7-Zip lays them out.
fn split_columns<'a>(line: &'a str, attr: &str) -> Option<(Option<&'a str>, Option<&'a str>, &'a str)> {
    if line.get(20..25)? != attr || line.get(COMPRESSED_FIELD.end..NAME_COLUMN)? != "  " {
        return None;
    }
    let size = size_field(line.get(SIZE_FIELD)?)?;
    let compressed = size_field(line.get(COMPRESSED_FIELD)?)?;
    let path = line.get(NAME_COLUMN..)?;
    Some((size, compressed, path))
}

/// Fallback for rows that are not column-aligned: sizes are the numeric tokens ahead of
/// the path. A directory only gives up tokens when both columns are present.
fn split_tokens<'a>(mut rest: &'a str, is_dir: bool) -> (Option<&'a str>, Option<&'a str>, &'a str) {
    let mut sizes: Vec<&str> = Vec::with_capacity(2);
    let mut cursor = rest;
    while sizes.len() < 2 {
        let before = cursor;
        match next_token(&mut cursor) {
            Some(tok) if is_number(tok) && !cursor.trim().is_empty() => sizes.push(tok),
            _ => {
                cursor = before;
                break;
            }
        }
    }
    if !is_dir || sizes.len() == 2 {
        rest = cursor;
    } else {
        sizes.clear();
    }
    (sizes.first().copied(), sizes.get(1).copied(), rest)
}

/// Tokenizes one line. Returns `None` for anything that is not a listing row.
pub fn tokenize(line: &str) -> Option<ListingRow<'_>> {
    let line = line.trim_end();
    let mut rest = line.trim_start();

    let date = next_token(&mut rest).filter(|t| is_triple(t, '-'))?;
    let time = next_token(&mut rest).filter(|t| is_triple(t, ':'))?;
    let attr = next_token(&mut rest).filter(|t| is_attr(t))?;

    let (size, compressed, path) = match split_columns(line, attr) {
        Some(columns) => columns,
        None => split_tokens(rest, attr.starts_with('D')),
    };

    let path = path.trim();
    if path.is_empty() {
        return None;
    }

    Some(ListingRow { date, time, attr, size, compressed, path })
}

/// Stateful parser for one archive's listing.
///
/// Holds the TAR path prefix once the root marker row has been seen.
#[derive(Debug, Default)]
pub struct ListingParser {
    prefix: Option<String>,
}

impl ListingParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// The prefix to re-apply when asking the tool for a file, empty for ISO images.
    pub fn path_prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or("")
    }

    /// Parses one line into a segment chain ready for [`crate::tree::FileTree::insert`].
    ///
    /// Returns `None` for rejected lines and for the TAR root marker.
    pub fn parse_line(&mut self, line: &str) -> Option<Vec<Segment>> {
        let Some(row) = tokenize(line) else {
            if !line.trim().is_empty() {
                debug!("listing: skipped '{}'", line.trim());
            }
            return None;
        };

        if row.path == TAR_ROOT_MARKER {
            if self.prefix.is_none() {
                self.prefix = Some(format!(".{}", std::path::MAIN_SEPARATOR));
            }
            return None;
        }

        let path = if self.prefix.is_some() {
            row.path
                .strip_prefix("./")
                .or_else(|| row.path.strip_prefix(".\\"))
                .unwrap_or(row.path)
        } else {
            row.path
        };
        let path = path.replace('\\', "/");
        let mut parts: Vec<&str> = path.trim_matches('/').split('/').filter(|p| !p.is_empty()).collect();
        let leaf_name = parts.pop()?;

        let stamp = format!("{} {}", row.date, row.time);
        let created_at = NaiveDateTime::parse_from_str(&stamp, TIMESTAMP_FORMAT).unwrap_or_else(|e| {
            warn!("could not parse timestamp '{}' of '{}': {}", stamp, row.path, e);
            NaiveDateTime::default()
        });

        let is_dir = row.is_dir();
        let leaf = Segment {
            name: leaf_name.to_string(),
            is_dir,
            size: if is_dir { None } else { row.size.and_then(|s| s.parse().ok()) },
            created_at,
        };

        let mut chain: Vec<Segment> = parts.into_iter().map(Segment::dir).collect();
        chain.push(leaf);
        Some(chain)
    }
}
