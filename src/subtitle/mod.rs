//! Subtitle reading.
//!
//! Turns `.srt` and `.vtt` files into timed [`Cue`]s. Each cue keeps its
//! text lines, and each line is split into fragments wherever inline markup
//! (`<i>`, `<font ...>`, `{\an8}`) starts or ends. The markup itself is
//! dropped. After parsing, adjacent cues that repeat the same text are
//! coalesced.

mod srt;
mod timestamp;
mod vtt;

use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ParseError;

pub use srt::parse_srt;
pub use vtt::parse_vtt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub start: Duration,
    pub end: Duration,
    pub lines: Vec<CueLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueLine {
    pub fragments: Vec<Fragment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
}

#[cfg(test)]
impl Cue {
    /// Convenience constructor for a cue whose lines each hold a single fragment.
    pub fn from_text(start: Duration, end: Duration, lines: &[&str]) -> Self {
        Self {
            start,
            end,
            lines: lines
                .iter()
                .map(|text| CueLine {
                    fragments: vec![Fragment {
                        text: (*text).to_string(),
                    }],
                })
                .collect(),
        }
    }
}

/// Read and parse a subtitle file, picking the format from its extension.
pub fn parse_file(path: &Path) -> Result<Vec<Cue>, ParseError> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

    let parser: fn(&str) -> Result<Vec<Cue>, ParseError> = match extension.as_deref() {
        Some("srt") => parse_srt,
        Some("vtt") => parse_vtt,
        _ => return Err(ParseError::UnsupportedFormat(path.to_path_buf())),
    };

    let contents = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(coalesce(parser(&contents)?))
}

/// Merge neighbouring cues with identical text whose time ranges touch or overlap.
pub fn coalesce(cues: Vec<Cue>) -> Vec<Cue> {
    let mut merged: Vec<Cue> = Vec::with_capacity(cues.len());
    for cue in cues {
        if let Some(prev) = merged.last_mut()
            && prev.lines == cue.lines
            && cue.start <= prev.end
        {
            prev.end = prev.end.max(cue.end);
            continue;
        }
        merged.push(cue);
    }
    merged
}

/// Split one subtitle text line into fragments at markup boundaries.
pub(crate) fn split_fragments(line: &str) -> CueLine {
    let mut fragments = Vec::new();
    let mut current = String::new();
    let mut rest = line;

    while let Some(ch) = rest.chars().next() {
        let tag_end = match ch {
            '<' => html_tag_end(rest),
            '{' if rest[1..].starts_with('\\') => rest.find('}'),
            _ => None,
        };

        match tag_end {
            Some(end) => {
                push_fragment(&mut fragments, &mut current);
                rest = &rest[end + 1..];
            }
            None => {
                current.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }
    push_fragment(&mut fragments, &mut current);

    CueLine { fragments }
}

/// Byte offset of the closing `>` when `rest` opens a markup tag.
///
/// Tags start with a letter after the optional `/` (`<i>`, `</b>`,
/// `<font ...>`, `<v Speaker>`, `<c.x>`), or are WebVTT timestamp tags
/// such as `<00:00:01.500>`. A bare `<` in dialogue stays text.
fn html_tag_end(rest: &str) -> Option<usize> {
    let name = rest[1..].strip_prefix('/').unwrap_or(&rest[1..]);
    let end = rest.find('>')?;
    match name.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => Some(end),
        Some(c) if c.is_ascii_digit() => rest[1..end]
            .chars()
            .all(|c| c.is_ascii_digit() || c == ':' || c == '.')
            .then_some(end),
        _ => None,
    }
}

fn push_fragment(fragments: &mut Vec<Fragment>, current: &mut String) {
    let text = current.trim();
    if !text.is_empty() {
        fragments.push(Fragment {
            text: text.to_string(),
        });
    }
    current.clear();
}

/// Groups non-blank lines into blocks, keeping 1-based line numbers.
pub(crate) fn blocks(input: &str) -> Vec<Vec<(usize, &str)>> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for (idx, line) in input.lines().enumerate() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push((idx + 1, line));
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}
