use crate::error::ParseError;

use super::timestamp::parse_timing;
use super::{Cue, blocks, split_fragments};

const SKIPPED_BLOCKS: [&str; 3] = ["NOTE", "STYLE", "REGION"];

pub fn parse_vtt(input: &str) -> Result<Vec<Cue>, ParseError> {
    let mut blocks = blocks(input).into_iter();

    let header = blocks.next().ok_or(ParseError::MissingHeader)?;
    if !header[0].1.trim_start().starts_with("WEBVTT") {
        return Err(ParseError::MissingHeader);
    }

    let mut cues = Vec::new();
    for block in blocks {
        let first = block[0].1.trim_start();
        if SKIPPED_BLOCKS
            .iter()
            .any(|kind| first == *kind || first.starts_with(&format!("{kind} ")))
        {
            continue;
        }

        // Optional cue identifier before the timing line
        let timing_at = block
            .iter()
            .take(2)
            .position(|(_, line)| line.contains("-->"))
            .ok_or_else(|| ParseError::malformed(block[0].0, "cue is missing a timing line"))?;

        let (line_no, timing) = block[timing_at];
        let (start, end) = parse_timing(timing.trim())
            .map_err(|msg| ParseError::malformed(line_no, msg))?;

        let lines = block[timing_at + 1..]
            .iter()
            .map(|(_, text)| split_fragments(text))
            .collect();

        cues.push(Cue { start, end, lines });
    }

    Ok(cues)
}
