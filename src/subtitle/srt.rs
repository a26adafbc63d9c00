use crate::error::ParseError;

use super::timestamp::parse_timing;
use super::{Cue, blocks, split_fragments};

pub fn parse_srt(input: &str) -> Result<Vec<Cue>, ParseError> {
    let mut cues: Vec<Cue> = Vec::new();

    for block in blocks(input) {
        // Index line can sometimes be omitted
        let timing_at = block
            .iter()
            .take(2)
            .position(|(_, line)| line.contains("-->"));

        let Some(timing_at) = timing_at else {
            // Text after a blank line inside a cue still belongs to that cue
            let Some(prev) = cues.last_mut() else {
                return Err(ParseError::malformed(
                    block[0].0,
                    "cue is missing a timestamp line",
                ));
            };
            prev.lines
                .extend(block.iter().map(|(_, text)| split_fragments(text)));
            continue;
        };

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
