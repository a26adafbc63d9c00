//! Reduces parsed cues to the sequence of spoken lines that gets stored.

use crate::models::Line;
use crate::subtitle::Cue;

/// Whether a fragment becomes a new line, given the text emitted last.
fn is_new_line(last_emitted: &str, text: &str) -> bool {
    !text.is_empty() && text != last_emitted
}

/// Flatten cues into lines, dropping empty fragments and consecutive repeats.
///
/// The "last emitted" text is carried across cue boundaries, so a sentence
/// repeated in back-to-back cues keeps only its first occurrence and that
/// occurrence's time range. Returned lines have no video assigned yet.
pub fn normalize(cues: &[Cue]) -> Vec<Line> {
    let fragments = cues.iter().flat_map(|cue| {
        cue.lines
            .iter()
            .flat_map(|line| line.fragments.iter())
            .map(move |fragment| (cue, fragment))
    });

    let (lines, _) = fragments.fold(
        (Vec::new(), ""),
        |(mut lines, last_emitted), (cue, fragment)| {
            let text = fragment.text.as_str();
            if !is_new_line(last_emitted, text) {
                return (lines, last_emitted);
            }
            lines.push(Line::new(text, cue.start, cue.end));
            (lines, text)
        },
    );
    lines
}
