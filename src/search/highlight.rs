/// A run of result text, either matching the search text or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub matched: bool,
}

impl Segment {
    fn new(text: &str, matched: bool) -> Self {
        Segment {
            text: text.to_string(),
            matched,
        }
    }
}

/// Split `text` around every literal, case-sensitive occurrence of `needle`.
///
/// Uses the same substring rule as the line search, so every row returned
/// for a keyword has at least one matched segment.
pub fn highlight(text: &str, needle: &str) -> Vec<Segment> {
    if needle.is_empty() {
        return vec![Segment::new(text, false)];
    }

    let mut segments = Vec::new();
    let mut last = 0;
    for (start, matched) in text.match_indices(needle) {
        if start > last {
            segments.push(Segment::new(&text[last..start], false));
        }
        segments.push(Segment::new(matched, true));
        last = start + matched.len();
    }
    if last < text.len() || segments.is_empty() {
        segments.push(Segment::new(&text[last..], false));
    }
    segments
}
