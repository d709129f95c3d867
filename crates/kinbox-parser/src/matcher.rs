//! Deciding whether a line belongs to a field.

use kinbox_core::LabelSet;

/// Markers that make a line a link candidate without any label.
const URL_MARKERS: [&str; 3] = ["http://", "https://", "www."];

/// True iff `line` starts or ends with one of the label spellings.
///
/// Only the edges are checked: a label in the middle of a line
/// ("see Link here please") does not match. Free text in a Name value
/// would otherwise trip the word-count and `#` sphere labels.
#[must_use]
pub fn matches(line: &str, labels: &LabelSet) -> bool {
    labels
        .iter()
        .any(|label| line.starts_with(label) || line.ends_with(label))
}

/// True if the line contains a URL marker anywhere.
#[must_use]
pub fn looks_like_url(line: &str) -> bool {
    URL_MARKERS.iter().any(|m| line.contains(m))
}
