//! Stripping labels and separators from a matched line.
//!
//! Extraction accepts both orderings:
//!
//! ```text
//! Name: Some title        -> Some title
//! Name :Some title        -> Some title
//! Some title - Name       -> Some title
//! Some title -Name        -> Some title
//! ```
//!
//! Surrounding quotes are kept: `Название "Quoted Title"` yields `"Quoted Title"`.

use kinbox_core::LabelSet;

/// Leading separators, tried in order, each removed at most once.
const LEADING_SEPARATORS: [&str; 3] = [": ", " :", ":"];

/// Trailing separators, tried in order, each removed at most once.
const TRAILING_SEPARATORS: [&str; 3] = [" - ", "- ", " -"];

/// One pure transformation of the running value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Trim,
    StripLabelPrefix,
    StripLeadingSeparator,
    StripLabelSuffix,
    StripTrailingSeparator,
}

/// The steps run for every label found in the line.
const PIPELINE: [Step; 6] = [
    Step::Trim,
    Step::StripLabelPrefix,
    Step::StripLeadingSeparator,
    Step::StripLabelSuffix,
    Step::StripTrailingSeparator,
    Step::Trim,
];

impl Step {
    fn apply<'a>(self, value: &'a str, label: &str) -> &'a str {
        match self {
            Self::Trim => value.trim(),
            Self::StripLabelPrefix => value.strip_prefix(label).unwrap_or(value),
            Self::StripLeadingSeparator => LEADING_SEPARATORS
                .iter()
                .fold(value, |v, sep| v.strip_prefix(sep).unwrap_or(v)),
            Self::StripLabelSuffix => value.strip_suffix(label).unwrap_or(value),
            Self::StripTrailingSeparator => TRAILING_SEPARATORS
                .iter()
                .fold(value, |v, sep| v.strip_suffix(sep).unwrap_or(v)),
        }
    }
}

/// Run the pipeline once for a single label.
fn strip_label<'a>(value: &'a str, label: &str) -> &'a str {
    PIPELINE.iter().fold(value, |v, step| step.apply(v, label))
}

/// Remove the field's label and separators from `line`, returning the value.
///
/// Every expanded spelling that occurs anywhere in the original line gets one
/// pass, in expansion order, each pass working on the previous result. If no
/// spelling occurs, the line comes back unchanged.
#[must_use]
pub fn extract(labels: &LabelSet, line: &str) -> String {
    labels
        .iter()
        .filter(|label| line.contains(label))
        .fold(line, strip_label)
        .to_string()
}
