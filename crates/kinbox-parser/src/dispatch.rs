//! Routing one line to every field it matches.

use kinbox_core::{Field, FieldLabels, KnowledgeRecord, LabelSet, ParseError};

use crate::extract::extract;
use crate::matcher::{looks_like_url, matches};

/// The expanded label set of every field, built once per parser.
#[derive(Debug, Clone)]
pub struct ExpandedLabels {
    sets: [LabelSet; 8],
}

impl ExpandedLabels {
    #[must_use]
    pub fn new(labels: &FieldLabels) -> Self {
        Self {
            sets: Field::ALL.map(|field| labels.label_set(field)),
        }
    }

    /// `Field::ALL` is in declaration order, so the discriminant is the slot.
    #[must_use]
    pub fn get(&self, field: Field) -> &LabelSet {
        &self.sets[field as usize]
    }
}

impl Default for ExpandedLabels {
    fn default() -> Self {
        Self::new(&FieldLabels::default())
    }
}

/// Try `line` against every field in dispatch order and write what matches.
///
/// Fields are not exclusive: a line matching two label families sets both.
///
/// # Errors
///
/// Returns the first [`ParseError`] raised by a link or numeric field.
pub fn dispatch(
    line: &str,
    labels: &ExpandedLabels,
    record: &mut KnowledgeRecord,
) -> Result<(), ParseError> {
    for field in Field::ALL {
        let set = labels.get(field);
        let detected = match field {
            Field::Link => looks_like_url(line) || matches(line, set),
            _ => matches(line, set),
        };
        if detected {
            let value = extract(set, line);
            tracing::debug!(%field, %value, "recognized field");
            assign(field, value, record)?;
        }
    }
    Ok(())
}

fn assign(field: Field, value: String, record: &mut KnowledgeRecord) -> Result<(), ParseError> {
    match field {
        Field::Link => {
            if value.chars().any(char::is_whitespace) {
                return Err(ParseError::NoLink { value });
            }
            record.link = value;
        }
        Field::Name => record.name = value,
        Field::Theme => record.theme = value,
        Field::Sphere => record.sphere = value,
        Field::KnowledgeType => record.knowledge_type = value,
        Field::Subtype => record.subtype = value,
        Field::Duration => match parse_count(&value) {
            Some(n) => record.duration = n,
            None => return Err(ParseError::InvalidDuration { value }),
        },
        Field::WordCount => match parse_count(&value) {
            Some(n) => record.word_count = n,
            None => return Err(ParseError::InvalidWordCount { value }),
        },
    }
    Ok(())
}

/// A signed 64-bit decimal integer that is not negative. A leading `+` is
/// allowed; fractions, units and surrounding text are not.
fn parse_count(value: &str) -> Option<u64> {
    let n: i64 = value.parse().ok()?;
    u64::try_from(n).ok()
}
