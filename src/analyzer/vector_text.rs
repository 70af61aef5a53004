//! Parser for the textual form of an instant vector.
//!
//! Each sample is rendered on its own line as
//!
//! ```text
//! <label-set> => <value> @<timestamp>
//! ```
//!
//! e.g. `{pod="app-0"} => 12.5 @[1700000000.000]`. The parser checks the
//! two-delimiter shape of every line before it looks at the value, so a
//! structurally broken response is reported differently from one carrying an
//! unparsable number.

use std::num::ParseFloatError;

/// Separates the label set from the value.
pub const VALUE_DELIMITER: &str = "=>";

/// Separates the value from the timestamp.
pub const TIMESTAMP_DELIMITER: &str = "@";

/// Error type for vector text parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VectorParseError {
    #[error("Malformed metric line: {line:?}")]
    MalformedLine { line: String },

    #[error("Invalid metric value {value:?} in line {line:?}: {source}")]
    InvalidValue {
        line: String,
        value: String,
        #[source]
        source: ParseFloatError,
    },
}

/// One parsed sample line.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleLine<'a> {
    pub labels: &'a str,
    pub value: f64,
    pub timestamp: &'a str,
}

/// Parse a single sample line.
pub fn parse_line(line: &str) -> Result<SampleLine<'_>, VectorParseError> {
    let malformed = || VectorParseError::MalformedLine {
        line: line.to_string(),
    };

    let segments: Vec<&str> = line.split(VALUE_DELIMITER).collect();
    let &[labels, rest] = segments.as_slice() else {
        return Err(malformed());
    };

    let segments: Vec<&str> = rest.split(TIMESTAMP_DELIMITER).collect();
    let &[raw_value, timestamp] = segments.as_slice() else {
        return Err(malformed());
    };

    let value = raw_value.replace(' ', "");
    let parsed = value
        .parse::<f64>()
        .map_err(|source| VectorParseError::InvalidValue {
            line: line.to_string(),
            value: value.clone(),
            source,
        })?;

    Ok(SampleLine {
        labels: labels.trim(),
        value: parsed,
        timestamp: timestamp.trim(),
    })
}

/// Sum the values of every sample in `text`.
///
/// An empty vector sums to zero. Any malformed line fails the whole sum.
pub fn sum_samples(text: &str) -> Result<f64, VectorParseError> {
    if text.trim().is_empty() {
        return Ok(0.0);
    }

    text.lines()
        .map(|line| parse_line(line).map(|sample| sample.value))
        .sum()
}
