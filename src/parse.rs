//! Parsing of key/value quality control reports into typed, filtered records.
//!
//! # Overview
//!
//! Most of the reports handled by `scqc` are simple two-column files: a field
//! name, a delimiter (either a comma or a colon), and a value. The value is
//! often decorated for human consumption, for instance
//!
//! ```text
//! Valid Reads: 95.2% (1,234,567)
//! ```
//!
//! Parsing a report proceeds in four steps:
//!
//! 1. Each line is split at the _first_ delimiter. Every further delimiter is
//!    kept as part of the value.
//! 2. The field name is checked against the configured [`FieldFilter`].
//! 3. The value is normalized with the field's [`Extraction`]: the relevant
//!    portion is selected, a trailing `%` is dropped and thousands separators
//!    are removed.
//! 4. The normalized value is coerced to a [`FieldValue`] per the field's
//!    [`Coercion`].
//!
//! A line without any delimiter means the file is not in the expected format
//! and the whole file is rejected. A value which cannot be extracted or
//! coerced only drops that one field.
//!
//! ```
//! use scqc::parse::{parse_lines, Coercion, Delimiter, Extraction, FieldValue, ParserConfig};
//!
//! let config = ParserConfig::new()
//!     .field("Raw Reads", Extraction::Whole, Coercion::Integer)
//!     .field("Valid Reads", Extraction::InsideParenthesis, Coercion::Float);
//!
//! let record = parse_lines(
//!     ["Raw Reads: 1,500", "Valid Reads: 1,234 (82.27%)"],
//!     Delimiter::Colon,
//!     &config,
//! )
//! .unwrap();
//!
//! assert_eq!(record["Raw Reads"], FieldValue::Int(1500));
//! assert_eq!(record["Valid Reads"], FieldValue::Float(82.27));
//! ```

pub mod json;

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::io::Read;

use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

//========//
// Errors //
//========//

/// Structural failures encountered while parsing a report. Any of these means
/// that the file as a whole could not be understood.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A line could not be split into a name and a value.
    #[error("line {line} does not contain the `{delimiter}` delimiter")]
    MissingDelimiter {
        /// The 1-based line number of the offending line.
        line: u64,
        /// The delimiter that was expected.
        delimiter: char,
    },

    /// A value that must be numeric for the file to make sense was not.
    #[error("line {line}: `{value}` is not a valid count")]
    InvalidNumber {
        /// The 1-based line number of the offending line.
        line: u64,
        /// The offending value.
        value: String,
    },

    /// The report is not valid delimited text.
    #[error("invalid delimited text: {0}")]
    Csv(#[from] csv::Error),

    /// The report is not valid JSON or does not have the expected shape.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The top level JSON value was expected to be an object.
    #[error("expected a JSON object at the top level")]
    NotAnObject,

    /// The report could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

//===========//
// Delimiter //
//===========//

/// The delimiter separating a field name from its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delimiter {
    /// `name,value` lines, as written by CSV summaries.
    Comma,

    /// `name: value` lines, as written by text statistics reports.
    Colon,
}

impl Delimiter {
    /// The delimiter as a single character.
    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Colon => ':',
        }
    }

    /// The delimiter as a single byte (as expected by [`csv`]).
    pub fn as_byte(&self) -> u8 {
        self.as_char() as u8
    }
}

//========//
// Values //
//========//

/// A single parsed value within a [`FieldRecord`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// An integral value.
    Int(i64),

    /// A floating point value.
    Float(f64),

    /// A value that was kept as text.
    Text(String),
}

impl FieldValue {
    /// Gets the value as an `f64`, if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(v) => f.write_str(v),
        }
    }
}

/// All retained fields for one report, in the order they appeared in the file.
pub type FieldRecord = IndexMap<String, FieldValue>;

//===========//
// Filtering //
//===========//

/// Matches field names for the purposes of filtering.
#[derive(Clone, Debug)]
pub enum FieldMatcher {
    /// Matches a field with exactly this name.
    Exact(String),

    /// Matches any field whose name contains this substring.
    Contains(String),
}

impl FieldMatcher {
    /// Creates a matcher for a field with exactly this name.
    pub fn exact(name: impl Into<String>) -> Self {
        FieldMatcher::Exact(name.into())
    }

    /// Creates a matcher for any field containing this substring.
    pub fn contains(substring: impl Into<String>) -> Self {
        FieldMatcher::Contains(substring.into())
    }

    /// Whether this matcher matches the field name.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            FieldMatcher::Exact(n) => n == name,
            FieldMatcher::Contains(s) => name.contains(s.as_str()),
        }
    }
}

/// Determines which parsed fields are retained in the output record.
#[derive(Clone, Debug, Default)]
pub enum FieldFilter {
    /// Every field is retained.
    #[default]
    All,

    /// Only fields matching one of the matchers are retained.
    Allow(Vec<FieldMatcher>),

    /// Fields matching any of the matchers are dropped.
    Deny(Vec<FieldMatcher>),
}

impl FieldFilter {
    /// Creates an allow-list of exact field names.
    pub fn allow<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldFilter::Allow(names.into_iter().map(FieldMatcher::exact).collect())
    }

    /// Creates a deny-list of exact field names.
    pub fn deny<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldFilter::Deny(names.into_iter().map(FieldMatcher::exact).collect())
    }

    /// Whether a field with the given name should be retained.
    pub fn retains(&self, name: &str) -> bool {
        match self {
            FieldFilter::All => true,
            FieldFilter::Allow(matchers) => matchers.iter().any(|m| m.matches(name)),
            FieldFilter::Deny(matchers) => !matchers.iter().any(|m| m.matches(name)),
        }
    }
}

//===============//
// Normalization //
//===============//

/// Selects which portion of a raw value is of interest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extraction {
    /// The entire value.
    Whole,

    /// The portion before the first `(`, e.g. the count in `1,234 (56.7%)`.
    BeforeParenthesis,

    /// The portion within the first pair of parentheses, e.g. the percentage
    /// in `1,234 (56.7%)`. Values without parentheses cannot be extracted.
    InsideParenthesis,

    /// The portion within parentheses if there are any, otherwise the entire
    /// value.
    PreferParenthesis,
}

/// The type a normalized value is coerced to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coercion {
    /// A signed integer. Floating point text is truncated toward zero.
    Integer,

    /// A floating point number.
    Float,

    /// The normalized text itself.
    Text,
}

/// How a single field is normalized and coerced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    /// The portion of the value to keep.
    pub extraction: Extraction,

    /// The type to coerce the value to.
    pub coercion: Coercion,
}

impl FieldSpec {
    /// Creates a new [`FieldSpec`].
    pub fn new(extraction: Extraction, coercion: Coercion) -> Self {
        FieldSpec {
            extraction,
            coercion,
        }
    }
}

impl Default for FieldSpec {
    fn default() -> Self {
        FieldSpec::new(Extraction::Whole, Coercion::Text)
    }
}

/// Normalizes a raw value: trims it, applies the extraction, drops a trailing
/// `%` and removes thousands separators. Returns `None` if nothing is left.
pub fn normalize(raw: &str, extraction: Extraction) -> Option<String> {
    let value = raw.trim();

    let extracted = match extraction {
        Extraction::Whole => value,
        Extraction::BeforeParenthesis => value.split('(').next().unwrap_or(value),
        Extraction::InsideParenthesis => inside_parenthesis(value)?,
        Extraction::PreferParenthesis => inside_parenthesis(value).unwrap_or(value),
    };

    let extracted = extracted.trim();
    let extracted = extracted.strip_suffix('%').unwrap_or(extracted);
    let result = extracted.trim().replace(',', "");

    match result.is_empty() {
        true => None,
        false => Some(result),
    }
}

fn inside_parenthesis(value: &str) -> Option<&str> {
    let (_, rest) = value.split_once('(')?;
    Some(rest.split(')').next().unwrap_or(rest))
}

/// Coerces a normalized value. Returns `None` if the value cannot be
/// represented as the requested type.
pub fn coerce(value: &str, coercion: Coercion) -> Option<FieldValue> {
    match coercion {
        Coercion::Integer => value
            .parse::<i64>()
            .ok()
            .or_else(|| {
                value
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(|v| v.trunc() as i64)
            })
            .map(FieldValue::Int),
        Coercion::Float => value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(FieldValue::Float),
        Coercion::Text => Some(FieldValue::Text(value.to_string())),
    }
}

//===============//
// Configuration //
//===============//

/// Configuration for parsing a single kind of report: which fields to keep and
/// how to normalize and coerce each of them.
#[derive(Clone, Debug, Default)]
pub struct ParserConfig {
    filter: FieldFilter,
    default_spec: FieldSpec,
    fields: HashMap<String, FieldSpec>,
}

impl ParserConfig {
    /// Creates a configuration that retains every field as text.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter that determines which fields are retained.
    pub fn filter(mut self, filter: FieldFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the extraction and coercion used for fields without an entry in
    /// the type table.
    pub fn default_spec(mut self, extraction: Extraction, coercion: Coercion) -> Self {
        self.default_spec = FieldSpec::new(extraction, coercion);
        self
    }

    /// Adds an entry to the type table.
    pub fn field(
        mut self,
        name: impl Into<String>,
        extraction: Extraction,
        coercion: Coercion,
    ) -> Self {
        self.fields
            .insert(name.into(), FieldSpec::new(extraction, coercion));
        self
    }

    /// Gets the extraction and coercion for a field by name.
    pub fn spec_for(&self, name: &str) -> FieldSpec {
        self.fields.get(name).copied().unwrap_or(self.default_spec)
    }
}

//=========//
// Parsing //
//=========//

/// Filters, normalizes and coerces a set of already split `(name, value)`
/// pairs. Later duplicates of a name overwrite earlier ones.
pub fn parse_pairs<I, K, V>(pairs: I, config: &ParserConfig) -> FieldRecord
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut record = FieldRecord::new();

    for (name, raw) in pairs {
        let name = name.as_ref().trim();
        let raw = raw.as_ref();

        if !config.filter.retains(name) {
            continue;
        }

        let spec = config.spec_for(name);
        let normalized = match normalize(raw, spec.extraction) {
            Some(n) => n,
            None => {
                debug!(
                    "Could not extract a value for field `{}` from `{}`. Skipping.",
                    name,
                    raw.trim()
                );
                continue;
            }
        };

        match coerce(&normalized, spec.coercion) {
            Some(value) => {
                record.insert(name.to_string(), value);
            }
            None => debug!(
                "Could not coerce field `{}` value `{}` to {:?}. Skipping.",
                name, normalized, spec.coercion
            ),
        }
    }

    record
}

/// Splits a delimited report into `(name, value)` pairs. The first delimiter
/// on a line separates the name from the value; any further delimiters are
/// retained in the value.
pub fn split_pairs<R>(reader: R, delimiter: Delimiter) -> Result<Vec<(String, String)>, ParseError>
where
    R: Read,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter.as_byte())
        .from_reader(reader);

    let mut pairs = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let row = result?;

        if row.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        if row.len() < 2 {
            let line = row
                .position()
                .map(|p| p.line())
                .unwrap_or(i as u64 + 1);
            return Err(ParseError::MissingDelimiter {
                line,
                delimiter: delimiter.as_char(),
            });
        }

        let name = row[0].to_string();
        let value = row.iter().skip(1).join(&delimiter.as_char().to_string());
        pairs.push((name, value));
    }

    Ok(pairs)
}

/// Parses a delimited report from a reader into a [`FieldRecord`].
pub fn parse_reader<R>(
    reader: R,
    delimiter: Delimiter,
    config: &ParserConfig,
) -> Result<FieldRecord, ParseError>
where
    R: Read,
{
    let pairs = split_pairs(reader, delimiter)?;
    Ok(parse_pairs(pairs, config))
}

/// Parses a delimited report, given as a sequence of lines, into a
/// [`FieldRecord`].
pub fn parse_lines<I, S>(
    lines: I,
    delimiter: Delimiter,
    config: &ParserConfig,
) -> Result<FieldRecord, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let text = lines.into_iter().map(|l| l.as_ref().to_string()).join("\n");
    parse_reader(text.as_bytes(), delimiter, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bc_config() -> ParserConfig {
        ParserConfig::new()
            .filter(FieldFilter::allow([
                "Raw Reads",
                "Valid Reads",
                "Q30 of Barcodes",
            ]))
            .default_spec(Extraction::PreferParenthesis, Coercion::Float)
            .field("Raw Reads", Extraction::Whole, Coercion::Integer)
    }

    #[test]
    fn test_normalize_extractions() {
        let raw = " 1,234 (95.2%) ";
        assert_eq!(
            normalize(raw, Extraction::Whole),
            Some(String::from("1234 (95.2%)"))
        );
        assert_eq!(
            normalize(raw, Extraction::BeforeParenthesis),
            Some(String::from("1234"))
        );
        assert_eq!(
            normalize(raw, Extraction::InsideParenthesis),
            Some(String::from("95.2"))
        );
        assert_eq!(
            normalize(raw, Extraction::PreferParenthesis),
            Some(String::from("95.2"))
        );
        assert_eq!(
            normalize("95.2% (1234567)", Extraction::InsideParenthesis),
            Some(String::from("1234567"))
        );
        assert_eq!(
            normalize("97.5%", Extraction::PreferParenthesis),
            Some(String::from("97.5"))
        );
        assert_eq!(normalize("97.5%", Extraction::InsideParenthesis), None);
        assert_eq!(normalize("   ", Extraction::Whole), None);
        assert_eq!(normalize("12.5 %", Extraction::Whole), Some(String::from("12.5")));
    }

    #[test]
    fn test_whole_value_with_parenthetical_is_skipped() {
        let config = ParserConfig::new()
            .default_spec(Extraction::Whole, Coercion::Float)
            .field("Reads", Extraction::BeforeParenthesis, Coercion::Integer);

        let record = parse_lines(
            ["Valid: 1,234 (95.2%)", "Saturation: 61.5%", "Reads: 95.2% (1,234)"],
            Delimiter::Colon,
            &config,
        )
        .unwrap();

        assert!(!record.contains_key("Valid"));
        assert_eq!(record["Saturation"], FieldValue::Float(61.5));
        assert_eq!(record["Reads"], FieldValue::Int(95));
    }

    #[test]
    fn test_coerce() {
        assert_eq!(coerce("1234", Coercion::Integer), Some(FieldValue::Int(1234)));
        assert_eq!(coerce("12.9", Coercion::Integer), Some(FieldValue::Int(12)));
        assert_eq!(coerce("0.5", Coercion::Float), Some(FieldValue::Float(0.5)));
        assert_eq!(coerce("abc", Coercion::Integer), None);
        assert_eq!(coerce("abc", Coercion::Float), None);
        assert_eq!(coerce("NaN", Coercion::Float), None);
        assert_eq!(
            coerce("abc", Coercion::Text),
            Some(FieldValue::Text(String::from("abc")))
        );
    }

    #[test]
    fn test_allow_list_retains_only_named_fields_with_declared_types() {
        let lines = [
            "Raw Reads: 1,500,000",
            "Valid Reads: 1,234,567 (82.30%)",
            "Q30 of Barcodes: 94.12%",
            "Q30 of UMIs: 93.00%",
        ];
        let record = parse_lines(lines, Delimiter::Colon, &bc_config()).unwrap();

        assert_eq!(
            record.keys().collect::<Vec<_>>(),
            vec!["Raw Reads", "Valid Reads", "Q30 of Barcodes"]
        );
        assert_eq!(record["Raw Reads"], FieldValue::Int(1_500_000));
        assert_eq!(record["Valid Reads"], FieldValue::Float(82.30));
        assert_eq!(record["Q30 of Barcodes"], FieldValue::Float(94.12));
    }

    #[test]
    fn test_deny_list_passes_other_fields_through() {
        let config = ParserConfig::new()
            .filter(FieldFilter::Deny(vec![
                FieldMatcher::contains("valid"),
                FieldMatcher::exact("total"),
            ]))
            .default_spec(Extraction::Whole, Coercion::Integer);
        let record = parse_lines(
            ["total,100", "full_length,60", "valid_reads,80", "fragment,40"],
            Delimiter::Comma,
            &config,
        )
        .unwrap();

        assert_eq!(record.len(), 2);
        assert_eq!(record["full_length"], FieldValue::Int(60));
        assert_eq!(record["fragment"], FieldValue::Int(40));
    }

    #[test]
    fn test_first_delimiter_wins() {
        let config = ParserConfig::new();
        let record = parse_lines(["Started: 12:30:01"], Delimiter::Colon, &config).unwrap();
        assert_eq!(
            record["Started"],
            FieldValue::Text(String::from("12:30:01"))
        );

        let record = parse_lines(
            ["Estimated Number of Cells,1,234", "Mean Reads per Cell,\"5,678\""],
            Delimiter::Comma,
            &ParserConfig::new().default_spec(Extraction::Whole, Coercion::Integer),
        )
        .unwrap();
        assert_eq!(record["Estimated Number of Cells"], FieldValue::Int(1234));
        assert_eq!(record["Mean Reads per Cell"], FieldValue::Int(5678));
    }

    #[test]
    fn test_coercion_failure_skips_only_that_field() {
        let record = parse_lines(
            ["Raw Reads: not available", "Valid Reads: 10 (50.0%)"],
            Delimiter::Colon,
            &bc_config(),
        )
        .unwrap();
        assert!(!record.contains_key("Raw Reads"));
        assert_eq!(record["Valid Reads"], FieldValue::Float(50.0));
    }

    #[test]
    fn test_missing_delimiter_is_a_structural_failure() {
        let result = parse_lines(
            ["Raw Reads: 100", "this line has no delimiter"],
            Delimiter::Colon,
            &bc_config(),
        );
        match result {
            Err(ParseError::MissingDelimiter { line, delimiter }) => {
                assert_eq!(line, 2);
                assert_eq!(delimiter, ':');
            }
            other => panic!("expected a missing delimiter error, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let record =
            parse_lines(["Raw Reads: 100", "", "   "], Delimiter::Colon, &bc_config()).unwrap();
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let lines = ["Raw Reads: 1,000", "Valid Reads: 900 (90%)"];
        let first = parse_lines(lines, Delimiter::Colon, &bc_config()).unwrap();
        let second = parse_lines(lines, Delimiter::Colon, &bc_config()).unwrap();
        assert_eq!(first, second);
    }
}
