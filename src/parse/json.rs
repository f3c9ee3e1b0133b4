//! Parsing of flat JSON summaries through the same filter, extraction and
//! coercion pipeline as delimited reports.

use std::io::Read;

use serde_json::Value;
use tracing::debug;

use super::parse_pairs;
use super::FieldRecord;
use super::ParseError;
use super::ParserConfig;

/// Parses a JSON object of `name: value` entries into a [`FieldRecord`].
///
/// The top level value must be an object. Entries holding numbers or strings
/// are normalized and coerced per `config`; any other entry is skipped.
pub fn parse_object<R>(reader: R, config: &ParserConfig) -> Result<FieldRecord, ParseError>
where
    R: Read,
{
    let value: Value = serde_json::from_reader(reader)?;

    let object = match value {
        Value::Object(o) => o,
        _ => return Err(ParseError::NotAnObject),
    };

    let pairs = object
        .into_iter()
        .filter_map(|(name, value)| match scalar_text(&value) {
            Some(text) => Some((name, text)),
            None => {
                debug!("Field `{}` does not hold a scalar value. Skipping.", name);
                None
            }
        });

    Ok(parse_pairs(pairs, config))
}

/// Renders a JSON number or string as text.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Coercion;
    use crate::parse::Extraction;
    use crate::parse::FieldFilter;
    use crate::parse::FieldValue;

    #[test]
    fn test_parse_object() {
        let json = r#"{
            "Estimated Number of Cells": 4021,
            "Sequencing Saturation": "0.61",
            "Mean Reads per Cell": 52310.7,
            "nested": {"a": 1},
            "ignored": 1
        }"#;
        let config = ParserConfig::new()
            .filter(FieldFilter::deny(["ignored"]))
            .default_spec(Extraction::Whole, Coercion::Float)
            .field("Estimated Number of Cells", Extraction::Whole, Coercion::Integer)
            .field("Mean Reads per Cell", Extraction::Whole, Coercion::Integer);

        let record = parse_object(json.as_bytes(), &config).unwrap();
        assert_eq!(record.len(), 3);
        assert_eq!(record["Estimated Number of Cells"], FieldValue::Int(4021));
        assert_eq!(record["Sequencing Saturation"], FieldValue::Float(0.61));
        assert_eq!(record["Mean Reads per Cell"], FieldValue::Int(52310));
    }

    #[test]
    fn test_non_object_is_a_structural_failure() {
        let result = parse_object("[1, 2, 3]".as_bytes(), &ParserConfig::new());
        assert!(matches!(result, Err(ParseError::NotAnObject)));

        let result = parse_object("{\"truncated\": ".as_bytes(), &ParserConfig::new());
        assert!(matches!(result, Err(ParseError::Json(_))));
    }
}
