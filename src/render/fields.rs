//! Declarative metadata describing how a field is shown in tables.

use serde::Serialize;

use crate::parse::FieldValue;
use crate::utils::display::CountFormat;

/// How a numeric value is formatted for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    /// Truncated to an integer and shown with thousands separators.
    Integer,

    /// Already a percentage; shown with two decimals and a `%` suffix.
    Percentage,

    /// A fraction in `[0, 1]`; multiplied by 100 and shown as a percentage.
    Fraction,

    /// Shown with two decimals.
    Float,
}

/// Metadata for a single general statistics column.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldMeta {
    /// Column title.
    pub title: &'static str,

    /// Longer description of the column.
    pub description: &'static str,

    /// How values are formatted.
    pub format: FormatKind,

    /// Minimum of the value range, if bounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Maximum of the value range, if bounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Name of the color scale used to shade the column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<&'static str>,
}

impl FieldMeta {
    /// Creates a new [`FieldMeta`] without range or scale.
    pub fn new(title: &'static str, description: &'static str, format: FormatKind) -> Self {
        FieldMeta {
            title,
            description,
            format,
            min: None,
            max: None,
            scale: None,
        }
    }

    /// Sets the value range.
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Sets the color scale.
    pub fn scale(mut self, scale: &'static str) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Formats a value for display.
    pub fn format_value(&self, value: &FieldValue) -> String {
        let v = match value.as_f64() {
            Some(v) => v,
            None => return value.to_string(),
        };

        match self.format {
            FormatKind::Integer => CountFormat(v.trunc() as i64).to_string(),
            FormatKind::Percentage => format!("{:.2}%", v),
            FormatKind::Fraction => format!("{:.2}%", v * 100.0),
            FormatKind::Float => format!("{:.2}", v),
        }
    }

    /// Describes the value range for legends, e.g. `0 - 100`.
    pub fn range_label(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("{} - {}", min, max),
            (Some(min), None) => format!(">= {}", min),
            (None, Some(max)) => format!("<= {}", max),
            (None, None) => String::new(),
        }
    }
}
