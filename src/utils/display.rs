//! Utilities related to displaying numbers in tables and chart labels.

use std::fmt;

use num_format::Locale;
use num_format::ToFormattedString;

/// Utility struct for displaying percentages. The first item in the struct is
/// the numerator and the second item in the struct is the denominator.
pub struct PercentageFormat(pub u64, pub u64);

impl fmt::Display for PercentageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.1 == 0 {
            f.write_str("N/A")
        } else {
            let (a, b) = (self.0 as f64, self.1 as f64);
            write!(f, "{:.0}%", a / b * 100.0)
        }
    }
}

/// Utility struct for displaying counts with thousands separators.
pub struct CountFormat(pub i64);

impl fmt::Display for CountFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_formatted_string(&Locale::en))
    }
}
