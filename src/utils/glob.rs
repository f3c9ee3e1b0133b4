//! Shell-style wildcard patterns used for matching file and sample names.
//!
//! Only two wildcards are supported: `*` matches any run of characters
//! (including none) and `?` matches exactly one character. Every other
//! character matches itself. Patterns always match the whole name.
//!
//! ```
//! use scqc::utils::glob::Glob;
//!
//! let glob = Glob::new("*.bcrank.csv").unwrap();
//! assert!(glob.is_match("sample1.bcrank.csv"));
//! assert!(!glob.is_match("sample1.bcrank.csv.bak"));
//! ```

use std::fmt;

use regex::Regex;

/// A compiled wildcard pattern.
#[derive(Clone, Debug)]
pub struct Glob {
    pattern: String,
    regex: Regex,
}

impl Glob {
    /// Compiles a wildcard pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let mut expression = String::from("^");

        for c in pattern.chars() {
            match c {
                '*' => expression.push_str(".*"),
                '?' => expression.push('.'),
                c => expression.push_str(&regex::escape(&c.to_string())),
            }
        }

        expression.push('$');

        Ok(Glob {
            pattern: pattern.to_string(),
            regex: Regex::new(&expression)?,
        })
    }

    /// Whether the pattern matches the entire name.
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// The original pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl fmt::Display for Glob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}
