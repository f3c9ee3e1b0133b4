//! The sample registry: parsed results keyed by sample name.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::parse::FieldRecord;
use crate::utils::glob::Glob;

//=============//
// Ignore list //
//=============//

/// A set of wildcard patterns for sample names that should be dropped from all
/// results.
#[derive(Clone, Debug, Default)]
pub struct IgnoreList {
    patterns: Vec<Glob>,
}

impl IgnoreList {
    /// Compiles an ignore list from wildcard patterns.
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Glob::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(IgnoreList { patterns })
    }

    /// Whether a sample name matches any of the patterns.
    pub fn is_ignored(&self, sample_name: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(sample_name))
    }

    /// Whether the ignore list has no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

//=================//
// Sample registry //
//=================//

/// Results for every sample of one kind of report, in insertion order.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SampleRegistry<T> {
    samples: IndexMap<String, T>,
}

impl<T> Default for SampleRegistry<T> {
    fn default() -> Self {
        SampleRegistry {
            samples: IndexMap::new(),
        }
    }
}

impl<T> SampleRegistry<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the results for a sample. If the sample already exists, the
    /// previous results are overwritten (and returned).
    pub fn insert(&mut self, sample_name: impl Into<String>, value: T) -> Option<T> {
        let sample_name = sample_name.into();

        if self.samples.contains_key(&sample_name) {
            warn!("Duplicate sample name found! Overwriting: {}", sample_name);
        }

        self.samples.insert(sample_name, value)
    }

    /// Gets the results for a sample.
    pub fn get(&self, sample_name: &str) -> Option<&T> {
        self.samples.get(sample_name)
    }

    /// The number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether there are no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterates over the sample names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.samples.keys().map(|k| k.as_str())
    }

    /// Iterates over `(sample name, results)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.samples.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Removes all samples matching the ignore list.
    pub fn ignore_samples(mut self, ignore: &IgnoreList) -> Self {
        if ignore.is_empty() {
            return self;
        }

        self.samples.retain(|name, _| {
            let ignored = ignore.is_ignored(name);
            if ignored {
                debug!("Ignoring sample: {}", name);
            }
            !ignored
        });

        self
    }
}

impl SampleRegistry<FieldRecord> {
    /// Merges the fields of a record into the existing record for a sample (or
    /// inserts it if the sample is not yet present). Fields already present are
    /// overwritten.
    pub fn merge(&mut self, sample_name: impl Into<String>, record: FieldRecord) {
        self.samples
            .entry(sample_name.into())
            .or_default()
            .extend(record);
    }

    /// The union of field names across all samples, in order of first
    /// appearance.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();

        for record in self.samples.values() {
            for name in record.keys() {
                if !names.contains(&name.as_str()) {
                    names.push(name.as_str());
                }
            }
        }

        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::FieldValue;

    fn record(pairs: &[(&str, i64)]) -> FieldRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), FieldValue::Int(*v)))
            .collect()
    }

    #[test]
    fn test_duplicate_sample_name_keeps_the_last_record() {
        let mut registry = SampleRegistry::new();
        assert!(registry.insert("sample1", record(&[("a", 1)])).is_none());
        let previous = registry.insert("sample1", record(&[("a", 2)]));

        assert_eq!(previous, Some(record(&[("a", 1)])));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("sample1"), Some(&record(&[("a", 2)])));
    }

    #[test]
    fn test_merge() {
        let mut registry: SampleRegistry<FieldRecord> = SampleRegistry::new();
        registry.merge("sample1", record(&[("a", 1), ("b", 2)]));
        registry.merge("sample1", record(&[("b", 3), ("c", 4)]));
        registry.merge("sample2", record(&[("d", 5)]));

        assert_eq!(
            registry.get("sample1"),
            Some(&record(&[("a", 1), ("b", 3), ("c", 4)]))
        );
        assert_eq!(registry.field_names(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_ignore_samples() {
        let mut registry = SampleRegistry::new();
        registry.insert("control_1", 1);
        registry.insert("tumor_1", 2);
        registry.insert("tumor_2", 3);

        let ignore = IgnoreList::new(["control*", "tumor_2"]).unwrap();
        let registry = registry.ignore_samples(&ignore);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["tumor_1"]);
    }
}
