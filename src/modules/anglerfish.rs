//! Adaptor alignment statistics from Anglerfish, a tool for checking
//! Illumina libraries sequenced on nanopore flowcells.
//!
//! Anglerfish has written two layouts of its JSON report over time. Both are
//! accepted and validated up front into an [`AnglerfishReport`]:
//!
//! * Current reports carry an `anglerfish_version`. `paf_stats` is a list of
//!   alignment groups and `sample_stats` a list of per-library objects, each
//!   naming its library in `sample_name`.
//! * Legacy reports key both `paf_stats` and `sample_stats` by group or
//!   library name.

use std::io::Read;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use tracing::info;

use crate::discovery::LogCategory;
use crate::modules::DataFile;
use crate::modules::ModuleContext;
use crate::modules::ModuleOutcome;
use crate::modules::ModuleReport;
use crate::modules::ReportModule;
use crate::modules::Section;
use crate::parse::coerce;
use crate::parse::json::scalar_text;
use crate::parse::Coercion;
use crate::parse::FieldRecord;
use crate::parse::FieldValue;
use crate::render::chart::bar_chart;
use crate::render::chart::BarCategory;
use crate::render::chart::BarConfig;

const ANGLERFISH: LogCategory =
    LogCategory::new("anglerfish", "*.anglerfish.json", ".anglerfish");

/// Paf statistics shown in the chart, with their legend names.
const PAF_CATEGORIES: [(&str, &str); 5] = [
    (
        "aligned reads matching both I7 and I5 adaptor",
        "Aligned reads matching both I7 and I5 adaptor",
    ),
    (
        "aligned reads matching multiple I7/I5 adaptor pairs",
        "Aligned reads matching multiple I7/I5 adaptor pairs",
    ),
    (
        "aligned reads matching only I7 or I5 adaptor",
        "Aligned reads matching only I7 or I5 adaptor",
    ),
    (
        "aligned reads with uncategorized alignments",
        "Aligned reads with uncategorized alignments",
    ),
    (
        "reads aligning to adaptor sequences",
        "Reads aligning to adaptor sequences",
    ),
];

/// Module for Anglerfish JSON reports.
pub struct AnglerfishModule;

/// A JSON object with its keys in file order.
type Object = IndexMap<String, Value>;

/// An Anglerfish report in one of its known layouts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AnglerfishReport {
    /// Reports written by versions that record their own version.
    Current {
        /// Version of Anglerfish that wrote the report.
        anglerfish_version: String,

        /// One object of `stat: [amount, percent]` entries per group.
        paf_stats: Vec<Object>,

        /// One object per library.
        sample_stats: Vec<Object>,
    },

    /// Reports written by older versions.
    Legacy {
        /// Objects of `stat: [amount, percent]` entries, keyed by group.
        paf_stats: IndexMap<String, Object>,

        /// Objects of library statistics, keyed by library name.
        sample_stats: IndexMap<String, Object>,
    },
}

impl AnglerfishReport {
    /// Reads and validates a report.
    pub fn from_reader<R>(reader: R) -> serde_json::Result<Self>
    where
        R: Read,
    {
        serde_json::from_reader(reader)
    }

    /// Flattens the report into a single record.
    ///
    /// Each paf statistic becomes `{stat}_amount_{group}` and
    /// `{stat}_percent_{group}`, and each numeric library statistic becomes
    /// `{stat}_{library}`. Malformed entries are skipped.
    pub fn into_record(self) -> FieldRecord {
        let mut record = FieldRecord::new();

        match self {
            AnglerfishReport::Current {
                anglerfish_version,
                paf_stats,
                sample_stats,
            } => {
                debug!("Anglerfish report written by version {}", anglerfish_version);

                for (group, stats) in paf_stats.iter().enumerate() {
                    add_paf_stats(&mut record, &group.to_string(), stats);
                }

                for stats in &sample_stats {
                    match stats.get("sample_name").and_then(Value::as_str) {
                        Some(library) => add_sample_stats(&mut record, library, stats),
                        None => debug!("Sample statistics without `sample_name`. Skipping."),
                    }
                }
            }
            AnglerfishReport::Legacy {
                paf_stats,
                sample_stats,
            } => {
                for (group, stats) in &paf_stats {
                    add_paf_stats(&mut record, group, stats);
                }

                for (library, stats) in &sample_stats {
                    add_sample_stats(&mut record, library, stats);
                }
            }
        }

        record
    }
}

fn add_paf_stats(record: &mut FieldRecord, group: &str, stats: &Object) {
    for (stat, value) in stats {
        let pair = match value.as_array().map(|a| a.as_slice()) {
            Some([amount, percent, ..]) => scalar_text(amount)
                .and_then(|a| coerce(&a, Coercion::Integer))
                .zip(scalar_text(percent).and_then(|p| coerce(&p, Coercion::Float))),
            _ => None,
        };

        match pair {
            Some((amount, percent)) => {
                record.insert(format!("{}_amount_{}", stat, group), amount);
                record.insert(format!("{}_percent_{}", stat, group), percent);
            }
            None => debug!(
                "Paf statistic `{}` of group {} is not an [amount, percent] pair. Skipping.",
                stat, group
            ),
        }
    }
}

fn add_sample_stats(record: &mut FieldRecord, library: &str, stats: &Object) {
    for (stat, value) in stats {
        if stat == "sample_name" {
            continue;
        }

        match numeric(value) {
            Some(v) => {
                record.insert(format!("{}_{}", stat, library), v);
            }
            None => debug!(
                "Statistic `{}` of library {} is not numeric. Skipping.",
                stat, library
            ),
        }
    }
}

fn numeric(value: &Value) -> Option<FieldValue> {
    let n = value.as_number()?;
    n.as_i64()
        .map(FieldValue::Int)
        .or_else(|| n.as_f64().map(FieldValue::Float))
}

impl ReportModule for AnglerfishModule {
    fn name(&self) -> &'static str {
        "anglerfish"
    }

    fn anchor(&self) -> &'static str {
        "anglerfish"
    }

    fn info(&self) -> &'static str {
        "Quality control of Illumina libraries sequenced on Oxford Nanopore."
    }

    fn categories(&self) -> &'static [LogCategory] {
        &[ANGLERFISH]
    }

    fn run(&self, context: &ModuleContext<'_>) -> anyhow::Result<ModuleOutcome> {
        let samples = context.collect_samples(&ANGLERFISH, |_, reader| {
            Ok(Some(AnglerfishReport::from_reader(reader)?.into_record()))
        })?;

        if samples.is_empty() {
            return Ok(ModuleOutcome::NoSamplesFound);
        }

        info!("Found {} reports", samples.len());

        let categories = PAF_CATEGORIES
            .iter()
            .map(|(stat, name)| BarCategory::new(format!("{}_amount_0", stat), *name))
            .collect::<Vec<_>>();
        let plot = bar_chart(
            &samples,
            &categories,
            BarConfig {
                title: "Anglerfish: Paf Statistics",
                ylab: "# Reads",
            },
        );

        let mut report = ModuleReport::new(self);
        report.data_files.push(DataFile::new("anglerfish", &samples)?);
        report.sections.push(Section {
            name: String::from("Paf Statistics"),
            anchor: String::from("anglerfish-paf-statistics"),
            description: Some(String::from("Paf Statistics of sampled reads.")),
            helptext: None,
            plot: plot.into(),
        });

        Ok(ModuleOutcome::Report(report))
    }
}
