//! Cell statistics from nanopore single-cell extraction runs.

use indexmap::IndexMap;
use tracing::info;

use crate::discovery::LogCategory;
use crate::modules::DataFile;
use crate::modules::GeneralStats;
use crate::modules::ModuleContext;
use crate::modules::ModuleOutcome;
use crate::modules::ModuleReport;
use crate::modules::ReportModule;
use crate::parse::parse_reader;
use crate::parse::Coercion;
use crate::parse::Delimiter;
use crate::parse::Extraction;
use crate::parse::ParserConfig;
use crate::render::fields::FieldMeta;
use crate::render::fields::FormatKind;

const ONTSTAT: LogCategory = LogCategory::new("ontstat", "*.ontstat.csv", ".ontstat");

/// Module for the `name,value` cell statistics summaries of nanopore runs.
pub struct OntStatModule;

fn headers() -> IndexMap<String, FieldMeta> {
    [
        (
            "Estimated Number of Cells",
            "The number of barcodes associated with at least one cell.",
            FormatKind::Integer,
        ),
        (
            "Mean Reads per Cell",
            "The total number of sequenced reads divided by the number of barcodes \
            associated with cell-containing partitions.",
            FormatKind::Integer,
        ),
        (
            "Median Genes per Cell",
            "The median number of genes detected per cell-associated barcode. \
            Detection is defined as the presence of at least 1 UMI count.",
            FormatKind::Integer,
        ),
        (
            "% Valid Barcodes",
            "Fraction of reads with valid barcodes matching whitelist.",
            FormatKind::Fraction,
        ),
        (
            "% Reads in Cells",
            "Fraction of unique reads in cells",
            FormatKind::Fraction,
        ),
        ("Mean UMI per Cell", "Mean UMI per Cell", FormatKind::Integer),
    ]
    .into_iter()
    .map(|(name, description, format)| (name.to_string(), FieldMeta::new(name, description, format)))
    .collect()
}

fn config() -> ParserConfig {
    ParserConfig::new().default_spec(Extraction::Whole, Coercion::Float)
}

impl ReportModule for OntStatModule {
    fn name(&self) -> &'static str {
        "ONT_stat"
    }

    fn anchor(&self) -> &'static str {
        "ontstat"
    }

    fn info(&self) -> &'static str {
        "Cell calling statistics of nanopore single-cell runs."
    }

    fn categories(&self) -> &'static [LogCategory] {
        &[ONTSTAT]
    }

    fn run(&self, context: &ModuleContext<'_>) -> anyhow::Result<ModuleOutcome> {
        let config = config();
        let samples = context.collect_samples(&ONTSTAT, |_, reader| {
            Ok(Some(parse_reader(reader, Delimiter::Comma, &config)?))
        })?;

        if samples.is_empty() {
            return Ok(ModuleOutcome::NoSamplesFound);
        }

        info!("Found {} reports", samples.len());

        let mut report = ModuleReport::new(self);
        report.data_files.push(DataFile::new("ontstat", &samples)?);
        report.general_stats = Some(GeneralStats {
            samples,
            headers: headers(),
        });

        Ok(ModuleOutcome::Report(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::tests::expect_report;
    use crate::modules::tests::run_module;
    use crate::modules::tests::scan_fixtures;
    use crate::parse::FieldValue;

    #[test]
    fn test_ontstat() {
        let (_dir, files) = scan_fixtures(&[
            (
                "run1/a.ontstat.csv",
                "Estimated Number of Cells,\"5,012\"\n% Valid Barcodes,0.9312\nChemistry,3prime\n",
            ),
            ("run2/a.ontstat.csv", "Estimated Number of Cells,6000\n"),
            ("b.ontstat.csv", "a line without a delimiter\n"),
        ]);

        let report = expect_report(run_module(&OntStatModule, &files));
        let stats = report.general_stats.unwrap();

        // Both files for `a` were parsed; the second overwrote the first.
        assert_eq!(stats.samples.len(), 1);
        let a = stats.samples.get("a").unwrap();
        assert_eq!(a["Estimated Number of Cells"], FieldValue::Float(6000.0));
        assert!(!a.contains_key("Chemistry"));
        assert_eq!(stats.headers.len(), 6);
    }
}
