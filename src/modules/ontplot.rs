//! Read splitting proportions from nanopore sequence extraction.

use tracing::debug;
use tracing::info;

use crate::discovery::LogCategory;
use crate::modules::DataFile;
use crate::modules::ModuleContext;
use crate::modules::ModuleOutcome;
use crate::modules::ModuleReport;
use crate::modules::ReportModule;
use crate::modules::Section;
use crate::parse::parse_reader;
use crate::parse::Coercion;
use crate::parse::Delimiter;
use crate::parse::Extraction;
use crate::parse::FieldFilter;
use crate::parse::FieldMatcher;
use crate::parse::ParserConfig;
use crate::render::chart::bar_chart;
use crate::render::chart::BarCategory;
use crate::render::chart::BarConfig;

const PLOT: LogCategory = LogCategory::new("ontplot/plot", "*.Summary.csv", ".Summary");

/// Module for the `.Summary.csv` read splitting summaries of nanopore runs.
pub struct OntPlotModule;

fn config() -> ParserConfig {
    ParserConfig::new()
        .filter(FieldFilter::Deny(vec![
            FieldMatcher::contains("valid"),
            FieldMatcher::contains("frac"),
            FieldMatcher::exact("total"),
        ]))
        .default_spec(Extraction::Whole, Coercion::Integer)
}

impl ReportModule for OntPlotModule {
    fn name(&self) -> &'static str {
        "ONT extract"
    }

    fn anchor(&self) -> &'static str {
        "ontplot"
    }

    fn info(&self) -> &'static str {
        "Statistical chart of ONT sequence splitting."
    }

    fn categories(&self) -> &'static [LogCategory] {
        &[PLOT]
    }

    fn run(&self, context: &ModuleContext<'_>) -> anyhow::Result<ModuleOutcome> {
        let config = config();
        let samples = context.collect_samples(&PLOT, |file, reader| {
            let record = parse_reader(reader, Delimiter::Comma, &config)?;

            if record.len() > 1 {
                Ok(Some(record))
            } else {
                debug!(
                    "Too few split categories in {}. Skipping.",
                    file.path.display()
                );
                Ok(None)
            }
        })?;

        if samples.is_empty() {
            return Ok(ModuleOutcome::NoSamplesFound);
        }

        info!("Found {} reports", samples.len());

        let categories = BarCategory::from_fields(samples.field_names());
        let plot = bar_chart(
            &samples,
            &categories,
            BarConfig {
                title: "Split sequence proportion",
                ylab: "# Reads",
            },
        );

        let mut report = ModuleReport::new(self);
        report.data_files.push(DataFile::new("ontPlot", &samples)?);
        report.sections.push(Section {
            name: String::from("Split sequence proportion"),
            anchor: String::from("ont_extract_plot"),
            description: None,
            helptext: None,
            plot: plot.into(),
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

    #[test]
    fn test_ontplot_drops_totals_and_fractions() {
        let (_dir, files) = scan_fixtures(&[
            (
                "a.Summary.csv",
                "total,1000\nfull_length,600\nvalid_reads,900\nfrac_full,0.6\nfragment,300\n",
            ),
            ("b.Summary.csv", "total,10\nfull_length,6\n"),
        ]);

        let report = expect_report(run_module(&OntPlotModule, &files));
        let data = &report.data_files[0].data;

        assert_eq!(data["a"], serde_json::json!({"full_length": 600, "fragment": 300}));
        // `b` only has a single category left, so it is not plotted.
        assert!(data.get("b").is_none());
        assert_eq!(report.sections.len(), 1);
    }
}
