//! Tag mapping and cell assignment charts from single-cell tag sequencing runs.

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
use crate::parse::FieldRecord;
use crate::parse::ParserConfig;
use crate::registry::SampleRegistry;
use crate::render::chart::bar_chart;
use crate::render::chart::BarCategory;
use crate::render::chart::BarConfig;

const MAP: LogCategory = LogCategory::new("sctag_stat_plot/map", "*_map_stat.txt", "_map_stat");
const COUNT: LogCategory =
    LogCategory::new("sctag_stat_plot/count", "*_count_stat.txt", "_count_stat");

/// Summary values of the count report that are not part of the cell chart.
const COUNT_SUMMARY_FIELDS: [&str; 4] = [
    "Number of Matched Cells",
    "Mapped Reads in Cells",
    "Median UMI per Cell",
    "Mean UMI per Cell",
];

const MAP_HELPTEXT: &str = "Reads Mapped : R2 reads that successfully mapped to linker and \
    tag-barcode.\n\
    Reads Unmapped Invalid Linker : Unmapped R2 reads because of too many mismatches in \
    linker sequence.\n\
    Reads Unmapped Invalid Barcode : Unmapped R2 reads because of too many mismatches in \
    tag-barcode sequence.";

/// Module for the `name: value` tag mapping and cell count reports of tag runs.
pub struct SctagStatPlotModule;

/// One chart produced by this module.
struct Step {
    category: LogCategory,
    tag: &'static str,
    filter: fn() -> FieldFilter,
    section: &'static str,
    helptext: Option<&'static str>,
    chart: BarConfig,
}

fn map_filter() -> FieldFilter {
    FieldFilter::All
}

fn count_filter() -> FieldFilter {
    FieldFilter::deny(COUNT_SUMMARY_FIELDS)
}

static STEPS: [Step; 2] = [
    Step {
        category: MAP,
        tag: "map",
        filter: map_filter,
        section: "Mapping",
        helptext: Some(MAP_HELPTEXT),
        chart: BarConfig {
            title: "Mapping sequence proportion",
            ylab: "# Reads",
        },
    },
    Step {
        category: COUNT,
        tag: "count",
        filter: count_filter,
        section: "Cells",
        helptext: None,
        chart: BarConfig {
            title: "The proportion of tags in cells",
            ylab: "# Cells",
        },
    },
];

fn collect_step(
    context: &ModuleContext<'_>,
    step: &Step,
) -> anyhow::Result<SampleRegistry<FieldRecord>> {
    let config = ParserConfig::new()
        .filter((step.filter)())
        .default_spec(Extraction::BeforeParenthesis, Coercion::Integer);

    context.collect_samples(&step.category, |file, reader| {
        let record = parse_reader(reader, Delimiter::Colon, &config)?;

        if record.len() > 1 {
            Ok(Some(record))
        } else {
            debug!(
                "Too few {} values in {}. Skipping.",
                step.tag,
                file.path.display()
            );
            Ok(None)
        }
    })
}

impl ReportModule for SctagStatPlotModule {
    fn name(&self) -> &'static str {
        "Stat"
    }

    fn anchor(&self) -> &'static str {
        "sctag_stat_plot"
    }

    fn info(&self) -> &'static str {
        "Tag mapping and cell assignment charts of tag runs."
    }

    fn categories(&self) -> &'static [LogCategory] {
        &[MAP, COUNT]
    }

    fn run(&self, context: &ModuleContext<'_>) -> anyhow::Result<ModuleOutcome> {
        let mut results = Vec::new();
        for step in &STEPS {
            results.push((step, collect_step(context, step)?));
        }

        let num_reports: usize = results.iter().map(|(_, samples)| samples.len()).sum();
        if num_reports == 0 {
            return Ok(ModuleOutcome::NoSamplesFound);
        }

        info!("Found {} reports", num_reports);

        let mut report = ModuleReport::new(self);

        for (step, samples) in results {
            report.data_files.push(DataFile::new(step.tag, &samples)?);

            if samples.is_empty() {
                continue;
            }

            let categories = BarCategory::from_fields(samples.field_names());
            report.sections.push(Section {
                name: String::from(step.section),
                anchor: format!("sctag_{}", step.tag),
                description: None,
                helptext: step.helptext.map(String::from),
                plot: bar_chart(&samples, &categories, step.chart).into(),
            });
        }

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

    const MAP_STAT: &str = "Reads Mapped: 1,000,000 (80.00%)
Reads Unmapped Invalid Linker: 150,000 (12.00%)
Reads Unmapped Invalid Barcode: 100,000 (8.00%)
";

    const COUNT_STAT: &str = "Number of Matched Cells: 3,000
Mapped Reads in Cells: 900,000 (90.00%)
Median UMI per Cell: 120
Mean UMI per Cell: 150
Cells with Tag 1: 1,500 (50.00%)
Cells with Tag 2: 1,200 (40.00%)
Cells without Tag: 300 (10.00%)
";

    #[test]
    fn test_map_and_count() {
        let (_dir, files) = scan_fixtures(&[
            ("t1_map_stat.txt", MAP_STAT),
            ("t1_count_stat.txt", COUNT_STAT),
            ("t2_count_stat.txt", "Number of Matched Cells: 10\nCells with Tag 1: 4\n"),
        ]);

        let report = expect_report(run_module(&SctagStatPlotModule, &files));
        assert_eq!(report.sections.len(), 2);
        assert_eq!(report.sections[0].name, "Mapping");
        assert!(report.sections[0].helptext.is_some());
        assert_eq!(report.sections[1].anchor, "sctag_count");

        let map = &report.data_files[0];
        assert_eq!(map.tag, "map");
        assert_eq!(map.data["t1"]["Reads Mapped"], 1_000_000);

        let count = &report.data_files[1];
        let t1 = count.data["t1"].as_object().unwrap();
        assert_eq!(t1.len(), 3);
        assert_eq!(t1["Cells with Tag 2"], 1200);

        // Only one chartable value remains for `t2`.
        assert!(count.data.get("t2").is_none());
    }

    #[test]
    fn test_map_only() {
        let (_dir, files) = scan_fixtures(&[("t1_map_stat.txt", MAP_STAT)]);
        let report = expect_report(run_module(&SctagStatPlotModule, &files));
        assert_eq!(report.sections.len(), 1);
        assert_eq!(report.data_files.len(), 2);

        let config = ParserConfig::new()
            .default_spec(Extraction::BeforeParenthesis, Coercion::Integer);
        let record = parse_reader(MAP_STAT.as_bytes(), Delimiter::Colon, &config).unwrap();
        assert_eq!(record["Reads Unmapped Invalid Barcode"], FieldValue::Int(100_000));
    }
}
