//! STARsolo summary and feature assignment statistics.

use indexmap::IndexMap;
use tracing::info;

use crate::discovery::LogCategory;
use crate::modules::DataFile;
use crate::modules::GeneralStats;
use crate::modules::ModuleContext;
use crate::modules::ModuleOutcome;
use crate::modules::ModuleReport;
use crate::modules::ReportModule;
use crate::modules::Section;
use crate::parse::json::parse_object;
use crate::parse::Coercion;
use crate::parse::Extraction;
use crate::parse::FieldFilter;
use crate::parse::ParserConfig;
use crate::render::chart::bar_chart;
use crate::render::chart::BarCategory;
use crate::render::chart::BarConfig;
use crate::render::fields::FieldMeta;
use crate::render::fields::FormatKind;

const SUMMARY: LogCategory = LogCategory::new("starsolo/summary", "*.summary.json", ".summary");
const READ_STATS: LogCategory =
    LogCategory::new("starsolo/read_stats", "*.read_stats.json", ".read_stats");

/// Module for STARsolo (https://github.com/alexdobin/STAR) single-cell output.
pub struct StarsoloModule;

fn summary_headers() -> IndexMap<String, FieldMeta> {
    let percent = |title, description| {
        FieldMeta::new(title, description, FormatKind::Fraction).range(0.0, 100.0)
    };

    IndexMap::from([
        (
            String::from("Reads With Valid Barcodes"),
            percent(
                "% Valid Barcodes",
                "Fraction of reads with valid barcodes matching whitelist",
            ),
        ),
        (
            String::from("Estimated Number of Cells"),
            FieldMeta::new("N Cells", "Estimated number of cells", FormatKind::Integer),
        ),
        (
            String::from("Fraction of Unique Reads in Cells"),
            percent("% Reads in Cells", "Fraction of unique reads in cells"),
        ),
        (
            String::from("Median GeneFull_Ex50pAS per Cell"),
            FieldMeta::new("Median Genes", "Median genes per cell", FormatKind::Integer),
        ),
        (
            String::from("Mean Reads per Cell"),
            FieldMeta::new("Mean Reads", "Mean Reads per Cell", FormatKind::Integer),
        ),
        (
            String::from("Mean UMI per Cell"),
            FieldMeta::new("Mean UMI", "Mean UMI per Cell", FormatKind::Integer),
        ),
        (
            String::from("Sequencing Saturation"),
            percent("Saturation", "Sequencing Saturation"),
        ),
    ])
}

fn assign_categories() -> Vec<BarCategory> {
    vec![
        BarCategory::new("exonic", "Mapped reads assigned to exonic regions").color("#437bb1"),
        BarCategory::new("intronic", "Mapped reads assigned to intronic regions")
            .color("#7cb5ec"),
        BarCategory::new("intergenic", "Mapped reads assigned to intergenic regions")
            .color("#e63491"),
        BarCategory::new("antisense", "Mapped reads assigned antisense to gene").color("#f7a35c"),
    ]
}

fn summary_config() -> ParserConfig {
    ParserConfig::new().default_spec(Extraction::Whole, Coercion::Float)
}

fn read_stats_config() -> ParserConfig {
    ParserConfig::new()
        .filter(FieldFilter::allow([
            "exonic",
            "intronic",
            "intergenic",
            "antisense",
        ]))
        .default_spec(Extraction::Whole, Coercion::Integer)
}

impl ReportModule for StarsoloModule {
    fn name(&self) -> &'static str {
        "STARSolo"
    }

    fn anchor(&self) -> &'static str {
        "starsolo"
    }

    fn info(&self) -> &'static str {
        "Cell calling and feature assignment statistics from STARsolo."
    }

    fn categories(&self) -> &'static [LogCategory] {
        &[SUMMARY, READ_STATS]
    }

    fn run(&self, context: &ModuleContext<'_>) -> anyhow::Result<ModuleOutcome> {
        let summary_config = summary_config();
        let summary = context.collect_samples(&SUMMARY, |_, reader| {
            Ok(Some(parse_object(reader, &summary_config)?))
        })?;
        info!("Found {} starsolo summary reports", summary.len());

        let read_stats_config = read_stats_config();
        let read_stats = context.collect_samples(&READ_STATS, |_, reader| {
            Ok(Some(parse_object(reader, &read_stats_config)?))
        })?;
        info!("Found {} starsolo read_stats reports", read_stats.len());

        if summary.is_empty() && read_stats.is_empty() {
            return Ok(ModuleOutcome::NoSamplesFound);
        }

        let mut report = ModuleReport::new(self);
        report
            .data_files
            .push(DataFile::new("starsolo_summary", &summary)?);
        report
            .data_files
            .push(DataFile::new("starsolo_read_stats", &read_stats)?);

        if !summary.is_empty() {
            report.general_stats = Some(GeneralStats {
                samples: summary,
                headers: summary_headers(),
            });
        }

        if !read_stats.is_empty() {
            let plot = bar_chart(
                &read_stats,
                &assign_categories(),
                BarConfig {
                    title: "STARSolo: Assign",
                    ylab: "# Reads",
                },
            );

            report.sections.push(Section {
                name: String::from("Read Counts Assigned to Features"),
                anchor: String::from("starsolo_assign"),
                description: None,
                helptext: None,
                plot: plot.into(),
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

    const SUMMARY_JSON: &str = r#"{
        "Number of Reads": 120000000,
        "Reads With Valid Barcodes": 0.962,
        "Estimated Number of Cells": 4021,
        "Fraction of Unique Reads in Cells": 0.81,
        "Mean Reads per Cell": 29843.6,
        "Sequencing Saturation": 0.54
    }"#;

    #[test]
    fn test_summary_and_read_stats() {
        let (_dir, files) = scan_fixtures(&[
            ("pbmc.summary.json", SUMMARY_JSON),
            (
                "pbmc.read_stats.json",
                r#"{"exonic": 1000, "intronic": 300, "intergenic": 50, "antisense": 20, "noFeature": 7}"#,
            ),
            ("broken.summary.json", "{not json"),
        ]);

        let report = expect_report(run_module(&StarsoloModule, &files));
        assert_eq!(report.anchor, "starsolo");
        assert_eq!(report.data_files.len(), 2);
        assert_eq!(report.sections.len(), 1);
        assert_eq!(report.sections[0].anchor, "starsolo_assign");

        let stats = report.general_stats.unwrap();
        assert_eq!(stats.samples.len(), 1);
        let pbmc = stats.samples.get("pbmc").unwrap();
        assert_eq!(pbmc["Reads With Valid Barcodes"], FieldValue::Float(0.962));
        assert_eq!(pbmc["Estimated Number of Cells"], FieldValue::Float(4021.0));

        let read_stats = &report.data_files[1].data["pbmc"];
        assert_eq!(read_stats["exonic"], 1000);
        assert!(read_stats.get("noFeature").is_none());
    }

    #[test]
    fn test_read_stats_only() {
        let (_dir, files) = scan_fixtures(&[(
            "s1.read_stats.json",
            r#"{"exonic": 10, "intronic": 3}"#,
        )]);

        let report = expect_report(run_module(&StarsoloModule, &files));
        assert!(report.general_stats.is_none());
        assert_eq!(report.sections.len(), 1);
    }
}
