//! Barcode extraction and adapter trimming statistics from single-cell tag
//! sequencing runs.

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
use crate::parse::FieldFilter;
use crate::parse::FieldRecord;
use crate::parse::ParserConfig;
use crate::registry::SampleRegistry;
use crate::render::fields::FieldMeta;
use crate::render::fields::FormatKind;

const BC: LogCategory = LogCategory::new("sctag_stat_table/bc", "*_bc_stat.txt", "_bc_stat");
const CUTADAPT: LogCategory = LogCategory::new(
    "sctag_stat_table/cutadapt",
    "*_cutadapt_stat.txt",
    "_cutadapt_stat",
);

/// Module for the `name: value` barcode and cutadapt statistics of tag runs.
pub struct SctagStatTableModule;

fn bc_config() -> ParserConfig {
    ParserConfig::new()
        .filter(FieldFilter::allow([
            "Raw Reads",
            "Valid Reads",
            "Q30 of Barcodes",
            "Q30 of UMIs",
        ]))
        .default_spec(Extraction::PreferParenthesis, Coercion::Float)
        .field("Raw Reads", Extraction::PreferParenthesis, Coercion::Integer)
}

fn cutadapt_config() -> ParserConfig {
    ParserConfig::new().default_spec(Extraction::InsideParenthesis, Coercion::Float)
}

fn headers() -> IndexMap<String, FieldMeta> {
    let percent = |title, description, scale| {
        FieldMeta::new(title, description, FormatKind::Percentage)
            .range(0.0, 100.0)
            .scale(scale)
    };

    IndexMap::from([
        (
            String::from("Raw Reads"),
            FieldMeta::new("Raw Reads", "Total reads from FASTQ files.", FormatKind::Integer),
        ),
        (
            String::from("Valid Reads"),
            percent(
                "% Valid Reads",
                "Reads pass filtering (filtered: reads without poly T, reads without \
                linker, reads without correct barcode or low quality reads).",
                "OrRd",
            ),
        ),
        (
            String::from("Q30 of Barcodes"),
            percent(
                "% Q30 of Barcodes",
                "Percent of barcode base pairs with quality scores over Q30.",
                "RdPu",
            ),
        ),
        (
            String::from("Q30 of UMIs"),
            percent(
                "% Q30 of UMIs",
                "Percent of UMI base pairs with quality scores over Q30.",
                "YlOrRd",
            ),
        ),
        (
            String::from("Reads with Adapters"),
            percent(
                "% Reads with Adapters",
                "Reads with sequencing adapters or reads two with poly A \
                (read-through adapters).",
                "YlOrRd-rev",
            ),
        ),
        (
            String::from("Reads Too Short"),
            percent(
                "% Reads Too Short",
                "Reads with read length less than 20bp after trimming.",
                "RdPu-rev",
            ),
        ),
        (
            String::from("Base Pairs Quality-Trimmed"),
            percent(
                "% Base Pairs Quality-Trimmed",
                "Bases pairs removed from the end of the read whose quality is \
                smaller than the given threshold.",
                "OrRd-rev",
            ),
        ),
    ])
}

impl ReportModule for SctagStatTableModule {
    fn name(&self) -> &'static str {
        "Stat"
    }

    fn anchor(&self) -> &'static str {
        "sctag_stat_table"
    }

    fn info(&self) -> &'static str {
        "Barcode extraction and adapter trimming statistics of tag runs."
    }

    fn categories(&self) -> &'static [LogCategory] {
        &[BC, CUTADAPT]
    }

    fn run(&self, context: &ModuleContext<'_>) -> anyhow::Result<ModuleOutcome> {
        let bc_config = bc_config();
        let bc = context.collect_samples(&BC, |_, reader| {
            Ok(Some(parse_reader(reader, Delimiter::Colon, &bc_config)?))
        })?;

        let cutadapt_config = cutadapt_config();
        let cutadapt = context.collect_samples(&CUTADAPT, |_, reader| {
            Ok(Some(parse_reader(reader, Delimiter::Colon, &cutadapt_config)?))
        })?;

        let num_reports = bc.len() + cutadapt.len();

        // Both reports describe the same sample, so their fields are combined.
        let mut samples: SampleRegistry<FieldRecord> = SampleRegistry::new();
        for registry in [bc, cutadapt] {
            for (sample, record) in registry.iter() {
                samples.merge(sample, record.clone());
            }
        }

        if samples.is_empty() {
            return Ok(ModuleOutcome::NoSamplesFound);
        }

        info!("Found {} reports", num_reports);

        let mut report = ModuleReport::new(self);
        report
            .data_files
            .push(DataFile::new("bc_cutadapt", &samples)?);
        report.general_stats = Some(GeneralStats {
            samples,
            headers: headers(),
        });

        Ok(ModuleOutcome::Report(report))
    }
}
