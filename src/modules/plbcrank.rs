//! Barcode rank (knee) plots.

use serde::Serialize;
use tracing::info;

use crate::discovery::LogCategory;
use crate::modules::DataFile;
use crate::modules::ModuleContext;
use crate::modules::ModuleOutcome;
use crate::modules::ModuleReport;
use crate::modules::ReportModule;
use crate::modules::Section;
use crate::rank::read_rank_counts;
use crate::rank::reduce;
use crate::rank::RankCurve;
use crate::registry::SampleRegistry;
use crate::render::chart::rank_chart;

const BCRANK: LogCategory = LogCategory::new("plbcrank", "*.bcrank.csv", ".bcrank");

const DESCRIPTION: &str = "Barcode knee plot";

const HELPTEXT: &str = "The plot shows the count of filtered UMIs mapped to each \
    barcode. As barcodes are not determined to be cell-associated strictly based \
    on their UMI count, but instead are determined by their expression profiles, \
    some regions of the graph contain both cell-associated and \
    background-associated barcodes.";

/// Module for per-barcode UMI count tables.
pub struct BarcodeRankModule;

/// Summary of a sample's rank curve, as written to the data file.
#[derive(Debug, Serialize)]
pub struct RankSummary {
    /// Total number of barcodes.
    pub barcodes: usize,

    /// Number of barcodes above the knee threshold.
    pub cells: usize,

    /// The knee threshold.
    pub threshold: u64,
}

impl From<&RankCurve> for RankSummary {
    fn from(curve: &RankCurve) -> Self {
        RankSummary {
            barcodes: curve.barcodes(),
            cells: curve.split_index,
            threshold: curve.threshold,
        }
    }
}

impl ReportModule for BarcodeRankModule {
    fn name(&self) -> &'static str {
        "Barcode rank"
    }

    fn anchor(&self) -> &'static str {
        "plbcrank"
    }

    fn info(&self) -> &'static str {
        "Barcode rank plots split into cell-associated and background barcodes."
    }

    fn categories(&self) -> &'static [LogCategory] {
        &[BCRANK]
    }

    fn run(&self, context: &ModuleContext<'_>) -> anyhow::Result<ModuleOutcome> {
        let curves = context.collect_samples(&BCRANK, |_, reader| {
            let counts = read_rank_counts(reader)?;
            Ok(Some(reduce(&counts, context.knee)?))
        })?;

        if curves.is_empty() {
            return Ok(ModuleOutcome::NoSamplesFound);
        }

        info!("Found {} reports", curves.len());

        let mut summaries = SampleRegistry::new();
        let mut report = ModuleReport::new(self);

        for (sample, curve) in curves.iter() {
            summaries.insert(sample, RankSummary::from(curve));
            report.sections.push(Section {
                name: format!("Count - BC rank plot - {}", sample),
                anchor: format!("count-bcrank-plot-{}", sample),
                description: Some(String::from(DESCRIPTION)),
                helptext: Some(String::from(HELPTEXT)),
                plot: rank_chart(sample, curve).into(),
            });
        }

        report.data_files.push(DataFile::new("plbcrank", &summaries)?);
        Ok(ModuleOutcome::Report(report))
    }
}
