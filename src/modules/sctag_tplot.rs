//! t-SNE figures rendered by the single-cell tag pipeline.
//!
//! Each report is a JSON object holding two finished HTML figures, one
//! coloured by cluster and one by gene. They are passed through untouched.

use serde::Deserialize;
use tracing::info;

use crate::discovery::LogCategory;
use crate::modules::ModuleContext;
use crate::modules::ModuleOutcome;
use crate::modules::ModuleReport;
use crate::modules::ReportModule;
use crate::modules::Section;
use crate::modules::SectionPlot;

const TSNE: LogCategory = LogCategory::new("sctag_tplot", "*_html.json", "_html");

/// Module for the pre-rendered t-SNE figures of a sample.
pub struct SctagTplotModule;

/// The two figures of one sample.
#[derive(Debug, Deserialize)]
pub struct TsneFigures {
    /// Cells coloured by cluster.
    pub tsne_cluster: String,

    /// Cells coloured by gene expression.
    pub tsne_gene: String,
}

fn section(kind: &str, sample: &str, figure: &str) -> Section {
    Section {
        name: format!("t-SNE {}: {}", kind, sample),
        anchor: format!("tsne-{}-{}", kind, sample),
        description: None,
        helptext: None,
        plot: SectionPlot::Html(figure.to_string()),
    }
}

impl ReportModule for SctagTplotModule {
    fn name(&self) -> &'static str {
        "t-SNE plot"
    }

    fn anchor(&self) -> &'static str {
        "tsne_plot"
    }

    fn info(&self) -> &'static str {
        "t-SNE projections of cells coloured by cluster and by gene."
    }

    fn categories(&self) -> &'static [LogCategory] {
        &[TSNE]
    }

    fn run(&self, context: &ModuleContext<'_>) -> anyhow::Result<ModuleOutcome> {
        let samples = context.collect_samples(&TSNE, |_, reader| {
            let figures: TsneFigures = serde_json::from_reader(reader)?;
            Ok(Some(figures))
        })?;

        if samples.is_empty() {
            return Ok(ModuleOutcome::NoSamplesFound);
        }

        info!("Found {} reports", samples.len());

        // All cluster figures come before all gene figures.
        let mut report = ModuleReport::new(self);
        for (sample, figures) in samples.iter() {
            report
                .sections
                .push(section("cluster", sample, &figures.tsne_cluster));
        }
        for (sample, figures) in samples.iter() {
            report
                .sections
                .push(section("gene", sample, &figures.tsne_gene));
        }

        Ok(ModuleOutcome::Report(report))
    }
}
