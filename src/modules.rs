//! Report modules: one per upstream tool whose output `scqc` understands.

pub mod anglerfish;
pub mod ontplot;
pub mod ontstat;
pub mod plbcrank;
pub mod sctag_stat_plot;
pub mod sctag_stat_table;
pub mod sctag_tplot;
pub mod starsolo;

use std::io::Read;

use anyhow::bail;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;
use tracing::warn;

use crate::discovery::LogCategory;
use crate::discovery::LogFile;
use crate::discovery::LogFiles;
use crate::parse::FieldRecord;
use crate::rank::KneeParams;
use crate::registry::IgnoreList;
use crate::registry::SampleRegistry;
use crate::render::fields::FieldMeta;

//=========//
// Context //
//=========//

/// Everything a module needs to find and parse its reports.
pub struct ModuleContext<'a> {
    /// The files found beneath the input paths.
    pub files: &'a LogFiles,

    /// Sample names to drop from all results.
    pub ignore: &'a IgnoreList,

    /// Parameters for locating the knee of barcode rank curves.
    pub knee: KneeParams,
}

impl<'a> ModuleContext<'a> {
    /// Creates a new [`ModuleContext`].
    pub fn new(files: &'a LogFiles, ignore: &'a IgnoreList, knee: KneeParams) -> Self {
        ModuleContext {
            files,
            ignore,
            knee,
        }
    }

    /// Finds every file belonging to a category.
    pub fn find_log_files(&self, category: &LogCategory) -> anyhow::Result<Vec<LogFile>> {
        self.files.find(category)
    }

    /// Parses every file of a category into a registry. Files that cannot be
    /// opened or parsed are skipped with a warning, and files for which
    /// `parse` returns `None` are skipped silently. Ignored samples are
    /// removed before the registry is returned.
    pub fn collect_samples<T, F>(
        &self,
        category: &LogCategory,
        mut parse: F,
    ) -> anyhow::Result<SampleRegistry<T>>
    where
        F: FnMut(&LogFile, Box<dyn Read>) -> anyhow::Result<Option<T>>,
    {
        let mut registry = SampleRegistry::new();

        for file in self.find_log_files(category)? {
            let reader = match file.open() {
                Ok(r) => r,
                Err(err) => {
                    warn!("Could not open {}: {}", file.path.display(), err);
                    continue;
                }
            };

            match parse(&file, reader) {
                Ok(Some(value)) => {
                    registry.insert(file.sample_name.clone(), value);
                }
                Ok(None) => {}
                Err(err) => warn!(
                    "Could not parse {} as {}: {:#}. Skipping.",
                    file.path.display(),
                    category.name,
                    err
                ),
            }
        }

        Ok(registry.ignore_samples(self.ignore))
    }
}

//========//
// Report //
//========//

/// Columns contributed by one module to the general statistics table.
#[derive(Clone, Debug)]
pub struct GeneralStats {
    /// Values for each sample.
    pub samples: SampleRegistry<FieldRecord>,

    /// Metadata for each field shown, in column order.
    pub headers: IndexMap<String, FieldMeta>,
}

/// A titled chart.
pub struct Section {
    /// Section name.
    pub name: String,

    /// Unique anchor; also used as the output file name.
    pub anchor: String,

    /// Short description, if any.
    pub description: Option<String>,

    /// Longer help text, if any.
    pub helptext: Option<String>,

    /// The chart itself.
    pub plot: SectionPlot,
}

/// The chart shown in a [`Section`].
pub enum SectionPlot {
    /// A chart built by `scqc`.
    Plotly(plotly::Plot),

    /// A chart that was already rendered by the upstream tool, as an HTML
    /// fragment.
    Html(String),
}

impl SectionPlot {
    /// Renders the chart as a standalone HTML document.
    pub fn to_html(&self) -> String {
        match self {
            SectionPlot::Plotly(plot) => plot.to_html(),
            SectionPlot::Html(fragment) => format!(
                "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n</head>\n\
                <body>\n{}\n</body>\n</html>\n",
                fragment
            ),
        }
    }
}

impl From<plotly::Plot> for SectionPlot {
    fn from(plot: plotly::Plot) -> Self {
        SectionPlot::Plotly(plot)
    }
}

/// Parsed results written to a data file.
#[derive(Clone, Debug, Serialize)]
pub struct DataFile {
    /// Name of the data file (without extension).
    pub tag: String,

    /// The data to write.
    pub data: serde_json::Value,
}

impl DataFile {
    /// Serializes `data` into a new [`DataFile`].
    pub fn new<T>(tag: impl Into<String>, data: &T) -> anyhow::Result<Self>
    where
        T: Serialize,
    {
        Ok(DataFile {
            tag: tag.into(),
            data: serde_json::to_value(data)?,
        })
    }
}

/// Everything a module hands over to rendering.
pub struct ModuleReport {
    /// Name of the module.
    pub name: &'static str,

    /// Anchor of the module.
    pub anchor: &'static str,

    /// Columns for the general statistics table.
    pub general_stats: Option<GeneralStats>,

    /// Charts.
    pub sections: Vec<Section>,

    /// Data files.
    pub data_files: Vec<DataFile>,
}

impl ModuleReport {
    /// Creates an empty report for a module.
    pub fn new(module: &dyn ReportModule) -> Self {
        ModuleReport {
            name: module.name(),
            anchor: module.anchor(),
            general_stats: None,
            sections: Vec::new(),
            data_files: Vec::new(),
        }
    }
}

/// The result of running a module.
pub enum ModuleOutcome {
    /// At least one sample was found.
    Report(ModuleReport),

    /// No usable reports were found; the module has nothing to show.
    NoSamplesFound,
}

//==============//
// Module trait //
//==============//

/// A parser for the reports of one upstream tool.
pub trait ReportModule {
    /// The name of this module.
    fn name(&self) -> &'static str;

    /// A unique, lowercase identifier for this module.
    fn anchor(&self) -> &'static str;

    /// A short description of what this module reports on.
    fn info(&self) -> &'static str;

    /// The kinds of files this module reads.
    fn categories(&self) -> &'static [LogCategory];

    /// Finds, parses and summarizes this module's reports.
    fn run(&self, context: &ModuleContext<'_>) -> anyhow::Result<ModuleOutcome>;
}

/// Gets all of the supported report modules.
pub fn get_all_modules(only_module: Option<String>) -> anyhow::Result<Vec<Box<dyn ReportModule>>> {
    let mut results: Vec<Box<dyn ReportModule>> = vec![
        Box::new(starsolo::StarsoloModule),
        Box::new(ontstat::OntStatModule),
        Box::new(ontplot::OntPlotModule),
        Box::new(plbcrank::BarcodeRankModule),
        Box::new(sctag_stat_table::SctagStatTableModule),
        Box::new(sctag_stat_plot::SctagStatPlotModule),
        Box::new(sctag_tplot::SctagTplotModule),
        Box::new(anglerfish::AnglerfishModule),
    ];

    if let Some(only) = only_module {
        results = results
            .into_iter()
            .filter(|x| x.anchor().eq_ignore_ascii_case(&only))
            .collect_vec();

        if results.is_empty() {
            bail!("No modules matched the specified `--only` flag: {}", only);
        }
    }

    Ok(results)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashSet;
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    /// Writes `(file name, contents)` pairs into a new temporary directory and
    /// scans it.
    pub fn scan_fixtures(files: &[(&str, &str)]) -> (TempDir, LogFiles) {
        let dir = TempDir::new().unwrap();

        for (name, contents) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, contents).unwrap();
        }

        let files = LogFiles::scan(&[dir.path().to_path_buf()]).unwrap();
        (dir, files)
    }

    /// Runs a module against a directory of fixtures.
    pub fn run_module(module: &dyn ReportModule, files: &LogFiles) -> ModuleOutcome {
        let ignore = IgnoreList::default();
        let context = ModuleContext::new(files, &ignore, KneeParams::default());
        module.run(&context).unwrap()
    }

    /// Unwraps the report of a module that is expected to have found samples.
    pub fn expect_report(outcome: ModuleOutcome) -> ModuleReport {
        match outcome {
            ModuleOutcome::Report(report) => report,
            ModuleOutcome::NoSamplesFound => panic!("expected samples to be found"),
        }
    }

    #[test]
    fn test_get_all_modules() {
        let modules = get_all_modules(None).unwrap();
        assert_eq!(modules.len(), 8);

        let anchors = modules.iter().map(|m| m.anchor()).collect::<HashSet<_>>();
        assert_eq!(anchors.len(), modules.len());

        let modules = get_all_modules(Some(String::from("PLBCRANK"))).unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].anchor(), "plbcrank");

        assert!(get_all_modules(Some(String::from("fastqc"))).is_err());
    }

    #[test]
    fn test_every_module_reports_no_samples_for_an_empty_directory() {
        let (_dir, files) = scan_fixtures(&[]);
        assert!(files.is_empty());

        for module in get_all_modules(None).unwrap() {
            assert!(
                matches!(run_module(module.as_ref(), &files), ModuleOutcome::NoSamplesFound),
                "{} should report no samples",
                module.name()
            );
        }
    }

    #[test]
    fn test_collect_samples_skips_unparseable_files() {
        let category = LogCategory::new("test", "*.test.txt", ".test");
        let (_dir, files) = scan_fixtures(&[
            ("a.test.txt", "1"),
            ("b.test.txt", "oops"),
            ("c.test.txt", "3"),
            ("ignored_d.test.txt", "4"),
        ]);

        let ignore = IgnoreList::new(["ignored_*"]).unwrap();
        let context = ModuleContext::new(&files, &ignore, KneeParams::default());
        let registry = context
            .collect_samples(&category, |_, mut reader| {
                let mut contents = String::new();
                reader.read_to_string(&mut contents)?;
                Ok(Some(contents.trim().parse::<u64>()?))
            })
            .unwrap();

        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(registry.get("c"), Some(&3));
    }
}
