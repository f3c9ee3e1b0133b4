//! Rendering of module reports to the output directory.

pub mod chart;
pub mod data_file;
pub mod fields;
pub mod table;

use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::modules::ModuleReport;

/// Name of the file, within the output directory, holding the general
/// statistics table.
pub const GENERAL_STATS_FILE: &str = "general_stats.txt";

/// Writes every report to `output_directory`:
///
/// * data files to `<output_directory>/scqc_data/<tag>.json`,
/// * each chart to `<output_directory>/<anchor>.html`, and
/// * the general statistics table, with its legend, to stdout and to
///   `<output_directory>/general_stats.txt`.
pub fn write_report(reports: &[ModuleReport], output_directory: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(output_directory).with_context(|| {
        format!(
            "could not create output directory: {}",
            output_directory.display()
        )
    })?;

    //============//
    // Data files //
    //============//

    let data_directory = output_directory.join(data_file::DATA_DIRECTORY);
    for report in reports {
        for data in &report.data_files {
            let filepath = data_file::write_data_file(&data_directory, &data.tag, &data.data)?;
            info!("  [*] Wrote {} data to {}", report.name, filepath.display());
        }
    }

    //========//
    // Charts //
    //========//

    for report in reports {
        for section in &report.sections {
            let filepath = output_directory.join(format!("{}.html", section.anchor));
            info!("  [*] Writing {} to {}", section.name, filepath.display());

            let mut file = File::create(&filepath)
                .with_context(|| format!("could not create chart: {}", filepath.display()))?;
            file.write_all(section.plot.to_html().as_bytes())
                .with_context(|| format!("could not write chart: {}", filepath.display()))?;
        }
    }

    //===============//
    // General stats //
    //===============//

    if let Some(stats) = table::general_stats_table(reports) {
        let legend = table::legend_table(reports);

        println!("General Statistics:");
        println!();
        stats.printstd();
        println!();

        let filepath = output_directory.join(GENERAL_STATS_FILE);
        let mut file = File::create(&filepath)
            .with_context(|| format!("could not create file: {}", filepath.display()))?;
        stats.print(&mut file)?;
        writeln!(file)?;
        legend.print(&mut file)?;
        info!("  [*] Wrote general statistics to {}", filepath.display());
    }

    if reports.iter().any(|r| !r.sections.is_empty()) {
        println!("Charts:");
        println!();
        table::sections_table(reports).printstd();
    }

    Ok(())
}
