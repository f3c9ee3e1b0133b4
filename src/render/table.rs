//! The general statistics table shared by all modules.

use indexmap::IndexSet;
use prettytable::row;
use prettytable::Cell;
use prettytable::Row;
use prettytable::Table;

use crate::modules::GeneralStats;
use crate::modules::ModuleReport;

fn general_stats(reports: &[ModuleReport]) -> impl Iterator<Item = &GeneralStats> {
    reports.iter().filter_map(|r| r.general_stats.as_ref())
}

/// Builds one table with a row per sample and a column per field contributed by
/// any module. Samples are listed in the order they were first seen and cells
/// without a value are left blank. Returns `None` if no module contributed any
/// columns.
pub fn general_stats_table(reports: &[ModuleReport]) -> Option<Table> {
    let mut samples = IndexSet::new();
    let mut header = vec![Cell::new("Sample")];

    for stats in general_stats(reports) {
        samples.extend(stats.samples.names());
        header.extend(stats.headers.values().map(|meta| Cell::new(meta.title)));
    }

    if header.len() == 1 {
        return None;
    }

    let mut table = Table::new();
    table.set_titles(Row::new(header));

    for sample in samples {
        let mut cells = vec![Cell::new(sample)];

        for stats in general_stats(reports) {
            let record = stats.samples.get(sample);

            for (key, meta) in &stats.headers {
                let text = record
                    .and_then(|r| r.get(key))
                    .map(|v| meta.format_value(v))
                    .unwrap_or_default();
                cells.push(Cell::new(&text));
            }
        }

        table.add_row(Row::new(cells));
    }

    Some(table)
}

/// Builds a legend describing every column of [`general_stats_table`].
pub fn legend_table(reports: &[ModuleReport]) -> Table {
    let mut table = Table::new();
    table.set_titles(row!["Module", "Title", "Description", "Range", "Scale"]);

    for report in reports {
        if let Some(stats) = &report.general_stats {
            for meta in stats.headers.values() {
                table.add_row(row![
                    report.name,
                    meta.title,
                    meta.description,
                    meta.range_label(),
                    meta.scale.unwrap_or_default(),
                ]);
            }
        }
    }

    table
}

/// Builds an index of every chart, with the file it is written to.
pub fn sections_table(reports: &[ModuleReport]) -> Table {
    let mut table = Table::new();
    table.set_titles(row!["Module", "Section", "File", "Description"]);

    for report in reports {
        for section in &report.sections {
            table.add_row(row![
                report.name,
                section.name,
                format!("{}.html", section.anchor),
                section.description.as_deref().unwrap_or_default(),
            ]);
        }
    }

    table
}
