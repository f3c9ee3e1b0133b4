//! Chart builders for bar graphs and barcode rank plots.

use plotly::common::Line;
use plotly::common::Marker;
use plotly::common::Mode;
use plotly::common::Title;
use plotly::layout::Axis;
use plotly::layout::AxisType;
use plotly::layout::BarMode;
use plotly::Bar;
use plotly::Layout;
use plotly::Scatter;

use crate::parse::FieldRecord;
use crate::rank::RankCurve;
use crate::registry::SampleRegistry;
use crate::utils::display::PercentageFormat;

/// Line color for cell-associated barcodes.
const CELLS_COLOR: &str = "#4682B4";

/// Line color for background barcodes.
const BACKGROUND_COLOR: &str = "#dddddd";

//===========//
// Bar chart //
//===========//

/// One stacked category of a bar chart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BarCategory {
    /// Field name the values are read from.
    pub key: String,

    /// Legend name.
    pub name: String,

    /// Bar color, if not the default palette.
    pub color: Option<&'static str>,
}

impl BarCategory {
    /// Creates a new [`BarCategory`] using the default palette.
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        BarCategory {
            key: key.into(),
            name: name.into(),
            color: None,
        }
    }

    /// Sets the bar color.
    pub fn color(mut self, color: &'static str) -> Self {
        self.color = Some(color);
        self
    }

    /// Creates one category per field name, using the field name as the legend.
    pub fn from_fields<I, S>(names: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|n| BarCategory::new(n.as_ref(), n.as_ref()))
            .collect()
    }
}

/// Labels of a bar chart.
#[derive(Clone, Copy, Debug)]
pub struct BarConfig {
    /// Chart title.
    pub title: &'static str,

    /// Y axis label.
    pub ylab: &'static str,
}

/// Builds a stacked bar chart with one bar per sample and one stacked segment
/// per category. Samples without a value for a category are left out of that
/// segment.
pub fn bar_chart(
    registry: &SampleRegistry<FieldRecord>,
    categories: &[BarCategory],
    config: BarConfig,
) -> plotly::Plot {
    let mut plot = plotly::Plot::new();

    for category in categories {
        let mut x = Vec::new();
        let mut y = Vec::new();

        for (sample, record) in registry.iter() {
            if let Some(value) = record.get(&category.key).and_then(|v| v.as_f64()) {
                x.push(sample.to_string());
                y.push(value);
            }
        }

        let trace = Bar::new(x, y).name(category.name.as_str());
        let trace = match category.color {
            Some(color) => trace.marker(Marker::new().color(color)),
            None => trace,
        };

        plot.add_trace(trace);
    }

    let layout = Layout::new()
        .title(Title::new(config.title))
        .bar_mode(BarMode::Stack)
        .x_axis(Axis::new().title(Title::new("Sample")))
        .y_axis(Axis::new().title(Title::new(config.ylab)));
    plot.set_layout(layout);

    plot
}

//============//
// Rank chart //
//============//

/// Builds a log-log barcode rank plot for one sample: a `Cells` trace for the
/// foreground segment and a `Background` trace for the rest.
pub fn rank_chart(sample_name: &str, curve: &RankCurve) -> plotly::Plot {
    let mut plot = plotly::Plot::new();

    let cells_label = match curve.split_index as u64 {
        0 => String::from("0 Cells"),
        cells => format!(
            "{} Cells<br>({}/{})",
            PercentageFormat(cells, cells),
            cells,
            cells
        ),
    };

    let foreground = Scatter::new(curve.foreground.x.clone(), curve.foreground.y.clone())
        .mode(Mode::Lines)
        .name("Cells")
        .text(cells_label.as_str())
        .line(Line::new().color(CELLS_COLOR).width(3.0));

    let background = Scatter::new(curve.background.x.clone(), curve.background.y.clone())
        .mode(Mode::Lines)
        .name("Background")
        .text("Background<br>")
        .line(Line::new().color(BACKGROUND_COLOR).width(3.0));

    plot.add_trace(foreground);
    plot.add_trace(background);

    let layout = Layout::new()
        .title(Title::new(&format!("Barcode rank - {}", sample_name)))
        .width(950)
        .height(650)
        .x_axis(
            Axis::new()
                .type_(AxisType::Log)
                .title(Title::new("Barcode")),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Log)
                .title(Title::new("UMI counts")),
        );
    plot.set_layout(layout);

    plot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::FieldValue;
    use crate::rank::reduce;
    use crate::rank::KneeParams;

    #[test]
    fn test_bar_chart_has_one_trace_per_category() {
        let mut registry = SampleRegistry::new();
        let record: FieldRecord = [("exonic", 10), ("intronic", 5)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), FieldValue::Int(v)))
            .collect();
        registry.insert("sample1", record);

        let categories = vec![
            BarCategory::new("exonic", "Exonic").color("#437bb1"),
            BarCategory::new("intronic", "Intronic"),
        ];
        let plot = bar_chart(
            &registry,
            &categories,
            BarConfig {
                title: "Assign",
                ylab: "# Reads",
            },
        );

        let json = plot.to_json();
        assert!(json.contains("\"Exonic\""));
        assert!(json.contains("\"Intronic\""));
        assert!(json.contains("#437bb1"));
    }

    #[test]
    fn test_rank_chart() {
        let mut counts = vec![1000; 35];
        counts.extend([10; 5]);
        let curve = reduce(&counts, KneeParams::default()).unwrap();

        let json = rank_chart("sample1", &curve).to_json();
        assert!(json.contains("\"Cells\""));
        assert!(json.contains("\"Background\""));
        assert!(json.contains("100% Cells<br>(35/35)"));
        assert!(json.contains("Barcode rank - sample1"));
    }

    #[test]
    fn test_rank_chart_without_cells() {
        let curve = reduce(&[0; 40], KneeParams::default()).unwrap();
        assert_eq!(curve.split_index, 0);

        let json = rank_chart("flat", &curve).to_json();
        assert!(json.contains("\"0 Cells\""));
        assert!(!json.contains("N/A"));
        assert!(json.contains("\"Background\""));
    }

    #[test]
    fn test_from_fields() {
        let categories = BarCategory::from_fields(["a", "b"]);
        assert_eq!(categories[1], BarCategory::new("b", "b"));
    }
}
