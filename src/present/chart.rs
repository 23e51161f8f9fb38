//! Declarative chart descriptions.
//!
//! The types serialize to the figure layout plotly.js consumes
//! (`{"data": [...], "layout": {...}}`); undefined points become `null` and
//! render as gaps.

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::ChartConfig;
use crate::engine::columns;
use crate::model::{EnrichedTable, Series};

pub const ADI_HOVER_TEMPLATE: &str =
    "Date: %{x}<br>Original ADI: %{customdata}<br>Scaled ADI: %{y}<extra></extra>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Scatter,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dash {
    Solid,
    Dash,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub dash: Dash,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: TraceKind,
    pub name: String,
    pub x: Vec<NaiveDate>,
    pub y: Series,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<LineStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<MarkerStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    /// `Some("y2")` binds the trace to the secondary y-axis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customdata: Option<Series>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertemplate: Option<String>,
}

impl Trace {
    pub fn line(name: &str, x: Vec<NaiveDate>, y: Series, color: Option<&str>) -> Self {
        Self {
            kind: TraceKind::Scatter,
            name: name.to_owned(),
            x,
            y,
            mode: Some("lines"),
            line: Some(LineStyle {
                color: color.map(str::to_owned),
                dash: Dash::Solid,
            }),
            marker: None,
            opacity: None,
            yaxis: None,
            customdata: None,
            hovertemplate: None,
        }
    }

    pub fn bar(name: &str, x: Vec<NaiveDate>, y: Series, color: &str) -> Self {
        Self {
            kind: TraceKind::Bar,
            name: name.to_owned(),
            x,
            y,
            mode: None,
            line: None,
            marker: Some(MarkerStyle {
                color: color.to_owned(),
            }),
            opacity: None,
            yaxis: None,
            customdata: None,
            hovertemplate: None,
        }
    }

    pub fn dashed(mut self) -> Self {
        if let Some(line) = &mut self.line {
            line.dash = Dash::Dash;
        }
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn on_secondary_axis(mut self) -> Self {
        self.yaxis = Some("y2");
        self
    }

    pub fn with_hover(mut self, customdata: Series, template: &str) -> Self {
        self.customdata = Some(customdata);
        self.hovertemplate = Some(template.to_owned());
        self
    }

    pub fn point_count(&self) -> usize {
        self.y.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

impl Title {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: Title,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showgrid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zeroline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlaying: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<&'static str>,
}

impl Axis {
    fn titled(text: &str) -> Self {
        Self {
            title: Title::new(text),
            showgrid: None,
            zeroline: None,
            overlaying: None,
            side: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub orientation: &'static str,
    pub yanchor: &'static str,
    pub y: f64,
    pub xanchor: &'static str,
    pub x: f64,
}

impl Legend {
    /// Horizontal legend sitting just above the plot area, right-aligned.
    pub fn horizontal_top() -> Self {
        Self {
            orientation: "h",
            yanchor: "bottom",
            y: 1.02,
            xanchor: "right",
            x: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    pub xaxis: Axis,
    pub yaxis: Axis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis2: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    pub height: u32,
    pub width: u32,
}

/// One chart: ordered traces plus layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

fn column_or_gap(table: &EnrichedTable, name: &str) -> Series {
    table
        .column(name)
        .cloned()
        .unwrap_or_else(|| vec![None; table.len()])
}

/// Adjusted close when present, plain close otherwise.
fn reference_price(table: &EnrichedTable) -> (&'static str, Series) {
    match table.column(columns::ADJ_CLOSE) {
        Some(values) => ("Adj Close", values.clone()),
        None => ("Close", column_or_gap(table, columns::CLOSE)),
    }
}

/// Price, bands, volume and ADI on one canvas.
///
/// Trace order is fixed: reference close, middle, upper and lower band,
/// volume bars on the secondary axis, raw ADI, then the rescaled ADI
/// carrying the raw values as hover data.
pub fn combined_chart(table: &EnrichedTable, config: &ChartConfig) -> ChartSpec {
    let x = table.dates.clone();
    let (price_name, price) = reference_price(table);
    let adi = column_or_gap(table, columns::ADI);

    let data = vec![
        Trace::line(price_name, x.clone(), price, Some("blue")),
        Trace::line(
            "Bollinger Middle",
            x.clone(),
            column_or_gap(table, columns::BB_MIDDLE),
            Some("orange"),
        ),
        Trace::line(
            "Bollinger High",
            x.clone(),
            column_or_gap(table, columns::BB_HIGH),
            Some("green"),
        ),
        Trace::line(
            "Bollinger Low",
            x.clone(),
            column_or_gap(table, columns::BB_LOW),
            Some("red"),
        ),
        Trace::bar(
            "Volume",
            x.clone(),
            column_or_gap(table, columns::VOLUME),
            "gray",
        )
        .with_opacity(0.6)
        .on_secondary_axis(),
        Trace::line("ADI", x.clone(), adi.clone(), Some("purple")),
        Trace::line(
            "Scaled ADI",
            x,
            column_or_gap(table, columns::SCALED_ADI),
            Some("purple"),
        )
        .dashed()
        .with_hover(adi, ADI_HOVER_TEMPLATE),
    ];

    let mut yaxis = Axis::titled("Price");
    yaxis.showgrid = Some(true);
    yaxis.zeroline = Some(true);

    let mut yaxis2 = Axis::titled("Volume");
    yaxis2.overlaying = Some("y");
    yaxis2.side = Some("right");

    ChartSpec {
        data,
        layout: Layout {
            title: Title::new(&config.title),
            xaxis: Axis::titled("Date"),
            yaxis,
            yaxis2: Some(yaxis2),
            legend: Some(Legend::horizontal_top()),
            height: config.height,
            width: config.width,
        },
    }
}

fn panel(title: &str, y_title: &str, data: Vec<Trace>, config: &ChartConfig) -> ChartSpec {
    ChartSpec {
        data,
        layout: Layout {
            title: Title::new(title),
            xaxis: Axis::titled("Date"),
            yaxis: Axis::titled(y_title),
            yaxis2: None,
            legend: None,
            height: config.height,
            width: config.width,
        },
    }
}

/// Reference close with the three Bollinger lines.
pub fn price_chart(table: &EnrichedTable, config: &ChartConfig) -> ChartSpec {
    let x = table.dates.clone();
    let (price_name, price) = reference_price(table);
    let data = vec![
        Trace::line(price_name, x.clone(), price, None),
        Trace::line(
            "Bollinger Middle",
            x.clone(),
            column_or_gap(table, columns::BB_MIDDLE),
            None,
        ),
        Trace::line(
            "Bollinger High",
            x.clone(),
            column_or_gap(table, columns::BB_HIGH),
            None,
        ),
        Trace::line("Bollinger Low", x, column_or_gap(table, columns::BB_LOW), None),
    ];
    panel("Historical Price Chart - Adjusted Close Price", "Price", data, config)
}

pub fn volume_chart(table: &EnrichedTable, config: &ChartConfig) -> ChartSpec {
    let data = vec![Trace::bar(
        "Volume",
        table.dates.clone(),
        column_or_gap(table, columns::VOLUME),
        "gray",
    )];
    panel("Volume", "Volume", data, config)
}

pub fn adi_chart(table: &EnrichedTable, config: &ChartConfig) -> ChartSpec {
    let data = vec![Trace::line(
        "ADI",
        table.dates.clone(),
        column_or_gap(table, columns::ADI),
        None,
    )];
    panel("Accumulation/Distribution Index (ADI)", "ADI", data, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnKey, NamedSeries};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, d).unwrap()
    }

    fn sample_table() -> EnrichedTable {
        let mut table = EnrichedTable {
            dates: vec![day(1), day(2), day(3)],
            columns: Vec::new(),
        };
        let put = |t: &mut EnrichedTable, cat: &str, field: &str, v: [Option<f64>; 3]| {
            t.push(&ColumnKey::new(cat, field), v.to_vec());
        };
        put(&mut table, "Price Data", "Adj Close", [Some(10.0), Some(11.0), Some(12.0)]);
        put(&mut table, "Price Data", "Volume", [Some(5.0), Some(6.0), Some(7.0)]);
        put(&mut table, "Bollinger Bands", "Middle", [None, Some(10.5), Some(11.5)]);
        put(&mut table, "Bollinger Bands", "High", [None, Some(11.0), Some(12.5)]);
        put(&mut table, "Bollinger Bands", "Low", [None, Some(10.0), Some(10.5)]);
        put(&mut table, "Indicators", "ADI", [Some(-3.0), Some(1.0), Some(5.0)]);
        put(&mut table, "Scaled", "ADI", [Some(10.0), Some(11.0), Some(12.0)]);
        table
    }

    #[test]
    fn combined_chart_trace_order_and_styles() {
        let chart = combined_chart(&sample_table(), &ChartConfig::default());
        let names: Vec<&str> = chart.data.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Adj Close",
                "Bollinger Middle",
                "Bollinger High",
                "Bollinger Low",
                "Volume",
                "ADI",
                "Scaled ADI"
            ]
        );

        let colors: Vec<Option<&str>> = chart
            .data
            .iter()
            .map(|t| t.line.as_ref().and_then(|l| l.color.as_deref()))
            .collect();
        assert_eq!(
            colors,
            vec![
                Some("blue"),
                Some("orange"),
                Some("green"),
                Some("red"),
                None,
                Some("purple"),
                Some("purple")
            ]
        );

        let volume = &chart.data[4];
        assert_eq!(volume.kind, TraceKind::Bar);
        assert_eq!(volume.yaxis, Some("y2"));
        assert_eq!(volume.opacity, Some(0.6));
        assert_eq!(volume.marker.as_ref().unwrap().color, "gray");

        assert_eq!(chart.data[5].yaxis, None);
        assert_eq!(chart.data[5].line.as_ref().unwrap().dash, Dash::Solid);
    }

    #[test]
    fn scaled_adi_carries_original_values() {
        let chart = combined_chart(&sample_table(), &ChartConfig::default());
        let scaled = &chart.data[6];
        assert_eq!(scaled.line.as_ref().unwrap().dash, Dash::Dash);
        assert_eq!(
            scaled.customdata.as_ref().unwrap(),
            &vec![Some(-3.0), Some(1.0), Some(5.0)]
        );
        assert_eq!(scaled.hovertemplate.as_deref(), Some(ADI_HOVER_TEMPLATE));
    }

    #[test]
    fn layout_has_overlaid_secondary_axis() {
        let chart = combined_chart(&sample_table(), &ChartConfig::default());
        let json = serde_json::to_value(&chart).unwrap();
        let layout = &json["layout"];
        assert_eq!(layout["yaxis2"]["overlaying"], "y");
        assert_eq!(layout["yaxis2"]["side"], "right");
        assert_eq!(layout["legend"]["orientation"], "h");
        assert_eq!(layout["legend"]["y"], 1.02);
        assert_eq!(layout["height"], 600);
        assert_eq!(layout["width"], 1000);
        assert_eq!(json["data"][4]["type"], "bar");
    }

    #[test]
    fn warmup_gaps_serialize_as_null() {
        let chart = combined_chart(&sample_table(), &ChartConfig::default());
        let json = serde_json::to_value(&chart).unwrap();
        assert!(json["data"][1]["y"][0].is_null());
        assert_eq!(json["data"][1]["x"][0], "2021-03-01");
    }

    #[test]
    fn missing_adjusted_close_falls_back_to_close() {
        let mut table = sample_table();
        table.columns.retain(|c| c.name != columns::ADJ_CLOSE);
        table.columns.push(NamedSeries {
            name: columns::CLOSE.into(),
            values: vec![Some(1.0), Some(2.0), Some(3.0)],
        });
        let chart = combined_chart(&table, &ChartConfig::default());
        assert_eq!(chart.data[0].name, "Close");
        assert_eq!(chart.data[0].y, vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn empty_table_yields_empty_traces() {
        let chart = combined_chart(&EnrichedTable::default(), &ChartConfig::default());
        assert_eq!(chart.data.len(), 7);
        assert!(chart.data.iter().all(|t| t.point_count() == 0 && t.x.is_empty()));
    }

    #[test]
    fn auxiliary_panels_have_single_axis() {
        let table = sample_table();
        let config = ChartConfig::default();
        assert_eq!(price_chart(&table, &config).data.len(), 4);
        assert_eq!(volume_chart(&table, &config).data[0].kind, TraceKind::Bar);
        let adi = adi_chart(&table, &config);
        assert!(adi.layout.yaxis2.is_none());
        assert_eq!(adi.data[0].y.len(), 3);
    }
}
