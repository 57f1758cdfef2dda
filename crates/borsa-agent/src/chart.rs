//! Terminal chart rendering
//!
//! When the user asks for a chart, the collected task outputs are scanned
//! for embedded JSON series. OHLC rows render as an ASCII candlestick
//! chart, labeled values as a horizontal bar chart. No data found means no
//! chart, never an error.

use regex::Regex;
use serde::Deserialize;

const CHART_KEYWORDS: &[&str] = &[
    "grafik",
    "candlestick",
    "chart",
    "plot",
    "çiz",
    "görselleştir",
];

const CHART_HEIGHT: usize = 12;
const BAR_WIDTH: usize = 40;

/// Whether the query asks for a chart.
pub fn wants_chart(query: &str) -> bool {
    let lowered = query.to_lowercase();
    CHART_KEYWORDS.iter().any(|k| lowered.contains(k))
}

#[derive(Debug, Deserialize)]
struct OhlcRow {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

#[derive(Debug, Deserialize)]
struct LabeledRow {
    name: String,
    value: f64,
}

/// OHLC series extracted from task outputs.
#[derive(Debug)]
pub struct OhlcSeries {
    pub dates: Vec<String>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
}

/// Prefix-parse the first JSON array of `T` rows found in `text`.
fn extract_rows<T: for<'de> Deserialize<'de>>(text: &str) -> Option<Vec<T>> {
    // Positions where a JSON array of objects may begin.
    let array_starts = Regex::new(r"\[\s*\{").ok()?;
    for m in array_starts.find_iter(text) {
        let candidate = &text[m.start()..];
        let mut stream = serde_json::Deserializer::from_str(candidate).into_iter::<Vec<T>>();
        if let Some(Ok(rows)) = stream.next() {
            if !rows.is_empty() {
                return Some(rows);
            }
        }
    }
    None
}

/// Find an OHLC series in the outputs.
pub fn extract_ohlc(outputs: &[String]) -> Option<OhlcSeries> {
    for output in outputs {
        if let Some(rows) = extract_rows::<OhlcRow>(output) {
            let mut series = OhlcSeries {
                dates: Vec::with_capacity(rows.len()),
                open: Vec::with_capacity(rows.len()),
                high: Vec::with_capacity(rows.len()),
                low: Vec::with_capacity(rows.len()),
                close: Vec::with_capacity(rows.len()),
            };
            for row in rows {
                series.dates.push(row.date);
                series.open.push(row.open);
                series.high.push(row.high);
                series.low.push(row.low);
                series.close.push(row.close);
            }
            return Some(series);
        }
    }
    None
}

/// Find labeled values (name/value pairs) in the outputs.
pub fn extract_labeled_values(outputs: &[String]) -> Option<Vec<(String, f64)>> {
    for output in outputs {
        if let Some(rows) = extract_rows::<LabeledRow>(output) {
            return Some(rows.into_iter().map(|r| (r.name, r.value)).collect());
        }
    }
    None
}

/// Render whatever chartable series the outputs contain.
pub fn render_from_outputs(outputs: &[String]) -> Option<String> {
    if let Some(series) = extract_ohlc(outputs) {
        return Some(render_candlestick(&series));
    }
    extract_labeled_values(outputs).map(|values| render_bar_chart(&values))
}

/// ASCII candlestick chart, one two-column candle per row of data.
pub fn render_candlestick(series: &OhlcSeries) -> String {
    if series.close.is_empty() {
        return String::new();
    }
    let max = series.high.iter().copied().fold(f64::MIN, f64::max);
    let min = series.low.iter().copied().fold(f64::MAX, f64::min);
    let span = if (max - min).abs() < f64::EPSILON {
        1.0
    } else {
        max - min
    };
    let to_row = |value: f64| -> usize {
        let t = (max - value) / span;
        ((t * (CHART_HEIGHT - 1) as f64).round() as usize).min(CHART_HEIGHT - 1)
    };

    let mut grid = vec![vec![' '; series.close.len() * 2]; CHART_HEIGHT];
    for i in 0..series.close.len() {
        let col = i * 2;
        let wick_top = to_row(series.high[i]);
        let wick_bottom = to_row(series.low[i]);
        let body_top = to_row(series.open[i].max(series.close[i]));
        let body_bottom = to_row(series.open[i].min(series.close[i]));
        let bullish = series.close[i] >= series.open[i];
        for row in wick_top..=wick_bottom {
            grid[row][col] = '│';
        }
        for row in body_top..=body_bottom {
            grid[row][col] = if bullish { '█' } else { '▒' };
        }
    }

    let mut out = format!("{max:>10.2} ┐\n");
    for row in grid {
        out.push_str("           │");
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out.push_str(&format!("{min:>10.2} ┘\n"));
    if let (Some(first), Some(last)) = (series.dates.first(), series.dates.last()) {
        out.push_str(&format!("            {first} .. {last}\n"));
    }
    out
}

/// Horizontal bar chart for labeled values.
pub fn render_bar_chart(values: &[(String, f64)]) -> String {
    if values.is_empty() {
        return String::new();
    }
    let max = values
        .iter()
        .map(|(_, v)| v.abs())
        .fold(f64::MIN, f64::max);
    let label_width = values.iter().map(|(n, _)| n.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    for (name, value) in values {
        let width = if max > 0.0 {
            ((value.abs() / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        let bar: String = "█".repeat(width.max(1));
        let padding = " ".repeat(label_width - name.chars().count());
        out.push_str(&format!("{name}{padding} │ {bar} {value:.2}\n"));
    }
    out
}
