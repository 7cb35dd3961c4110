//! Trend chart projection and text rendering.
//!
//! [`project`] turns a collection into one label and one point per series for
//! every entry. Oxygen and heart rate share the linear `y1` axis; the
//! breathing score is drawn as bars on `y2`, bounded to `[0, 1]`.

use std::fmt::Write as _;

use serde::Serialize;

use crate::entry::{Breathing, LogCollection, LogEntry};

/// Width of a full breathing bar in the text renderer.
const BAR_WIDTH: usize = 10;

/// Numeric encoding of a breathing choice.
///
/// Unset scores the same as `worse`.
#[must_use]
pub fn breathing_score(breathing: Option<Breathing>) -> f64 {
    match breathing {
        Some(Breathing::Better) => 1.0,
        Some(Breathing::Same) => 0.5,
        Some(Breathing::Worse) | None => 0.0,
    }
}

/// Chart axis identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisId {
    /// Left axis, oxygen and heart rate.
    Y1,
    /// Right axis, breathing score.
    Y2,
}

/// How a series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    /// A line through the points.
    Line,
    /// One bar per point.
    Bar,
}

/// One y-axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    /// Axis identifier.
    pub id: AxisId,
    /// Axis title.
    pub title: &'static str,
    /// Fixed lower bound, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Fixed upper bound, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Presentation of one series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStyle {
    /// Key of the series in [`Series`].
    pub key: &'static str,
    /// Legend label.
    pub label: &'static str,
    /// Axis the series is plotted against.
    pub axis: AxisId,
    /// How it is drawn.
    pub kind: SeriesKind,
}

/// Axes and series presentation for the trend chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    /// The two y-axes.
    pub axes: [Axis; 2],
    /// One style per series.
    pub series: [SeriesStyle; 3],
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            axes: [
                Axis {
                    id: AxisId::Y1,
                    title: "Oxygen / Heart Rate",
                    min: None,
                    max: None,
                },
                Axis {
                    id: AxisId::Y2,
                    title: "Breathing Status",
                    min: Some(0.0),
                    max: Some(1.0),
                },
            ],
            series: [
                SeriesStyle {
                    key: "oxygen",
                    label: "Oxygen Level (%)",
                    axis: AxisId::Y1,
                    kind: SeriesKind::Line,
                },
                SeriesStyle {
                    key: "heartRate",
                    label: "Heart Rate (BPM)",
                    axis: AxisId::Y1,
                    kind: SeriesKind::Line,
                },
                SeriesStyle {
                    key: "breathingScore",
                    label: "Breathing Status",
                    axis: AxisId::Y2,
                    kind: SeriesKind::Bar,
                },
            ],
        }
    }
}

/// Parallel numeric series, one point per entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    /// Oxygen readings; `None` where the reading is not a number.
    pub oxygen: Vec<Option<f64>>,
    /// Heart-rate readings; `None` where the reading is not a number.
    pub heart_rate: Vec<Option<f64>>,
    /// Breathing scores.
    pub breathing_score: Vec<f64>,
}

/// Everything a renderer needs to draw the trend chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    /// One label per entry.
    pub labels: Vec<String>,
    /// The projected series.
    pub series: Series,
    /// Axes and series presentation.
    pub layout: Layout,
}

impl ChartData {
    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True if there are no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Label for one entry: its date, followed by the meal time if set.
#[must_use]
pub fn label(entry: &LogEntry) -> String {
    match entry.meal_time {
        Some(meal_time) => format!("{} {meal_time}", entry.date),
        None => entry.date.to_string(),
    }
}

/// Project a collection into chart series, in collection order.
#[must_use]
pub fn project(collection: &LogCollection) -> ChartData {
    let mut labels = Vec::with_capacity(collection.len());
    let mut series = Series::default();

    for entry in collection {
        labels.push(label(entry));
        series.oxygen.push(entry.oxygen.value());
        series.heart_rate.push(entry.heart_rate.value());
        series.breathing_score.push(breathing_score(entry.breathing));
    }

    ChartData {
        labels,
        series,
        layout: Layout::default(),
    }
}

/// Render the chart as text, one row per point.
///
/// Missing readings show as `-`. The breathing score is drawn as a bar.
#[must_use]
pub fn render_text(chart: &ChartData) -> String {
    let mut out = String::new();
    if chart.is_empty() {
        out.push_str("No logs yet.\n");
        return out;
    }

    let width = chart.labels.iter().map(String::len).max().unwrap_or(0);
    let _ = writeln!(
        out,
        "{:<width$}  {:>6}  {:>6}  Breathing",
        "Entry", "O2 %", "BPM"
    );

    // Rows stop at the shortest series.
    let series = &chart.series;
    let rows = chart
        .labels
        .iter()
        .zip(&series.oxygen)
        .zip(&series.heart_rate)
        .zip(&series.breathing_score);
    for (((label, oxygen), heart_rate), score) in rows {
        let _ = writeln!(
            out,
            "{label:<width$}  {:>6}  {:>6}  {} {score:.1}",
            point(*oxygen),
            point(*heart_rate),
            bar(*score),
        );
    }
    out
}

fn point(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v}"))
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn bar(score: f64) -> String {
    let filled = (score.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{MealTime, Reading};
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn entry(breathing: Option<Breathing>, oxygen: &str, heart_rate: &str) -> LogEntry {
        let mut entry = LogEntry::empty(date());
        entry.breathing = breathing;
        entry.oxygen = Reading::new(oxygen);
        entry.heart_rate = Reading::new(heart_rate);
        entry
    }

    #[test]
    fn test_breathing_score_mapping() {
        assert!((breathing_score(Some(Breathing::Better)) - 1.0).abs() < f64::EPSILON);
        assert!((breathing_score(Some(Breathing::Same)) - 0.5).abs() < f64::EPSILON);
        assert!(breathing_score(Some(Breathing::Worse)).abs() < f64::EPSILON);
        assert!(breathing_score(None).abs() < f64::EPSILON);
    }

    #[test]
    fn test_scores_stay_in_unit_range() {
        for breathing in Breathing::ALL.into_iter().map(Some).chain([None]) {
            let score = breathing_score(breathing);
            assert!([0.0, 0.5, 1.0].contains(&score));
        }
    }

    #[test]
    fn test_empty_projection() {
        let chart = project(&LogCollection::new());
        assert!(chart.is_empty());
        assert!(chart.series.oxygen.is_empty());
    }

    #[test]
    fn test_one_point_per_entry() {
        let collection = LogCollection::from(vec![
            entry(Some(Breathing::Better), "97", "72"),
            entry(Some(Breathing::Same), "", "80"),
            entry(None, "high", "65"),
        ]);
        let chart = project(&collection);

        assert_eq!(chart.len(), collection.len());
        assert_eq!(chart.series.oxygen, vec![Some(97.0), None, None]);
        assert_eq!(chart.series.heart_rate, vec![Some(72.0), Some(80.0), Some(65.0)]);
        assert_eq!(chart.series.breathing_score, vec![1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_labels() {
        let plain = entry(None, "", "");
        let mut with_meal = entry(None, "", "");
        with_meal.meal_time = Some(MealTime::Dinner);

        assert_eq!(label(&plain), "2026-10-19");
        assert_eq!(label(&with_meal), "2026-10-19 Dinner");
    }

    #[test]
    fn test_layout_axes() {
        let layout = Layout::default();
        assert_eq!(layout.axes[1].id, AxisId::Y2);
        assert_eq!(layout.axes[1].min, Some(0.0));
        assert_eq!(layout.axes[1].max, Some(1.0));
        let bars: Vec<_> = layout
            .series
            .iter()
            .filter(|s| s.kind == SeriesKind::Bar)
            .collect();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].axis, AxisId::Y2);
    }

    #[test]
    fn test_json_shape() {
        let collection = LogCollection::from(vec![entry(Some(Breathing::Same), "x", "70")]);
        let json = serde_json::to_value(project(&collection)).unwrap();

        assert_eq!(json["labels"][0], "2026-10-19");
        assert!(json["series"]["oxygen"][0].is_null());
        assert_eq!(json["series"]["heartRate"][0], 70.0);
        assert_eq!(json["series"]["breathingScore"][0], 0.5);
        assert_eq!(json["layout"]["axes"][0]["id"], "y1");
        assert_eq!(json["layout"]["series"][2]["kind"], "bar");
    }

    #[test]
    fn test_render_text() {
        let collection = LogCollection::from(vec![
            entry(Some(Breathing::Better), "97", "72"),
            entry(Some(Breathing::Same), "", "80"),
        ]);
        let text = render_text(&project(&collection));
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("97"));
        assert!(lines[1].contains("########## 1.0"));
        assert!(lines[2].contains("#####..... 0.5"));
        assert!(lines[2].contains(" - "));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_text(&project(&LogCollection::new())), "No logs yet.\n");
    }

    #[test]
    fn test_render_text_uneven_series() {
        let collection = LogCollection::from(vec![
            entry(Some(Breathing::Better), "97", "72"),
            entry(Some(Breathing::Same), "95", "80"),
            entry(None, "96", "75"),
        ]);
        let mut chart = project(&collection);
        chart.series.heart_rate.truncate(1);
        chart.series.breathing_score.pop();

        let text = render_text(&chart);
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("72"));
    }
}
