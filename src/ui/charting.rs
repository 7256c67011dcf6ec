use crate::history::HistoryEntry;

/// Y-axis bounds of the accuracy chart.
pub const ACCURACY_BOUNDS: [f64; 2] = [0.0, 100.0];

/// Which recorded value a history chart plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Wpm,
    Accuracy,
}

impl Metric {
    fn of(&self, entry: &HistoryEntry) -> f64 {
        match self {
            Metric::Wpm => entry.wpm,
            Metric::Accuracy => entry.accuracy,
        }
    }
}

/// Points for a history chart: session number against `metric`.
pub fn history_points(history: &[HistoryEntry], metric: Metric) -> Vec<(f64, f64)> {
    history
        .iter()
        .enumerate()
        .map(|(idx, entry)| ((idx + 1) as f64, metric.of(entry)))
        .collect()
}

/// Compute X (session) and Y (WPM) bounds for the results chart
pub fn compute_chart_params(points: &[(f64, f64)], current_wpm: f64) -> (f64, f64) {
    let highest_wpm = points
        .iter()
        .map(|&(_, wpm)| wpm)
        .fold(current_wpm, f64::max);

    let sessions = points.last().map_or(1.0, |p| p.0).max(1.0);

    (sessions, highest_wpm.ceil().max(1.0))
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
