//! One-line text rendering of metric views.

use kafkawatch_sync::{DiskSpace, MetricsView, State, Tag, Topics, MAX_RETRIES};
use kafkawatch_types::TimeSeries;

const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Number of most recent samples drawn in a sparkline.
const SPARKLINE_WIDTH: usize = 16;

/// Render the disk space view as a status line.
pub fn disk_line(view: &MetricsView<DiskSpace>) -> String {
    let header = format!("[disk-space {}]", view.selection.time_duration);
    let summary = match view.data.latest() {
        Some((_, used)) => format!(
            "used {} {} ({} samples)",
            format_bytes(used),
            sparkline(&view.data.used_bytes),
            view.data.len()
        ),
        None => String::new(),
    };
    status_line(&header, view.state, view.tag(), view.fetch_failures, &summary)
}

/// Render the topics view as a status line.
pub fn topic_line(view: &MetricsView<Topics>) -> String {
    let header = match &view.selection.selected_topic {
        Some(topic) => format!("[topics {} {}]", view.selection.time_duration, topic),
        None => format!("[topics {}]", view.selection.time_duration),
    };
    let data = &view.data;
    let summary = if data.is_empty() {
        String::new()
    } else {
        format!(
            "{} topics | in {} {} | out {} | {} log series",
            data.topics.len(),
            format_bytes(data.total_incoming()),
            sparkline(&data.bytes_incoming),
            format_bytes(data.total_outgoing()),
            data.bytes_per_partition.len()
        )
    };
    status_line(&header, view.state, view.tag(), view.fetch_failures, &summary)
}

fn status_line(header: &str, state: State, tag: Option<Tag>, failures: u32, summary: &str) -> String {
    let body = match tag {
        Some(Tag::Loading) if state == State::Failure => {
            format!("fetch failed, retrying ({}/{})", failures, MAX_RETRIES)
        }
        Some(Tag::Loading) => "loading...".to_string(),
        Some(Tag::Refreshing) if summary.is_empty() => "refreshing...".to_string(),
        Some(Tag::Refreshing) => format!("refreshing... {}", summary),
        Some(Tag::Failed) => format!(
            "failed to load metrics after {} attempts; type r to retry",
            MAX_RETRIES
        ),
        Some(Tag::NoData) => "no data for this window; type r to refresh".to_string(),
        None => summary.to_string(),
    };
    format!("{} {}", header, body)
}

/// Draw the most recent samples of a series, scaled to 8 bar levels.
pub fn sparkline(series: &TimeSeries) -> String {
    let values: Vec<f64> = series
        .values()
        .rev()
        .take(SPARKLINE_WIDTH)
        .rev()
        .copied()
        .collect();

    if values.len() < 2 {
        return String::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    values
        .iter()
        .map(|&v| {
            let level = if range > 0.0 {
                ((v - min) * 7.0 / range) as usize
            } else {
                0
            };
            SPARKLINE_CHARS[level.min(7)]
        })
        .collect()
}

/// Format byte counts with binary suffixes
pub fn format_bytes(bytes: f64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    let mut value = bytes;
    let mut unit = 0;
    while value.abs() >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{:.0} {}", value, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
