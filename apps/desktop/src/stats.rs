//! Read-only aggregates over a point snapshot for the statistics view.
//!
//! Built from whatever the model holds at switch time; never subscribed to
//! the stores, since the table presenter is destroyed while this is shown.

use std::collections::HashMap;

use chrono::Duration;
use client_core::StatLine;
use shared::domain::{EventKind, Point};

pub fn money_by_kind(points: &[Point]) -> Vec<(EventKind, u32)> {
    let mut totals: HashMap<EventKind, u32> = HashMap::new();
    for point in points {
        *totals.entry(point.kind).or_default() += point.base_price;
    }
    into_sorted(totals)
}

pub fn count_by_kind(points: &[Point]) -> Vec<(EventKind, usize)> {
    let mut counts: HashMap<EventKind, usize> = HashMap::new();
    for point in points {
        *counts.entry(point.kind).or_default() += 1;
    }
    into_sorted(counts)
}

pub fn time_by_kind(points: &[Point]) -> Vec<(EventKind, Duration)> {
    let mut totals: HashMap<EventKind, Duration> = HashMap::new();
    for point in points {
        let entry = totals.entry(point.kind).or_insert_with(Duration::zero);
        *entry = *entry + point.duration();
    }
    into_sorted(totals)
}

/// Largest first; equal values order by kind label so the listing is stable.
fn into_sorted<V: Ord + Copy>(totals: HashMap<EventKind, V>) -> Vec<(EventKind, V)> {
    let mut rows: Vec<(EventKind, V)> = totals.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.label().cmp(b.0.label())));
    rows
}

pub fn format_duration(duration: Duration) -> String {
    let minutes = duration.num_minutes();
    let (days, rest) = (minutes / (24 * 60), minutes % (24 * 60));
    let (hours, minutes) = (rest / 60, rest % 60);
    if days > 0 {
        format!("{days:02}D {hours:02}H {minutes:02}M")
    } else if hours > 0 {
        format!("{hours:02}H {minutes:02}M")
    } else {
        format!("{minutes:02}M")
    }
}

pub fn stat_lines(points: &[Point]) -> Vec<StatLine> {
    let mut lines = Vec::new();
    lines.push(StatLine {
        label: "MONEY".to_string(),
        value: String::new(),
    });
    for (kind, total) in money_by_kind(points) {
        lines.push(StatLine {
            label: format!("  {}", kind.label()),
            value: format!("{total}"),
        });
    }
    lines.push(StatLine {
        label: "TYPE".to_string(),
        value: String::new(),
    });
    for (kind, count) in count_by_kind(points) {
        lines.push(StatLine {
            label: format!("  {}", kind.label()),
            value: format!("{count}x"),
        });
    }
    lines.push(StatLine {
        label: "TIME".to_string(),
        value: String::new(),
    });
    for (kind, spent) in time_by_kind(points) {
        lines.push(StatLine {
            label: format!("  {}", kind.label()),
            value: format_duration(spent),
        });
    }
    lines
}
