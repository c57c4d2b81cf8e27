//! Sort comparators and filter predicates over points.
//!
//! Pure functions; the presenter derives the visible list by filtering and
//! then sorting on demand. Every comparator tie-breaks on the point id so
//! equal keys order deterministically.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use shared::domain::{FilterKind, Point, SortKind};

pub fn compare(sort: SortKind, a: &Point, b: &Point) -> Ordering {
    let primary = match sort {
        SortKind::Day => a.date_from.cmp(&b.date_from),
        SortKind::Time => b.duration().cmp(&a.duration()),
        SortKind::Price => b.base_price.cmp(&a.base_price),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

pub fn matches_filter(filter: FilterKind, now: DateTime<Utc>, point: &Point) -> bool {
    // A point spanning "now" counts as both future and past.
    let spans_now = point.date_from < now && point.date_to > now;
    match filter {
        FilterKind::Everything => true,
        FilterKind::Future => point.date_from >= now || spans_now,
        FilterKind::Past => point.date_to < now || spans_now,
    }
}

pub fn filter_points(filter: FilterKind, now: DateTime<Utc>, points: &[Point]) -> Vec<Point> {
    points
        .iter()
        .filter(|point| matches_filter(filter, now, point))
        .cloned()
        .collect()
}

#[cfg(test)]
#[path = "tests/policy_tests.rs"]
mod tests;
