use super::*;

use chrono::Duration;
use shared::domain::PointId;

use crate::test_support::sample_point;

#[test]
fn day_sort_orders_by_start_time_ascending() {
    let mut points = vec![
        sample_point("late", 20, 2, 100),
        sample_point("early", 10, 2, 100),
        sample_point("middle", 15, 2, 100),
    ];
    points.sort_by(|a, b| compare(SortKind::Day, a, b));
    let ids: Vec<_> = points.iter().map(|p| p.id.0.as_str()).collect();
    assert_eq!(ids, ["early", "middle", "late"]);
}

#[test]
fn time_sort_orders_by_duration_descending() {
    let mut points = vec![
        sample_point("short", 10, 1, 100),
        sample_point("long", 20, 9, 100),
        sample_point("medium", 15, 4, 100),
    ];
    points.sort_by(|a, b| compare(SortKind::Time, a, b));
    let ids: Vec<_> = points.iter().map(|p| p.id.0.as_str()).collect();
    assert_eq!(ids, ["long", "medium", "short"]);
}

#[test]
fn price_sort_orders_by_base_price_descending() {
    let mut points = vec![
        sample_point("cheap", 10, 2, 20),
        sample_point("dear", 10, 2, 900),
        sample_point("fair", 10, 2, 300),
    ];
    points.sort_by(|a, b| compare(SortKind::Price, a, b));
    let ids: Vec<_> = points.iter().map(|p| p.id.0.as_str()).collect();
    assert_eq!(ids, ["dear", "fair", "cheap"]);
}

#[test]
fn equal_keys_fall_back_to_id_order() {
    // Same start, same duration, same price: only the id can decide.
    let a = sample_point("a", 10, 2, 100);
    let b = sample_point("b", 10, 2, 100);
    for sort in [SortKind::Day, SortKind::Time, SortKind::Price] {
        assert_eq!(compare(sort, &a, &b), Ordering::Less);
        assert_eq!(compare(sort, &b, &a), Ordering::Greater);
    }
}

#[test]
fn everything_keeps_every_point() {
    let now = Utc::now();
    let points = vec![sample_point("a", 10, 2, 100), sample_point("b", 20, 2, 100)];
    assert_eq!(filter_points(FilterKind::Everything, now, &points).len(), 2);
}

#[test]
fn future_and_past_split_around_now() {
    let now = Utc::now();
    let mut past = sample_point("past", 10, 2, 100);
    past.date_from = now - Duration::days(3);
    past.date_to = now - Duration::days(2);
    let mut future = sample_point("future", 10, 2, 100);
    future.date_from = now + Duration::days(2);
    future.date_to = now + Duration::days(3);
    let points = vec![past, future];

    let future_ids: Vec<_> = filter_points(FilterKind::Future, now, &points)
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(future_ids, vec![PointId::new("future")]);

    let past_ids: Vec<_> = filter_points(FilterKind::Past, now, &points)
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(past_ids, vec![PointId::new("past")]);
}

#[test]
fn a_point_spanning_now_is_both_future_and_past() {
    let now = Utc::now();
    let mut spanning = sample_point("spanning", 10, 2, 100);
    spanning.date_from = now - Duration::hours(1);
    spanning.date_to = now + Duration::hours(1);
    assert!(matches_filter(FilterKind::Future, now, &spanning));
    assert!(matches_filter(FilterKind::Past, now, &spanning));
}

#[test]
fn filtering_preserves_relative_sorted_order() {
    // Sorting then filtering must give a subsequence of the full sorted
    // order, for every filter and sort combination.
    let now = Utc::now();
    let mut points = Vec::new();
    for (index, offset) in [-5i64, -3, -1, 2, 4].iter().enumerate() {
        let mut point = sample_point(&format!("p{index}"), 10, 2, 50 * (index as u32 + 1));
        point.date_from = now + Duration::days(*offset);
        point.date_to = point.date_from + Duration::hours(3);
        points.push(point);
    }

    for sort in [SortKind::Day, SortKind::Time, SortKind::Price] {
        let mut full = points.clone();
        full.sort_by(|a, b| compare(sort, a, b));
        let full_ids: Vec<_> = full.iter().map(|p| p.id.clone()).collect();

        for filter in [FilterKind::Everything, FilterKind::Future, FilterKind::Past] {
            let mut subset = filter_points(filter, now, &points);
            subset.sort_by(|a, b| compare(sort, a, b));
            let mut cursor = full_ids.iter();
            for point in &subset {
                assert!(
                    cursor.any(|id| *id == point.id),
                    "{:?}/{:?}: {} out of order",
                    filter,
                    sort,
                    point.id
                );
            }
        }
    }
}
