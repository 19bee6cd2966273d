//! Comparison snapshot windowing and dashboard statistics.

mod common;

use chrono::{Duration, TimeZone, Utc};
use common::*;

#[tokio::test]
async fn comparison_snapshot_uses_half_open_month_window() {
    let app = TestApp::new().await;
    let train = insert_train(&app.state, "KRL-01", "Commuter 01", "KRL").await;

    // month0 = 2 means March.
    let first_included = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let last_included = Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap();
    let excluded_next = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
    let excluded_prev = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();

    insert_report(&app.state, train, None, "Critical", "Open", first_included).await;
    insert_report(&app.state, train, None, "Low", "Finished", last_included).await;
    insert_report(&app.state, train, None, "Critical", "Open", excluded_next).await;
    insert_report(&app.state, train, None, "Low", "Open", excluded_prev).await;

    insert_maintenance(&app.state, train, "Brake check", "High", "Completed", first_included).await;
    insert_maintenance(&app.state, train, "Oil change", "Low", "Pending", first_included).await;
    insert_maintenance(&app.state, train, "Bogie check", "Low", "Completed", excluded_next).await;

    let snapshot = app.state.services.analytics.comparison_snapshot(2024, 2).await;

    assert_eq!(snapshot.total_reports, 2);
    assert_eq!(snapshot.critical_reports, 1);
    assert_eq!(snapshot.completed_reports, 1);
    assert_eq!(snapshot.maintenance_completed, 1);
}

#[tokio::test]
async fn comparison_snapshot_wraps_december() {
    let app = TestApp::new().await;
    let train = insert_train(&app.state, "KRL-01", "Commuter 01", "KRL").await;

    insert_report(
        &app.state,
        train,
        None,
        "Low",
        "Open",
        Utc.with_ymd_and_hms(2023, 12, 20, 10, 0, 0).unwrap(),
    )
    .await;
    insert_report(
        &app.state,
        train,
        None,
        "Low",
        "Open",
        Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap(),
    )
    .await;

    // month0 = 11 means December 2023 only.
    let snapshot = app.state.services.analytics.comparison_snapshot(2023, 11).await;
    assert_eq!(snapshot.total_reports, 1);
}

#[tokio::test]
async fn invalid_month_degrades_to_zeroed_snapshot() {
    let app = TestApp::new().await;
    let snapshot = app.state.services.analytics.comparison_snapshot(2024, 99).await;
    assert_eq!(snapshot.total_reports, 0);
    assert_eq!(snapshot.maintenance_completed, 0);
}

#[tokio::test]
async fn dashboard_stats_count_the_current_month_and_open_severe_reports() {
    let app = TestApp::new().await;
    let train = insert_train(&app.state, "KRL-01", "Commuter 01", "KRL").await;
    let tech = insert_technician(&app.state, "Ayu", "Electrical").await;
    let other_tech = insert_technician(&app.state, "Budi", "Mechanical").await;

    let now = Utc::now();
    let last_month = middle_of_previous_month();

    // Two reports this month, one of them severe and open.
    insert_report(&app.state, train, None, "High", "Open", now).await;
    insert_report(&app.state, train, None, "Low", "Finished", now).await;
    // A severe open report from last month still counts as severe/open.
    insert_report(&app.state, train, None, "Critical", "Open", last_month).await;

    // Active technicians: only "On Progress" assignments count, and the set
    // is distinct per technician.
    insert_report(&app.state, train, Some(tech), "Medium", "On Progress", now).await;
    insert_report(&app.state, train, Some(tech), "Medium", "On Progress", now).await;
    insert_report(&app.state, train, Some(other_tech), "Medium", "Open", now).await;

    insert_maintenance(&app.state, train, "Brake check", "High", "Completed", now).await;
    insert_maintenance(&app.state, train, "Oil change", "Low", "Completed", last_month).await;

    let stats = app.state.services.dashboard.stats().await;

    assert_eq!(stats.total_reports_this_month, 5);
    assert_eq!(stats.severe_open, 2);
    assert_eq!(stats.maintenance_completed, 1);
    assert_eq!(stats.active_technicians, 1);
}

#[tokio::test]
async fn technician_stats_use_the_wider_active_definition() {
    let app = TestApp::new().await;
    let train = insert_train(&app.state, "KRL-01", "Commuter 01", "KRL").await;
    let tech = insert_technician(&app.state, "Ayu", "Electrical").await;
    let other_tech = insert_technician(&app.state, "Budi", "Mechanical").await;

    let now = Utc::now();
    insert_report(&app.state, train, Some(tech), "Medium", "On Progress", now).await;
    insert_report(&app.state, train, Some(other_tech), "Medium", "Open", now).await;
    insert_report(&app.state, train, Some(other_tech), "Low", "Finished", now).await;

    // The dashboard figure excludes Open assignments; the technician
    // overview includes them.
    let dashboard = app.state.services.dashboard.stats().await;
    assert_eq!(dashboard.active_technicians, 1);

    let overview = app.state.services.technicians.stats().await.unwrap();
    assert_eq!(overview.total_technicians, 2);
    assert_eq!(overview.active_technicians, 2);
    assert_eq!(overview.total_assigned, 3);
    assert_eq!(overview.completed_reports, 1);
}

#[tokio::test]
async fn weekly_buckets_cover_only_weeks_with_data() {
    let app = TestApp::new().await;
    let train = insert_train(&app.state, "KRL-01", "Commuter 01", "KRL").await;

    let now = Utc::now();
    insert_report(&app.state, train, None, "Low", "Open", now - Duration::days(2)).await;
    insert_report(&app.state, train, None, "Low", "Open", now - Duration::days(2)).await;
    insert_report(&app.state, train, None, "Low", "Open", now - Duration::days(10)).await;
    // Outside the 28-day range.
    insert_report(&app.state, train, None, "Low", "Open", now - Duration::days(40)).await;

    let buckets = app.state.services.dashboard.weekly_reports().await;

    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].name, "Week 3");
    assert_eq!(buckets[0].value, 1);
    assert_eq!(buckets[1].name, "Week 4");
    assert_eq!(buckets[1].value, 2);
}

#[tokio::test]
async fn recent_issues_join_trains_and_order_newest_first() {
    let app = TestApp::new().await;
    let train = insert_train(&app.state, "KRL-01", "Commuter 01", "KRL").await;
    let doomed = insert_train(&app.state, "KRL-02", "Commuter 02", "KRL").await;

    let now = Utc::now();
    insert_report(&app.state, train, None, "Low", "Open", now - Duration::hours(2)).await;
    let newest = insert_report(&app.state, doomed, None, "High", "Open", now).await;
    delete_train_row(&app.state, doomed).await;

    let issues = app.state.services.dashboard.recent_issues(5).await;

    assert_eq!(issues.len(), 2);
    assert_eq!(issues[0].id, newest);
    assert_eq!(issues[0].train_code, "N/A");
    assert_eq!(issues[0].train_name, "Unknown");
    assert_eq!(issues[1].train_code, "KRL-01");
}
