//! Analytics aggregation over crash reports, maintenance schedules, and
//! technicians.
//!
//! Every public operation degrades to its zero-valued default when the
//! backend misbehaves: dashboard widgets favor availability over
//! completeness, so failures are logged and swallowed here rather than
//! propagated to the page.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::{error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    domain::CrashStatus,
    entities::{crash_report, maintenance, technician, train},
    errors::ServiceError,
    reports::colors,
};

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyTrendPoint {
    pub month: String,
    pub total: i64,
    pub critical: i64,
    pub high: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopTrain {
    pub train_id: Uuid,
    pub train_code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub train_type: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: Uuid,
    pub name: String,
    pub expertise: String,
    pub total_assigned: i64,
    pub completed: i64,
    pub active: i64,
    pub performance_score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub title: String,
    pub date: DateTime<Utc>,
    pub urgency: String,
    pub status: String,
    pub train_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusSlice {
    pub name: String,
    pub value: i64,
    pub color: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSnapshot {
    pub total_reports: i64,
    pub critical_reports: i64,
    pub completed_reports: i64,
    pub maintenance_completed: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

/// One month-over-month comparison figure. Whether "up" is good is a
/// declared property of the metric, never inferred from the sign of the
/// delta.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonMetric {
    pub key: String,
    pub label: String,
    pub current: i64,
    pub previous: i64,
    pub delta_pct: i64,
    pub direction: TrendDirection,
    pub positive_is_up: bool,
    /// `None` when the value did not move.
    pub improved: Option<bool>,
}

/// Analytics service computing chart aggregates for the dashboard.
#[derive(Clone)]
pub struct AnalyticsService {
    db: Arc<DbPool>,
}

impl AnalyticsService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Crash reports bucketed into the last `months` calendar months,
    /// oldest bucket first.
    #[instrument(skip(self))]
    pub async fn monthly_trend(&self, months: u32) -> Vec<MonthlyTrendPoint> {
        match self.monthly_trend_inner(months).await {
            Ok(points) => points,
            Err(e) => {
                error!("monthly_trend failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn monthly_trend_inner(&self, months: u32) -> Result<Vec<MonthlyTrendPoint>, ServiceError> {
        let db = &*self.db;
        let now = Utc::now();

        let (start_year, start_month0) = months_back(now.year(), now.month0(), months.saturating_sub(1));
        let window_start = month_start(start_year, start_month0)?;

        let rows = crash_report::Entity::find()
            .filter(crash_report::Column::ReportedDate.gte(window_start))
            .order_by_asc(crash_report::Column::ReportedDate)
            .all(db)
            .await?;

        Ok(bucket_monthly(&rows, months, now))
    }

    /// Trains ranked by crash-report count. Reports whose train reference
    /// no longer resolves are skipped, not counted under an "unknown"
    /// bucket.
    #[instrument(skip(self))]
    pub async fn top_trains(&self, limit: usize) -> Vec<TopTrain> {
        match self.top_trains_inner(limit).await {
            Ok(items) => items,
            Err(e) => {
                error!("top_trains failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn top_trains_inner(&self, limit: usize) -> Result<Vec<TopTrain>, ServiceError> {
        let db = &*self.db;

        let reports = crash_report::Entity::find().all(db).await?;
        let trains: HashMap<Uuid, train::Model> = train::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        let mut order: Vec<Uuid> = Vec::new();
        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for report in &reports {
            if !trains.contains_key(&report.train_id) {
                continue;
            }
            let entry = counts.entry(report.train_id).or_insert(0);
            if *entry == 0 {
                order.push(report.train_id);
            }
            *entry += 1;
        }

        let mut items: Vec<TopTrain> = order
            .into_iter()
            .map(|train_id| {
                let t = &trains[&train_id];
                TopTrain {
                    train_id,
                    train_code: t.train_code.clone(),
                    name: t.name.clone(),
                    train_type: t.train_type.clone(),
                    count: counts[&train_id],
                }
            })
            .collect();

        items.sort_by(|a, b| b.count.cmp(&a.count));
        items.truncate(limit);
        Ok(items)
    }

    /// Technicians ranked by completion ratio. One count triple per
    /// technician; completion order does not affect the sorted result.
    #[instrument(skip(self))]
    pub async fn technician_leaderboard(&self, limit: usize) -> Vec<LeaderboardEntry> {
        match self.technician_leaderboard_inner(limit).await {
            Ok(entries) => entries,
            Err(e) => {
                error!("technician_leaderboard failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn technician_leaderboard_inner(
        &self,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        let db = &*self.db;
        let technicians = technician::Entity::find().all(db).await?;

        let mut entries = Vec::with_capacity(technicians.len());
        for tech in technicians {
            let total_assigned = crash_report::Entity::find()
                .filter(crash_report::Column::TechnicianId.eq(tech.id))
                .count(db)
                .await? as i64;

            let completed = crash_report::Entity::find()
                .filter(crash_report::Column::TechnicianId.eq(tech.id))
                .filter(crash_report::Column::Status.eq(CrashStatus::Finished.to_string()))
                .count(db)
                .await? as i64;

            let active = crash_report::Entity::find()
                .filter(crash_report::Column::TechnicianId.eq(tech.id))
                .filter(crash_report::Column::Status.is_in(["Open", "On Progress"]))
                .count(db)
                .await? as i64;

            entries.push(LeaderboardEntry {
                id: tech.id,
                name: tech.name,
                expertise: tech.expertise,
                total_assigned,
                completed,
                active,
                performance_score: performance_score(completed, total_assigned),
            });
        }

        entries.sort_by(|a, b| b.performance_score.cmp(&a.performance_score));
        entries.truncate(limit);
        Ok(entries)
    }

    /// Every maintenance record as a display event; date-range windowing is
    /// the calendar widget's concern.
    #[instrument(skip(self))]
    pub async fn maintenance_calendar(&self) -> Vec<CalendarEvent> {
        match self.maintenance_calendar_inner().await {
            Ok(events) => events,
            Err(e) => {
                error!("maintenance_calendar failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn maintenance_calendar_inner(&self) -> Result<Vec<CalendarEvent>, ServiceError> {
        let db = &*self.db;

        let records = maintenance::Entity::find()
            .order_by_asc(maintenance::Column::ScheduleDate)
            .all(db)
            .await?;
        let trains: HashMap<Uuid, String> = train::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|t| (t.id, t.train_code))
            .collect();

        Ok(records
            .into_iter()
            .map(|record| {
                let code = trains.get(&record.train_id).cloned();
                CalendarEvent {
                    id: record.id,
                    title: format!(
                        "{} – {}",
                        code.as_deref().unwrap_or("?"),
                        record.maintenance_type
                    ),
                    date: record.schedule_date,
                    urgency: record.urgency,
                    status: record.status,
                    train_code: code.unwrap_or_default(),
                }
            })
            .collect())
    }

    /// Crash-report counts per status with display colors; unknown status
    /// values keep their stored name and get the fallback color.
    #[instrument(skip(self))]
    pub async fn status_distribution(&self) -> Vec<StatusSlice> {
        match self.status_distribution_inner().await {
            Ok(slices) => slices,
            Err(e) => {
                error!("status_distribution failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn status_distribution_inner(&self) -> Result<Vec<StatusSlice>, ServiceError> {
        let db = &*self.db;
        let reports = crash_report::Entity::find().all(db).await?;

        let mut counts: HashMap<String, i64> = HashMap::new();
        for report in &reports {
            *counts.entry(report.status.clone()).or_insert(0) += 1;
        }

        let mut slices = Vec::new();
        for status in CrashStatus::iter() {
            let name = status.to_string();
            if let Some(value) = counts.remove(&name) {
                slices.push(StatusSlice {
                    color: colors::status_chart_color(&name).to_string(),
                    name,
                    value,
                });
            }
        }
        let mut unknown: Vec<(String, i64)> = counts.into_iter().collect();
        unknown.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, value) in unknown {
            slices.push(StatusSlice {
                color: colors::status_chart_color(&name).to_string(),
                name,
                value,
            });
        }

        Ok(slices)
    }

    /// Counts for one calendar month. `month0` is zero-based (0 = January),
    /// matching the dashboard's month arithmetic; the window is
    /// `[first of month, first of next month)`.
    #[instrument(skip(self))]
    pub async fn comparison_snapshot(&self, year: i32, month0: u32) -> ComparisonSnapshot {
        match self.comparison_snapshot_inner(year, month0).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("comparison_snapshot failed: {}", e);
                ComparisonSnapshot::default()
            }
        }
    }

    /// Current and previous calendar-month snapshots, derived from the
    /// clock.
    #[instrument(skip(self))]
    pub async fn month_over_month(&self) -> (ComparisonSnapshot, ComparisonSnapshot) {
        let now = Utc::now();
        let current = self.comparison_snapshot(now.year(), now.month0()).await;
        let (prev_year, prev_month0) = months_back(now.year(), now.month0(), 1);
        let previous = self.comparison_snapshot(prev_year, prev_month0).await;
        (current, previous)
    }

    async fn comparison_snapshot_inner(
        &self,
        year: i32,
        month0: u32,
    ) -> Result<ComparisonSnapshot, ServiceError> {
        let db = &*self.db;

        let first_day = month_start(year, month0)?;
        let (next_year, next_month0) = next_month(year, month0);
        let first_day_next = month_start(next_year, next_month0)?;

        let total_reports = crash_report::Entity::find()
            .filter(crash_report::Column::ReportedDate.gte(first_day))
            .filter(crash_report::Column::ReportedDate.lt(first_day_next))
            .count(db)
            .await? as i64;

        let critical_reports = crash_report::Entity::find()
            .filter(crash_report::Column::Severity.eq("Critical"))
            .filter(crash_report::Column::ReportedDate.gte(first_day))
            .filter(crash_report::Column::ReportedDate.lt(first_day_next))
            .count(db)
            .await? as i64;

        let completed_reports = crash_report::Entity::find()
            .filter(crash_report::Column::Status.eq("Finished"))
            .filter(crash_report::Column::ReportedDate.gte(first_day))
            .filter(crash_report::Column::ReportedDate.lt(first_day_next))
            .count(db)
            .await? as i64;

        let maintenance_completed = maintenance::Entity::find()
            .filter(maintenance::Column::Status.eq("Completed"))
            .filter(maintenance::Column::ScheduleDate.gte(first_day))
            .filter(maintenance::Column::ScheduleDate.lt(first_day_next))
            .count(db)
            .await? as i64;

        Ok(ComparisonSnapshot {
            total_reports,
            critical_reports,
            completed_reports,
            maintenance_completed,
        })
    }
}

/// Completion ratio as a whole percentage, `0` for an empty assignment set.
pub fn performance_score(completed: i64, total_assigned: i64) -> i64 {
    if total_assigned > 0 {
        ((completed as f64 / total_assigned as f64) * 100.0).round() as i64
    } else {
        0
    }
}

/// Month-over-month comparison figures with per-metric polarity.
pub fn comparison_metrics(
    current: &ComparisonSnapshot,
    previous: &ComparisonSnapshot,
) -> Vec<ComparisonMetric> {
    let defs: [(&str, &str, i64, i64, bool); 4] = [
        (
            "totalReports",
            "Total Laporan",
            current.total_reports,
            previous.total_reports,
            false,
        ),
        (
            "criticalReports",
            "Critical",
            current.critical_reports,
            previous.critical_reports,
            false,
        ),
        (
            "completedReports",
            "Selesai",
            current.completed_reports,
            previous.completed_reports,
            true,
        ),
        (
            "maintenanceCompleted",
            "Maintenance Done",
            current.maintenance_completed,
            previous.maintenance_completed,
            true,
        ),
    ];

    defs.into_iter()
        .map(|(key, label, cur, prev, positive_is_up)| {
            let diff = cur - prev;
            let direction = match diff {
                0 => TrendDirection::Flat,
                d if d > 0 => TrendDirection::Up,
                _ => TrendDirection::Down,
            };
            let delta_pct = if diff == 0 {
                0
            } else if prev != 0 {
                ((diff as f64 / prev as f64).abs() * 100.0).round() as i64
            } else {
                100
            };
            ComparisonMetric {
                key: key.to_string(),
                label: label.to_string(),
                current: cur,
                previous: prev,
                delta_pct,
                direction,
                positive_is_up,
                improved: if diff == 0 {
                    None
                } else {
                    Some(positive_is_up == (diff > 0))
                },
            }
        })
        .collect()
}

fn bucket_monthly(
    rows: &[crash_report::Model],
    months: u32,
    now: DateTime<Utc>,
) -> Vec<MonthlyTrendPoint> {
    let months = months.max(1);
    let mut buckets = Vec::with_capacity(months as usize);
    let mut index: HashMap<(i32, u32), usize> = HashMap::with_capacity(months as usize);

    for i in 0..months {
        let (year, month0) = months_back(now.year(), now.month0(), months - 1 - i);
        index.insert((year, month0), i as usize);
        buckets.push(MonthlyTrendPoint {
            month: MONTH_LABELS[month0 as usize].to_string(),
            total: 0,
            critical: 0,
            high: 0,
        });
    }

    for row in rows {
        let key = (row.reported_date.year(), row.reported_date.month0());
        let Some(&i) = index.get(&key) else {
            continue;
        };
        buckets[i].total += 1;
        if row.severity == "Critical" {
            buckets[i].critical += 1;
        }
        if row.severity == "High" {
            buckets[i].high += 1;
        }
    }

    buckets
}

fn months_back(year: i32, month0: u32, back: u32) -> (i32, u32) {
    let total = year * 12 + month0 as i32 - back as i32;
    (total.div_euclid(12), total.rem_euclid(12) as u32)
}

fn next_month(year: i32, month0: u32) -> (i32, u32) {
    if month0 >= 11 {
        (year + 1, 0)
    } else {
        (year, month0 + 1)
    }
}

fn month_start(year: i32, month0: u32) -> Result<DateTime<Utc>, ServiceError> {
    let date = NaiveDate::from_ymd_opt(year, month0 + 1, 1)
        .ok_or_else(|| ServiceError::InvalidInput(format!("invalid month index: {}", month0)))?;
    Ok(date.and_hms_opt(0, 0, 0).unwrap().and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn report(reported: DateTime<Utc>, severity: &str) -> crash_report::Model {
        crash_report::Model {
            id: Uuid::new_v4(),
            train_id: Uuid::new_v4(),
            technician_id: None,
            severity: severity.to_string(),
            status: "Open".to_string(),
            description: String::new(),
            photo_url: None,
            reported_date: reported,
            created_at: reported,
        }
    }

    #[test]
    fn buckets_cover_exactly_the_requested_months_oldest_first() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let buckets = bucket_monthly(&[], 6, now);

        let labels: Vec<&str> = buckets.iter().map(|b| b.month.as_str()).collect();
        assert_eq!(labels, vec!["Oct", "Nov", "Dec", "Jan", "Feb", "Mar"]);
        assert!(buckets.iter().all(|b| b.total == 0));
    }

    #[test]
    fn reports_land_in_their_calendar_month() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let rows = vec![
            report(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(), "Critical"),
            report(Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap(), "High"),
            report(Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap(), "Low"),
            // Outside the window: ignored.
            report(Utc.with_ymd_and_hms(2023, 9, 30, 0, 0, 0).unwrap(), "Critical"),
        ];

        let buckets = bucket_monthly(&rows, 2, now);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].month, "Feb");
        assert_eq!(buckets[0].total, 1);
        assert_eq!(buckets[0].critical, 0);
        assert_eq!(buckets[1].month, "Mar");
        assert_eq!(buckets[1].total, 2);
        assert_eq!(buckets[1].critical, 1);
        assert_eq!(buckets[1].high, 1);
        assert!(buckets[1].critical + buckets[1].high <= buckets[1].total);
    }

    #[test]
    fn month_window_wraps_across_year_boundaries() {
        assert_eq!(months_back(2024, 0, 1), (2023, 11));
        assert_eq!(months_back(2024, 2, 14), (2023, 0));
        assert_eq!(next_month(2024, 11), (2025, 0));
    }

    #[test]
    fn performance_score_is_clamped_and_zero_for_unassigned() {
        assert_eq!(performance_score(0, 0), 0);
        assert_eq!(performance_score(1, 3), 33);
        assert_eq!(performance_score(2, 3), 67);
        assert_eq!(performance_score(3, 3), 100);
    }

    #[test]
    fn comparison_metrics_declare_polarity() {
        let current = ComparisonSnapshot {
            total_reports: 10,
            critical_reports: 2,
            completed_reports: 8,
            maintenance_completed: 4,
        };
        let previous = ComparisonSnapshot {
            total_reports: 5,
            critical_reports: 4,
            completed_reports: 8,
            maintenance_completed: 0,
        };

        let metrics = comparison_metrics(&current, &previous);

        // More reports is bad, fewer criticals is good, flat stays neutral,
        // growth from zero pegs at 100%.
        assert_eq!(metrics[0].delta_pct, 100);
        assert_eq!(metrics[0].improved, Some(false));
        assert_eq!(metrics[1].delta_pct, 50);
        assert_eq!(metrics[1].improved, Some(true));
        assert_eq!(metrics[2].direction, TrendDirection::Flat);
        assert_eq!(metrics[2].improved, None);
        assert_eq!(metrics[3].delta_pct, 100);
        assert_eq!(metrics[3].improved, Some(true));
    }
}
