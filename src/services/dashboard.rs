//! Headline dashboard aggregates. Same degrade-to-default policy as the
//! analytics service: a backend failure blanks the widget, not the page.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{crash_report, maintenance, train},
    errors::ServiceError,
};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Crash reports filed since the first of the current month.
    pub total_reports_this_month: i64,
    /// High or Critical reports still Open.
    pub severe_open: i64,
    /// Maintenance completed with a schedule date in the current month.
    pub maintenance_completed: i64,
    /// Distinct technicians on "On Progress" reports. Assigned-but-Open
    /// reports are deliberately not counted here; the technician stats
    /// endpoint uses the wider definition.
    pub active_technicians: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WeeklyBucket {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SeveritySlice {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecentIssue {
    pub id: Uuid,
    pub train_code: String,
    pub train_name: String,
    pub severity: String,
    pub status: String,
    pub reported_date: DateTime<Utc>,
}

#[derive(Clone)]
pub struct DashboardService {
    db: Arc<DbPool>,
}

impl DashboardService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn stats(&self) -> DashboardStats {
        match self.stats_inner().await {
            Ok(stats) => stats,
            Err(e) => {
                error!("dashboard stats failed: {}", e);
                DashboardStats::default()
            }
        }
    }

    async fn stats_inner(&self) -> Result<DashboardStats, ServiceError> {
        let db = &*self.db;
        let now = Utc::now();
        let first_of_month = now
            .date_naive()
            .with_day(1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();

        let total_reports_this_month = crash_report::Entity::find()
            .filter(crash_report::Column::ReportedDate.gte(first_of_month))
            .count(db)
            .await? as i64;

        let severe_open = crash_report::Entity::find()
            .filter(crash_report::Column::Severity.is_in(["High", "Critical"]))
            .filter(crash_report::Column::Status.eq("Open"))
            .count(db)
            .await? as i64;

        let maintenance_completed = maintenance::Entity::find()
            .filter(maintenance::Column::Status.eq("Completed"))
            .filter(maintenance::Column::ScheduleDate.gte(first_of_month))
            .count(db)
            .await? as i64;

        let in_progress = crash_report::Entity::find()
            .filter(crash_report::Column::Status.eq("On Progress"))
            .filter(crash_report::Column::TechnicianId.is_not_null())
            .all(db)
            .await?;
        let active_technicians = in_progress
            .iter()
            .filter_map(|r| r.technician_id)
            .collect::<HashSet<Uuid>>()
            .len() as i64;

        Ok(DashboardStats {
            total_reports_this_month,
            severe_open,
            maintenance_completed,
            active_technicians,
        })
    }

    /// Reports filed in the last 28 days, bucketed into 7-day windows from
    /// the range start. Only buckets with data are returned.
    #[instrument(skip(self))]
    pub async fn weekly_reports(&self) -> Vec<WeeklyBucket> {
        match self.weekly_reports_inner().await {
            Ok(buckets) => buckets,
            Err(e) => {
                error!("weekly_reports failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn weekly_reports_inner(&self) -> Result<Vec<WeeklyBucket>, ServiceError> {
        let db = &*self.db;
        let start = Utc::now() - Duration::days(28);

        let rows = crash_report::Entity::find()
            .filter(crash_report::Column::ReportedDate.gte(start))
            .order_by_asc(crash_report::Column::ReportedDate)
            .all(db)
            .await?;

        let mut counts: HashMap<i64, i64> = HashMap::new();
        for row in &rows {
            let week = (row.reported_date - start).num_days() / 7;
            *counts.entry(week).or_insert(0) += 1;
        }

        let mut weeks: Vec<i64> = counts.keys().copied().collect();
        weeks.sort_unstable();

        Ok(weeks
            .into_iter()
            .map(|week| WeeklyBucket {
                name: format!("Week {}", week + 1),
                value: counts[&week],
            })
            .collect())
    }

    /// Crash-report counts per severity value, for the category pie.
    #[instrument(skip(self))]
    pub async fn severity_distribution(&self) -> Vec<SeveritySlice> {
        match self.severity_distribution_inner().await {
            Ok(slices) => slices,
            Err(e) => {
                error!("severity_distribution failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn severity_distribution_inner(&self) -> Result<Vec<SeveritySlice>, ServiceError> {
        let db = &*self.db;
        let reports = crash_report::Entity::find().all(db).await?;

        let mut counts: HashMap<String, i64> = HashMap::new();
        for report in &reports {
            *counts.entry(report.severity.clone()).or_insert(0) += 1;
        }

        let mut slices: Vec<SeveritySlice> = counts
            .into_iter()
            .map(|(name, value)| SeveritySlice { name, value })
            .collect();
        slices.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(slices)
    }

    /// Most recent reports with their train summary; placeholders stand in
    /// for unresolvable trains.
    #[instrument(skip(self))]
    pub async fn recent_issues(&self, limit: u64) -> Vec<RecentIssue> {
        match self.recent_issues_inner(limit).await {
            Ok(issues) => issues,
            Err(e) => {
                error!("recent_issues failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn recent_issues_inner(&self, limit: u64) -> Result<Vec<RecentIssue>, ServiceError> {
        let db = &*self.db;

        let reports = crash_report::Entity::find()
            .order_by_desc(crash_report::Column::ReportedDate)
            .limit(limit)
            .all(db)
            .await?;
        let trains: HashMap<Uuid, train::Model> = train::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        Ok(reports
            .into_iter()
            .map(|report| {
                let t = trains.get(&report.train_id);
                RecentIssue {
                    id: report.id,
                    train_code: t.map(|t| t.train_code.clone()).unwrap_or_else(|| "N/A".into()),
                    train_name: t.map(|t| t.name.clone()).unwrap_or_else(|| "Unknown".into()),
                    severity: report.severity,
                    status: report.status,
                    reported_date: report.reported_date,
                }
            })
            .collect())
    }
}
