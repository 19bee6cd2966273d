//! Crash-report export pipeline: one filtered, denormalized row fetch
//! feeding two independent encoders (workbook and paginated document).

pub mod colors;
pub mod excel;
pub mod pdf;

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use strum::IntoEnumIterator;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    domain::{CrashStatus, Severity},
    entities::{crash_report, technician, train},
    errors::ServiceError,
};

/// Filters accepted by the export endpoints (camelCase keys on the wire).
/// Dates accept RFC 3339 timestamps or plain `YYYY-MM-DD` dates.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportFilters {
    pub severity: Option<String>,
    pub status: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub train_id: Option<Uuid>,
}

/// One denormalized crash-report row as both encoders consume it. Missing
/// related entities stay `None` and render as placeholders.
#[derive(Debug, Clone)]
pub struct CrashReportRow {
    pub id: Uuid,
    pub train_code: Option<String>,
    pub train_name: Option<String>,
    pub train_type: Option<String>,
    pub severity: String,
    pub status: String,
    pub description: String,
    pub technician_name: Option<String>,
    pub technician_expertise: Option<String>,
    pub reported_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

pub(crate) fn parse_date_bound(raw: &str) -> Result<DateTime<Utc>, ServiceError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.and_hms_opt(0, 0, 0).unwrap().and_utc())
        .map_err(|_| ServiceError::InvalidInput(format!("invalid date filter: {}", raw)))
}

/// Fetch the filtered row set, newest first, joined with train and
/// technician summaries. Both encoders must see the same rows in the same
/// order.
pub async fn fetch_filtered(
    db: &DbPool,
    filters: &ReportFilters,
) -> Result<Vec<CrashReportRow>, ServiceError> {
    let mut query = crash_report::Entity::find()
        .order_by_desc(crash_report::Column::ReportedDate);

    if let Some(severity) = &filters.severity {
        query = query.filter(crash_report::Column::Severity.eq(severity.clone()));
    }
    if let Some(status) = &filters.status {
        query = query.filter(crash_report::Column::Status.eq(status.clone()));
    }
    if let Some(raw) = &filters.date_from {
        query = query.filter(crash_report::Column::ReportedDate.gte(parse_date_bound(raw)?));
    }
    if let Some(raw) = &filters.date_to {
        query = query.filter(crash_report::Column::ReportedDate.lte(parse_date_bound(raw)?));
    }
    if let Some(train_id) = filters.train_id {
        query = query.filter(crash_report::Column::TrainId.eq(train_id));
    }

    let reports = query.all(db).await?;
    let trains: HashMap<Uuid, train::Model> = train::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();
    let technicians: HashMap<Uuid, technician::Model> = technician::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    Ok(reports
        .into_iter()
        .map(|report| {
            let train = trains.get(&report.train_id);
            let tech = report.technician_id.and_then(|id| technicians.get(&id));
            CrashReportRow {
                id: report.id,
                train_code: train.map(|t| t.train_code.clone()),
                train_name: train.map(|t| t.name.clone()),
                train_type: train.map(|t| t.train_type.clone()),
                severity: report.severity,
                status: report.status,
                description: report.description,
                technician_name: tech.map(|t| t.name.clone()),
                technician_expertise: tech.map(|t| t.expertise.clone()),
                reported_date: report.reported_date,
                created_at: report.created_at,
            }
        })
        .collect())
}

/// Counts per severity: the four known values always present (in ascending
/// urgency), any unrecognized stored value appended in first-seen order.
pub fn severity_counts(rows: &[CrashReportRow]) -> Vec<(String, i64)> {
    let mut counts: Vec<(String, i64)> = Severity::iter().map(|s| (s.to_string(), 0)).collect();
    tally(&mut counts, rows.iter().map(|r| r.severity.as_str()));
    counts
}

/// Counts per status: the three known values always present, unrecognized
/// values appended in first-seen order.
pub fn status_counts(rows: &[CrashReportRow]) -> Vec<(String, i64)> {
    let mut counts: Vec<(String, i64)> = CrashStatus::iter().map(|s| (s.to_string(), 0)).collect();
    tally(&mut counts, rows.iter().map(|r| r.status.as_str()));
    counts
}

fn tally<'a>(counts: &mut Vec<(String, i64)>, values: impl Iterator<Item = &'a str>) {
    for value in values {
        match counts.iter_mut().find(|(name, _)| name == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value.to_string(), 1)),
        }
    }
}

/// Formats used by both encoders for the two timestamp renderings.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H.%M.%S";
pub const SHORT_DATE_FORMAT: &str = "%d/%m/%Y";

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(severity: &str, status: &str) -> CrashReportRow {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        CrashReportRow {
            id: Uuid::new_v4(),
            train_code: None,
            train_name: None,
            train_type: None,
            severity: severity.to_string(),
            status: status.to_string(),
            description: String::new(),
            technician_name: None,
            technician_expertise: None,
            reported_date: ts,
            created_at: ts,
        }
    }

    #[test]
    fn severity_counts_always_list_all_four() {
        let counts = severity_counts(&[row("Critical", "Open"), row("Low", "Finished")]);
        assert_eq!(
            counts,
            vec![
                ("Low".to_string(), 1),
                ("Medium".to_string(), 0),
                ("High".to_string(), 0),
                ("Critical".to_string(), 1),
            ]
        );
    }

    #[test]
    fn status_counts_keep_unknown_values() {
        let counts = status_counts(&[row("Low", "Open"), row("Low", "Archived")]);
        assert_eq!(
            counts,
            vec![
                ("Open".to_string(), 1),
                ("On Progress".to_string(), 0),
                ("Finished".to_string(), 0),
                ("Archived".to_string(), 1),
            ]
        );
    }

    #[test]
    fn date_bounds_accept_both_wire_shapes() {
        assert_eq!(
            parse_date_bound("2024-03-01").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_date_bound("2024-03-01T10:15:00Z").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap()
        );
        assert!(parse_date_bound("yesterday").is_err());
    }
}
