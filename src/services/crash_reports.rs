//! Crash report CRUD and filtered, denormalized listings.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    domain::{CrashStatus, Severity},
    entities::{crash_report, technician, train},
    errors::ServiceError,
    events::{Event, EventSender},
    reports::parse_date_bound,
    services::{TechnicianSummary, TrainSummary},
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CrashReportWithDetails {
    #[serde(flatten)]
    pub report: crash_report::Model,
    pub trains: Option<TrainSummary>,
    pub technicians: Option<TechnicianSummary>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct CrashReportFilters {
    /// Matched against train code, train name, and description.
    pub search: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCrashReport {
    pub train_id: Uuid,
    pub technician_id: Option<Uuid>,
    pub severity: Severity,
    pub status: CrashStatus,
    #[validate(length(min = 1))]
    pub description: String,
    pub photo_url: Option<String>,
    pub reported_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateCrashReport {
    pub train_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
    pub severity: Option<Severity>,
    pub status: Option<CrashStatus>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub reported_date: Option<DateTime<Utc>>,
}

/// Service for crash report lifecycle and listings.
#[derive(Clone)]
pub struct CrashReportService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl CrashReportService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            warn!("event delivery failed: {}", e);
        }
    }

    /// Filtered listing, newest first, with related train and technician
    /// summaries. Free-text search is applied in memory over the joined
    /// fields.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filters: &CrashReportFilters,
    ) -> Result<Vec<CrashReportWithDetails>, ServiceError> {
        let db = &*self.db;

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

        let mut items: Vec<CrashReportWithDetails> = reports
            .into_iter()
            .map(|report| denormalize(report, &trains, &technicians))
            .collect();

        if let Some(search) = &filters.search {
            let needle = search.to_lowercase();
            items.retain(|item| {
                item.trains
                    .as_ref()
                    .is_some_and(|t| t.train_code.to_lowercase().contains(&needle))
                    || item
                        .trains
                        .as_ref()
                        .is_some_and(|t| t.name.to_lowercase().contains(&needle))
                    || item.report.description.to_lowercase().contains(&needle)
            });
        }

        Ok(items)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<CrashReportWithDetails, ServiceError> {
        let db = &*self.db;
        let report = crash_report::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("crash report {}", id)))?;

        let train = train::Entity::find_by_id(report.train_id).one(db).await?;
        let tech = match report.technician_id {
            Some(tech_id) => technician::Entity::find_by_id(tech_id).one(db).await?,
            None => None,
        };

        Ok(CrashReportWithDetails {
            trains: train.map(|t| TrainSummary {
                train_code: t.train_code,
                name: t.name,
                train_type: t.train_type,
            }),
            technicians: tech.map(|t| TechnicianSummary {
                name: t.name,
                expertise: t.expertise,
                contact: t.contact,
            }),
            report,
        })
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: CreateCrashReport) -> Result<crash_report::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        train::Entity::find_by_id(input.train_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("train {}", input.train_id)))?;
        if let Some(tech_id) = input.technician_id {
            technician::Entity::find_by_id(tech_id)
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("technician {}", tech_id)))?;
        }

        let model = crash_report::ActiveModel {
            id: Set(Uuid::new_v4()),
            train_id: Set(input.train_id),
            technician_id: Set(input.technician_id),
            severity: Set(input.severity.to_string()),
            status: Set(input.status.to_string()),
            description: Set(input.description),
            photo_url: Set(input.photo_url),
            reported_date: Set(input.reported_date),
            created_at: Set(Utc::now()),
        };
        let report = model.insert(db).await?;

        self.emit(Event::ReportCreated {
            report_id: report.id,
            train_id: report.train_id,
            severity: report.severity.clone(),
        })
        .await;
        if let Some(tech_id) = report.technician_id {
            self.emit(Event::ReportAssigned {
                report_id: report.id,
                technician_id: tech_id,
            })
            .await;
        }

        Ok(report)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateCrashReport,
    ) -> Result<crash_report::Model, ServiceError> {
        let db = &*self.db;
        let existing = crash_report::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("crash report {}", id)))?;

        let old_status = existing.status.clone();
        let old_technician = existing.technician_id;

        let mut model: crash_report::ActiveModel = existing.into();
        if let Some(train_id) = input.train_id {
            train::Entity::find_by_id(train_id)
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("train {}", train_id)))?;
            model.train_id = Set(train_id);
        }
        if let Some(tech_id) = input.technician_id {
            technician::Entity::find_by_id(tech_id)
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("technician {}", tech_id)))?;
            model.technician_id = Set(Some(tech_id));
        }
        if let Some(severity) = input.severity {
            model.severity = Set(severity.to_string());
        }
        if let Some(status) = input.status {
            model.status = Set(status.to_string());
        }
        if let Some(description) = input.description {
            if description.is_empty() {
                return Err(ServiceError::ValidationError(
                    "description must not be empty".to_string(),
                ));
            }
            model.description = Set(description);
        }
        if let Some(photo_url) = input.photo_url {
            model.photo_url = Set(Some(photo_url));
        }
        if let Some(reported_date) = input.reported_date {
            model.reported_date = Set(reported_date);
        }

        let updated = model.update(db).await?;

        self.emit(Event::ReportUpdated { report_id: updated.id }).await;
        if updated.status != old_status {
            self.emit(Event::ReportStatusChanged {
                report_id: updated.id,
                old_status,
                new_status: updated.status.clone(),
            })
            .await;
        }
        if let Some(tech_id) = updated.technician_id {
            if old_technician != Some(tech_id) {
                self.emit(Event::ReportAssigned {
                    report_id: updated.id,
                    technician_id: tech_id,
                })
                .await;
            }
        }

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;
        let result = crash_report::Entity::delete_by_id(id).exec(db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("crash report {}", id)));
        }

        self.emit(Event::ReportDeleted { report_id: id }).await;
        Ok(())
    }
}

fn denormalize(
    report: crash_report::Model,
    trains: &HashMap<Uuid, train::Model>,
    technicians: &HashMap<Uuid, technician::Model>,
) -> CrashReportWithDetails {
    let train = trains.get(&report.train_id);
    let tech = report.technician_id.and_then(|id| technicians.get(&id));
    CrashReportWithDetails {
        trains: train.map(|t| TrainSummary {
            train_code: t.train_code.clone(),
            name: t.name.clone(),
            train_type: t.train_type.clone(),
        }),
        technicians: tech.map(|t| TechnicianSummary {
            name: t.name.clone(),
            expertise: t.expertise.clone(),
            contact: t.contact.clone(),
        }),
        report,
    }
}
