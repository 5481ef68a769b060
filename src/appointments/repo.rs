use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::RepoResult;

/// A viewing request. `appointment_date` is kept exactly as the client sent it.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Appointment {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "user", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(rename = "propertyId")]
    pub property_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub mobile: String,
    #[serde(rename = "appointmentDate")]
    pub appointment_date: String,
    #[serde(rename = "date", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub user_id: Option<Uuid>,
    pub property_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub appointment_date: String,
}

#[async_trait]
pub trait AppointmentRepo: Send + Sync {
    async fn insert(&self, appt: NewAppointment) -> RepoResult<Appointment>;
}

#[derive(Clone)]
pub struct PgAppointmentRepo {
    db: PgPool,
}

impl PgAppointmentRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AppointmentRepo for PgAppointmentRepo {
    async fn insert(&self, appt: NewAppointment) -> RepoResult<Appointment> {
        let row = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (id, user_id, property_id, name, email, mobile, appointment_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, property_id, name, email, mobile, appointment_date, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(appt.user_id)
        .bind(appt.property_id)
        .bind(&appt.name)
        .bind(&appt.email)
        .bind(&appt.mobile)
        .bind(&appt.appointment_date)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }
}
