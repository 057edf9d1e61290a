//! Diesel row models mirroring the persisted schema.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{maintenance_slots, reservations, system_settings, users};

/// A persisted user row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub credits: i32,
    pub is_vip: bool,
    pub is_active: bool,
    pub first_login_completed: bool,
    pub created_at: DateTime<Utc>,
}

/// A persisted reservation row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = reservations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReservationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub hour: i32,
    pub created_at: DateTime<Utc>,
}

/// Insertable reservation row; `created_at` defaults at the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reservations)]
pub struct NewReservationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub hour: i32,
}

/// A scheduled maintenance block.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = maintenance_slots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MaintenanceSlotRow {
    pub id: Uuid,
    pub date: NaiveDate,
    pub hour: i32,
    pub reason: String,
}

/// The single facility settings row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = system_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SystemSettingsRow {
    pub id: i32,
    pub recurring_program_enabled: bool,
}
