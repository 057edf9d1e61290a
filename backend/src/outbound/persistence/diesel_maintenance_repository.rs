//! PostgreSQL-backed `MaintenanceSlotRepository` implementation using Diesel.

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::blackout::{BlackoutSlot, BlackoutSource};
use crate::domain::ports::{MaintenanceSlotRepository, MaintenanceSlotRepositoryError};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::MaintenanceSlotRow;
use super::pool::{DbPool, PoolError};
use super::schema::maintenance_slots;

/// Diesel-backed implementation of the maintenance slot port.
#[derive(Clone)]
pub struct DieselMaintenanceRepository {
    pool: DbPool,
}

impl DieselMaintenanceRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> MaintenanceSlotRepositoryError {
    map_basic_pool_error(error, |message| {
        MaintenanceSlotRepositoryError::connection(message)
    })
}

fn map_diesel_error(error: diesel::result::Error) -> MaintenanceSlotRepositoryError {
    map_basic_diesel_error(
        error,
        MaintenanceSlotRepositoryError::query,
        MaintenanceSlotRepositoryError::connection,
    )
}

fn row_to_blackout(row: MaintenanceSlotRow) -> Result<BlackoutSlot, MaintenanceSlotRepositoryError> {
    let hour = u8::try_from(row.hour).map_err(|_| {
        MaintenanceSlotRepositoryError::query(format!("hour {} out of range", row.hour))
    })?;
    Ok(BlackoutSlot {
        date: row.date,
        hour,
        reason: row.reason,
        source: BlackoutSource::Maintenance,
    })
}

#[async_trait]
impl MaintenanceSlotRepository for DieselMaintenanceRepository {
    async fn slots_for(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<BlackoutSlot>, MaintenanceSlotRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<MaintenanceSlotRow> = maintenance_slots::table
            .filter(maintenance_slots::date.eq(date))
            .order(maintenance_slots::hour.asc())
            .select(MaintenanceSlotRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_blackout).collect()
    }
}
