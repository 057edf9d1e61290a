//! PostgreSQL-backed `SystemSettingsRepository` implementation using Diesel.
//!
//! Facility settings live in a single row maintained by admin tooling; this
//! adapter only reads it.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{SystemSettingsRepository, SystemSettingsRepositoryError};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::pool::{DbPool, PoolError};
use super::schema::system_settings;

/// Primary key of the single settings row.
const SETTINGS_ROW_ID: i32 = 1;

/// Diesel-backed implementation of the system settings port.
#[derive(Clone)]
pub struct DieselSettingsRepository {
    pool: DbPool,
}

impl DieselSettingsRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> SystemSettingsRepositoryError {
    map_basic_pool_error(error, |message| {
        SystemSettingsRepositoryError::connection(message)
    })
}

fn map_diesel_error(error: diesel::result::Error) -> SystemSettingsRepositoryError {
    map_basic_diesel_error(
        error,
        SystemSettingsRepositoryError::query,
        SystemSettingsRepositoryError::connection,
    )
}

#[async_trait]
impl SystemSettingsRepository for DieselSettingsRepository {
    async fn recurring_program_enabled(&self) -> Result<bool, SystemSettingsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // The migration seeds the row; a missing row means the schema was
        // tampered with, so fail loudly rather than guessing a default.
        system_settings::table
            .filter(system_settings::id.eq(SETTINGS_ROW_ID))
            .select(system_settings::recurring_program_enabled)
            .first::<bool>(&mut conn)
            .await
            .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::checkout("connection refused"));
        assert!(matches!(
            err,
            SystemSettingsRepositoryError::Connection { .. }
        ));
    }

    #[rstest]
    fn missing_row_is_a_query_error() {
        let err = map_diesel_error(diesel::result::Error::NotFound);
        assert!(matches!(err, SystemSettingsRepositoryError::Query { .. }));
    }
}
