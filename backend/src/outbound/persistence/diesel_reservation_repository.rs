//! PostgreSQL-backed `ReservationRepository` implementation using Diesel.
//!
//! The `(date, hour)` uniqueness constraint on the reservations table is the
//! authoritative double-booking detector. Multi-row submissions run inside a
//! single transaction so a conflict on any row rolls back the whole batch.

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{ReservationPersistenceError, ReservationRepository};
use crate::domain::reservation::NewReservation;
use crate::domain::user::UserId;

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::NewReservationRow;
use super::pool::{DbPool, PoolError};
use super::schema::reservations;

/// Diesel-backed implementation of the reservation repository port.
#[derive(Clone)]
pub struct DieselReservationRepository {
    pool: DbPool,
}

impl DieselReservationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ReservationPersistenceError {
    map_basic_pool_error(error, |message| {
        ReservationPersistenceError::connection(message)
    })
}

impl From<DieselError> for ReservationPersistenceError {
    fn from(error: DieselError) -> Self {
        map_basic_diesel_error(
            error,
            ReservationPersistenceError::query,
            ReservationPersistenceError::connection,
        )
    }
}

fn decode_hour(hour: i32) -> Result<u8, ReservationPersistenceError> {
    u8::try_from(hour)
        .map_err(|_| ReservationPersistenceError::query(format!("hour {hour} out of range")))
}

#[async_trait]
impl ReservationRepository for DieselReservationRepository {
    async fn insert_all(
        &self,
        batch: &[NewReservation],
    ) -> Result<Vec<Uuid>, ReservationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<NewReservationRow> = batch
            .iter()
            .map(|reservation| NewReservationRow {
                id: Uuid::new_v4(),
                user_id: *reservation.user_id.as_uuid(),
                date: reservation.slot.date,
                hour: i32::from(reservation.slot.hour),
            })
            .collect();

        conn.transaction::<Vec<Uuid>, ReservationPersistenceError, _>(|conn| {
            async move {
                let mut ids = Vec::with_capacity(rows.len());
                // Row-at-a-time so a unique violation names the losing slot.
                for row in rows {
                    match diesel::insert_into(reservations::table)
                        .values(&row)
                        .execute(conn)
                        .await
                    {
                        Ok(_) => ids.push(row.id),
                        Err(DieselError::DatabaseError(
                            DatabaseErrorKind::UniqueViolation,
                            _,
                        )) => {
                            return Err(ReservationPersistenceError::SlotTaken {
                                date: row.date,
                                hour: decode_hour(row.hour)?,
                            });
                        }
                        Err(other) => return Err(other.into()),
                    }
                }
                Ok(ids)
            }
            .scope_boxed()
        })
        .await
    }

    async fn reserved_hours(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<u8>, ReservationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let hours: Vec<i32> = reservations::table
            .filter(reservations::date.eq(date))
            .order(reservations::hour.asc())
            .select(reservations::hour)
            .load(&mut conn)
            .await?;

        hours.into_iter().map(decode_hour).collect()
    }

    async fn user_hours_on(
        &self,
        user_id: &UserId,
        date: NaiveDate,
    ) -> Result<Vec<u8>, ReservationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let hours: Vec<i32> = reservations::table
            .filter(
                reservations::user_id
                    .eq(user_id.as_uuid())
                    .and(reservations::date.eq(date)),
            )
            .order(reservations::hour.asc())
            .select(reservations::hour)
            .load(&mut conn)
            .await?;

        hours.into_iter().map(decode_hour).collect()
    }
}
