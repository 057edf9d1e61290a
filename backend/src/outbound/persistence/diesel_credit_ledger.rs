//! PostgreSQL-backed `CreditLedger` implementation using Diesel.
//!
//! The debit is a single conditional `UPDATE ... WHERE credits >= amount`
//! evaluated by the storage engine, so two concurrent submissions by the
//! same user can never both spend the last credit. The `credits >= 0`
//! check constraint backstops the refund path.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{CreditLedger, LedgerError};
use crate::domain::user::UserId;

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the credit ledger port.
#[derive(Clone)]
pub struct DieselCreditLedger {
    pool: DbPool,
}

impl DieselCreditLedger {
    /// Create a new ledger with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> LedgerError {
    map_basic_pool_error(error, |message| LedgerError::connection(message))
}

fn map_diesel_error(error: diesel::result::Error) -> LedgerError {
    map_basic_diesel_error(error, LedgerError::operation, LedgerError::connection)
}

fn signed_amount(amount: u32) -> Result<i32, LedgerError> {
    i32::try_from(amount).map_err(|_| LedgerError::operation("amount out of range"))
}

#[async_trait]
impl CreditLedger for DieselCreditLedger {
    async fn debit(&self, user_id: &UserId, amount: u32) -> Result<Option<i32>, LedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let amount = signed_amount(amount)?;

        // No matching row means the balance was insufficient (or the user is
        // unknown); either way the submission must not proceed.
        diesel::update(
            users::table
                .filter(users::id.eq(user_id.as_uuid()))
                .filter(users::credits.ge(amount)),
        )
        .set(users::credits.eq(users::credits - amount))
        .returning(users::credits)
        .get_result::<i32>(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)
    }

    async fn credit(&self, user_id: &UserId, amount: u32) -> Result<i32, LedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let amount = signed_amount(amount)?;

        diesel::update(users::table.filter(users::id.eq(user_id.as_uuid())))
            .set(users::credits.eq(users::credits + amount))
            .returning(users::credits)
            .get_result::<i32>(&mut conn)
            .await
            .map_err(map_diesel_error)
    }
}
