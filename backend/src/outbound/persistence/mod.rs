//! PostgreSQL persistence adapters for the domain's driven ports.

pub mod diesel_basic_error_mapping;
pub mod diesel_credit_ledger;
pub mod diesel_maintenance_repository;
pub mod diesel_reservation_repository;
pub mod diesel_settings_repository;
pub mod diesel_user_repository;
pub mod models;
pub mod pool;
pub mod schema;

pub use diesel_credit_ledger::DieselCreditLedger;
pub use diesel_maintenance_repository::DieselMaintenanceRepository;
pub use diesel_reservation_repository::DieselReservationRepository;
pub use diesel_settings_repository::DieselSettingsRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
