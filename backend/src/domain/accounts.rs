//! Account services: session establishment and the caller's own profile.
//!
//! Identity verification itself lives with an external provider; this
//! module only resolves an already-verified email to a known, active user
//! and serves the profile shown above the grid.

use std::sync::Arc;

use async_trait::async_trait;

use super::Error;
use super::ports::{
    LoginService, ProfileService, UserPersistenceError, UserRepository,
};
use super::user::{Email, User, UserId};

/// Account use cases over the user repository.
pub struct AccountService {
    users: Arc<dyn UserRepository>,
}

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
    }
}

impl AccountService {
    /// Create the service over the user port.
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl LoginService for AccountService {
    async fn login_by_email(&self, email: &Email) -> Result<User, Error> {
        let user = self
            .users
            .find_by_email(email)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::unauthorized("Usuario no registrado"))?;
        if !user.is_active() {
            // Deactivated accounts must not establish new sessions.
            return Err(Error::unauthorized("Cuenta desactivada"));
        }
        Ok(user)
    }
}

#[async_trait]
impl ProfileService for AccountService {
    async fn profile(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("Usuario no encontrado"))
    }

    async fn complete_first_login(&self, user_id: &UserId) -> Result<(), Error> {
        // Confirm the user exists so a dangling session yields 404, not a
        // silent no-op.
        self.profile(user_id).await?;
        self.users
            .mark_first_login(user_id)
            .await
            .map_err(map_user_error)
    }
}
