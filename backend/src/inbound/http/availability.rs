//! Availability API handler.
//!
//! ```text
//! GET /api/v1/availability?date=2026-03-16
//! ```

use actix_web::{get, web};
use serde::{Deserialize, Serialize};

use crate::domain::blackout::{BlackoutSlot, BlackoutSource};
use crate::domain::ports::DayAvailability;
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, missing_field_error, parse_date};

const DATE_FIELD: FieldName = FieldName::new("date");

/// Query parameters for the availability endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityParams {
    /// Calendar day to query, `YYYY-MM-DD`.
    pub date: Option<String>,
}

/// One blackout entry shaped for the grid.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlackoutEntry {
    pub hour: u8,
    pub reason: String,
    pub source: BlackoutSource,
}

impl From<BlackoutSlot> for BlackoutEntry {
    fn from(slot: BlackoutSlot) -> Self {
        Self {
            hour: slot.hour,
            reason: slot.reason,
            source: slot.source,
        }
    }
}

/// Grid snapshot for one day.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    /// The day queried, `YYYY-MM-DD`.
    pub date: String,
    /// Every bookable hour at the facility.
    pub hours: Vec<u8>,
    /// Hours already reserved by any user.
    pub reserved_hours: Vec<u8>,
    /// Blackouts in effect for the day.
    pub blackouts: Vec<BlackoutEntry>,
}

impl From<DayAvailability> for AvailabilityResponse {
    fn from(day: DayAvailability) -> Self {
        Self {
            date: day.date.to_string(),
            hours: day.hours,
            reserved_hours: day.reserved_hours,
            blackouts: day.blackouts.into_iter().map(BlackoutEntry::from).collect(),
        }
    }
}

/// Availability snapshot for today or tomorrow.
///
/// Advisory only: the admission engine re-validates every rule at
/// submission time, so a stale grid can never admit an invalid booking.
#[utoipa::path(
    get,
    path = "/api/v1/availability",
    params(
        ("date" = String, Query, description = "Calendar day to query, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Availability snapshot", body = AvailabilityResponse),
        (status = 400, description = "Invalid or out-of-range date", body = crate::domain::Error),
        (status = 401, description = "Unauthorised", body = crate::domain::Error),
        (status = 503, description = "Service unavailable", body = crate::domain::Error)
    ),
    tags = ["bookings"],
    operation_id = "getAvailability"
)]
#[get("/availability")]
pub async fn get_availability(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<AvailabilityParams>,
) -> ApiResult<web::Json<AvailabilityResponse>> {
    session.require_user_id()?;
    let raw = params
        .into_inner()
        .date
        .ok_or_else(|| missing_field_error(DATE_FIELD))?;
    let date = parse_date(&raw, DATE_FIELD)?;

    let day = state.availability.day(date).await?;
    Ok(web::Json(AvailabilityResponse::from(day)))
}
