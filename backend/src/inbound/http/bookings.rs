//! Booking API handler.
//!
//! ```text
//! POST /api/v1/bookings {"slots":[{"date":"2026-03-16","hour":14},{"date":"2026-03-16","hour":15}]}
//! ```
//!
//! The handler only parses the payload; every booking rule is evaluated by
//! the admission engine from fresh reads.

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::Error;
use crate::domain::ports::BookingRequest;
use crate::domain::reservation::Slot;
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, missing_field_error, parse_date, parse_hour};

const DATE_FIELD: FieldName = FieldName::new("date");
const HOUR_FIELD: FieldName = FieldName::new("hour");
const SLOTS_FIELD: FieldName = FieldName::new("slots");

/// One requested slot in the submission body.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotPayload {
    /// Calendar day, `YYYY-MM-DD`, facility time.
    pub date: String,
    /// Hour of day, 0-23.
    pub hour: u32,
}

/// Booking submission body.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayload {
    /// One or two slots to book in a single atomic submission.
    pub slots: Vec<SlotPayload>,
}

/// Successful booking response.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    /// Identifiers of the reservations just created.
    pub reservation_ids: Vec<String>,
    /// Credit balance after the debit.
    pub credits: i32,
}

fn parse_slots(payload: BookingPayload) -> Result<Vec<Slot>, Error> {
    if payload.slots.is_empty() {
        return Err(missing_field_error(SLOTS_FIELD));
    }
    payload
        .slots
        .into_iter()
        .map(|slot| {
            let date = parse_date(&slot.date, DATE_FIELD)?;
            let hour = parse_hour(slot.hour, HOUR_FIELD)?;
            Ok(Slot::new(date, hour))
        })
        .collect()
}

/// Submit a booking for evaluation and, on allow, atomic commit.
///
/// # Errors
///
/// - `400 Bad Request`: malformed dates or hours, or an invalid selection
///   shape.
/// - `401 Unauthorized`: no valid session.
/// - `409 Conflict`: a booking rule denied the request, or the slot was
///   taken concurrently; `details.rule` names the exact rule.
/// - `503 Service Unavailable`: storage unreachable.
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    request_body = BookingPayload,
    responses(
        (status = 201, description = "Reservation committed", body = BookingResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 409, description = "Booking rule denied the request", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "submitBooking"
)]
#[post("/bookings")]
pub async fn submit_booking(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<BookingPayload>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let slots = parse_slots(payload.into_inner())?;

    let outcome = state
        .bookings
        .submit(BookingRequest { user_id, slots })
        .await?;

    let body = BookingResponse {
        reservation_ids: outcome
            .reservation_ids
            .iter()
            .map(|id| id.to_string())
            .collect(),
        credits: outcome.credits,
    };
    Ok(HttpResponse::Created().json(body))
}

#[cfg(test)]
#[path = "bookings_tests.rs"]
mod tests;
