//! OpenAPI documentation configuration.
//!
//! Defines [`ApiDoc`], the generated specification for the REST API. It
//! registers the booking, availability, account, and health endpoints along
//! with the response schemas they reference, plus the session cookie
//! security scheme. Swagger UI serves the document in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::blackout::BlackoutSource;
use crate::domain::{Error, ErrorCode};
use crate::inbound::http::availability::{AvailabilityResponse, BlackoutEntry};
use crate::inbound::http::bookings::{BookingPayload, BookingResponse, SlotPayload};
use crate::inbound::http::users::{LoginRequest, ProfileResponse};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Courtbook API",
        description = "HTTP interface for court availability, bookings, and account access."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::users::me,
        crate::inbound::http::users::complete_first_login,
        crate::inbound::http::availability::get_availability,
        crate::inbound::http::bookings::submit_booking,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        LoginRequest,
        ProfileResponse,
        SlotPayload,
        BookingPayload,
        BookingResponse,
        BlackoutEntry,
        BlackoutSource,
        AvailabilityResponse,
    )),
    tags(
        (name = "accounts", description = "Login, profile, and first-login flow"),
        (name = "bookings", description = "Availability grid and booking submission"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    /// Assert that an Object schema contains a field with the given name.
    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn openapi_error_schema_has_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get("Error").expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
    }

    #[test]
    fn openapi_registers_the_booking_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/api/v1/login"));
        assert!(paths.contains_key("/api/v1/bookings"));
        assert!(paths.contains_key("/api/v1/availability"));
        assert!(paths.contains_key("/health/ready"));
    }
}
