//! Account API handlers.
//!
//! ```text
//! POST /api/v1/login {"email":"ana@example.com"}
//! GET  /api/v1/me
//! POST /api/v1/me/first-login
//! ```
//!
//! Credential verification is delegated to the external identity provider;
//! `POST /login` resolves an already-verified email to a known, active user
//! and establishes the cookie session.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::Error;
use crate::domain::user::{Email, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login request body for `POST /api/v1/login`.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Email already verified by the identity provider.
    pub email: String,
}

/// Profile body returned by login and `GET /me`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub credits: i32,
    pub is_vip: bool,
    pub first_login_completed: bool,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            email: user.email().to_string(),
            full_name: user.full_name().to_owned(),
            credits: user.credits(),
            is_vip: user.is_vip(),
            first_login_completed: user.first_login_completed(),
        }
    }
}

/// Establish a session for a known, active user.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session established", body = ProfileResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unknown or deactivated user", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<ProfileResponse>> {
    let email = Email::new(payload.into_inner().email).map_err(|error| {
        Error::invalid_request(error.to_string())
            .with_details(json!({ "field": "email", "code": "invalid_email" }))
    })?;
    let user = state.login.login_by_email(&email).await?;
    session.persist_user(user.id())?;
    Ok(web::Json(ProfileResponse::from(&user)))
}

/// The authenticated caller's own profile.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "getProfile"
)]
#[get("/me")]
pub async fn me(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<ProfileResponse>> {
    let user_id = session.require_user_id()?;
    let user = state.profile.profile(&user_id).await?;
    Ok(web::Json(ProfileResponse::from(&user)))
}

/// Record that the caller finished the first-login flow.
#[utoipa::path(
    post,
    path = "/api/v1/me/first-login",
    responses(
        (status = 204, description = "Flag recorded"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "completeFirstLogin"
)]
#[post("/me/first-login")]
pub async fn complete_first_login(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    state.profile.complete_first_login(&user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{seed_user, test_backend, weekday_clock};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test, web};
    use serde_json::Value;

    fn test_app(
        state: crate::inbound::http::state::HttpState,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(state))
            .wrap(crate::inbound::http::test_utils::test_session_middleware())
            .service(
                web::scope("/api/v1")
                    .service(login)
                    .service(me)
                    .service(complete_first_login),
            )
    }

    #[actix_web::test]
    async fn login_returns_profile_and_session_cookie() {
        let backend = test_backend(weekday_clock());
        seed_user(&backend, "clara@example.com", 4, false);
        let app = actix_test::init_service(test_app(backend.state.clone())).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(&LoginRequest {
                    email: "Clara@Example.com".into(),
                })
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert!(
            res.response()
                .cookies()
                .any(|cookie| cookie.name() == "session")
        );
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body.get("credits").and_then(Value::as_i64), Some(4));
        assert_eq!(
            body.get("email").and_then(Value::as_str),
            Some("clara@example.com")
        );
        // camelCase envelope, no snake_case leakage.
        assert!(body.get("fullName").is_some());
        assert!(body.get("full_name").is_none());
    }

    #[actix_web::test]
    async fn unknown_email_is_unauthorised() {
        let backend = test_backend(weekday_clock());
        let app = actix_test::init_service(test_app(backend.state.clone())).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(&LoginRequest {
                    email: "nadie@example.com".into(),
                })
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn malformed_email_is_a_validation_error() {
        let backend = test_backend(weekday_clock());
        let app = actix_test::init_service(test_app(backend.state.clone())).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(&LoginRequest {
                    email: "no-arroba".into(),
                })
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(
            body.pointer("/details/code").and_then(Value::as_str),
            Some("invalid_email")
        );
    }

    #[actix_web::test]
    async fn me_requires_a_session() {
        let backend = test_backend(weekday_clock());
        let app = actix_test::init_service(test_app(backend.state.clone())).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/api/v1/me").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn first_login_flag_round_trips_through_the_api() {
        use crate::domain::user::{Email, User, UserDraft, UserId};

        let backend = test_backend(weekday_clock());
        let id = UserId::random();
        let fresh = User::new(UserDraft {
            id: id.clone(),
            email: Email::new("clara@example.com").expect("fixture email"),
            full_name: "Clara Ibáñez".to_owned(),
            credits: 4,
            is_vip: false,
            is_active: true,
            first_login_completed: false,
        })
        .expect("fixture user");
        backend.users.add(fresh);
        backend.ledger.set_balance(&id, 4);
        let app = actix_test::init_service(test_app(backend.state.clone())).await;

        let login_res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(&LoginRequest {
                    email: "clara@example.com".into(),
                })
                .to_request(),
        )
        .await;
        let cookie = login_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie")
            .into_owned();

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/me/first-login")
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let me_res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/me")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        let body: Value = actix_test::read_body_json(me_res).await;
        assert_eq!(
            body.get("firstLoginCompleted").and_then(Value::as_bool),
            Some(true)
        );
    }
}
