use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use serde_json::{Value, json};

use super::*;
use crate::domain::reservation::Slot;
use crate::domain::user::UserId;
use crate::inbound::http::test_utils::{TestBackend, seed_user, test_backend, weekday_clock};
use crate::inbound::http::users::{LoginRequest, login};

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
        .service(web::scope("/api/v1").service(login).service(submit_booking))
}

async fn login_and_get_cookie(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    email: &str,
) -> actix_web::cookie::Cookie<'static> {
    let login_req = actix_test::TestRequest::post()
        .uri("/api/v1/login")
        .set_json(&LoginRequest {
            email: email.into(),
        })
        .to_request();
    let login_res = actix_test::call_service(app, login_req).await;
    assert!(login_res.status().is_success());
    login_res
        .response()
        .cookies()
        .find(|c| c.name() == "session")
        .expect("session cookie")
        .into_owned()
}

fn seeded_backend(credits: i32) -> TestBackend {
    let backend = test_backend(weekday_clock());
    seed_user(&backend, "clara@example.com", credits, false);
    backend
}

#[actix_web::test]
async fn booking_two_hours_returns_created_with_new_balance() {
    let backend = seeded_backend(5);
    let app = actix_test::init_service(test_app(backend.state.clone())).await;
    let cookie = login_and_get_cookie(&app, "clara@example.com").await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/bookings")
            .cookie(cookie)
            .set_json(json!({
                "slots": [
                    {"date": "2026-03-16", "hour": 14},
                    {"date": "2026-03-16", "hour": 15}
                ]
            }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body.get("credits").and_then(Value::as_i64), Some(3));
    assert_eq!(
        body.get("reservationIds")
            .and_then(Value::as_array)
            .map(Vec::len),
        Some(2)
    );
}

#[actix_web::test]
async fn booking_requires_a_session() {
    let backend = seeded_backend(5);
    let app = actix_test::init_service(test_app(backend.state.clone())).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/bookings")
            .set_json(json!({ "slots": [{"date": "2026-03-16", "hour": 14}] }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn malformed_date_is_a_validation_error() {
    let backend = seeded_backend(5);
    let app = actix_test::init_service(test_app(backend.state.clone())).await;
    let cookie = login_and_get_cookie(&app, "clara@example.com").await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/bookings")
            .cookie(cookie)
            .set_json(json!({ "slots": [{"date": "16/03/2026", "hour": 14}] }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(
        body.pointer("/details/code").and_then(Value::as_str),
        Some("invalid_date")
    );
}

#[actix_web::test]
async fn empty_slot_list_is_a_validation_error() {
    let backend = seeded_backend(5);
    let app = actix_test::init_service(test_app(backend.state.clone())).await;
    let cookie = login_and_get_cookie(&app, "clara@example.com").await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/bookings")
            .cookie(cookie)
            .set_json(json!({ "slots": [] }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(
        body.pointer("/details/code").and_then(Value::as_str),
        Some("missing_field")
    );
}

#[actix_web::test]
async fn rule_denials_surface_as_conflicts_with_the_rule_code() {
    let backend = seeded_backend(1);
    let app = actix_test::init_service(test_app(backend.state.clone())).await;
    let cookie = login_and_get_cookie(&app, "clara@example.com").await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/bookings")
            .cookie(cookie)
            .set_json(json!({
                "slots": [
                    {"date": "2026-03-16", "hour": 14},
                    {"date": "2026-03-16", "hour": 15}
                ]
            }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(
        body.pointer("/details/rule").and_then(Value::as_str),
        Some("insufficient_credits")
    );
    assert_eq!(
        body.get("message").and_then(Value::as_str),
        Some("No tienes créditos suficientes")
    );
}

#[actix_web::test]
async fn lost_race_returns_conflict_and_leaves_credits_untouched() {
    let backend = test_backend(weekday_clock());
    let user = seed_user(&backend, "clara@example.com", 5, false);
    let rival = UserId::random();
    backend.reservations.seed(
        Slot::new(
            chrono::NaiveDate::from_ymd_opt(2026, 3, 16).expect("valid date"),
            14,
        ),
        &rival,
    );
    let app = actix_test::init_service(test_app(backend.state.clone())).await;
    let cookie = login_and_get_cookie(&app, "clara@example.com").await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/bookings")
            .cookie(cookie)
            .set_json(json!({ "slots": [{"date": "2026-03-16", "hour": 14}] }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(
        body.pointer("/details/rule").and_then(Value::as_str),
        Some("slot_taken")
    );
    assert_eq!(backend.ledger.balance(&user), Some(5));
}
