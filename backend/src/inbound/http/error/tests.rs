//! Tests for HTTP error mapping.

use super::*;
use actix_web::body::to_bytes;
use actix_web::{App, HttpResponse, test as actix_test, web};
use rstest::{fixture, rstest};
use serde::Deserialize;
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("no auth"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("clash"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("busy"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] error: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), status);
}

async fn decode_response(error: &Error) -> (StatusCode, Option<String>, Error) {
    let response = ResponseError::error_response(error);
    let status = response.status();
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    let payload = serde_json::from_slice(&bytes).expect("Error JSON deserialisation succeeds");
    (status, header, payload)
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted_but_keep_trace_id(expected_trace_id: String) {
    let error = Error::internal("connection string leaked")
        .with_trace_id(expected_trace_id.clone())
        .with_details(json!({"secret": "x"}));

    let (status, header, payload) = decode_response(&error).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header.as_deref(), Some(expected_trace_id.as_str()));
    assert_eq!(payload.code(), ErrorCode::InternalError);
    assert_eq!(payload.message(), "Internal server error");
    assert_eq!(payload.trace_id(), Some(expected_trace_id.as_str()));
    assert!(payload.details().is_none());
}

#[rstest]
#[actix_web::test]
async fn ledger_rejections_keep_their_details(expected_trace_id: String) {
    let error = Error::invalid_request("bicycle is not available")
        .with_trace_id(expected_trace_id.clone())
        .with_details(json!({"reason": "not_available"}));

    let (status, header, payload) = decode_response(&error).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(header.as_deref(), Some(expected_trace_id.as_str()));
    assert_eq!(payload.message(), "bicycle is not available");
    assert_eq!(payload.details(), Some(&json!({"reason": "not_available"})));
}

#[rstest]
#[actix_web::test]
async fn error_without_trace_id_omits_trace_header() {
    let error = Error::not_found("missing");

    let (_, header, payload) = decode_response(&error).await;

    assert!(header.is_none());
    assert_eq!(payload.trace_id(), None);
}

#[test]
fn from_actix_error_is_redacted_internal_error() {
    let actix_err = actix_web::error::ErrorBadRequest("boom");
    let err: Error = actix_err.into();

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "Internal server error");
    assert_eq!(err.details(), None);
}

#[derive(Deserialize)]
struct Probe {
    #[expect(dead_code, reason = "only the shape of the body matters")]
    value: u32,
}

#[rstest]
#[case::malformed("{\"value\":", "application/json", "malformed_json")]
#[case::wrong_type("{\"value\":\"x\"}", "application/json", "malformed_json")]
#[case::content_type("{\"value\":1}", "text/plain", "content_type")]
#[actix_web::test]
async fn json_rejections_use_the_error_payload(
    #[case] body: &'static str,
    #[case] content_type: &'static str,
    #[case] code: &str,
) {
    let app = actix_test::init_service(
        App::new()
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .route(
                "/",
                web::post().to(|_: web::Json<Probe>| async { HttpResponse::Ok().finish() }),
            ),
    )
    .await;
    let request = actix_test::TestRequest::post()
        .uri("/")
        .insert_header(("content-type", content_type))
        .set_payload(body)
        .to_request();

    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value: serde_json::Value = actix_test::read_body_json(response).await;
    assert_eq!(value["code"], "invalid_request");
    assert_eq!(value["details"]["code"], code);
}
