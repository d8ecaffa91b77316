//! Payment handlers.
//!
//! ```text
//! POST /payments {"rentalID":"…","userID":"…","amount":1250,"cardNumber":"4111 1111 1111 1111"}
//! GET  /rentals/{id}/payments
//! ```
//!
//! The card number is parsed straight into a zeroising buffer and only its
//! last four digits leave this module.

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zeroize::Zeroizing;

use crate::domain::{Amount, CardNumber, Payment, PaymentRequest, PaymentStatus};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_field, parse_rental_id, parse_user_id, require,
};

const AMOUNT: FieldName = FieldName::new("amount");
const CARD_NUMBER: FieldName = FieldName::new("cardNumber");

/// Request body for `POST /payments`.
#[derive(Deserialize, ToSchema)]
pub struct PaymentRequestBody {
    #[serde(rename = "rentalID", alias = "rentalId")]
    #[schema(format = "uuid")]
    pub rental_id: Option<String>,
    #[serde(rename = "userID", alias = "userId")]
    #[schema(format = "uuid")]
    pub user_id: Option<String>,
    /// Amount in minor currency units.
    #[schema(minimum = 1, example = 1250)]
    pub amount: Option<i64>,
    #[serde(rename = "cardNumber")]
    #[schema(value_type = Option<String>, example = "4111 1111 1111 1111")]
    pub card_number: Option<Zeroizing<String>>,
}

/// A recorded payment as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct PaymentBody {
    #[serde(rename = "paymentID")]
    #[schema(format = "uuid")]
    pub payment_id: String,
    #[serde(rename = "rentalID")]
    #[schema(format = "uuid")]
    pub rental_id: String,
    #[serde(rename = "userID")]
    #[schema(format = "uuid")]
    pub user_id: String,
    pub amount: i64,
    #[serde(rename = "cardLastFour")]
    #[schema(example = "1111")]
    pub card_last_four: String,
    #[schema(value_type = String, example = "completed")]
    pub status: PaymentStatus,
    #[serde(rename = "paidAt")]
    pub paid_at: DateTime<Utc>,
}

impl From<Payment> for PaymentBody {
    fn from(payment: Payment) -> Self {
        Self {
            payment_id: payment.id.to_string(),
            rental_id: payment.rental_id.to_string(),
            user_id: payment.user_id.to_string(),
            amount: payment.amount.minor_units(),
            card_last_four: payment.card_last_four.as_ref().to_owned(),
            status: payment.status,
            paid_at: payment.paid_at,
        }
    }
}

fn parse_payment(body: PaymentRequestBody) -> Result<PaymentRequest, crate::domain::Error> {
    let rental_id = parse_rental_id(body.rental_id)?;
    let user_id = parse_user_id(body.user_id)?;
    let amount = Amount::new(require(body.amount, AMOUNT)?).map_err(|e| invalid_field(AMOUNT, e))?;
    let card = require(body.card_number, CARD_NUMBER)?;
    let card = CardNumber::new(&card).map_err(|e| invalid_field(CARD_NUMBER, e))?;
    Ok(PaymentRequest {
        rental_id,
        user_id,
        amount,
        card,
    })
}

/// Record a payment against one of the caller's rentals.
#[utoipa::path(
    post,
    path = "/payments",
    request_body = PaymentRequestBody,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Rental belongs to another user", body = ErrorSchema),
        (status = 404, description = "Unknown rental", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "recordPayment"
)]
#[post("/payments")]
pub async fn record_payment(
    state: web::Data<HttpState>,
    payload: web::Json<PaymentRequestBody>,
) -> ApiResult<HttpResponse> {
    let request = parse_payment(payload.into_inner())?;
    let payment = state.payments.pay(request).await?;
    Ok(HttpResponse::Created().json(PaymentBody::from(payment)))
}

/// Payments recorded against a rental.
#[utoipa::path(
    get,
    path = "/rentals/{id}/payments",
    params(("id" = String, Path, description = "Rental identifier", format = "uuid")),
    responses(
        (status = 200, description = "Payments for the rental", body = [PaymentBody]),
        (status = 400, description = "Malformed identifier", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "listRentalPayments"
)]
#[get("/rentals/{id}/payments")]
pub async fn list_payments(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<PaymentBody>>> {
    let rental_id = parse_rental_id(Some(path.into_inner()))?;
    let payments = state.payments.payments_for_rental(rental_id).await?;
    Ok(web::Json(
        payments.into_iter().map(PaymentBody::from).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CardLastFour, Error, PaymentId, RentalId, UserId};
    use crate::inbound::http::configure_api;
    use crate::inbound::http::test_utils::MockPorts;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use chrono::TimeZone;
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    fn paid_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 11, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[fixture]
    fn payment_body() -> Value {
        json!({
            "rentalID": RentalId::random().to_string(),
            "userID": UserId::random().to_string(),
            "amount": 1250,
            "cardNumber": "4111-1111-1111-4242",
        })
    }

    async fn send(ports: MockPorts, request: actix_test::TestRequest) -> (StatusCode, Value) {
        let app = actix_test::init_service(
            App::new()
                .app_data(ports.into_state())
                .configure(configure_api),
        )
        .await;
        let response = actix_test::call_service(&app, request.to_request()).await;
        let status = response.status();
        let body = actix_test::read_body(response).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn recorded(request: &PaymentRequest) -> Payment {
        Payment {
            id: PaymentId::random(),
            rental_id: request.rental_id,
            user_id: request.user_id.clone(),
            amount: request.amount,
            card_last_four: request.card.last_four(),
            status: PaymentStatus::Completed,
            paid_at: paid_at(),
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn payment_response_only_carries_last_four(payment_body: Value) {
        let mut ports = MockPorts::default();
        ports
            .payments
            .expect_pay()
            .withf(|request| request.amount.minor_units() == 1250)
            .times(1)
            .returning(|request| Ok(recorded(&request)));
        let request = actix_test::TestRequest::post()
            .uri("/payments")
            .set_json(payment_body);

        let (status, body) = send(ports, request).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["cardLastFour"], "4242");
        assert_eq!(body["status"], "completed");
        assert!(!body.to_string().contains("4111"));
    }

    #[rstest]
    #[case::zero_amount("amount", json!(0))]
    #[case::short_card("cardNumber", json!("4111 1111"))]
    #[case::letters_in_card("cardNumber", json!("4111-abcd-1111-4242"))]
    #[actix_web::test]
    async fn invalid_payment_fields_are_rejected(
        mut payment_body: Value,
        #[case] field: &str,
        #[case] value: Value,
    ) {
        payment_body[field] = value;
        let mut ports = MockPorts::default();
        ports.payments.expect_pay().never();
        let request = actix_test::TestRequest::post()
            .uri("/payments")
            .set_json(payment_body);

        let (status, body) = send(ports, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["field"], field);
    }

    #[rstest]
    #[actix_web::test]
    async fn foreign_rental_is_forbidden(payment_body: Value) {
        let mut ports = MockPorts::default();
        ports
            .payments
            .expect_pay()
            .times(1)
            .returning(|_| Err(Error::forbidden("rental belongs to another user")));
        let request = actix_test::TestRequest::post()
            .uri("/payments")
            .set_json(payment_body);

        let (status, _) = send(ports, request).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[rstest]
    #[actix_web::test]
    async fn lists_payments_for_a_rental() {
        let rental_id = RentalId::random();
        let payment = Payment {
            id: PaymentId::random(),
            rental_id,
            user_id: UserId::random(),
            amount: Amount::new(900).expect("amount"),
            card_last_four: CardLastFour::new("0004").expect("suffix"),
            status: PaymentStatus::Completed,
            paid_at: paid_at(),
        };
        let mut ports = MockPorts::default();
        ports
            .payments
            .expect_payments_for_rental()
            .withf(move |id| *id == rental_id)
            .times(1)
            .return_once(move |_| Ok(vec![payment]));
        let uri = format!("/rentals/{rental_id}/payments");

        let (status, body) = send(ports, actix_test::TestRequest::get().uri(&uri)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["amount"], 900);
        assert_eq!(body[0]["paidAt"], "2026-05-01T11:00:00Z");
    }
}
