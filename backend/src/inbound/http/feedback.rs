//! Feedback handlers.
//!
//! ```text
//! POST /feedback {"rentalID":"…","userID":"…","text":"Smooth ride","rating":5}
//! GET  /rentals/{id}/feedback
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, Feedback, FeedbackRequest, FeedbackText, Rating};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_field, parse_rental_id, parse_user_id, require,
};

const TEXT: FieldName = FieldName::new("text");
const RATING: FieldName = FieldName::new("rating");

/// Request body for `POST /feedback`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct FeedbackRequestBody {
    #[serde(rename = "rentalID", alias = "rentalId")]
    #[schema(format = "uuid")]
    pub rental_id: Option<String>,
    #[serde(rename = "userID", alias = "userId")]
    #[schema(format = "uuid")]
    pub user_id: Option<String>,
    /// Free-text comment; may be omitted.
    #[schema(max_length = 1000)]
    pub text: Option<String>,
    #[schema(minimum = 1, maximum = 5)]
    pub rating: Option<i16>,
}

/// Feedback as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct FeedbackBody {
    #[serde(rename = "feedbackID")]
    #[schema(format = "uuid")]
    pub feedback_id: String,
    #[serde(rename = "rentalID")]
    #[schema(format = "uuid")]
    pub rental_id: String,
    #[serde(rename = "userID")]
    #[schema(format = "uuid")]
    pub user_id: String,
    pub text: String,
    pub rating: i16,
    #[serde(rename = "submittedAt")]
    pub submitted_at: DateTime<Utc>,
}

impl From<Feedback> for FeedbackBody {
    fn from(feedback: Feedback) -> Self {
        Self {
            feedback_id: feedback.id.to_string(),
            rental_id: feedback.rental_id.to_string(),
            user_id: feedback.user_id.to_string(),
            text: feedback.text.into(),
            rating: feedback.rating.value(),
            submitted_at: feedback.submitted_at,
        }
    }
}

fn parse_feedback(body: FeedbackRequestBody) -> Result<FeedbackRequest, Error> {
    let rental_id = parse_rental_id(body.rental_id)?;
    let user_id = parse_user_id(body.user_id)?;
    let text = FeedbackText::new(body.text.unwrap_or_default())
        .map_err(|err| invalid_field(TEXT, err))?;
    let rating = Rating::new(require(body.rating, RATING)?).map_err(|err| invalid_field(RATING, err))?;
    Ok(FeedbackRequest {
        rental_id,
        user_id,
        text,
        rating,
    })
}

/// Leave feedback on a returned rental.
#[utoipa::path(
    post,
    path = "/feedback",
    request_body = FeedbackRequestBody,
    responses(
        (status = 201, description = "Feedback stored", body = FeedbackBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Rental belongs to another user", body = ErrorSchema),
        (status = 404, description = "Unknown rental", body = ErrorSchema),
        (status = 409, description = "Rental is still open", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["feedback"],
    operation_id = "submitFeedback"
)]
#[post("/feedback")]
pub async fn submit_feedback(
    state: web::Data<HttpState>,
    payload: web::Json<FeedbackRequestBody>,
) -> ApiResult<HttpResponse> {
    let request = parse_feedback(payload.into_inner())?;
    let feedback = state.feedback.submit(request).await?;
    Ok(HttpResponse::Created().json(FeedbackBody::from(feedback)))
}

/// Feedback left on a rental.
#[utoipa::path(
    get,
    path = "/rentals/{id}/feedback",
    params(("id" = String, Path, description = "Rental identifier", format = "uuid")),
    responses(
        (status = 200, description = "Feedback for the rental", body = [FeedbackBody]),
        (status = 400, description = "Malformed identifier", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["feedback"],
    operation_id = "listRentalFeedback"
)]
#[get("/rentals/{id}/feedback")]
pub async fn list_feedback(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<FeedbackBody>>> {
    let rental_id = parse_rental_id(Some(path.into_inner()))?;
    let feedback = state.feedback.feedback_for_rental(rental_id).await?;
    Ok(web::Json(
        feedback.into_iter().map(FeedbackBody::from).collect(),
    ))
}
