//! Registration and login handlers.
//!
//! ```text
//! POST /register   {"name":"…","emailID":"…","phoneNo":"…","password":"…","DOB":"1990-02-28"}
//! POST /login_user {"emailID":"…","password":"…"}
//! ```
//!
//! Identity travels as a `userID` returned from login; there is no session.

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    CredentialsValidationError, DisplayName, EmailAddress, Error, LoginCredentials, Password,
    PhoneNumber, Registration, UserId, UserValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_field, parse_iso_date, require};

const NAME: FieldName = FieldName::new("name");
const EMAIL: FieldName = FieldName::new("emailID");
const PHONE: FieldName = FieldName::new("phoneNo");
const PASSWORD: FieldName = FieldName::new("password");
const DOB: FieldName = FieldName::new("DOB");

/// Sign-up request body.
#[derive(Default, Deserialize, Serialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "Ada Lovelace")]
    pub name: Option<String>,
    #[serde(rename = "emailID")]
    #[schema(example = "ada@example.org")]
    pub email: Option<String>,
    #[serde(rename = "phoneNo")]
    #[schema(example = "+44 20 7946 0000")]
    pub phone: Option<String>,
    #[schema(format = "password")]
    pub password: Option<String>,
    #[serde(rename = "DOB")]
    #[schema(format = "date", example = "1990-02-28")]
    pub date_of_birth: Option<String>,
}

/// Login request body.
#[derive(Default, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    #[serde(rename = "emailID")]
    pub email: Option<String>,
    #[schema(format = "password")]
    pub password: Option<String>,
}

/// Identifier returned by registration and login.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UserIdBody {
    #[serde(rename = "userID")]
    #[schema(format = "uuid")]
    pub user_id: String,
}

impl From<&UserId> for UserIdBody {
    fn from(id: &UserId) -> Self {
        Self {
            user_id: id.to_string(),
        }
    }
}

fn map_credentials_error(err: CredentialsValidationError) -> Error {
    match err {
        CredentialsValidationError::Email(inner) => invalid_field(EMAIL, inner),
        other => invalid_field(PASSWORD, other),
    }
}

fn parse_registration(request: RegisterRequest) -> Result<Registration, Error> {
    let RegisterRequest {
        name,
        email,
        phone,
        password,
        date_of_birth,
    } = request;
    let display_name =
        DisplayName::new(require(name, NAME)?).map_err(|err| invalid_field(NAME, err))?;
    let email = EmailAddress::new(require(email, EMAIL)?).map_err(|err| invalid_field(EMAIL, err))?;
    let phone = PhoneNumber::new(require(phone, PHONE)?).map_err(|err| invalid_field(PHONE, err))?;
    let password = require(password, PASSWORD)?;
    let password = Password::for_registration(&password).map_err(map_credentials_error)?;
    let date_of_birth = parse_iso_date(date_of_birth, DOB)?;
    Ok(Registration {
        display_name,
        email,
        phone,
        date_of_birth,
        password,
    })
}

fn parse_login(request: LoginRequest) -> Result<LoginCredentials, Error> {
    let email = require(request.email, EMAIL)?;
    let password = require(request.password, PASSWORD)?;
    LoginCredentials::try_from_parts(&email, &password).map_err(|err| match err {
        // An email that cannot exist is reported the same way as a wrong one.
        CredentialsValidationError::Email(UserValidationError::InvalidEmail) => {
            Error::unauthorized("invalid credentials")
        }
        other => map_credentials_error(other),
    })
}

/// Create an account.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserIdBody),
        (status = 400, description = "Invalid field or email already registered", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "register"
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration = parse_registration(payload.into_inner())?;
    let user = state.identity.register(registration).await?;
    Ok(HttpResponse::Created().json(UserIdBody::from(user.id())))
}

/// Verify credentials and return the caller's user id.
#[utoipa::path(
    post,
    path = "/login_user",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = UserIdBody),
        (status = 400, description = "Missing field", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "loginUser"
)]
#[post("/login_user")]
pub async fn login_user(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<UserIdBody>> {
    let credentials = parse_login(payload.into_inner())?;
    let user_id = state.identity.login(&credentials).await?;
    Ok(web::Json(UserIdBody::from(&user_id)))
}
