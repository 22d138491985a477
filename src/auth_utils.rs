use crate::error_handler::ServiceError;
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures_util::future::{err, ok, Ready};
use serde::Deserialize;

pub const USER_ID_HEADER: &str = "X-User-Id";

/// The owner of every record touched by a request.
///
/// Sessions live in the authentication layer in front of this service; it
/// forwards the logged-in user's id in the `X-User-Id` header.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: i32,
}

impl AuthenticatedUser {
    fn parse_header(raw: &str) -> Result<Self, ServiceError> {
        if raw.is_empty() {
            log::warn!("{} header is present but empty.", USER_ID_HEADER);
            return Err(ServiceError::BadRequest(format!(
                "{} header cannot be empty.",
                USER_ID_HEADER
            )));
        }

        match raw.trim().parse::<i32>() {
            Ok(user_id) if user_id > 0 => {
                log::debug!("Successfully parsed {}: {}", USER_ID_HEADER, user_id);
                Ok(AuthenticatedUser { id: user_id })
            }
            Ok(user_id) => {
                log::warn!("Rejected non-positive {}: {}", USER_ID_HEADER, user_id);
                Err(ServiceError::BadRequest(format!(
                    "{} must be a positive integer.",
                    USER_ID_HEADER
                )))
            }
            Err(parse_err) => {
                log::warn!(
                    "Failed to parse {} '{}' as an integer: {}",
                    USER_ID_HEADER,
                    raw,
                    parse_err
                );
                Err(ServiceError::BadRequest(format!(
                    "Invalid {} header format (not an integer).",
                    USER_ID_HEADER
                )))
            }
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(header_value) = req.headers().get(USER_ID_HEADER) else {
            log::warn!("{} header was NOT found in request headers.", USER_ID_HEADER);
            return err(ServiceError::Unauthorized(format!(
                "Missing {} header. Authentication required.",
                USER_ID_HEADER
            )));
        };

        match header_value.to_str() {
            Ok(raw) => match Self::parse_header(raw) {
                Ok(user) => ok(user),
                Err(e) => err(e),
            },
            Err(_) => {
                log::warn!("{} header is not valid UTF-8.", USER_ID_HEADER);
                err(ServiceError::BadRequest(format!(
                    "{} header contains invalid characters.",
                    USER_ID_HEADER
                )))
            }
        }
    }
}
