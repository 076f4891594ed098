//! HTTP route handlers
//!
//! Each handler returns a complete response; domain errors are rendered as
//! `{"error": ..., "code": ...}` with the status from
//! [`AskThemError::status_code`].

pub mod health;
pub mod identities;
pub mod questions;
pub mod signatures;
pub mod users;

pub use health::{health_check, HealthResponse};
pub use identities::{handle_claim_identity, handle_inspect_identity, Inspection};
pub use questions::{
    handle_answer_question, handle_create_question, handle_get_question, handle_list_questions,
    handle_tally_audit,
};
pub use signatures::{handle_record_signature, handle_withdraw_signature};
pub use users::{handle_get_user, handle_register_user, handle_user_signatures};

use bson::oid::ObjectId;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, warn};

use crate::types::{AskThemError, Result};

pub(crate) type FullBody = Full<Bytes>;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<FullBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

pub(crate) fn error_response(err: AskThemError) -> Response<FullBody> {
    let status = err.status_code();
    match &err {
        AskThemError::Integrity(_) => error!("Request failed: {}", err),
        _ if status.is_server_error() => warn!("Request failed: {}", err),
        _ => {}
    }

    let code = err.code();
    let (status, message) = err.into_status_code_and_body();
    json_response(
        status,
        &ErrorResponse {
            error: message,
            code,
        },
    )
}

/// Render a handler result, using `status` on success
pub(crate) fn respond<T: Serialize>(status: StatusCode, result: Result<T>) -> Response<FullBody> {
    match result {
        Ok(body) => json_response(status, &body),
        Err(err) => error_response(err),
    }
}

/// Collect and deserialize a JSON request body
pub(crate) async fn read_json<T: DeserializeOwned>(req: Request<Incoming>) -> Result<T> {
    let body_bytes = req
        .into_body()
        .collect()
        .await
        .map_err(|e| AskThemError::BadRequest(format!("Invalid body: {}", e)))?
        .to_bytes();
    Ok(serde_json::from_slice(&body_bytes)?)
}

pub(crate) fn parse_id(raw: &str) -> Result<ObjectId> {
    Ok(ObjectId::parse_str(raw)?)
}

/// Value of one query-string parameter, percent-decoded
pub(crate) fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(key, _)| *key == name)
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(|value| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_param() {
        let query = Some("feed=need_answers&q=a%20b");
        assert_eq!(query_param(query, "feed").as_deref(), Some("need_answers"));
        assert_eq!(query_param(query, "q").as_deref(), Some("a b"));
        assert_eq!(query_param(query, "missing"), None);
        assert_eq!(query_param(None, "feed"), None);
    }

    #[test]
    fn test_error_response_shape() {
        let response = error_response(AskThemError::NotFound("Signature x".to_string()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert!(matches!(parse_id("xyz"), Err(AskThemError::BadRequest(_))));
        let id = ObjectId::new();
        assert_eq!(parse_id(&id.to_hex()).unwrap(), id);
    }
}
