//! User endpoints
//!
//! - `POST /users` - register
//! - `GET /users/{id}` - engagement profile
//! - `GET /users/{id}/signatures` - questions the user has signed

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{parse_id, read_json, respond, FullBody};
use crate::db::schemas::{QuestionDoc, UserDoc};
use crate::server::AppState;
use crate::types::Result;
use crate::users::UserProfile;

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    given_name: String,
    #[serde(default)]
    family_name: String,
    street_address: Option<String>,
    locality: Option<String>,
    region: Option<String>,
    postal_code: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Serialize)]
struct RegisterResponse {
    id: String,
}

/// POST /users
pub async fn handle_register_user(req: Request<Incoming>, state: Arc<AppState>) -> Response<FullBody> {
    respond(StatusCode::CREATED, register(req, &state).await)
}

async fn register(req: Request<Incoming>, state: &AppState) -> Result<RegisterResponse> {
    let request: RegisterRequest = read_json(req).await?;

    let mut user = UserDoc::new(request.email, request.given_name, request.family_name);
    user.street_address = request.street_address;
    user.locality = request.locality;
    user.region = request.region;
    user.postal_code = request.postal_code;
    if request.country.is_some() {
        user.country = request.country;
    }

    let id = state.users.register(user).await?;
    Ok(RegisterResponse { id: id.to_hex() })
}

/// GET /users/{id}
pub async fn handle_get_user(state: Arc<AppState>, user_id: &str) -> Response<FullBody> {
    let result: Result<UserProfile> = match parse_id(user_id) {
        Ok(id) => state.users.profile(&id).await,
        Err(e) => Err(e),
    };
    respond(StatusCode::OK, result)
}

/// GET /users/{id}/signatures
pub async fn handle_user_signatures(state: Arc<AppState>, user_id: &str) -> Response<FullBody> {
    let result: Result<Vec<QuestionDoc>> = match parse_id(user_id) {
        Ok(id) => state.users.questions_signed(&id).await,
        Err(e) => Err(e),
    };
    respond(StatusCode::OK, result)
}
