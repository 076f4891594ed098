//! Identity endpoints
//!
//! - `POST /identities` - claim (body: `{"user_id", "person_id"}`)
//! - `POST /identities/{id}/verify` and `/reject` (body: `{"inspector_id"}`)

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use super::{parse_id, read_json, respond, FullBody};
use crate::db::schemas::IdentityDoc;
use crate::server::AppState;
use crate::types::Result;

/// Outcome a staff member assigns to a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inspection {
    Verify,
    Reject,
}

#[derive(Debug, Deserialize)]
struct ClaimRequest {
    user_id: String,
    person_id: String,
}

#[derive(Debug, Deserialize)]
struct InspectRequest {
    inspector_id: String,
}

/// POST /identities
pub async fn handle_claim_identity(req: Request<Incoming>, state: Arc<AppState>) -> Response<FullBody> {
    respond(StatusCode::CREATED, claim(req, &state).await)
}

async fn claim(req: Request<Incoming>, state: &AppState) -> Result<IdentityDoc> {
    let request: ClaimRequest = read_json(req).await?;
    let user_id = parse_id(&request.user_id)?;
    let person_id = parse_id(&request.person_id)?;
    state.identities.claim(&user_id, &person_id).await
}

/// POST /identities/{id}/verify, POST /identities/{id}/reject
pub async fn handle_inspect_identity(
    req: Request<Incoming>,
    state: Arc<AppState>,
    identity_id: &str,
    inspection: Inspection,
) -> Response<FullBody> {
    respond(
        StatusCode::OK,
        inspect(req, &state, identity_id, inspection).await,
    )
}

async fn inspect(
    req: Request<Incoming>,
    state: &AppState,
    identity_id: &str,
    inspection: Inspection,
) -> Result<IdentityDoc> {
    let identity_id = parse_id(identity_id)?;
    let request: InspectRequest = read_json(req).await?;
    let inspector_id = parse_id(&request.inspector_id)?;

    match inspection {
        Inspection::Verify => state.identities.verify(&identity_id, &inspector_id).await,
        Inspection::Reject => state.identities.reject(&identity_id, &inspector_id).await,
    }
}
