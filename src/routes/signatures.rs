//! Signature endpoints
//!
//! - `POST /questions/{id}/signatures` - sign a question (body: `{"user_id": ...}`)
//! - `DELETE /signatures/{id}` - withdraw a signature

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use super::{parse_id, read_json, respond, FullBody};
use crate::db::schemas::QuestionDoc;
use crate::server::AppState;
use crate::signatures::SignatureReceipt;
use crate::types::Result;

#[derive(Debug, Deserialize)]
struct SignRequest {
    user_id: String,
}

/// POST /questions/{id}/signatures
pub async fn handle_record_signature(
    req: Request<Incoming>,
    state: Arc<AppState>,
    question_id: &str,
) -> Response<FullBody> {
    respond(StatusCode::CREATED, record(req, &state, question_id).await)
}

async fn record(
    req: Request<Incoming>,
    state: &AppState,
    question_id: &str,
) -> Result<SignatureReceipt> {
    let question_id = parse_id(question_id)?;
    let request: SignRequest = read_json(req).await?;
    let user_id = parse_id(&request.user_id)?;

    state
        .signatures
        .record_signature(&user_id, &question_id)
        .await
}

/// DELETE /signatures/{id}
///
/// Responds with the question as it stands after the withdrawal.
pub async fn handle_withdraw_signature(
    state: Arc<AppState>,
    signature_id: &str,
) -> Response<FullBody> {
    respond(StatusCode::OK, withdraw(&state, signature_id).await)
}

async fn withdraw(state: &AppState, signature_id: &str) -> Result<QuestionDoc> {
    let signature_id = parse_id(signature_id)?;
    state.signatures.withdraw_signature(&signature_id).await
}
