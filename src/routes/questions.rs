//! Question endpoints
//!
//! - `GET /questions/{id}`
//! - `GET /questions/{id}/tally` - stored counter vs live signatures
//! - `POST /questions/{id}/answers`
//! - `GET /jurisdictions/{state}/questions?feed=` - one listing tab
//! - `POST /jurisdictions/{state}/questions`

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use super::{parse_id, query_param, read_json, respond, FullBody};
use crate::db::schemas::{AnswerDoc, QuestionDoc};
use crate::questions::{NewQuestion, QuestionFeed};
use crate::server::AppState;
use crate::signatures::TallyAudit;
use crate::types::Result;

#[derive(Debug, Deserialize)]
struct CreateQuestionRequest {
    user_id: String,
    person_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    bill_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnswerRequest {
    #[serde(default)]
    text: String,
    #[serde(default)]
    user_id: Option<String>,
}

/// GET /questions/{id}
pub async fn handle_get_question(state: Arc<AppState>, question_id: &str) -> Response<FullBody> {
    let result = match parse_id(question_id) {
        Ok(id) => state.questions.get(&id).await,
        Err(e) => Err(e),
    };
    respond(StatusCode::OK, result)
}

/// GET /questions/{id}/tally
pub async fn handle_tally_audit(state: Arc<AppState>, question_id: &str) -> Response<FullBody> {
    let result = match parse_id(question_id) {
        Ok(id) => state.signatures.audit_tally(&id).await,
        Err(e) => Err(e),
    };
    respond::<TallyAudit>(StatusCode::OK, result)
}

/// GET /jurisdictions/{state}/questions?feed=need_signatures
///
/// Without `feed` the need_signatures tab is listed.
pub async fn handle_list_questions(
    req: &Request<Incoming>,
    state: Arc<AppState>,
    jurisdiction: &str,
) -> Response<FullBody> {
    respond(StatusCode::OK, list(req, &state, jurisdiction).await)
}

async fn list(
    req: &Request<Incoming>,
    state: &AppState,
    jurisdiction: &str,
) -> Result<Vec<QuestionDoc>> {
    let feed = match query_param(req.uri().query(), "feed") {
        Some(raw) => raw.parse::<QuestionFeed>()?,
        None => QuestionFeed::NeedSignatures,
    };
    state.questions.feed(jurisdiction, feed).await
}

/// POST /jurisdictions/{state}/questions
pub async fn handle_create_question(
    req: Request<Incoming>,
    state: Arc<AppState>,
    jurisdiction: &str,
) -> Response<FullBody> {
    respond(StatusCode::CREATED, create(req, &state, jurisdiction).await)
}

async fn create(
    req: Request<Incoming>,
    state: &AppState,
    jurisdiction: &str,
) -> Result<QuestionDoc> {
    let request: CreateQuestionRequest = read_json(req).await?;

    let input = NewQuestion {
        user_id: parse_id(&request.user_id)?,
        person_id: parse_id(&request.person_id)?,
        title: request.title,
        body: request.body,
        subject: request.subject,
        bill_id: request.bill_id.as_deref().map(parse_id).transpose()?,
    };

    state.questions.create(jurisdiction, input).await
}

/// POST /questions/{id}/answers
pub async fn handle_answer_question(
    req: Request<Incoming>,
    state: Arc<AppState>,
    question_id: &str,
) -> Response<FullBody> {
    respond(StatusCode::CREATED, answer(req, &state, question_id).await)
}

async fn answer(req: Request<Incoming>, state: &AppState, question_id: &str) -> Result<AnswerDoc> {
    let question_id = parse_id(question_id)?;
    let request: AnswerRequest = read_json(req).await?;
    let user_id = request.user_id.as_deref().map(parse_id).transpose()?;

    state
        .questions
        .answer(&question_id, request.text, user_id)
        .await
}
