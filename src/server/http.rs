//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Args;
use crate::identities::IdentityService;
use crate::questions::QuestionService;
use crate::routes::{self, Inspection};
use crate::signatures::SignatureService;
use crate::store::CivicStore;
use crate::types::AskThemError;
use crate::users::UserDirectory;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// MongoDB in production, in-memory in dev-mode fallback
    pub store: Arc<dyn CivicStore>,
    pub signatures: SignatureService,
    pub questions: QuestionService,
    pub users: UserDirectory,
    pub identities: IdentityService,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(args: Args, store: Arc<dyn CivicStore>) -> Self {
        Self {
            signatures: SignatureService::new(Arc::clone(&store), args.withdrawal_rule),
            questions: QuestionService::new(Arc::clone(&store)),
            users: UserDirectory::new(Arc::clone(&store)),
            identities: IdentityService::new(Arc::clone(&store)),
            store,
            args,
            started_at: Instant::now(),
        }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), AskThemError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "AskThem listening on {} ({} store, withdrawal rule {})",
        state.args.listen,
        state.store.backend(),
        state.args.withdrawal_rule
    );

    if state.args.dev_mode {
        warn!("Development mode enabled");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    let response = match (method, segments.as_slice()) {
        (Method::OPTIONS, _) => preflight_response(),

        (Method::GET, ["health"]) | (Method::GET, ["healthz"]) => routes::health_check(state),

        // Questions
        (Method::GET, ["jurisdictions", jurisdiction, "questions"]) => {
            routes::handle_list_questions(&req, state, jurisdiction).await
        }
        (Method::POST, ["jurisdictions", jurisdiction, "questions"]) => {
            routes::handle_create_question(req, state, jurisdiction).await
        }
        (Method::GET, ["questions", id]) => routes::handle_get_question(state, id).await,
        (Method::GET, ["questions", id, "tally"]) => routes::handle_tally_audit(state, id).await,
        (Method::POST, ["questions", id, "answers"]) => {
            routes::handle_answer_question(req, state, id).await
        }

        // Signatures
        (Method::POST, ["questions", id, "signatures"]) => {
            routes::handle_record_signature(req, state, id).await
        }
        (Method::DELETE, ["signatures", id]) => routes::handle_withdraw_signature(state, id).await,

        // Users
        (Method::POST, ["users"]) => routes::handle_register_user(req, state).await,
        (Method::GET, ["users", id]) => routes::handle_get_user(state, id).await,
        (Method::GET, ["users", id, "signatures"]) => {
            routes::handle_user_signatures(state, id).await
        }

        // Identities
        (Method::POST, ["identities"]) => routes::handle_claim_identity(req, state).await,
        (Method::POST, ["identities", id, "verify"]) => {
            routes::handle_inspect_identity(req, state, id, Inspection::Verify).await
        }
        (Method::POST, ["identities", id, "reject"]) => {
            routes::handle_inspect_identity(req, state, id, Inspection::Reject).await
        }

        _ => not_found_response(&path),
    };

    Ok(response)
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    let headers = response.headers_mut();
    headers.insert(
        hyper::header::ACCESS_CONTROL_ALLOW_ORIGIN,
        hyper::header::HeaderValue::from_static("*"),
    );
    headers.insert(
        hyper::header::ACCESS_CONTROL_ALLOW_HEADERS,
        hyper::header::HeaderValue::from_static("*"),
    );
    headers.insert(
        hyper::header::ACCESS_CONTROL_ALLOW_METHODS,
        hyper::header::HeaderValue::from_static("GET, POST, DELETE, OPTIONS"),
    );
    response
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Not Found",
        "code": "NOT_FOUND",
        "path": path,
    });
    routes::json_response(StatusCode::NOT_FOUND, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use clap::Parser;

    #[test]
    fn test_state_wires_withdrawal_rule() {
        let args = Args::try_parse_from(["askthem", "--withdrawal-rule", "below-threshold"])
            .unwrap();
        let state = AppState::new(args, Arc::new(MemoryStore::new()));
        assert_eq!(
            state.signatures.withdrawal_rule(),
            crate::signatures::WithdrawalRule::BelowThreshold
        );
        assert_eq!(state.store.backend(), "memory");
    }

    #[test]
    fn test_not_found_and_preflight() {
        assert_eq!(not_found_response("/nope").status(), StatusCode::NOT_FOUND);
        let preflight = preflight_response();
        assert_eq!(preflight.status(), StatusCode::OK);
        assert!(preflight
            .headers()
            .contains_key(hyper::header::ACCESS_CONTROL_ALLOW_METHODS));
    }
}
