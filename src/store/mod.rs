//! Persistence seam for AskThem
//!
//! Every read and write of domain documents goes through [`CivicStore`],
//! so the signature lifecycle can run against MongoDB in production and an
//! in-memory map in development and tests.
//!
//! ## Counter contract
//!
//! `add_to_signature_count` must be a single atomic add-and-fetch at the
//! storage layer. Decrements are conditional on the counter staying
//! non-negative; when the condition fails nothing is written and `None` is
//! returned.

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use bson::oid::ObjectId;

use crate::db::schemas::{
    AnswerDoc, IdentityDoc, IdentityStatus, PersonDoc, QuestionDoc, SignatureDoc, UserDoc,
};
use crate::types::Result;

/// Filter for listing questions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionQuery {
    /// Jurisdiction abbreviation
    pub state: Option<String>,
    /// Restrict to these question ids
    pub ids: Option<Vec<ObjectId>>,
    /// Restrict to questions authored by this user
    pub user_id: Option<ObjectId>,
    pub threshold_met: Option<bool>,
    /// `Some(true)`: at least one answer. `Some(false)`: none.
    pub answered: Option<bool>,
    /// Sort by `issued_at` descending
    pub newest_first: bool,
}

/// Storage operations needed by the domain services
#[async_trait::async_trait]
pub trait CivicStore: Send + Sync {
    /// Backend name for health reporting
    fn backend(&self) -> &'static str;

    // Users

    async fn find_user(&self, id: &ObjectId) -> Result<Option<UserDoc>>;
    async fn insert_user(&self, user: UserDoc) -> Result<ObjectId>;

    // People

    async fn find_person(&self, id: &ObjectId) -> Result<Option<PersonDoc>>;
    async fn insert_person(&self, person: PersonDoc) -> Result<ObjectId>;

    // Questions

    async fn find_question(&self, id: &ObjectId) -> Result<Option<QuestionDoc>>;
    async fn insert_question(&self, question: QuestionDoc) -> Result<ObjectId>;
    async fn find_questions(&self, query: QuestionQuery) -> Result<Vec<QuestionDoc>>;

    /// Atomically add `delta` to `signature_count` and return the updated
    /// question. Returns `None` when the question does not exist or the
    /// result would be negative.
    async fn add_to_signature_count(
        &self,
        question_id: &ObjectId,
        delta: i64,
    ) -> Result<Option<QuestionDoc>>;

    /// Write the cached threshold flag. Returns false if the question is gone.
    async fn set_threshold_met(&self, question_id: &ObjectId, met: bool) -> Result<bool>;

    // Signatures

    async fn find_signature(&self, id: &ObjectId) -> Result<Option<SignatureDoc>>;
    async fn find_signature_for(
        &self,
        user_id: &ObjectId,
        question_id: &ObjectId,
    ) -> Result<Option<SignatureDoc>>;

    /// Insert a signature. A second signature for the same (user, question)
    /// pair fails with `Validation`.
    async fn insert_signature(&self, signature: SignatureDoc) -> Result<ObjectId>;

    /// Delete a signature. Returns false if it was already gone.
    async fn delete_signature(&self, id: &ObjectId) -> Result<bool>;

    async fn count_signatures(&self, question_id: &ObjectId) -> Result<u64>;
    async fn signatures_by_user(&self, user_id: &ObjectId) -> Result<Vec<SignatureDoc>>;

    // Answers

    async fn insert_answer(&self, answer: AnswerDoc) -> Result<ObjectId>;

    // Identities

    async fn find_identity(&self, id: &ObjectId) -> Result<Option<IdentityDoc>>;
    async fn insert_identity(&self, identity: IdentityDoc) -> Result<ObjectId>;
    async fn count_identities(&self, user_id: &ObjectId, status: IdentityStatus) -> Result<u64>;

    /// Record a review outcome. Returns the updated identity, or `None` if it is gone.
    async fn set_identity_status(
        &self,
        id: &ObjectId,
        status: IdentityStatus,
        inspector_id: &ObjectId,
    ) -> Result<Option<IdentityDoc>>;
}
