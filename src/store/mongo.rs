//! MongoDB-backed store

use bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use tracing::info;

use super::{CivicStore, QuestionQuery};
use crate::db::schemas::{
    AnswerDoc, IdentityDoc, IdentityStatus, PersonDoc, QuestionDoc, SignatureDoc, UserDoc,
    ANSWER_COLLECTION, IDENTITY_COLLECTION, PERSON_COLLECTION, QUESTION_COLLECTION,
    SIGNATURE_COLLECTION, USER_COLLECTION,
};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{AskThemError, Result};

/// MongoDB implementation of [`CivicStore`]
///
/// Collections are opened (and their indexes applied) once at construction.
pub struct MongoStore {
    users: MongoCollection<UserDoc>,
    people: MongoCollection<PersonDoc>,
    questions: MongoCollection<QuestionDoc>,
    signatures: MongoCollection<SignatureDoc>,
    answers: MongoCollection<AnswerDoc>,
    identities: MongoCollection<IdentityDoc>,
}

impl MongoStore {
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        let store = Self {
            users: mongo.collection(USER_COLLECTION).await?,
            people: mongo.collection(PERSON_COLLECTION).await?,
            questions: mongo.collection(QUESTION_COLLECTION).await?,
            signatures: mongo.collection(SIGNATURE_COLLECTION).await?,
            answers: mongo.collection(ANSWER_COLLECTION).await?,
            identities: mongo.collection(IDENTITY_COLLECTION).await?,
        };
        info!("MongoDB store ready (database '{}')", mongo.db_name());
        Ok(store)
    }

    /// Ids of questions with at least one answer
    async fn answered_question_ids(&self) -> Result<Vec<Bson>> {
        self.answers.distinct("question_id", doc! {}).await
    }
}

fn question_filter(query: &QuestionQuery, answered_ids: Option<Vec<Bson>>) -> Document {
    let mut filter = Document::new();

    if let Some(state) = &query.state {
        filter.insert("state", state.as_str());
    }
    if let Some(user_id) = query.user_id {
        filter.insert("user_id", user_id);
    }
    if let Some(met) = query.threshold_met {
        filter.insert("threshold_met", met);
    }

    let mut id_clauses = Vec::new();
    if let Some(ids) = &query.ids {
        let ids: Vec<Bson> = ids.iter().map(|id| Bson::ObjectId(*id)).collect();
        id_clauses.push(doc! { "_id": { "$in": ids } });
    }
    match (query.answered, answered_ids) {
        (Some(true), Some(answered)) => id_clauses.push(doc! { "_id": { "$in": answered } }),
        (Some(false), Some(answered)) => id_clauses.push(doc! { "_id": { "$nin": answered } }),
        _ => {}
    }
    if !id_clauses.is_empty() {
        filter.insert("$and", id_clauses);
    }

    filter
}

#[async_trait::async_trait]
impl CivicStore for MongoStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn find_user(&self, id: &ObjectId) -> Result<Option<UserDoc>> {
        self.users.find_one(doc! { "_id": *id }).await
    }

    async fn insert_user(&self, user: UserDoc) -> Result<ObjectId> {
        self.users.insert_one(user).await.map_err(|e| match e {
            AskThemError::Validation(_) => {
                AskThemError::Validation("Email is already registered".to_string())
            }
            other => other,
        })
    }

    async fn find_person(&self, id: &ObjectId) -> Result<Option<PersonDoc>> {
        self.people.find_one(doc! { "_id": *id }).await
    }

    async fn insert_person(&self, person: PersonDoc) -> Result<ObjectId> {
        self.people.insert_one(person).await
    }

    async fn find_question(&self, id: &ObjectId) -> Result<Option<QuestionDoc>> {
        self.questions.find_one(doc! { "_id": *id }).await
    }

    async fn insert_question(&self, question: QuestionDoc) -> Result<ObjectId> {
        self.questions.insert_one(question).await
    }

    async fn find_questions(&self, query: QuestionQuery) -> Result<Vec<QuestionDoc>> {
        let answered_ids = match query.answered {
            Some(_) => Some(self.answered_question_ids().await?),
            None => None,
        };
        let filter = question_filter(&query, answered_ids);
        let sort = query.newest_first.then(|| doc! { "issued_at": -1 });

        self.questions.find_many(filter, sort).await
    }

    async fn add_to_signature_count(
        &self,
        question_id: &ObjectId,
        delta: i64,
    ) -> Result<Option<QuestionDoc>> {
        let mut filter = doc! { "_id": *question_id };
        if delta < 0 {
            // Never let the counter cross zero
            filter.insert("signature_count", doc! { "$gte": -delta });
        }

        self.questions
            .find_one_and_update(
                filter,
                doc! {
                    "$inc": { "signature_count": delta },
                    "$set": { "metadata.updated_at": DateTime::now() }
                },
            )
            .await
    }

    async fn set_threshold_met(&self, question_id: &ObjectId, met: bool) -> Result<bool> {
        let result = self
            .questions
            .update_one(
                doc! { "_id": *question_id },
                doc! {
                    "$set": {
                        "threshold_met": met,
                        "metadata.updated_at": DateTime::now()
                    }
                },
            )
            .await?;

        Ok(result.matched_count > 0)
    }

    async fn find_signature(&self, id: &ObjectId) -> Result<Option<SignatureDoc>> {
        self.signatures.find_one(doc! { "_id": *id }).await
    }

    async fn find_signature_for(
        &self,
        user_id: &ObjectId,
        question_id: &ObjectId,
    ) -> Result<Option<SignatureDoc>> {
        self.signatures
            .find_one(doc! { "user_id": *user_id, "question_id": *question_id })
            .await
    }

    async fn insert_signature(&self, signature: SignatureDoc) -> Result<ObjectId> {
        self.signatures.insert_one(signature).await.map_err(|e| match e {
            AskThemError::Validation(_) => {
                AskThemError::Validation("User has already signed this question".to_string())
            }
            other => other,
        })
    }

    async fn delete_signature(&self, id: &ObjectId) -> Result<bool> {
        self.signatures.delete_one(doc! { "_id": *id }).await
    }

    async fn count_signatures(&self, question_id: &ObjectId) -> Result<u64> {
        self.signatures
            .count(doc! { "question_id": *question_id })
            .await
    }

    async fn signatures_by_user(&self, user_id: &ObjectId) -> Result<Vec<SignatureDoc>> {
        self.signatures
            .find_many(doc! { "user_id": *user_id }, None)
            .await
    }

    async fn insert_answer(&self, answer: AnswerDoc) -> Result<ObjectId> {
        self.answers.insert_one(answer).await
    }

    async fn find_identity(&self, id: &ObjectId) -> Result<Option<IdentityDoc>> {
        self.identities.find_one(doc! { "_id": *id }).await
    }

    async fn insert_identity(&self, identity: IdentityDoc) -> Result<ObjectId> {
        self.identities.insert_one(identity).await
    }

    async fn count_identities(&self, user_id: &ObjectId, status: IdentityStatus) -> Result<u64> {
        self.identities
            .count(doc! { "user_id": *user_id, "status": status.as_str() })
            .await
    }

    async fn set_identity_status(
        &self,
        id: &ObjectId,
        status: IdentityStatus,
        inspector_id: &ObjectId,
    ) -> Result<Option<IdentityDoc>> {
        self.identities
            .find_one_and_update(
                doc! { "_id": *id },
                doc! {
                    "$set": {
                        "status": status.as_str(),
                        "inspector_id": *inspector_id,
                        "inspected_at": DateTime::now(),
                        "metadata.updated_at": DateTime::now()
                    }
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_filter_need_signatures() {
        let query = QuestionQuery {
            state: Some("vt".to_string()),
            threshold_met: Some(false),
            ..Default::default()
        };
        let filter = question_filter(&query, None);
        assert_eq!(filter, doc! { "state": "vt", "threshold_met": false });
    }

    #[test]
    fn test_question_filter_need_answers_uses_nin() {
        let answered = ObjectId::new();
        let query = QuestionQuery {
            state: Some("vt".to_string()),
            answered: Some(false),
            ..Default::default()
        };
        let filter = question_filter(&query, Some(vec![Bson::ObjectId(answered)]));
        assert_eq!(
            filter,
            doc! {
                "state": "vt",
                "$and": [ { "_id": { "$nin": [answered] } } ]
            }
        );
    }
}
