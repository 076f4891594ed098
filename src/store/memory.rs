//! In-memory store
//!
//! Backs development mode (no MongoDB) and the test suite. Per-entry
//! `DashMap` locking gives the same atomic add-and-fetch semantics as
//! MongoDB's `$inc` with `ReturnDocument::After`.

use std::collections::HashSet;

use bson::{oid::ObjectId, DateTime};
use dashmap::{mapref::entry::Entry, DashMap};

use super::{CivicStore, QuestionQuery};
use crate::db::schemas::{
    AnswerDoc, IdentityDoc, IdentityStatus, Metadata, PersonDoc, QuestionDoc, SignatureDoc,
    UserDoc,
};
use crate::types::{AskThemError, Result};

/// In-memory implementation of [`CivicStore`]
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<ObjectId, UserDoc>,
    /// email -> user id; the uniqueness index
    emails: DashMap<String, ObjectId>,
    people: DashMap<ObjectId, PersonDoc>,
    questions: DashMap<ObjectId, QuestionDoc>,
    signatures: DashMap<ObjectId, SignatureDoc>,
    /// (user_id, question_id) -> signature id; the uniqueness index
    signature_keys: DashMap<(ObjectId, ObjectId), ObjectId>,
    answers: DashMap<ObjectId, AnswerDoc>,
    identities: DashMap<ObjectId, IdentityDoc>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a person's threshold. Stands in for edits made outside
    /// this service (e.g. data imports).
    pub fn set_signature_threshold(&self, person_id: &ObjectId, threshold: i64) -> bool {
        match self.people.get_mut(person_id) {
            Some(mut person) => {
                person.signature_threshold = threshold;
                true
            }
            None => false,
        }
    }

    /// Overwrite a user's address fields, as a profile edit would
    pub fn update_user<F: FnOnce(&mut UserDoc)>(&self, user_id: &ObjectId, edit: F) -> bool {
        match self.users.get_mut(user_id) {
            Some(mut user) => {
                edit(&mut user);
                user.metadata.updated_at = Some(DateTime::now());
                true
            }
            None => false,
        }
    }

    /// Remove a question outright
    pub fn remove_question(&self, question_id: &ObjectId) -> bool {
        self.questions.remove(question_id).is_some()
    }
}

/// Assign an id if missing and stamp timestamps, mirroring `MongoCollection::insert_one`
fn stamp(id: &mut Option<ObjectId>, metadata: &mut Metadata) -> ObjectId {
    let now = DateTime::now();
    metadata.created_at = Some(now);
    metadata.updated_at = Some(now);
    *id.get_or_insert_with(ObjectId::new)
}

#[async_trait::async_trait]
impl CivicStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn find_user(&self, id: &ObjectId) -> Result<Option<UserDoc>> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn insert_user(&self, mut user: UserDoc) -> Result<ObjectId> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AskThemError::Validation(
                "Email is already registered".to_string(),
            )),
            Entry::Vacant(slot) => {
                let id = stamp(&mut user.id, &mut user.metadata);
                self.users.insert(id, user);
                slot.insert(id);
                Ok(id)
            }
        }
    }

    async fn find_person(&self, id: &ObjectId) -> Result<Option<PersonDoc>> {
        Ok(self.people.get(id).map(|p| p.clone()))
    }

    async fn insert_person(&self, mut person: PersonDoc) -> Result<ObjectId> {
        let id = stamp(&mut person.id, &mut person.metadata);
        self.people.insert(id, person);
        Ok(id)
    }

    async fn find_question(&self, id: &ObjectId) -> Result<Option<QuestionDoc>> {
        Ok(self.questions.get(id).map(|q| q.clone()))
    }

    async fn insert_question(&self, mut question: QuestionDoc) -> Result<ObjectId> {
        let id = stamp(&mut question.id, &mut question.metadata);
        self.questions.insert(id, question);
        Ok(id)
    }

    async fn find_questions(&self, query: QuestionQuery) -> Result<Vec<QuestionDoc>> {
        let answered: HashSet<ObjectId> = self.answers.iter().map(|a| a.question_id).collect();

        let mut found: Vec<QuestionDoc> = self
            .questions
            .iter()
            .filter(|q| {
                let id = *q.key();
                query.state.as_ref().map_or(true, |s| &q.state == s)
                    && query.user_id.map_or(true, |u| q.user_id == u)
                    && query.threshold_met.map_or(true, |m| q.threshold_met == m)
                    && query.ids.as_ref().map_or(true, |ids| ids.contains(&id))
                    && query.answered.map_or(true, |a| answered.contains(&id) == a)
            })
            .map(|q| q.clone())
            .collect();

        if query.newest_first {
            found.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        }

        Ok(found)
    }

    async fn add_to_signature_count(
        &self,
        question_id: &ObjectId,
        delta: i64,
    ) -> Result<Option<QuestionDoc>> {
        let Some(mut question) = self.questions.get_mut(question_id) else {
            return Ok(None);
        };

        let next = question.signature_count + delta;
        if next < 0 {
            return Ok(None);
        }

        question.signature_count = next;
        question.metadata.updated_at = Some(DateTime::now());
        Ok(Some(question.clone()))
    }

    async fn set_threshold_met(&self, question_id: &ObjectId, met: bool) -> Result<bool> {
        match self.questions.get_mut(question_id) {
            Some(mut question) => {
                question.threshold_met = met;
                question.metadata.updated_at = Some(DateTime::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_signature(&self, id: &ObjectId) -> Result<Option<SignatureDoc>> {
        Ok(self.signatures.get(id).map(|s| s.clone()))
    }

    async fn find_signature_for(
        &self,
        user_id: &ObjectId,
        question_id: &ObjectId,
    ) -> Result<Option<SignatureDoc>> {
        let id = match self.signature_keys.get(&(*user_id, *question_id)) {
            Some(id) => *id,
            None => return Ok(None),
        };
        self.find_signature(&id).await
    }

    async fn insert_signature(&self, mut signature: SignatureDoc) -> Result<ObjectId> {
        match self
            .signature_keys
            .entry((signature.user_id, signature.question_id))
        {
            Entry::Occupied(_) => Err(AskThemError::Validation(
                "User has already signed this question".to_string(),
            )),
            Entry::Vacant(slot) => {
                let id = stamp(&mut signature.id, &mut signature.metadata);
                self.signatures.insert(id, signature);
                slot.insert(id);
                Ok(id)
            }
        }
    }

    async fn delete_signature(&self, id: &ObjectId) -> Result<bool> {
        match self.signatures.remove(id) {
            Some((_, signature)) => {
                self.signature_keys
                    .remove(&(signature.user_id, signature.question_id));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_signatures(&self, question_id: &ObjectId) -> Result<u64> {
        Ok(self
            .signatures
            .iter()
            .filter(|s| &s.question_id == question_id)
            .count() as u64)
    }

    async fn signatures_by_user(&self, user_id: &ObjectId) -> Result<Vec<SignatureDoc>> {
        Ok(self
            .signatures
            .iter()
            .filter(|s| &s.user_id == user_id)
            .map(|s| s.clone())
            .collect())
    }

    async fn insert_answer(&self, mut answer: AnswerDoc) -> Result<ObjectId> {
        let id = stamp(&mut answer.id, &mut answer.metadata);
        self.answers.insert(id, answer);
        Ok(id)
    }

    async fn find_identity(&self, id: &ObjectId) -> Result<Option<IdentityDoc>> {
        Ok(self.identities.get(id).map(|i| i.clone()))
    }

    async fn insert_identity(&self, mut identity: IdentityDoc) -> Result<ObjectId> {
        let id = stamp(&mut identity.id, &mut identity.metadata);
        self.identities.insert(id, identity);
        Ok(id)
    }

    async fn count_identities(&self, user_id: &ObjectId, status: IdentityStatus) -> Result<u64> {
        Ok(self
            .identities
            .iter()
            .filter(|i| &i.user_id == user_id && i.status == status)
            .count() as u64)
    }

    async fn set_identity_status(
        &self,
        id: &ObjectId,
        status: IdentityStatus,
        inspector_id: &ObjectId,
    ) -> Result<Option<IdentityDoc>> {
        let Some(mut identity) = self.identities.get_mut(id) else {
            return Ok(None);
        };

        let now = DateTime::now();
        identity.status = status;
        identity.inspector_id = Some(*inspector_id);
        identity.inspected_at = Some(now);
        identity.metadata.updated_at = Some(now);
        Ok(Some(identity.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> QuestionDoc {
        QuestionDoc::new(
            ObjectId::new(),
            ObjectId::new(),
            "vt".to_string(),
            "Title".to_string(),
            "Body".to_string(),
        )
    }

    #[tokio::test]
    async fn test_counter_never_goes_negative() {
        let store = MemoryStore::new();
        let id = store.insert_question(question()).await.unwrap();

        let up = store.add_to_signature_count(&id, 1).await.unwrap().unwrap();
        assert_eq!(up.signature_count, 1);

        let down = store.add_to_signature_count(&id, -1).await.unwrap().unwrap();
        assert_eq!(down.signature_count, 0);

        assert!(store.add_to_signature_count(&id, -1).await.unwrap().is_none());
        let stored = store.find_question(&id).await.unwrap().unwrap();
        assert_eq!(stored.signature_count, 0);
    }

    #[tokio::test]
    async fn test_signature_uniqueness_released_on_delete() {
        let store = MemoryStore::new();
        let sig = SignatureDoc {
            user_id: ObjectId::new(),
            question_id: ObjectId::new(),
            ..Default::default()
        };

        let id = store.insert_signature(sig.clone()).await.unwrap();
        let dup = store.insert_signature(sig.clone()).await;
        assert!(matches!(dup, Err(AskThemError::Validation(_))));

        assert!(store.delete_signature(&id).await.unwrap());
        assert!(!store.delete_signature(&id).await.unwrap());

        // Re-signing after withdrawal is allowed
        assert!(store.insert_signature(sig).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registrations_claim_email_once() {
        let store = std::sync::Arc::new(MemoryStore::new());

        let tasks: Vec<_> = (0..16)
            .map(|n| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .insert_user(UserDoc::new(
                            "same@example.com".to_string(),
                            format!("User{n}"),
                            "Doe".to_string(),
                        ))
                        .await
                })
            })
            .collect();

        let mut inserted = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => inserted += 1,
                Err(err) => assert!(matches!(err, AskThemError::Validation(_))),
            }
        }
        assert_eq!(inserted, 1);
        assert_eq!(store.users.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let id = store.insert_question(question()).await.unwrap();

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.add_to_signature_count(&id, 1).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = store.find_question(&id).await.unwrap().unwrap();
        assert_eq!(stored.signature_count, 50);
    }
}
