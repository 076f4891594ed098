//! Signature lifecycle
//!
//! The only writer of `QuestionDoc::signature_count` and
//! `QuestionDoc::threshold_met`. Recording a signature snapshots the
//! signer's identity, inserts the signature, atomically increments the
//! question's counter and recomputes the threshold flag. Withdrawing does
//! the reverse.

use std::sync::Arc;

use bson::oid::ObjectId;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::threshold::{flag_after_signing, flag_after_withdrawal, WithdrawalRule};
use crate::db::schemas::{Metadata, QuestionDoc, SignatureDoc, UserDoc, DEFAULT_COUNTRY};
use crate::store::CivicStore;
use crate::types::{AskThemError, Result};

/// Outcome of recording a signature
#[derive(Debug, Clone, Serialize)]
pub struct SignatureReceipt {
    pub signature: SignatureDoc,
    pub question: QuestionDoc,
}

/// Stored counter compared against a live count of signatures
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TallyAudit {
    pub question_id: String,
    pub recorded: i64,
    pub live: u64,
    pub consistent: bool,
}

/// Build a signature carrying a copy of the user's current identity fields
pub fn snapshot_signature(user: &UserDoc, user_id: ObjectId, question_id: ObjectId) -> SignatureDoc {
    SignatureDoc {
        id: None,
        metadata: Metadata::new(),
        user_id,
        question_id,
        given_name: user.given_name.clone(),
        family_name: user.family_name.clone(),
        street_address: user.street_address.clone(),
        locality: user.locality.clone(),
        region: user.region.clone(),
        postal_code: user.postal_code.clone(),
        country: user
            .country
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
    }
}

/// Record and withdraw signatures while keeping question tallies in step
#[derive(Clone)]
pub struct SignatureService {
    store: Arc<dyn CivicStore>,
    rule: WithdrawalRule,
}

impl SignatureService {
    pub fn new(store: Arc<dyn CivicStore>, rule: WithdrawalRule) -> Self {
        Self { store, rule }
    }

    pub fn withdrawal_rule(&self) -> WithdrawalRule {
        self.rule
    }

    /// Record `user_id`'s signature on `question_id`.
    ///
    /// Fails with `Validation` if either reference does not resolve or the
    /// user has already signed, and with `NotFound` if the question's person
    /// is gone. Nothing is stored or counted on any of these failures.
    pub async fn record_signature(
        &self,
        user_id: &ObjectId,
        question_id: &ObjectId,
    ) -> Result<SignatureReceipt> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AskThemError::Validation(format!("User {} does not exist", user_id)))?;

        let question = self.store.find_question(question_id).await?.ok_or_else(|| {
            AskThemError::Validation(format!("Question {} does not exist", question_id))
        })?;
        // Fail before anything is written; the threshold is re-read after the increment
        self.signature_threshold(&question).await?;

        if self
            .store
            .find_signature_for(user_id, question_id)
            .await?
            .is_some()
        {
            return Err(AskThemError::Validation(
                "User has already signed this question".to_string(),
            ));
        }

        let mut signature = snapshot_signature(&user, *user_id, *question_id);
        // The store's uniqueness check is authoritative under concurrent signing
        let signature_id = self.store.insert_signature(signature.clone()).await?;
        signature.id = Some(signature_id);

        let mut question = match self.store.add_to_signature_count(question_id, 1).await? {
            Some(q) => q,
            None => {
                return Err(integrity_fault(format!(
                    "question {} disappeared after signature {} was stored",
                    question_id, signature_id
                )))
            }
        };

        let threshold = self.signature_threshold(&question).await?;
        if let Some(met) = flag_after_signing(question.signature_count, threshold) {
            if question.threshold_met != met {
                self.write_flag(question_id, met).await?;
                question.threshold_met = met;
                info!(
                    "Question {} reached its signature threshold ({}/{})",
                    question_id, question.signature_count, threshold
                );
            }
        }

        info!(
            "User {} signed question {} (count: {}, threshold met: {})",
            user_id, question_id, question.signature_count, question.threshold_met
        );

        Ok(SignatureReceipt {
            signature,
            question,
        })
    }

    /// Withdraw a signature and return the question's updated tally.
    ///
    /// Fails with `NotFound` if the signature is already gone, including
    /// when a concurrent withdrawal removed it first.
    pub async fn withdraw_signature(&self, signature_id: &ObjectId) -> Result<QuestionDoc> {
        let signature = self
            .store
            .find_signature(signature_id)
            .await?
            .ok_or_else(|| not_found_signature(signature_id))?;

        if !self.store.delete_signature(signature_id).await? {
            debug!("Signature {} removed concurrently", signature_id);
            return Err(not_found_signature(signature_id));
        }

        let question_id = signature.question_id;
        let mut question = match self.store.add_to_signature_count(&question_id, -1).await? {
            Some(q) => q,
            None => {
                let reason = match self.store.find_question(&question_id).await? {
                    Some(q) => format!(
                        "signature count of question {} would go negative (stored: {})",
                        question_id, q.signature_count
                    ),
                    None => format!(
                        "question {} of withdrawn signature {} no longer exists",
                        question_id, signature_id
                    ),
                };
                return Err(integrity_fault(reason));
            }
        };

        let threshold = self.signature_threshold(&question).await?;
        if let Some(met) = flag_after_withdrawal(self.rule, question.signature_count, threshold) {
            self.write_flag(&question_id, met).await?;
            if question.threshold_met != met {
                info!(
                    "Question {} fell below its signature threshold ({}/{})",
                    question_id, question.signature_count, threshold
                );
            }
            question.threshold_met = met;
        }

        info!(
            "Signature {} withdrawn from question {} (count: {}, threshold met: {})",
            signature_id, question_id, question.signature_count, question.threshold_met
        );

        Ok(question)
    }

    /// Compare a question's stored counter with its live signatures.
    ///
    /// Mismatches are logged, never repaired.
    pub async fn audit_tally(&self, question_id: &ObjectId) -> Result<TallyAudit> {
        let question = self
            .store
            .find_question(question_id)
            .await?
            .ok_or_else(|| AskThemError::NotFound(format!("Question {}", question_id)))?;
        let live = self.store.count_signatures(question_id).await?;

        let consistent = u64::try_from(question.signature_count).ok() == Some(live);
        if !consistent {
            warn!(
                "Question {} records {} signatures but {} are live",
                question_id, question.signature_count, live
            );
        }

        Ok(TallyAudit {
            question_id: question_id.to_hex(),
            recorded: question.signature_count,
            live,
            consistent,
        })
    }

    /// Re-read the threshold from the question's person
    async fn signature_threshold(&self, question: &QuestionDoc) -> Result<i64> {
        let person = self
            .store
            .find_person(&question.person_id)
            .await?
            .ok_or_else(|| AskThemError::NotFound(format!("Person {}", question.person_id)))?;
        Ok(person.signature_threshold)
    }

    async fn write_flag(&self, question_id: &ObjectId, met: bool) -> Result<()> {
        if self.store.set_threshold_met(question_id, met).await? {
            Ok(())
        } else {
            Err(integrity_fault(format!(
                "threshold flag recomputed for destroyed question {}",
                question_id
            )))
        }
    }
}

fn not_found_signature(id: &ObjectId) -> AskThemError {
    AskThemError::NotFound(format!("Signature {}", id))
}

fn integrity_fault(reason: String) -> AskThemError {
    error!("Integrity fault: {}", reason);
    AskThemError::Integrity(reason)
}
