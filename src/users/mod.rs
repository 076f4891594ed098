//! Users
//!
//! Registration-time validation and per-user derived views (questions
//! signed, verification status, top issues).

use std::collections::BTreeSet;
use std::sync::Arc;

use bson::oid::ObjectId;
use serde::Serialize;
use tracing::info;

use crate::db::schemas::{IdentityStatus, QuestionDoc, UserDoc};
use crate::store::{CivicStore, QuestionQuery};
use crate::types::{AskThemError, Result};

/// Postal abbreviations accepted as a user's region
pub const US_REGIONS: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN",
    "IA", "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH",
    "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT",
    "VT", "VA", "WA", "WV", "WI", "WY", "AS", "GU", "MP", "PR", "VI",
];

/// Countries accepted for a user
pub const SUPPORTED_COUNTRIES: &[&str] = &["US"];

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn is_blank_opt(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, is_blank)
}

/// Check the fields every stored user must have
pub fn validate_user(user: &UserDoc) -> Result<()> {
    let mut problems = Vec::new();

    if is_blank(&user.given_name) {
        problems.push("given name can't be blank".to_string());
    }
    if is_blank(&user.family_name) {
        problems.push("family name can't be blank".to_string());
    }
    if is_blank(&user.email) {
        problems.push("email can't be blank".to_string());
    }
    if is_blank_opt(&user.postal_code) {
        problems.push("postal code can't be blank".to_string());
    }
    if is_blank_opt(&user.country) {
        problems.push("country can't be blank".to_string());
    }

    if let Some(region) = user.region.as_deref().filter(|r| !is_blank(r)) {
        if !US_REGIONS.iter().any(|r| r.eq_ignore_ascii_case(region)) {
            problems.push(format!("region '{}' is not a US state or territory", region));
        }
    }
    if let Some(country) = user.country.as_deref().filter(|c| !is_blank(c)) {
        if !SUPPORTED_COUNTRIES.contains(&country) {
            problems.push(format!("country '{}' is not supported", country));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(AskThemError::Validation(problems.join("; ")))
    }
}

/// A user's engagement summary
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    pub verified: bool,
    pub questions_signed: Vec<QuestionDoc>,
    pub top_issues: Vec<String>,
}

/// User registration and lookups derived from other collections
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn CivicStore>,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn CivicStore>) -> Self {
        Self { store }
    }

    /// Validate and store a new user
    pub async fn register(&self, user: UserDoc) -> Result<ObjectId> {
        validate_user(&user)?;
        let id = self.store.insert_user(user).await?;
        info!("Registered user {}", id);
        Ok(id)
    }

    async fn require_user(&self, user_id: &ObjectId) -> Result<UserDoc> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AskThemError::NotFound(format!("User {}", user_id)))
    }

    /// Questions the user has signed
    pub async fn questions_signed(&self, user_id: &ObjectId) -> Result<Vec<QuestionDoc>> {
        let ids: Vec<ObjectId> = self
            .store
            .signatures_by_user(user_id)
            .await?
            .into_iter()
            .map(|s| s.question_id)
            .collect();

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        self.store
            .find_questions(QuestionQuery {
                ids: Some(ids),
                ..Default::default()
            })
            .await
    }

    /// Whether the user has signed the given question
    pub async fn has_signed(&self, user_id: &ObjectId, question_id: &ObjectId) -> Result<bool> {
        Ok(self
            .store
            .find_signature_for(user_id, question_id)
            .await?
            .is_some())
    }

    /// Whether staff have verified at least one identity claimed by the user
    pub async fn is_verified(&self, user_id: &ObjectId) -> Result<bool> {
        Ok(self
            .store
            .count_identities(user_id, IdentityStatus::Verified)
            .await?
            > 0)
    }

    /// Distinct subjects of the user's own questions, sorted
    pub async fn top_issues(&self, user_id: &ObjectId) -> Result<Vec<String>> {
        let questions = self
            .store
            .find_questions(QuestionQuery {
                user_id: Some(*user_id),
                ..Default::default()
            })
            .await?;

        let subjects: BTreeSet<String> = questions.into_iter().filter_map(|q| q.subject).collect();
        Ok(subjects.into_iter().collect())
    }

    pub async fn profile(&self, user_id: &ObjectId) -> Result<UserProfile> {
        let user = self.require_user(user_id).await?;
        Ok(UserProfile {
            user_id: user_id.to_hex(),
            name: user.name(),
            verified: self.is_verified(user_id).await?,
            questions_signed: self.questions_signed(user_id).await?,
            top_issues: self.top_issues(user_id).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_user() -> UserDoc {
        let mut user = UserDoc::new(
            "jane@example.com".to_string(),
            "Jane".to_string(),
            "Roe".to_string(),
        );
        user.postal_code = Some("05401".to_string());
        user.region = Some("vt".to_string());
        user
    }

    #[test]
    fn test_valid_user_passes() {
        assert!(validate_user(&valid_user()).is_ok());
    }

    #[test]
    fn test_blank_fields_reported_together() {
        let mut user = valid_user();
        user.given_name = " ".to_string();
        user.postal_code = None;

        let err = validate_user(&user).unwrap_err().to_string();
        assert!(err.contains("given name"));
        assert!(err.contains("postal code"));
    }

    #[test]
    fn test_region_and_country_inclusion() {
        let mut user = valid_user();
        user.region = Some("ZZ".to_string());
        assert!(validate_user(&user).is_err());

        let mut user = valid_user();
        user.region = Some(String::new());
        assert!(validate_user(&user).is_ok());

        let mut user = valid_user();
        user.country = Some("CA".to_string());
        assert!(validate_user(&user).is_err());
    }
}
