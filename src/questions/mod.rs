//! Questions
//!
//! Creation, lookup, answers and the jurisdiction feeds. Tallies are never
//! accepted from callers; they start at zero and belong to the signature
//! lifecycle.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bson::oid::ObjectId;
use tracing::info;

use crate::db::schemas::{AnswerDoc, IdentityStatus, QuestionDoc};
use crate::store::{CivicStore, QuestionQuery};
use crate::types::{AskThemError, Result};

/// Listing tabs for a jurisdiction's questions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionFeed {
    /// Threshold not yet met
    NeedSignatures,
    HaveAnswers,
    NeedAnswers,
    /// Newest first
    Recent,
}

impl QuestionFeed {
    fn query(self, state: &str) -> QuestionQuery {
        let mut query = QuestionQuery {
            state: Some(state.to_string()),
            ..Default::default()
        };
        match self {
            Self::NeedSignatures => query.threshold_met = Some(false),
            Self::HaveAnswers => query.answered = Some(true),
            Self::NeedAnswers => query.answered = Some(false),
            Self::Recent => query.newest_first = true,
        }
        query
    }
}

impl fmt::Display for QuestionFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NeedSignatures => "need_signatures",
            Self::HaveAnswers => "have_answers",
            Self::NeedAnswers => "need_answers",
            Self::Recent => "recent",
        };
        f.write_str(name)
    }
}

impl FromStr for QuestionFeed {
    type Err = AskThemError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "need_signatures" => Ok(Self::NeedSignatures),
            "have_answers" => Ok(Self::HaveAnswers),
            "need_answers" => Ok(Self::NeedAnswers),
            "recent" => Ok(Self::Recent),
            other => Err(AskThemError::BadRequest(format!("Unknown feed '{}'", other))),
        }
    }
}

/// Input for a new question
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub user_id: ObjectId,
    pub person_id: ObjectId,
    pub title: String,
    pub body: String,
    pub subject: Option<String>,
    pub bill_id: Option<ObjectId>,
}

#[derive(Clone)]
pub struct QuestionService {
    store: Arc<dyn CivicStore>,
}

impl QuestionService {
    pub fn new(store: Arc<dyn CivicStore>) -> Self {
        Self { store }
    }

    /// Create a question in jurisdiction `state`
    pub async fn create(&self, state: &str, input: NewQuestion) -> Result<QuestionDoc> {
        let mut problems = Vec::new();
        if input.title.trim().is_empty() {
            problems.push("title can't be blank".to_string());
        }
        if input.body.trim().is_empty() {
            problems.push("body can't be blank".to_string());
        }
        if self.store.find_user(&input.user_id).await?.is_none() {
            problems.push(format!("user {} does not exist", input.user_id));
        }
        if self.store.find_person(&input.person_id).await?.is_none() {
            problems.push(format!("person {} does not exist", input.person_id));
        }
        if !problems.is_empty() {
            return Err(AskThemError::Validation(problems.join("; ")));
        }

        let mut question = QuestionDoc::new(
            input.user_id,
            input.person_id,
            state.to_string(),
            input.title,
            input.body,
        );
        question.subject = input.subject.filter(|s| !s.trim().is_empty());
        question.bill_id = input.bill_id;

        let id = self.store.insert_question(question.clone()).await?;
        question.id = Some(id);

        info!(
            "Question {} posted in {} by user {} to person {}",
            id, state, question.user_id, question.person_id
        );
        Ok(question)
    }

    pub async fn get(&self, question_id: &ObjectId) -> Result<QuestionDoc> {
        self.store
            .find_question(question_id)
            .await?
            .ok_or_else(|| AskThemError::NotFound(format!("Question {}", question_id)))
    }

    /// List a jurisdiction's questions for one feed
    pub async fn feed(&self, state: &str, feed: QuestionFeed) -> Result<Vec<QuestionDoc>> {
        self.store.find_questions(feed.query(state)).await
    }

    /// Attach an answer. When an author is given they must hold a verified identity.
    pub async fn answer(
        &self,
        question_id: &ObjectId,
        text: String,
        user_id: Option<ObjectId>,
    ) -> Result<AnswerDoc> {
        self.get(question_id).await?;

        if text.trim().is_empty() {
            return Err(AskThemError::Validation("answer can't be blank".to_string()));
        }
        if let Some(user_id) = &user_id {
            if self
                .store
                .count_identities(user_id, IdentityStatus::Verified)
                .await?
                == 0
            {
                return Err(AskThemError::Validation(format!(
                    "user {} has no verified identity",
                    user_id
                )));
            }
        }

        let mut answer = AnswerDoc::new(*question_id, text);
        answer.user_id = user_id;
        let id = self.store.insert_answer(answer.clone()).await?;
        answer.id = Some(id);

        info!("Question {} answered ({})", question_id, id);
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_parsing() {
        assert_eq!(
            "need_signatures".parse::<QuestionFeed>().unwrap(),
            QuestionFeed::NeedSignatures
        );
        assert_eq!("recent".parse::<QuestionFeed>().unwrap(), QuestionFeed::Recent);
        assert!(matches!(
            "popular".parse::<QuestionFeed>(),
            Err(AskThemError::BadRequest(_))
        ));
        assert_eq!(QuestionFeed::HaveAnswers.to_string(), "have_answers");
    }

    #[test]
    fn test_feed_queries() {
        let q = QuestionFeed::NeedSignatures.query("vt");
        assert_eq!(q.state.as_deref(), Some("vt"));
        assert_eq!(q.threshold_met, Some(false));

        let q = QuestionFeed::NeedAnswers.query("vt");
        assert_eq!(q.answered, Some(false));

        assert!(QuestionFeed::Recent.query("vt").newest_first);
    }
}
