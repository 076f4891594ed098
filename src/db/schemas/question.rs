//! Question document schema
//!
//! A petition-like question addressed to a person. Carries a denormalized
//! signature tally and a cached threshold flag; both are written only by
//! the signature lifecycle.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for questions
pub const QUESTION_COLLECTION: &str = "questions";

/// Question document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct QuestionDoc {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Author
    pub user_id: ObjectId,

    /// Addressee; supplies the signature threshold
    pub person_id: ObjectId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_id: Option<ObjectId>,

    /// Jurisdiction abbreviation
    #[serde(default)]
    pub state: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub body: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Number of live signatures
    #[serde(default)]
    pub signature_count: i64,

    /// Cached `signature_count >= person.signature_threshold`
    #[serde(default)]
    pub threshold_met: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime>,
}

impl QuestionDoc {
    /// Create a new, unsigned question
    pub fn new(
        user_id: ObjectId,
        person_id: ObjectId,
        state: String,
        title: String,
        body: String,
    ) -> Self {
        Self {
            id: None,
            metadata: Metadata::new(),
            user_id,
            person_id,
            bill_id: None,
            state,
            title,
            body,
            subject: None,
            signature_count: 0,
            threshold_met: false,
            issued_at: Some(DateTime::now()),
        }
    }
}

impl IntoIndexes for QuestionDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Feed listing: questions still gathering signatures
            (
                doc! { "state": 1, "threshold_met": 1 },
                Some(
                    IndexOptions::builder()
                        .name("state_threshold_met_index".to_string())
                        .build(),
                ),
            ),
            // Recent feed
            (
                doc! { "state": 1, "issued_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("state_issued_at_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("user_id_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "person_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("person_id_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for QuestionDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
