//! Answer document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for answers
pub const ANSWER_COLLECTION: &str = "answers";

/// An official's reply to a question
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AnswerDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub question_id: ObjectId,

    /// Identity-verified user who wrote the answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<ObjectId>,

    #[serde(default)]
    pub text: String,
}

impl AnswerDoc {
    pub fn new(question_id: ObjectId, text: String) -> Self {
        Self {
            id: None,
            metadata: Metadata::new(),
            question_id,
            user_id: None,
            text,
        }
    }
}

impl IntoIndexes for AnswerDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "question_id": 1 },
            Some(
                IndexOptions::builder()
                    .name("question_id_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for AnswerDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
