//! Signature document schema
//!
//! One user's endorsement of one question. Name and address are copied
//! from the user at creation, so later profile edits do not rewrite
//! historical signatures.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for signatures
pub const SIGNATURE_COLLECTION: &str = "signatures";

/// Signature document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SignatureDoc {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub user_id: ObjectId,

    pub question_id: ObjectId,

    #[serde(default)]
    pub given_name: String,

    #[serde(default)]
    pub family_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(default)]
    pub country: String,
}

impl IntoIndexes for SignatureDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // One signature per user per question
            (
                doc! { "user_id": 1, "question_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("user_question_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "question_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("question_id_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for SignatureDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
